use serde::{Deserialize, Serialize};

/// Runtime limits and behavior switches for decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
	/// Maximum record count accepted for any single section.
	pub max_records: usize,
	/// Treat a frame marker past the declared frame window as a missing end marker.
	///
	/// When disabled the stream ends at that marker and a diagnostic is recorded instead.
	pub strict_frame_window: bool,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_records: 1 << 20,
			strict_frame_window: true,
		}
	}
}

impl DecodeOptions {
	/// Preset for legacy files whose streams end with an out-of-window frame marker.
	pub fn lenient() -> Self {
		Self {
			strict_frame_window: false,
			..Self::default()
		}
	}
}
