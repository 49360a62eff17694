use serde::Serialize;
use thiserror::Error;

/// Recoverable anomaly found while decoding, with the fallback that was applied.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum Diagnostic {
	/// Vertex declared an attachment count outside `0..=6`; the count was clamped.
	#[error("vertex {vertex} declares {declared} attachments, clamped to {kept}")]
	AttachmentOverflow {
		/// Vertex index.
		vertex: usize,
		/// Raw declared count.
		declared: i16,
		/// Count actually decoded.
		kept: usize,
	},
	/// MDF names a second texture; only the first is kept.
	#[error("material names a secondary texture {path:?} which is not supported")]
	UnsupportedSecondaryTexture {
		/// Second quoted path.
		path: String,
	},
	/// Animation bone has no mesh bone with the same name.
	#[error("animation bone {index} ({name:?}) has no matching mesh bone")]
	UnmappedBone {
		/// Animation bone index.
		index: usize,
		/// Animation bone name.
		name: String,
	},
	/// Animation bone 0 matched no mesh bone and was bound to mesh bone 0.
	#[error("root animation bone {name:?} has no matching mesh bone, bound to mesh bone 0")]
	RootBoneFallback {
		/// Animation bone 0 name.
		name: String,
	},
	/// Reserved words in an animation bone record were non-zero and are dropped.
	#[error("animation bone {bone} has non-zero reserved data {values:?}")]
	ReservedBoneData {
		/// Animation bone index.
		bone: usize,
		/// Raw reserved words.
		values: [i32; 2],
	},
	/// Variation section declared records; the section is not modeled and was skipped.
	#[error("variation section declares {count} records, ignored")]
	VariationDataIgnored {
		/// Declared record count.
		count: i32,
	},
	/// Animation header declared a negative event count; no events were read.
	#[error("animation {animation} declares {count} events, read none")]
	NegativeEventCount {
		/// Animation index.
		animation: usize,
		/// Raw declared count.
		count: i16,
	},
	/// Bone parent index is not a lower index (or -1).
	#[error("bone {bone} has parent {parent} which does not precede it")]
	ParentOutOfOrder {
		/// Bone index.
		bone: usize,
		/// Declared parent index.
		parent: i16,
	},
	/// Face references a vertex index past the vertex section.
	#[error("face {face} references vertex {vertex} of {vertex_count}")]
	FaceVertexOutOfRange {
		/// Face index.
		face: usize,
		/// Offending vertex index.
		vertex: i16,
		/// Decoded vertex count.
		vertex_count: usize,
	},
	/// A frame marker exceeded the stream's declared frame window and ended the stream.
	#[error("keyframe stream at offset {offset} reached frame {frame} beyond window {window}")]
	StreamFrameBeyondWindow {
		/// Absolute stream offset.
		offset: usize,
		/// Offending frame.
		frame: u16,
		/// Declared frame window.
		window: u16,
	},
	/// Material file referenced by the mesh could not be read.
	#[error("material {path:?} could not be loaded: {reason}")]
	MissingMaterial {
		/// MDF reference from the mesh.
		path: String,
		/// Loader error text.
		reason: String,
	},
}

/// Sink collecting diagnostics from one or more decode calls.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
	items: Vec<Diagnostic>,
}

impl Diagnostics {
	/// Create an empty sink.
	pub fn new() -> Self {
		Self::default()
	}

	/// Record and log one diagnostic.
	pub fn push(&mut self, diagnostic: Diagnostic) {
		tracing::warn!(%diagnostic, "recovered decode anomaly");
		self.items.push(diagnostic);
	}

	/// Borrow all recorded diagnostics in emission order.
	pub fn items(&self) -> &[Diagnostic] {
		&self.items
	}

	/// Return `true` when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Number of recorded diagnostics.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Move all diagnostics out of `other` into `self` without logging them again.
	pub fn append(&mut self, other: &mut Diagnostics) {
		self.items.append(&mut other.items);
	}

	/// Consume the sink and return the diagnostics.
	pub fn into_vec(self) -> Vec<Diagnostic> {
		self.items
	}
}
