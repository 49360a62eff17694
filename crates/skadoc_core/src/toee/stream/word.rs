use serde::Serialize;

/// Channels carried by one bone record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ChannelMask(u8);

impl ChannelMask {
	/// Scale channel bit.
	pub const SCALE: Self = Self(0b100);
	/// Rotation channel bit.
	pub const ROTATION: Self = Self(0b010);
	/// Location channel bit.
	pub const LOCATION: Self = Self(0b001);

	/// Build a mask from its three low bits; higher bits are ignored.
	pub fn from_bits(bits: u8) -> Self {
		Self(bits & 0b111)
	}

	/// Raw three-bit value.
	pub fn bits(self) -> u8 {
		self.0
	}

	/// Mask with the given channels set.
	pub fn with(scale: bool, rotation: bool, location: bool) -> Self {
		Self((u8::from(scale) << 2) | (u8::from(rotation) << 1) | u8::from(location))
	}

	/// Return `true` when every bit of `other` is set.
	pub fn contains(self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	/// Return `true` when no channel is set.
	pub fn is_empty(self) -> bool {
		self.0 == 0
	}
}

/// One 16-bit header word from the frame loop of a keyframe stream.
///
/// Bit 0 clear is a frame marker holding `word >> 1` (arithmetic); `-1` there ends the stream.
/// Bit 0 set is a bone record: bits 1..=3 are the channel mask, bits 4..=15 the bone index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamWord {
	/// Samples that follow belong to this frame.
	Frame(u16),
	/// End of stream.
	End,
	/// Per-bone record header.
	Bone {
		/// Bone index.
		bone: u16,
		/// Channels whose samples follow.
		channels: ChannelMask,
	},
}

impl StreamWord {
	/// Largest frame a marker can carry.
	pub const MAX_FRAME: u16 = (i16::MAX >> 1) as u16;
	/// Largest bone index a record header can carry.
	pub const MAX_BONE: u16 = 0x0fff;

	/// Classify a raw word; `None` for negative frame markers other than the end marker.
	pub fn from_raw(raw: i16) -> Option<Self> {
		if raw & 1 == 1 {
			let bits = raw as u16;
			return Some(Self::Bone {
				bone: bits >> 4,
				channels: ChannelMask::from_bits((bits >> 1) as u8),
			});
		}

		match raw >> 1 {
			-1 => Some(Self::End),
			frame => u16::try_from(frame).ok().map(Self::Frame),
		}
	}

	/// Pack into a raw word. Callers keep frames and bones within [`Self::MAX_FRAME`] and
	/// [`Self::MAX_BONE`].
	pub fn to_raw(self) -> i16 {
		match self {
			Self::Frame(frame) => ((frame & Self::MAX_FRAME) << 1) as i16,
			Self::End => -2,
			Self::Bone { bone, channels } => (((bone & Self::MAX_BONE) << 4) | (u16::from(channels.bits()) << 1) | 1) as i16,
		}
	}
}
