use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, SkaError>;

/// Fatal errors produced while reading or writing SKM, SKA and MDF data.
///
/// Recoverable anomalies are reported as [`Diagnostic`](crate::toee::Diagnostic) values instead.
#[derive(Debug, Error)]
pub enum SkaError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested field or record.
	#[error("truncated at offset {at}, need {need} bytes, remaining {rem}")]
	Truncated {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Section header carried a negative count or offset.
	#[error("section {section} has negative count or offset (count={count}, offset={offset})")]
	NegativeSection {
		/// Section label.
		section: &'static str,
		/// Declared record count.
		count: i32,
		/// Declared absolute offset.
		offset: i32,
	},
	/// Section declared more records than the configured ceiling.
	#[error("section {section} declares {count} records, max {max}")]
	TooManyRecords {
		/// Section label.
		section: &'static str,
		/// Declared record count.
		count: usize,
		/// Configured ceiling.
		max: usize,
	},
	/// MDF text contains no quoted texture path.
	#[error("material has no quoted texture path")]
	MalformedMaterial,
	/// Text does not fit into a fixed-length name field.
	#[error("name {name:?} exceeds capacity of {capacity} bytes")]
	NameTooLong {
		/// Offending text.
		name: String,
		/// Field capacity in bytes.
		capacity: usize,
	},
	/// Text contains characters that cannot be stored as single bytes.
	#[error("name {name:?} contains characters outside the single-byte range")]
	NameEncoding {
		/// Offending text.
		name: String,
	},
	/// Keyframe stream ran out of data or frame window without its end marker.
	#[error("keyframe stream at offset {offset} has no end marker (stopped at {at})")]
	StreamSentinelMissing {
		/// Absolute offset of the stream start.
		offset: usize,
		/// Absolute offset where decoding stopped.
		at: usize,
	},
	/// Keyframe stream words violate the frame/record state machine.
	#[error("malformed keyframe stream at offset {at}: {reason}")]
	MalformedStream {
		/// Absolute offset of the offending word.
		at: usize,
		/// Short description of the violation.
		reason: &'static str,
	},
	/// Animation header declared an impossible stream count.
	#[error("animation {animation} declares {count} streams (max {max})")]
	StreamCountOutOfRange {
		/// Animation record index.
		animation: usize,
		/// Declared stream count.
		count: i32,
		/// Fixed descriptor slot count.
		max: usize,
	},
	/// Vertex carries more attachments than the record can hold.
	#[error("vertex {vertex} has {count} attachments (max {max})")]
	TooManyAttachments {
		/// Vertex index.
		vertex: usize,
		/// Attachment count.
		count: usize,
		/// Fixed attachment slot count.
		max: usize,
	},
	/// Value does not fit the 16-bit quantized range with the given factor.
	#[error("value {value} with factor {factor} does not fit a 16-bit sample")]
	QuantizeOverflow {
		/// Offending value.
		value: f32,
		/// Quantization factor.
		factor: f32,
	},
	/// Keyframe frame number cannot be packed into a frame marker.
	#[error("frame {frame} cannot be encoded (max {max})")]
	StreamFrameOutOfRange {
		/// Offending frame.
		frame: u16,
		/// Largest encodable frame.
		max: u16,
	},
	/// Bone index cannot be packed into a bone record header.
	#[error("bone {bone} cannot be encoded in a keyframe stream (max {max})")]
	StreamBoneOutOfRange {
		/// Offending bone index.
		bone: u16,
		/// Largest encodable bone index.
		max: u16,
	},
	/// Channel keys are not ordered by frame.
	#[error("bone {bone} has keys out of frame order")]
	UnorderedKeys {
		/// Bone index whose channel is out of order.
		bone: u16,
	},
	/// Count or offset does not fit its on-disk integer width.
	#[error("{what} value {value} does not fit its on-disk field")]
	CountOverflow {
		/// Field label.
		what: &'static str,
		/// Offending value.
		value: usize,
	},
}
