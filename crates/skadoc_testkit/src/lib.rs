//! Shared test helpers for workspace crates.
//!
//! Byte images are assembled field by field here, independently of the library's writers, so
//! decoder tests check the on-disk layout rather than the library's own idea of it.

use std::sync::Once;

/// Size of an SKA animation header record.
pub const ANIM_HEADER_SIZE: usize = 236;
/// Size of an SKA event record.
pub const EVENT_SIZE: usize = 178;
/// Size of an SKA stream descriptor.
pub const DESCRIPTOR_SIZE: usize = 16;

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process, filtered by `RUST_LOG`.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_test_writer()
			.try_init();
	});
}

/// Little-endian byte image builder.
#[derive(Debug, Default, Clone)]
pub struct RawBuf {
	bytes: Vec<u8>,
}

impl RawBuf {
	/// Create an empty buffer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current length.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Return `true` when nothing was written.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Finish and return the bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}

	/// Append raw bytes.
	pub fn bytes(&mut self, raw: &[u8]) -> &mut Self {
		self.bytes.extend_from_slice(raw);
		self
	}

	/// Append zero bytes.
	pub fn zeros(&mut self, n: usize) -> &mut Self {
		self.bytes.resize(self.bytes.len() + n, 0);
		self
	}

	/// Append an `i8`.
	pub fn i8(&mut self, value: i8) -> &mut Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append an `i16`.
	pub fn i16(&mut self, value: i16) -> &mut Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a `u16`.
	pub fn u16(&mut self, value: u16) -> &mut Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append an `i32`.
	pub fn i32(&mut self, value: i32) -> &mut Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append an `f32`.
	pub fn f32(&mut self, value: f32) -> &mut Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append several `f32` values.
	pub fn f32s(&mut self, values: &[f32]) -> &mut Self {
		for value in values {
			self.f32(*value);
		}
		self
	}

	/// Append several `i16` values.
	pub fn i16s(&mut self, values: &[i16]) -> &mut Self {
		for value in values {
			self.i16(*value);
		}
		self
	}

	/// Append ASCII `text` null-padded to `width` bytes.
	pub fn name(&mut self, text: &str, width: usize) -> &mut Self {
		assert!(text.len() <= width, "fixture name {text:?} wider than {width}");
		self.bytes(text.as_bytes());
		self.zeros(width - text.len())
	}
}

/// Assemble a file made of a `(count, offset)` header followed by each section blob in order.
pub fn sectioned_image(sections: &[(i32, Vec<u8>)]) -> Vec<u8> {
	let mut offset = sections.len() * 8;
	let mut header = RawBuf::new();
	for (count, blob) in sections {
		header.i32(*count).i32(offset as i32);
		offset += blob.len();
	}

	let mut out = header.into_bytes();
	for (_, blob) in sections {
		out.extend_from_slice(blob);
	}
	out
}

/// Concatenate records into one section blob.
pub fn concat(records: &[Vec<u8>]) -> Vec<u8> {
	records.concat()
}

/// SKM bone record (100 bytes).
pub fn skm_bone(name: &str, parent: i16, world_inverse: [[f32; 4]; 3]) -> Vec<u8> {
	let mut buf = RawBuf::new();
	buf.i16(0).i16(parent).name(name, 48);
	for row in &world_inverse {
		buf.f32s(row);
	}
	buf.into_bytes()
}

/// SKM material record (128 bytes).
pub fn skm_material(path: &str) -> Vec<u8> {
	let mut buf = RawBuf::new();
	buf.name(path, 128);
	buf.into_bytes()
}

/// SKM vertex record (80 bytes) with an explicit declared attachment count.
///
/// `bones` and `weights` fill the leading slots of their six-wide arrays.
pub fn skm_vertex(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], declared: i16, bones: &[i16], weights: &[f32]) -> Vec<u8> {
	let mut buf = RawBuf::new();
	buf.f32s(&position).f32(1.0).f32s(&normal).f32(0.0).f32s(&uv);
	buf.u16(0).i16(declared);
	for slot in 0..6 {
		buf.i16(bones.get(slot).copied().unwrap_or(0));
	}
	for slot in 0..6 {
		buf.f32(weights.get(slot).copied().unwrap_or(0.0));
	}
	buf.into_bytes()
}

/// SKM face record (8 bytes).
pub fn skm_face(material: i16, vertices: [i16; 3]) -> Vec<u8> {
	let mut buf = RawBuf::new();
	buf.i16(material).i16s(&vertices);
	buf.into_bytes()
}

/// SKA bone record (100 bytes); `rotation` is `[x, y, z, w]`.
pub fn ska_bone(name: &str, parent: i16, scale: [f32; 3], rotation: [f32; 4], translation: [f32; 3]) -> Vec<u8> {
	let mut buf = RawBuf::new();
	buf.i16(0).i16(parent).name(name, 40).i32(0).i32(0);
	buf.f32s(&scale).f32(0.0).f32s(&rotation).f32s(&translation).f32(0.0);
	buf.into_bytes()
}

/// SKA event record (178 bytes).
pub fn ska_event(frame: i16, event_type: &str, action: &str) -> Vec<u8> {
	let mut buf = RawBuf::new();
	buf.i16(frame).name(event_type, 48).name(action, 128);
	buf.into_bytes()
}

/// Raw SKA stream descriptor fields.
#[derive(Debug, Clone, Copy)]
pub struct RawDescriptor {
	/// Frame count.
	pub frame_count: u16,
	/// Variation id.
	pub variation_id: i16,
	/// Playback rate.
	pub frame_rate: f32,
	/// Distance per second.
	pub dps: f32,
	/// Stream offset relative to the animation section start.
	pub data_offset: i32,
}

impl RawDescriptor {
	/// Descriptor with typical rate values.
	pub fn at(data_offset: i32, frame_count: u16) -> Self {
		Self {
			frame_count,
			variation_id: 0,
			frame_rate: 30.0,
			dps: 0.0,
			data_offset,
		}
	}
}

/// SKA animation header record (236 bytes); `stream_count` is `descriptors.len()`.
pub fn ska_anim_header(name: &str, drive_type: i8, loopable: bool, event_count: i16, event_offset: i32, descriptors: &[RawDescriptor]) -> Vec<u8> {
	assert!(descriptors.len() <= 10, "at most ten descriptors");
	let mut buf = RawBuf::new();
	buf.name(name, 64).i8(drive_type).i8(i8::from(loopable)).i16(event_count).i32(event_offset);
	buf.i16(descriptors.len() as i16).i16(0);
	for item in descriptors {
		buf.u16(item.frame_count).i16(item.variation_id).f32(item.frame_rate).f32(item.dps).i32(item.data_offset);
	}
	buf.zeros((10 - descriptors.len()) * DESCRIPTOR_SIZE);
	buf.into_bytes()
}

/// Assemble an SKA image: bones, an empty variation section, then the animation section.
///
/// The animation section is the headers followed by `tail` (event arrays and stream data).
pub fn ska_image(bones: &[Vec<u8>], headers: &[Vec<u8>], tail: &[u8]) -> Vec<u8> {
	let mut animations = concat(headers);
	animations.extend_from_slice(tail);
	sectioned_image(&[(bones.len() as i32, concat(bones)), (0, Vec::new()), (headers.len() as i32, animations)])
}

/// Keyframe stream word builder.
#[derive(Debug, Default, Clone)]
pub struct RawStream {
	buf: RawBuf,
}

impl RawStream {
	/// Start a stream with its scale and location factors.
	pub fn new(scale_factor: f32, location_factor: f32) -> Self {
		let mut buf = RawBuf::new();
		buf.f32(scale_factor).f32(location_factor);
		Self { buf }
	}

	/// Initial-block entry; `rotation` is `[x, y, z, w]`.
	pub fn initial(mut self, bone: i16, scale: [i16; 3], rotation: [i16; 4], location: [i16; 3]) -> Self {
		self.buf.i16(bone).i16s(&scale).i16s(&rotation).i16s(&location);
		self
	}

	/// Initial-block terminator.
	pub fn end_initial(mut self) -> Self {
		self.buf.i16(-1);
		self
	}

	/// Frame marker.
	pub fn frame(mut self, frame: i16) -> Self {
		self.buf.i16(frame << 1);
		self
	}

	/// Bone record; each present channel is `(applies_until, samples)`.
	pub fn bone(mut self, bone: u16, scale: Option<(u16, [i16; 3])>, rotation: Option<(u16, [i16; 4])>, location: Option<(u16, [i16; 3])>) -> Self {
		let mask = (u16::from(scale.is_some()) << 2) | (u16::from(rotation.is_some()) << 1) | u16::from(location.is_some());
		self.buf.u16((bone << 4) | (mask << 1) | 1);
		if let Some((until, values)) = scale {
			self.buf.u16(until).i16s(&values);
		}
		if let Some((until, values)) = rotation {
			self.buf.u16(until).i16s(&values);
		}
		if let Some((until, values)) = location {
			self.buf.u16(until).i16s(&values);
		}
		self
	}

	/// Arbitrary raw word.
	pub fn word(mut self, raw: i16) -> Self {
		self.buf.i16(raw);
		self
	}

	/// Stream end marker (frame `-1`).
	pub fn end(mut self) -> Self {
		self.buf.i16(-2);
		self
	}

	/// Finish and return the bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.buf.into_bytes()
	}
}
