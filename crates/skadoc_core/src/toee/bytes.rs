use crate::toee::{Result, SkaError};

/// Bounded little-endian cursor over an immutable byte slice.
///
/// Offsets are absolute into the slice so section and stream offsets read from headers can be
/// used directly with [`Cursor::at`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Create a cursor at an absolute position.
	///
	/// The position is not validated here; the first read past the end fails with `Truncated`.
	pub fn at(bytes: &'a [u8], pos: usize) -> Self {
		Self { bytes, pos }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(SkaError::Truncated {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Skip `n` bytes.
	pub fn skip(&mut self, n: usize) -> Result<()> {
		let _ = self.read_exact(n)?;
		Ok(())
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read an `i8`.
	pub fn read_i8(&mut self) -> Result<i8> {
		Ok(i8::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `i16`.
	pub fn read_i16(&mut self) -> Result<i16> {
		Ok(i16::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		Ok(u16::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32> {
		Ok(i32::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `f32`.
	pub fn read_f32(&mut self) -> Result<f32> {
		Ok(f32::from_le_bytes(self.read_array()?))
	}

	/// Read `N` consecutive little-endian `f32` values.
	pub fn read_f32s<const N: usize>(&mut self) -> Result<[f32; N]> {
		let mut out = [0.0_f32; N];
		for slot in &mut out {
			*slot = self.read_f32()?;
		}
		Ok(out)
	}

	/// Read `N` consecutive little-endian `i16` values.
	pub fn read_i16s<const N: usize>(&mut self) -> Result<[i16; N]> {
		let mut out = [0_i16; N];
		for slot in &mut out {
			*slot = self.read_i16()?;
		}
		Ok(out)
	}

	/// Read a null-padded name field of `length` bytes, truncated at the first null.
	///
	/// Bytes map one-to-one onto chars so that any stored name survives a write back.
	pub fn read_fixed_name(&mut self, length: usize) -> Result<String> {
		let raw = self.read_exact(length)?;
		let end = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());
		Ok(raw[..end].iter().map(|byte| char::from(*byte)).collect())
	}
}

/// Growable little-endian byte writer.
#[derive(Debug, Default)]
pub struct Writer {
	bytes: Vec<u8>,
}

impl Writer {
	/// Create an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an empty writer with reserved capacity.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			bytes: Vec::with_capacity(capacity),
		}
	}

	/// Return current length, which is the offset of the next write.
	pub fn pos(&self) -> usize {
		self.bytes.len()
	}

	/// Finish writing and return the buffer.
	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}

	/// Append raw bytes.
	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.bytes.extend_from_slice(bytes);
	}

	/// Append `n` zero bytes.
	pub fn write_zeros(&mut self, n: usize) {
		self.bytes.resize(self.bytes.len() + n, 0);
	}

	/// Append an `i8`.
	pub fn write_i8(&mut self, value: i8) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Append a little-endian `i16`.
	pub fn write_i16(&mut self, value: i16) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Append a little-endian `u16`.
	pub fn write_u16(&mut self, value: u16) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Append a little-endian `i32`.
	pub fn write_i32(&mut self, value: i32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Append a little-endian `f32`.
	pub fn write_f32(&mut self, value: f32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Append consecutive little-endian `f32` values.
	pub fn write_f32s(&mut self, values: &[f32]) {
		for value in values {
			self.write_f32(*value);
		}
	}

	/// Append consecutive little-endian `i16` values.
	pub fn write_i16s(&mut self, values: &[i16]) {
		for value in values {
			self.write_i16(*value);
		}
	}

	/// Overwrite a previously written `i32` at `at`.
	pub fn patch_i32(&mut self, at: usize, value: i32) {
		self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
	}

	/// Append `text` zero-padded to `length` bytes.
	pub fn write_fixed_name(&mut self, text: &str, length: usize) -> Result<()> {
		let encoded = encode_fixed_name(text, length)?;
		self.write_bytes(&encoded);
		self.write_zeros(length - encoded.len());
		Ok(())
	}
}

/// Encode `text` as single bytes, failing when it cannot fit `capacity`.
pub(crate) fn encode_fixed_name(text: &str, capacity: usize) -> Result<Vec<u8>> {
	let mut out = Vec::with_capacity(text.len());
	for ch in text.chars() {
		let byte = u8::try_from(u32::from(ch)).map_err(|_| SkaError::NameEncoding { name: text.to_owned() })?;
		out.push(byte);
	}

	if out.len() > capacity {
		return Err(SkaError::NameTooLong {
			name: text.to_owned(),
			capacity,
		});
	}
	Ok(out)
}

/// Convert an in-memory count or offset to its on-disk `i32`.
pub(crate) fn to_i32(what: &'static str, value: usize) -> Result<i32> {
	i32::try_from(value).map_err(|_| SkaError::CountOverflow { what, value })
}

/// Convert an in-memory count to its on-disk `i16`.
pub(crate) fn to_i16(what: &'static str, value: usize) -> Result<i16> {
	i16::try_from(value).map_err(|_| SkaError::CountOverflow { what, value })
}
