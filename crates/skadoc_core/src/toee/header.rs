use serde::Serialize;

use crate::toee::bytes::{Cursor, Writer, to_i32};
use crate::toee::{DecodeOptions, Result, SkaError};

/// One `(count, offset)` entry of a file header; the offset is absolute from file start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Section {
	/// Declared record count.
	pub count: i32,
	/// Absolute byte offset of the first record.
	pub offset: i32,
}

impl Section {
	/// Build a section entry from in-memory sizes.
	pub fn new(label: &'static str, count: usize, offset: usize) -> Result<Self> {
		Ok(Self {
			count: to_i32(label, count)?,
			offset: to_i32(label, offset)?,
		})
	}

	/// Validate this section against the buffer and return `(count, offset)` as `usize`.
	///
	/// Fails when the count or offset is negative, the count exceeds the configured ceiling, or
	/// `count` fixed-size records starting at `offset` do not fit in `file_len` bytes.
	pub fn locate(self, label: &'static str, record_size: usize, file_len: usize, opt: &DecodeOptions) -> Result<(usize, usize)> {
		let (Ok(count), Ok(offset)) = (usize::try_from(self.count), usize::try_from(self.offset)) else {
			return Err(SkaError::NegativeSection {
				section: label,
				count: self.count,
				offset: self.offset,
			});
		};

		if count > opt.max_records {
			return Err(SkaError::TooManyRecords {
				section: label,
				count,
				max: opt.max_records,
			});
		}

		let need = count * record_size;
		let rem = file_len.saturating_sub(offset);
		if need > rem {
			return Err(SkaError::Truncated { at: offset, need, rem });
		}

		Ok((count, offset))
	}
}

/// File header made of `N` consecutive `(count: i32, offset: i32)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTable<const N: usize> {
	/// Section entries in on-disk order.
	pub sections: [Section; N],
}

impl<const N: usize> SectionTable<N> {
	/// Header size in bytes.
	pub const SIZE: usize = N * 8;

	/// Parse the header from the beginning of `bytes`.
	pub fn parse(bytes: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let mut sections = [Section::default(); N];
		for section in &mut sections {
			section.count = cursor.read_i32()?;
			section.offset = cursor.read_i32()?;
		}
		Ok(Self { sections })
	}

	/// Append the header to `writer`.
	pub fn write(&self, writer: &mut Writer) {
		for section in &self.sections {
			writer.write_i32(section.count);
			writer.write_i32(section.offset);
		}
	}
}

/// Decode every fixed-size record of one section.
///
/// Each record gets its own cursor bounded to `record_size` bytes, so a reader that overruns its
/// record fails with `Truncated` instead of bleeding into the next one.
pub(crate) fn read_records<T>(
	bytes: &[u8],
	section: Section,
	label: &'static str,
	record_size: usize,
	opt: &DecodeOptions,
	mut read: impl FnMut(&mut Cursor<'_>, usize) -> Result<T>,
) -> Result<Vec<T>> {
	let (count, offset) = section.locate(label, record_size, bytes.len(), opt)?;
	let mut out = Vec::with_capacity(count);
	for index in 0..count {
		let start = offset + index * record_size;
		let mut cursor = Cursor::new(&bytes[start..start + record_size]);
		out.push(read(&mut cursor, index)?);
	}

	tracing::debug!(section = label, count, offset, "decoded section");
	Ok(out)
}

#[cfg(test)]
mod tests;
