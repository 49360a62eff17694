use std::fmt;

use serde::{Serialize, Serializer};

use crate::toee::bytes::{Cursor, Writer, encode_fixed_name};
use crate::toee::Result;

/// Fixed-capacity name stored as `N` null-padded bytes on disk.
///
/// Construction validates capacity, so writing a `Name` cannot fail.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Name<const N: usize>(String);

impl<const N: usize> Name<N> {
	/// On-disk width in bytes.
	pub const CAPACITY: usize = N;

	/// Build a name, failing with `NameTooLong` when `text` exceeds `N` bytes.
	pub fn new(text: impl Into<String>) -> Result<Self> {
		let text = text.into();
		encode_fixed_name(&text, N)?;
		Ok(Self(text))
	}

	/// Borrow the text.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Return `true` for an empty name.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub(crate) fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		cursor.read_fixed_name(N).map(Self)
	}

	pub(crate) fn write(&self, writer: &mut Writer) -> Result<()> {
		writer.write_fixed_name(&self.0, N)
	}
}

impl<const N: usize> fmt::Debug for Name<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&self.0, f)
	}
}

impl<const N: usize> fmt::Display for Name<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl<const N: usize> AsRef<str> for Name<N> {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl<const N: usize> TryFrom<&str> for Name<N> {
	type Error = crate::toee::SkaError;

	fn try_from(value: &str) -> Result<Self> {
		Self::new(value)
	}
}

impl<const N: usize> Serialize for Name<N> {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}
