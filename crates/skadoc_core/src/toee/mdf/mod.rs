use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::toee::{Diagnostic, Diagnostics, Result, SkaError};

/// Material definition naming one texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Material {
	/// Texture path relative to the asset data directory.
	pub texture_reference: String,
}

impl Material {
	/// Build a material for a texture path.
	pub fn new(texture_reference: impl Into<String>) -> Self {
		Self {
			texture_reference: texture_reference.into(),
		}
	}

	/// Parse MDF text, taking the first quoted string as the texture path.
	///
	/// A second quoted string is reported as `UnsupportedSecondaryTexture` and otherwise ignored.
	pub fn parse(bytes: &[u8], diag: &mut Diagnostics) -> Result<Self> {
		let text = String::from_utf8_lossy(bytes);
		let mut quoted = quoted_strings(&text);

		let texture_reference = quoted.next().ok_or(SkaError::MalformedMaterial)?.to_owned();
		if let Some(second) = quoted.next() {
			diag.push(Diagnostic::UnsupportedSecondaryTexture { path: second.to_owned() });
		}

		Ok(Self { texture_reference })
	}

	/// Read and parse an MDF file from disk.
	pub fn open(path: impl AsRef<Path>, diag: &mut Diagnostics) -> Result<Self> {
		let raw = fs::read(path)?;
		Self::parse(&raw, diag)
	}

	/// Render the material as MDF text.
	pub fn serialize(&self) -> Vec<u8> {
		format!("Textured\nTexture \"{}\"\n", self.texture_reference).into_bytes()
	}

	/// Write the material as an MDF file.
	pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
		fs::write(path, self.serialize())?;
		Ok(())
	}
}

/// Iterate the contents of closed `"..."` pairs in order.
fn quoted_strings(text: &str) -> impl Iterator<Item = &str> {
	let mut parts = text.split('"');
	let _ = parts.next();
	let mut rest = parts.peekable();
	std::iter::from_fn(move || {
		let inner = rest.next()?;
		// An unmatched opening quote has no closing segment after it.
		rest.peek()?;
		let _ = rest.next();
		Some(inner)
	})
}
