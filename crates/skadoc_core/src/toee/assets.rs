use std::fs;
use std::path::{Path, PathBuf};

use crate::toee::Result;

/// Source of asset bytes addressed by the relative references stored in model files.
pub trait AssetSource {
	/// Read the asset named by `reference`, e.g. `art/meshes/ogre/ogre.mdf`.
	fn read(&self, reference: &str) -> Result<Vec<u8>>;
}

/// Asset data directory on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
	root: PathBuf,
}

impl DataDir {
	/// Data directory rooted at `root`.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Derive the data directory from a model path of the form `<data>/art/...`.
	///
	/// The directory of the model is cut before its first `art` component, matched
	/// case-insensitively. Backslash separators are accepted. Without an `art` component the
	/// model's own directory is used.
	pub fn for_model(model: impl AsRef<Path>) -> Self {
		let normalized = model.as_ref().to_string_lossy().replace('\\', "/");
		let dir = Path::new(&normalized).parent().unwrap_or(Path::new(""));

		let mut root = PathBuf::new();
		for component in dir.components() {
			if component.as_os_str().to_str().is_some_and(|name| name.eq_ignore_ascii_case("art")) {
				break;
			}
			root.push(component);
		}
		Self { root }
	}

	/// Root directory.
	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Filesystem path for a reference; both `/` and `\` separate segments.
	pub fn resolve(&self, reference: &str) -> PathBuf {
		let mut path = self.root.clone();
		path.extend(reference.split(['/', '\\']).filter(|segment| !segment.is_empty()));
		path
	}
}

impl AssetSource for DataDir {
	fn read(&self, reference: &str) -> Result<Vec<u8>> {
		let path = self.resolve(reference);
		tracing::debug!(path = %path.display(), "reading asset");
		Ok(fs::read(path)?)
	}
}

/// Path of the mesh file that accompanies an animation file.
pub fn skm_path_for(ska: impl AsRef<Path>) -> PathBuf {
	ska.as_ref().with_extension("SKM")
}
