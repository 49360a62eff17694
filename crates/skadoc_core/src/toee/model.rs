use std::path::Path;

use serde::Serialize;

use crate::toee::{
	AssetSource, BoneMapping, DataDir, DecodeOptions, Diagnostic, Diagnostics, Material, RestTransform, Result, SkaFile, SkmFile, rest_pose,
	skm_path_for,
};

/// Animation file with its mesh, materials and bone mapping.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
	/// Mesh decoded from the sibling SKM file.
	pub mesh: SkmFile,
	/// Animation file.
	pub animation: SkaFile,
	/// One entry per mesh material slot; `None` when the MDF could not be loaded.
	pub materials: Vec<Option<Material>>,
	/// Animation bone to mesh bone mapping.
	pub mapping: BoneMapping,
}

impl Model {
	/// Load `ska_path`, its sibling SKM file and the materials it names.
	///
	/// Materials are looked up under the data directory derived from `ska_path`.
	pub fn load(ska_path: impl AsRef<Path>, opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let ska_path = ska_path.as_ref();
		Self::load_with(ska_path, &DataDir::for_model(ska_path), opt, diag)
	}

	/// Load like [`Model::load`] with an explicit material source.
	pub fn load_with(ska_path: impl AsRef<Path>, assets: &impl AssetSource, opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let ska_path = ska_path.as_ref();
		let mesh = SkmFile::open(skm_path_for(ska_path), opt, diag)?;
		let animation = SkaFile::open(ska_path, opt, diag)?;

		let materials = mesh
			.materials
			.iter()
			.map(|slot| {
				let path = slot.path.as_str();
				match assets.read(path).and_then(|raw| Material::parse(&raw, diag)) {
					Ok(material) => Some(material),
					Err(err) => {
						diag.push(Diagnostic::MissingMaterial {
							path: path.to_owned(),
							reason: err.to_string(),
						});
						None
					}
				}
			})
			.collect();

		let mapping = BoneMapping::resolve(&animation.bones, &mesh.bones, diag);
		tracing::debug!(path = %ska_path.display(), diagnostics = diag.len(), "loaded model");

		Ok(Self {
			mesh,
			animation,
			materials,
			mapping,
		})
	}

	/// Local rest transform for each animation bone, see [`rest_pose`].
	pub fn rest_pose(&self) -> Vec<Option<RestTransform>> {
		rest_pose(&self.mesh.bones, &self.mapping)
	}
}
