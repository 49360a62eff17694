use serde::Serialize;

use crate::toee::{AnimBone, Diagnostic, Diagnostics, MeshBone};

/// How one animation bone was bound to the mesh skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoneLink {
	/// Matched a mesh bone by name.
	Matched(usize),
	/// Root bone without a name match, bound to mesh bone 0.
	RootFallback(usize),
	/// No mesh bone; pose drivers skip this bone.
	Unmapped,
}

impl BoneLink {
	/// Mesh bone index, if any.
	pub fn mesh_index(self) -> Option<usize> {
		match self {
			Self::Matched(index) | Self::RootFallback(index) => Some(index),
			Self::Unmapped => None,
		}
	}
}

/// Animation-bone to mesh-bone mapping covering every animation bone index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoneMapping {
	links: Vec<BoneLink>,
}

impl BoneMapping {
	/// Resolve animation bones against mesh bones by case-insensitive name; the first match wins.
	///
	/// Animation bone 0 without a match is bound to mesh bone 0 when the mesh has any bones.
	/// Every other miss is recorded as [`BoneLink::Unmapped`] with an `UnmappedBone` diagnostic.
	pub fn resolve(anim_bones: &[AnimBone], mesh_bones: &[MeshBone], diag: &mut Diagnostics) -> Self {
		let mut links = Vec::with_capacity(anim_bones.len());
		for (index, bone) in anim_bones.iter().enumerate() {
			let name = bone.name.as_str();
			let link = match mesh_bones.iter().position(|mesh| mesh.name.as_str().eq_ignore_ascii_case(name)) {
				Some(mesh) => BoneLink::Matched(mesh),
				None if index == 0 && !mesh_bones.is_empty() => {
					diag.push(Diagnostic::RootBoneFallback { name: name.to_owned() });
					BoneLink::RootFallback(0)
				}
				None => {
					diag.push(Diagnostic::UnmappedBone {
						index,
						name: name.to_owned(),
					});
					BoneLink::Unmapped
				}
			};
			links.push(link);
		}

		tracing::debug!(bones = links.len(), "resolved bone mapping");
		Self { links }
	}

	/// Link for animation bone `index`.
	pub fn link(&self, index: usize) -> Option<BoneLink> {
		self.links.get(index).copied()
	}

	/// Mesh bone index for animation bone `index`, or `None` when unmapped or out of range.
	pub fn mesh_index(&self, index: usize) -> Option<usize> {
		self.link(index).and_then(BoneLink::mesh_index)
	}

	/// All links in animation bone order.
	pub fn links(&self) -> &[BoneLink] {
		&self.links
	}

	/// Number of animation bones covered.
	pub fn len(&self) -> usize {
		self.links.len()
	}

	/// Return `true` for an empty animation skeleton.
	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}

	/// Animation bone indices with no mesh bone.
	pub fn unmapped(&self) -> impl Iterator<Item = usize> + '_ {
		self.links.iter().enumerate().filter(|(_, link)| **link == BoneLink::Unmapped).map(|(index, _)| index)
	}

	/// Animation bone indices bound by the root fallback.
	pub fn fallbacks(&self) -> impl Iterator<Item = usize> + '_ {
		self.links.iter().enumerate().filter(|(_, link)| matches!(link, BoneLink::RootFallback(_))).map(|(index, _)| index)
	}

	/// `(animation index, mesh index)` pairs for every mapped bone.
	pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.links.iter().enumerate().filter_map(|(index, link)| link.mesh_index().map(|mesh| (index, mesh)))
	}
}
