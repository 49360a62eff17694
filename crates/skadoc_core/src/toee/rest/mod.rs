//! Bind-pose rest transforms derived from mesh bone world-inverse matrices.
//!
//! The rest world transform of a bone is the inverse of its stored world-inverse matrix. The
//! parent-relative rest transform is the parent's world-inverse times the bone's own world
//! transform. Animation samples are keyed relative to that local rest transform.

use glam::{Mat4, Quat, Vec3 as GVec3, Vec4};
use serde::Serialize;

use crate::toee::{BoneMapping, MeshBone, Quaternion, Vec3};

/// Matrices with a determinant this close to zero are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-8;

/// Decomposed rest transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestTransform {
	/// Scale.
	pub scale: Vec3,
	/// Rotation.
	pub rotation: Quaternion,
	/// Translation.
	pub translation: Vec3,
}

impl RestTransform {
	/// Bind-pose world transform of `bone`; `None` when its world-inverse matrix is singular.
	pub fn world(bone: &MeshBone) -> Option<Self> {
		invert(world_inverse_matrix(bone)).map(Self::from_matrix)
	}

	/// Parent-relative bind-pose transform of bone `index`.
	///
	/// Roots and bones whose parent index is out of range use their world transform.
	pub fn local(bones: &[MeshBone], index: usize) -> Option<Self> {
		let bone = bones.get(index)?;
		let world = invert(world_inverse_matrix(bone))?;
		let local = match usize::try_from(bone.parent_index).ok().and_then(|parent| bones.get(parent)) {
			Some(parent) => world_inverse_matrix(parent) * world,
			None => world,
		};
		Some(Self::from_matrix(local))
	}

	/// Express an absolute rotation sample relative to this rest rotation.
	pub fn relative_rotation(&self, rotation: Quaternion) -> Quaternion {
		let rest = Quat::from(self.rotation);
		Quaternion::from(rest.inverse() * Quat::from(rotation))
	}

	/// Express an absolute location sample relative to this rest translation.
	pub fn relative_location(&self, location: Vec3) -> Vec3 {
		(GVec3::from(location) - GVec3::from(self.translation)).to_array()
	}

	fn from_matrix(matrix: Mat4) -> Self {
		let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
		Self {
			scale: scale.to_array(),
			rotation: Quaternion::from(rotation),
			translation: translation.to_array(),
		}
	}
}

/// Stored `world_inverse` rows as a 4x4 affine matrix.
pub fn world_inverse_matrix(bone: &MeshBone) -> Mat4 {
	let [r0, r1, r2] = bone.world_inverse;
	Mat4::from_cols(Vec4::from(r0), Vec4::from(r1), Vec4::from(r2), Vec4::W).transpose()
}

/// Local rest transform of the mesh bone bound to each animation bone, in animation bone order.
///
/// Unmapped bones and bones with a singular matrix yield `None`.
pub fn rest_pose(mesh_bones: &[MeshBone], mapping: &BoneMapping) -> Vec<Option<RestTransform>> {
	mapping
		.links()
		.iter()
		.map(|link| link.mesh_index().and_then(|index| RestTransform::local(mesh_bones, index)))
		.collect()
}

fn invert(matrix: Mat4) -> Option<Mat4> {
	(matrix.determinant().abs() > SINGULAR_EPSILON).then(|| matrix.inverse())
}
