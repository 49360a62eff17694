use serde::Serialize;

/// Three-component vector `[x, y, z]`.
pub type Vec3 = [f32; 3];

/// Rotation quaternion with named components.
///
/// Files store quaternions as `x, y, z, w`; use [`Quaternion::xyzw`] or [`Quaternion::wxyz`] when a
/// positional order is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quaternion {
	/// Scalar part.
	pub w: f32,
	/// Vector part, x.
	pub x: f32,
	/// Vector part, y.
	pub y: f32,
	/// Vector part, z.
	pub z: f32,
}

impl Quaternion {
	/// Identity rotation.
	pub const IDENTITY: Self = Self {
		w: 1.0,
		x: 0.0,
		y: 0.0,
		z: 0.0,
	};

	/// Build from on-disk `[x, y, z, w]` order.
	pub fn from_xyzw([x, y, z, w]: [f32; 4]) -> Self {
		Self { w, x, y, z }
	}

	/// Build from scalar-first `[w, x, y, z]` order.
	pub fn from_wxyz([w, x, y, z]: [f32; 4]) -> Self {
		Self { w, x, y, z }
	}

	/// Return on-disk `[x, y, z, w]` order.
	pub fn xyzw(self) -> [f32; 4] {
		[self.x, self.y, self.z, self.w]
	}

	/// Return scalar-first `[w, x, y, z]` order.
	pub fn wxyz(self) -> [f32; 4] {
		[self.w, self.x, self.y, self.z]
	}
}

impl Default for Quaternion {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl From<glam::Quat> for Quaternion {
	fn from(value: glam::Quat) -> Self {
		Self::from_xyzw(value.to_array())
	}
}

impl From<Quaternion> for glam::Quat {
	fn from(value: Quaternion) -> Self {
		glam::Quat::from_array(value.xyzw())
	}
}
