use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::toee::bytes::{Cursor, Writer};
use crate::toee::header::read_records;
use crate::toee::{DecodeOptions, Diagnostic, Diagnostics, Name, Result, Section, SectionTable, SkaError, Vec3};

/// Number of attachment slots in a vertex record.
pub const MAX_ATTACHMENTS: usize = 6;

const BONE_SIZE: usize = 100;
const MATERIAL_SIZE: usize = 128;
const VERTEX_SIZE: usize = 80;
const FACE_SIZE: usize = 8;

/// Bind-pose skeleton bone from a mesh file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshBone {
	/// Raw bone flags.
	pub flags: i16,
	/// Parent bone index, `-1` for roots.
	pub parent_index: i16,
	/// Bone name.
	pub name: Name<48>,
	/// Inverse of the bone's bind-pose world transform, three rows of `[r0, r1, r2, t]`.
	pub world_inverse: [[f32; 4]; 3],
}

impl MeshBone {
	/// Identity rows for `world_inverse`.
	pub const IDENTITY: [[f32; 4]; 3] = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]];

	/// Build a bone at the origin.
	pub fn new(name: &str, parent_index: i16) -> Result<Self> {
		Ok(Self {
			flags: 0,
			parent_index,
			name: Name::new(name)?,
			world_inverse: Self::IDENTITY,
		})
	}

	fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		let flags = cursor.read_i16()?;
		let parent_index = cursor.read_i16()?;
		let name = Name::read(cursor)?;
		let mut world_inverse = [[0.0_f32; 4]; 3];
		for row in &mut world_inverse {
			*row = cursor.read_f32s()?;
		}

		Ok(Self {
			flags,
			parent_index,
			name,
			world_inverse,
		})
	}

	fn write(&self, writer: &mut Writer) -> Result<()> {
		writer.write_i16(self.flags);
		writer.write_i16(self.parent_index);
		self.name.write(writer)?;
		for row in &self.world_inverse {
			writer.write_f32s(row);
		}
		Ok(())
	}
}

/// Mesh material slot naming an MDF file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshMaterial {
	/// MDF path relative to the asset data directory.
	pub path: Name<128>,
}

impl MeshMaterial {
	/// Build a material slot for an MDF path.
	pub fn new(path: &str) -> Result<Self> {
		Ok(Self { path: Name::new(path)? })
	}
}

/// One weighted bone influence on a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attachment {
	/// Mesh bone index.
	pub bone: i16,
	/// Skinning weight.
	pub weight: f32,
}

/// Skinned mesh vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
	/// Object-space position.
	pub position: Vec3,
	/// Object-space normal.
	pub normal: Vec3,
	/// Texture coordinate.
	pub uv: [f32; 2],
	/// Bone influences, at most [`MAX_ATTACHMENTS`].
	pub attachments: Vec<Attachment>,
}

impl Vertex {
	fn read(cursor: &mut Cursor<'_>, index: usize, diag: &mut Diagnostics) -> Result<Self> {
		let [px, py, pz, _] = cursor.read_f32s::<4>()?;
		let [nx, ny, nz, _] = cursor.read_f32s::<4>()?;
		let uv = cursor.read_f32s()?;
		cursor.skip(2)?;

		let declared = cursor.read_i16()?;
		let kept = usize::try_from(declared).unwrap_or(0).min(MAX_ATTACHMENTS);
		if usize::try_from(declared).ok() != Some(kept) {
			diag.push(Diagnostic::AttachmentOverflow { vertex: index, declared, kept });
		}

		// Bone indices and weights are two separate fixed arrays, not interleaved pairs.
		let bones = cursor.read_i16s::<MAX_ATTACHMENTS>()?;
		let weights = cursor.read_f32s::<MAX_ATTACHMENTS>()?;

		let attachments = bones
			.iter()
			.zip(weights)
			.take(kept)
			.map(|(bone, weight)| Attachment { bone: *bone, weight })
			.collect();

		Ok(Self {
			position: [px, py, pz],
			normal: [nx, ny, nz],
			uv,
			attachments,
		})
	}

	fn write(&self, writer: &mut Writer, index: usize) -> Result<()> {
		let count = self.attachments.len();
		if count > MAX_ATTACHMENTS {
			return Err(SkaError::TooManyAttachments {
				vertex: index,
				count,
				max: MAX_ATTACHMENTS,
			});
		}

		writer.write_f32s(&self.position);
		writer.write_f32(0.0);
		writer.write_f32s(&self.normal);
		writer.write_f32(0.0);
		writer.write_f32s(&self.uv);
		writer.write_u16(0);
		writer.write_i16(count as i16);

		for slot in 0..MAX_ATTACHMENTS {
			writer.write_i16(self.attachments.get(slot).map_or(0, |item| item.bone));
		}
		for slot in 0..MAX_ATTACHMENTS {
			writer.write_f32(self.attachments.get(slot).map_or(0.0, |item| item.weight));
		}
		Ok(())
	}
}

/// Triangle face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Face {
	/// Index into [`SkmFile::materials`].
	pub material_index: i16,
	/// Vertex indices.
	pub vertices: [i16; 3],
}

impl Face {
	fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		let material_index = cursor.read_i16()?;
		let vertices = cursor.read_i16s()?;
		Ok(Self { material_index, vertices })
	}

	fn write(&self, writer: &mut Writer) {
		writer.write_i16(self.material_index);
		writer.write_i16s(&self.vertices);
	}
}

/// Decoded skeletal mesh file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkmFile {
	/// Bind-pose skeleton.
	pub bones: Vec<MeshBone>,
	/// Material slots.
	pub materials: Vec<MeshMaterial>,
	/// Vertices.
	pub vertices: Vec<Vertex>,
	/// Triangles.
	pub faces: Vec<Face>,
}

impl SkmFile {
	/// Decode an in-memory SKM image.
	pub fn parse(bytes: &[u8], opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let header = SectionTable::<4>::parse(bytes)?;
		let [bones, materials, vertices, faces] = header.sections;

		let bones = read_records(bytes, bones, "bones", BONE_SIZE, opt, |cursor, _| MeshBone::read(cursor))?;
		let materials = read_records(bytes, materials, "materials", MATERIAL_SIZE, opt, |cursor, _| {
			Ok(MeshMaterial { path: Name::read(cursor)? })
		})?;
		let vertices = read_records(bytes, vertices, "vertices", VERTEX_SIZE, opt, |cursor, index| {
			Vertex::read(cursor, index, diag)
		})?;
		let faces = read_records(bytes, faces, "faces", FACE_SIZE, opt, |cursor, _| Face::read(cursor))?;

		let file = Self {
			bones,
			materials,
			vertices,
			faces,
		};
		file.check(diag);
		Ok(file)
	}

	/// Read and decode an SKM file from disk.
	pub fn open(path: impl AsRef<Path>, opt: &DecodeOptions, diag: &mut Diagnostics) -> Result<Self> {
		let raw = fs::read(path)?;
		Self::parse(&raw, opt, diag)
	}

	/// Encode to an SKM image with sections laid out back to back after the header.
	pub fn write(&self) -> Result<Vec<u8>> {
		let bones_at = SectionTable::<4>::SIZE;
		let materials_at = bones_at + self.bones.len() * BONE_SIZE;
		let vertices_at = materials_at + self.materials.len() * MATERIAL_SIZE;
		let faces_at = vertices_at + self.vertices.len() * VERTEX_SIZE;
		let end = faces_at + self.faces.len() * FACE_SIZE;

		let header = SectionTable {
			sections: [
				Section::new("bones", self.bones.len(), bones_at)?,
				Section::new("materials", self.materials.len(), materials_at)?,
				Section::new("vertices", self.vertices.len(), vertices_at)?,
				Section::new("faces", self.faces.len(), faces_at)?,
			],
		};

		let mut writer = Writer::with_capacity(end);
		header.write(&mut writer);
		for bone in &self.bones {
			bone.write(&mut writer)?;
		}
		for material in &self.materials {
			material.path.write(&mut writer)?;
		}
		for (index, vertex) in self.vertices.iter().enumerate() {
			vertex.write(&mut writer, index)?;
		}
		for face in &self.faces {
			face.write(&mut writer);
		}

		debug_assert_eq!(writer.pos(), end);
		Ok(writer.into_bytes())
	}

	/// Encode and write to disk.
	pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
		fs::write(path, self.write()?)?;
		Ok(())
	}

	/// Find a bone by case-insensitive name.
	pub fn find_bone(&self, name: &str) -> Option<usize> {
		self.bones.iter().position(|bone| bone.name.as_str().eq_ignore_ascii_case(name))
	}

	fn check(&self, diag: &mut Diagnostics) {
		for (index, bone) in self.bones.iter().enumerate() {
			if !parent_precedes(bone.parent_index, index) {
				diag.push(Diagnostic::ParentOutOfOrder {
					bone: index,
					parent: bone.parent_index,
				});
			}
		}

		let vertex_count = self.vertices.len();
		for (index, face) in self.faces.iter().enumerate() {
			for vertex in face.vertices {
				if !usize::try_from(vertex).is_ok_and(|vertex| vertex < vertex_count) {
					diag.push(Diagnostic::FaceVertexOutOfRange {
						face: index,
						vertex,
						vertex_count,
					});
				}
			}
		}
	}
}

/// Return `true` when `parent` is `-1` or an index below `index`.
pub(crate) fn parent_precedes(parent: i16, index: usize) -> bool {
	parent == -1 || usize::try_from(parent).is_ok_and(|parent| parent < index)
}

#[cfg(test)]
mod tests;
