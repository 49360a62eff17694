use skadoc_testkit::{concat, sectioned_image, skm_bone, skm_face, skm_material, skm_vertex};

use crate::toee::{Attachment, DecodeOptions, Diagnostic, Diagnostics, Face, MeshBone, SectionTable, SkaError, SkmFile, Vertex};

const IDENTITY: [[f32; 4]; 3] = MeshBone::IDENTITY;

fn mesh_image(vertices: Vec<Vec<u8>>, faces: Vec<Vec<u8>>) -> Vec<u8> {
	let translated = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, -2.0], [0.0, 0.0, 1.0, 0.5]];
	let bones = vec![skm_bone("Bip01", -1, IDENTITY), skm_bone("Bip01 Pelvis", 0, translated)];
	let materials = vec![skm_material("art/meshes/ogre/ogre.mdf")];
	sectioned_image(&[
		(bones.len() as i32, concat(&bones)),
		(materials.len() as i32, concat(&materials)),
		(vertices.len() as i32, concat(&vertices)),
		(faces.len() as i32, concat(&faces)),
	])
}

fn triangle_vertices() -> Vec<Vec<u8>> {
	vec![
		skm_vertex([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0], 1, &[0], &[1.0]),
		skm_vertex([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0], 2, &[0, 1], &[0.75, 0.25]),
		skm_vertex([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0], 0, &[], &[]),
	]
}

fn parse(bytes: &[u8]) -> (SkmFile, Diagnostics) {
	let mut diag = Diagnostics::new();
	let file = SkmFile::parse(bytes, &DecodeOptions::default(), &mut diag).expect("skm parses");
	(file, diag)
}

#[test]
fn parses_all_sections() {
	let image = mesh_image(triangle_vertices(), vec![skm_face(0, [0, 1, 2])]);
	let (file, diag) = parse(&image);

	assert!(diag.is_empty(), "unexpected diagnostics: {:?}", diag.items());
	assert_eq!(file.bones.len(), 2);
	assert_eq!(file.bones[0].name.as_str(), "Bip01");
	assert_eq!(file.bones[0].parent_index, -1);
	assert_eq!(file.bones[1].parent_index, 0);
	assert_eq!(file.bones[1].world_inverse[1], [0.0, 1.0, 0.0, -2.0]);
	assert_eq!(file.materials[0].path.as_str(), "art/meshes/ogre/ogre.mdf");
	assert_eq!(file.vertices[1].position, [1.0, 0.0, 0.0]);
	assert_eq!(file.vertices[2].uv, [0.0, 1.0]);
	assert_eq!(file.faces, [Face {
		material_index: 0,
		vertices: [0, 1, 2]
	}]);
}

#[test]
fn attachment_arrays_are_not_interleaved() {
	let image = mesh_image(triangle_vertices(), Vec::new());
	let (file, _) = parse(&image);

	assert_eq!(file.vertices[0].attachments, [Attachment { bone: 0, weight: 1.0 }]);
	assert_eq!(file.vertices[1].attachments, [Attachment { bone: 0, weight: 0.75 }, Attachment { bone: 1, weight: 0.25 }]);
	assert!(file.vertices[2].attachments.is_empty());
}

#[test]
fn attachment_count_above_six_is_clamped_with_diagnostic() {
	let bones = [1_i16, 1, 1, 1, 1, 1];
	let weights = [0.5_f32, 0.1, 0.1, 0.1, 0.1, 0.1];
	let vertices = vec![skm_vertex([0.0; 3], [0.0; 3], [0.0; 2], 7, &bones, &weights)];
	let (file, diag) = parse(&mesh_image(vertices, Vec::new()));

	assert_eq!(file.vertices[0].attachments.len(), 6);
	assert_eq!(file.vertices[0].attachments[0], Attachment { bone: 1, weight: 0.5 });
	assert_eq!(
		diag.items(),
		[Diagnostic::AttachmentOverflow {
			vertex: 0,
			declared: 7,
			kept: 6
		}]
	);
}

#[test]
fn negative_attachment_count_decodes_as_none() {
	let vertices = vec![skm_vertex([0.0; 3], [0.0; 3], [0.0; 2], -3, &[4], &[1.0])];
	let (file, diag) = parse(&mesh_image(vertices, Vec::new()));

	assert!(file.vertices[0].attachments.is_empty());
	assert!(matches!(diag.items(), [Diagnostic::AttachmentOverflow { declared: -3, kept: 0, .. }]));
}

#[test]
fn round_trip_is_structurally_stable() {
	let image = mesh_image(triangle_vertices(), vec![skm_face(0, [0, 1, 2]), skm_face(0, [2, 1, 0])]);
	let (first, _) = parse(&image);

	let encoded = first.write().expect("skm encodes");
	let (second, diag) = parse(&encoded);
	assert_eq!(second, first);
	assert!(diag.is_empty());

	assert_eq!(second.write().expect("re-encodes"), encoded, "second encode is byte-identical");
}

#[test]
fn write_lays_out_sections_sequentially() {
	let image = mesh_image(triangle_vertices(), vec![skm_face(0, [0, 1, 2])]);
	let (file, _) = parse(&image);
	let encoded = file.write().expect("skm encodes");

	let header = SectionTable::<4>::parse(&encoded).expect("header parses");
	let offsets: Vec<_> = header.sections.iter().map(|section| (section.count, section.offset)).collect();
	assert_eq!(offsets, [(2, 32), (1, 232), (3, 360), (1, 600)]);
	assert_eq!(encoded.len(), 608);
}

#[test]
fn reads_sections_stored_out_of_order() {
	let faces = skm_face(0, [0, 0, 0]);
	let vertex = skm_vertex([2.0, 3.0, 4.0], [0.0; 3], [0.0; 2], 0, &[], &[]);
	let bone = skm_bone("root", -1, IDENTITY);

	// Header, then faces, vertices, bones; the material section is empty.
	let faces_at = 32;
	let vertices_at = faces_at + faces.len();
	let bones_at = vertices_at + vertex.len();
	let mut image = Vec::new();
	for (count, offset) in [(1, bones_at), (0, 0), (1, vertices_at), (1, faces_at)] {
		image.extend_from_slice(&(count as i32).to_le_bytes());
		image.extend_from_slice(&(offset as i32).to_le_bytes());
	}
	image.extend_from_slice(&faces);
	image.extend_from_slice(&vertex);
	image.extend_from_slice(&bone);

	let (file, _) = parse(&image);
	assert_eq!(file.bones[0].name.as_str(), "root");
	assert_eq!(file.vertices[0].position, [2.0, 3.0, 4.0]);
	assert_eq!(file.faces.len(), 1);
}

#[test]
fn truncated_vertex_section_is_fatal() {
	let mut image = mesh_image(triangle_vertices(), Vec::new());
	// Drop the tail of the last vertex record.
	image.truncate(image.len() - 10);

	let mut diag = Diagnostics::new();
	let err = SkmFile::parse(&image, &DecodeOptions::default(), &mut diag).expect_err("vertex section is short");
	assert!(matches!(err, SkaError::Truncated { .. }));
}

#[test]
fn reports_bad_face_and_parent_indices() {
	let bones = vec![skm_bone("a", 1, IDENTITY), skm_bone("b", -1, IDENTITY)];
	let vertices = triangle_vertices();
	let faces = vec![skm_face(0, [0, 1, 9])];
	let image = sectioned_image(&[
		(2, concat(&bones)),
		(0, Vec::new()),
		(vertices.len() as i32, concat(&vertices)),
		(1, concat(&faces)),
	]);

	let (_, diag) = parse(&image);
	assert_eq!(
		diag.items(),
		[
			Diagnostic::ParentOutOfOrder { bone: 0, parent: 1 },
			Diagnostic::FaceVertexOutOfRange {
				face: 0,
				vertex: 9,
				vertex_count: 3
			},
		]
	);
}

#[test]
fn write_rejects_too_many_attachments() {
	let mut file = SkmFile::default();
	file.vertices.push(Vertex {
		position: [0.0; 3],
		normal: [0.0; 3],
		uv: [0.0; 2],
		attachments: vec![Attachment { bone: 0, weight: 0.1 }; 7],
	});

	let err = file.write().expect_err("seven attachments do not fit");
	assert!(matches!(err, SkaError::TooManyAttachments { vertex: 0, count: 7, max: 6 }));
}

#[test]
fn find_bone_ignores_case() {
	let (file, _) = parse(&mesh_image(Vec::new(), Vec::new()));
	assert_eq!(file.find_bone("bip01 pelvis"), Some(1));
	assert_eq!(file.find_bone("Bip01 Spine"), None);
}

#[test]
fn negative_indices_keep_their_sign() {
	let vertices = vec![skm_vertex([0.0; 3], [0.0; 3], [0.0; 2], 1, &[-1], &[1.0])];
	let (file, diag) = parse(&mesh_image(vertices, vec![skm_face(0, [0, 0, -1])]));

	assert_eq!(file.vertices[0].attachments, [Attachment { bone: -1, weight: 1.0 }]);
	assert_eq!(file.faces[0].vertices, [0, 0, -1]);
	assert_eq!(
		diag.items(),
		[Diagnostic::FaceVertexOutOfRange {
			face: 0,
			vertex: -1,
			vertex_count: 1
		}]
	);

	let bytes = file.write().expect("skm encodes");
	assert_eq!(parse(&bytes).0, file);
}
