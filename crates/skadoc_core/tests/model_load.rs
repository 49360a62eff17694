#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use skadoc::toee::{
	AnimBone, AnimationRecord, BoneLink, DecodeOptions, Diagnostic, Diagnostics, KeyframeStream, Material, MeshBone, MeshMaterial, Model,
	Quaternion, SkaFile, SkmFile, StreamDescriptor,
};

fn mesh() -> SkmFile {
	let mut head = MeshBone::new("Bip01 Head", 0).expect("bone");
	head.world_inverse[2][3] = -1.5;
	SkmFile {
		bones: vec![MeshBone::new("Bip01", -1).expect("bone"), head],
		materials: vec![
			MeshMaterial::new("art/meshes/ogre/ogre.mdf").expect("material"),
			MeshMaterial::new("art\\meshes\\ogre\\missing.mdf").expect("material"),
		],
		vertices: Vec::new(),
		faces: Vec::new(),
	}
}

fn animation() -> SkaFile {
	let mut stream = KeyframeStream::new(0.5, 0.25);
	stream.push_rotation(1, 3, Quaternion::IDENTITY);
	let mut idle = AnimationRecord::new("unarmed_unarmed_idle").expect("name");
	idle.loopable = true;
	idle.streams.push(StreamDescriptor::new(Arc::new(stream), 12, 30.0));

	SkaFile {
		bones: vec![
			AnimBone::new("bip01", -1).expect("bone"),
			AnimBone::new("Bip01 Head", 0).expect("bone"),
			AnimBone::new("Cloth", 0).expect("bone"),
		],
		animations: vec![idle],
	}
}

/// Lay out `<data>/art/meshes/ogre/` with the mesh, the animation and one of two materials.
fn install(data: &Path) -> PathBuf {
	let dir = data.join("art").join("meshes").join("ogre");
	fs::create_dir_all(&dir).expect("mkdir");

	let ska_path = dir.join("ogre.SKA");
	animation().write_to(&ska_path).expect("write ska");
	mesh().write_to(dir.join("ogre.SKM")).expect("write skm");
	Material::new("art/meshes/ogre/ogre.tga").write_to(dir.join("ogre.mdf")).expect("write mdf");
	ska_path
}

#[test]
fn loads_mesh_materials_and_mapping() {
	skadoc_testkit::init_tracing();
	let temp = tempfile::tempdir().expect("tempdir");
	let ska_path = install(temp.path());

	let mut diag = Diagnostics::new();
	let model = Model::load(&ska_path, &DecodeOptions::default(), &mut diag).expect("model loads");

	assert_eq!(model.mesh, mesh());
	assert_eq!(model.animation.animations[0].name.as_str(), "unarmed_unarmed_idle");
	assert_eq!(model.materials.len(), 2);
	assert_eq!(model.materials[0].as_ref().map(|material| material.texture_reference.as_str()), Some("art/meshes/ogre/ogre.tga"));
	assert!(model.materials[1].is_none());

	assert_eq!(model.mapping.links(), [BoneLink::Matched(0), BoneLink::Matched(1), BoneLink::Unmapped]);

	let items = diag.items();
	assert_eq!(items.len(), 2, "{items:?}");
	assert!(matches!(&items[0], Diagnostic::MissingMaterial { path, .. } if path == "art\\meshes\\ogre\\missing.mdf"));
	assert_eq!(items[1], Diagnostic::UnmappedBone {
		index: 2,
		name: "Cloth".into()
	});

	let pose = model.rest_pose();
	let head = pose[1].expect("head has a rest pose");
	assert!((head.translation[2] - 1.5).abs() < 1e-5);
	assert!(pose[2].is_none());
}

#[test]
fn missing_mesh_is_fatal() {
	let temp = tempfile::tempdir().expect("tempdir");
	let ska_path = install(temp.path());
	fs::remove_file(ska_path.with_extension("SKM")).expect("remove mesh");

	let mut diag = Diagnostics::new();
	let err = Model::load(&ska_path, &DecodeOptions::default(), &mut diag).expect_err("mesh is required");
	assert!(matches!(err, skadoc::toee::SkaError::Io(_)));
}
