mod assets;
mod bytes;
mod diag;
mod error;
mod header;
mod mdf;
mod model;
mod name;
mod options;
mod rest;
mod ska;
mod skm;
mod stream;
mod value;
mod xref;

/// Asset lookup for references stored in model files.
pub use assets::{AssetSource, DataDir, skm_path_for};
/// Recoverable decode anomalies and their sink.
pub use diag::{Diagnostic, Diagnostics};
/// Error and result aliases.
pub use error::{Result, SkaError};
/// Sectioned file header representation.
pub use header::{Section, SectionTable};
/// Material definition codec.
pub use mdf::Material;
/// Combined animation, mesh and material loading.
pub use model::Model;
/// Fixed-capacity on-disk names.
pub use name::Name;
/// Decoding limits and switches.
pub use options::DecodeOptions;
/// Rest-pose transforms derived from the mesh skeleton.
pub use rest::{RestTransform, rest_pose, world_inverse_matrix};
/// Skeletal animation container codec.
pub use ska::{AnimBone, AnimationEvent, AnimationRecord, DriveType, MAX_STREAMS, SkaFile, StreamDescriptor};
/// Skeletal mesh codec.
pub use skm::{Attachment, Face, MAX_ATTACHMENTS, MeshBone, MeshMaterial, SkmFile, Vertex};
/// Delta keyframe stream codec.
pub use stream::{Channel, ChannelMask, Key, KeyframeStream, ROTATION_FACTOR, StreamWord};
/// Shared value types.
pub use value::{Quaternion, Vec3};
/// Animation to mesh bone cross-reference.
pub use xref::{BoneLink, BoneMapping};
