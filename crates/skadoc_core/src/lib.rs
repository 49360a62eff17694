//! Public library API for reading and writing ToEE `.skm`, `.ska` and `.mdf` files.

/// Skeletal mesh, animation and material codecs, bone cross-referencing, and rest-pose helpers.
pub mod toee;
