//! glTF 2.0 writer.
//!
//! Supports both JSON (.gltf) and binary (.glb) variants.

mod schema;
mod writer;

pub use writer::GltfWriter;
