//! prism-scene: the scene graph the Prism viewer edits and exports.
//!
//! A [`Scene`] is an arena of [`Node`]s with local transforms, optional
//! [`Geometry`] and material slots. Materials and textures live in id-keyed
//! stores. Material bookkeeping reaches the scene only through the
//! [`SceneGraph`] capability trait.

pub mod access;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod material;

pub use access::SceneGraph;
pub use error::{Result, SceneError};
pub use geometry::{normal_matrix, BoundingBox, Geometry, GeometryGroup};
pub use graph::{Node, Scene};
pub use material::{Filter, Material, MaterialKind, Sampler, Texture, TextureImage, Wrap};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque material identity, assigned by the scene at insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub u64);

/// Opaque texture identity, assigned by the scene at insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureId(pub u64);

/// Index of a node in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
