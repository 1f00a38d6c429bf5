//! Error types for prism-scene.

use crate::{MaterialId, NodeId, TextureId};
use thiserror::Error;

/// Result type for prism-scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors raised by scene graph access.
#[derive(Debug, Error)]
pub enum SceneError {
    /// No material with this id lives in the scene.
    #[error("unknown material: {0}")]
    UnknownMaterial(MaterialId),

    /// No texture with this id lives in the scene.
    #[error("unknown texture: {0}")]
    UnknownTexture(TextureId),

    /// No node with this id lives in the scene.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A node has fewer material slots than requested.
    #[error("node {node} has no material slot {slot}")]
    NoMaterialSlot {
        /// The node.
        node: NodeId,
        /// The requested slot.
        slot: usize,
    },

    /// Structurally invalid scene data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
