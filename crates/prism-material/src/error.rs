//! Error types for prism-material.

use prism_paint::PaintError;
use prism_scene::{MaterialId, SceneError};
use thiserror::Error;

/// Result type for prism-material operations.
pub type Result<T> = std::result::Result<T, MaterialError>;

/// Errors raised by material bookkeeping.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// The registry holds no entry for this material.
    #[error("no registry entry for {0}")]
    UnknownMaterial(MaterialId),

    /// Restore was requested before any scan.
    #[error("material registry has not been scanned")]
    NotScanned,

    /// Texture synthesis failed.
    #[error("texture synthesis failed: {0}")]
    Paint(#[from] PaintError),

    /// Scene access failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
}
