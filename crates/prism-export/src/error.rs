//! Error types for prism-export.

use thiserror::Error;

/// Result type for prism-export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while exporting a scene.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No writer registered for the requested format.
    #[error("no writer for format: {0}")]
    NoWriter(String),

    /// The scene has no triangles the format could hold.
    #[error("scene contains no exportable geometry")]
    NoGeometry,

    /// The writer failed to serialize the scene.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
