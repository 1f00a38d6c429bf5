//! Error types for prism-paint.

use thiserror::Error;

/// Result type for prism-paint operations.
pub type Result<T> = std::result::Result<T, PaintError>;

/// Errors raised while validating or rasterizing paint descriptions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaintError {
    /// A gradient needs at least one color stop.
    #[error("gradient has no color stops")]
    EmptyStops,

    /// Stop positions must never decrease.
    #[error("color stop {index} is positioned before the previous stop")]
    NonMonotonicStops {
        /// Index of the offending stop.
        index: usize,
    },

    /// Stop positions must lie in [0, 1].
    #[error("color stop {index} has position {position} outside [0, 1]")]
    StopOutOfRange {
        /// Index of the offending stop.
        index: usize,
        /// The rejected position.
        position: f32,
    },

    /// A shape parameter is NaN or infinite.
    #[error("invalid gradient parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Texture size must be positive and at most [`crate::gradient::MAX_TEXTURE_SIZE`].
    #[error("texture size must be between 1 and 16384")]
    InvalidSize,

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// PNG encoding failed.
    #[error("png encoding failed: {0}")]
    Png(String),
}
