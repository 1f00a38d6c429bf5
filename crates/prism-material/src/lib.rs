//! prism-material: material bookkeeping for the Prism model viewer.
//!
//! - [`MaterialRegistry`] discovers materials on a scene, upgrades legacy
//!   shading models to PBR and keeps an original snapshot per material.
//! - [`MaterialEditor`] applies solid colors, gradients, textures and opacity
//!   to live materials.
//! - [`BlinkHighlight`] flashes a material's emissive color on selection.
//!
//! All of it runs against the [`prism_scene::SceneGraph`] capability trait.

pub mod edit;
pub mod error;
pub mod highlight;
pub mod registry;

pub use edit::{EditReport, MaterialEditor, SolidColor, Target};
pub use error::{MaterialError, Result};
pub use highlight::{default_pattern, BlinkHighlight, BlinkStep};
pub use registry::{MaterialEntry, MaterialRegistry, OriginalSnapshot, FALLBACK_COLOR};
