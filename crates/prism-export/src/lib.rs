//! prism-export: turning a live Prism scene into files.
//!
//! Export works on a detached copy produced by [`bake`], so writers never
//! observe or mutate the scene being viewed. Supported formats:
//!
//! - GLB and glTF 2.0 (PBR materials, embedded textures)
//! - Wavefront OBJ (geometry only)
//! - STL, binary or ASCII
//!
//! [`compute_stats`] summarizes a scene, and [`conversion`] carries the
//! metadata exchanged with the CAD conversion service.

pub mod bake;
pub mod conversion;
pub mod error;
pub mod gltf;
pub mod obj;
pub mod positioning;
pub mod stats;
pub mod stl;
pub mod writer;

pub use bake::{bake, BakeMode};
pub use conversion::{
    begin_conversion, is_conversion_in_progress, ConversionGuard, ConversionOptions,
    ConversionResult,
};
pub use error::{ExportError, Result};
pub use gltf::GltfWriter;
pub use obj::ObjWriter;
pub use positioning::apply_positioning;
pub use stats::{compute_stats, ModelStats, StatsBounds};
pub use stl::StlWriter;
pub use writer::{
    export, ExportFormat, ExportOptions, ExportOutput, FormatRegistry, FormatWriter, WriteOptions,
};
