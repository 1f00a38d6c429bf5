//! prism-paint: colors and procedural textures for the Prism model viewer.
//!
//! - [`Color`] and [`interpolate`]: 8-bit RGB colors and RGB-space blending.
//! - [`GradientSpec`] and [`generate`]: linear, radial, angular, diamond and
//!   stripe gradients rasterized pixel by pixel.
//! - [`RgbaImage`]: the raster type produced by generators, with PNG encoding.
//!
//! # Example
//!
//! ```
//! use prism_paint::{generate, Color, GradientKind, GradientSpec};
//!
//! let spec = GradientSpec::new(GradientKind::Radial, [Color::BLACK, Color::WHITE]);
//! let image = generate(&spec, 64).unwrap();
//! assert_eq!(image.width, 64);
//! ```

pub mod color;
pub mod error;
pub mod gradient;
pub mod image;
mod png;

pub use color::{interpolate, srgb_to_linear, Color};
pub use error::{PaintError, Result};
pub use gradient::{generate, ColorStop, GradientKind, GradientSpec, MAX_TEXTURE_SIZE};
pub use image::RgbaImage;
pub use png::encode_png;
