//! Material and texture types.

use prism_paint::{Color, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::TextureId;

/// Shading model of a material.
///
/// `Standard` is the PBR-capable model; the others are legacy models that the
/// material registry upgrades on discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Standard,
    Basic,
    Lambert,
    Phong,
}

impl MaterialKind {
    pub fn is_pbr(self) -> bool {
        matches!(self, MaterialKind::Standard)
    }
}

/// Surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Shading model.
    pub kind: MaterialKind,
    /// Base color; `None` when the material never had one.
    pub color: Option<Color>,
    /// Base color texture.
    pub map: Option<TextureId>,
    /// Metallic factor (0.0 = dielectric, 1.0 = metallic).
    pub metalness: f32,
    /// Roughness factor (0.0 = smooth, 1.0 = rough).
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    /// Emissive color.
    pub emissive: Color,
    pub emissive_intensity: f32,
    /// Multiply the base color by the vertex color attribute.
    pub vertex_colors: bool,
    pub double_sided: bool,
    /// Bumped on every mutation; renderers re-upload when it changes.
    #[serde(skip)]
    pub version: u64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: MaterialKind::Standard,
            color: Some(Color::WHITE),
            map: None,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            vertex_colors: false,
            double_sided: false,
            version: 0,
        }
    }
}

impl Material {
    /// Create a new default material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a simple colored material.
    pub fn colored(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color: Some(color),
            ..Default::default()
        }
    }

    /// Create a legacy (non-PBR) material.
    pub fn legacy(name: impl Into<String>, kind: MaterialKind, color: Option<Color>) -> Self {
        Self {
            name: name.into(),
            kind,
            color,
            ..Default::default()
        }
    }

    /// Set opacity clamped to [0, 1] and derive transparency from it.
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
    }

    /// Signal that the material changed.
    pub fn mark_dirty(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

/// Texture data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    /// Texture name.
    #[serde(default)]
    pub name: String,
    /// Image source.
    pub image: TextureImage,
    /// Sampler settings.
    #[serde(default)]
    pub sampler: Sampler,
    /// Released GPU-side; the image data is kept so the texture can be revived.
    #[serde(default)]
    pub disposed: bool,
    #[serde(skip)]
    pub version: u64,
}

impl Texture {
    /// Create a texture from a raster image with default sampling.
    pub fn from_image(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image: TextureImage::Raster(image),
            sampler: Sampler::default(),
            disposed: false,
            version: 0,
        }
    }

    /// Use repeat wrapping on both axes.
    pub fn with_repeat_wrap(mut self) -> Self {
        self.sampler.wrap_u = Wrap::Repeat;
        self.sampler.wrap_v = Wrap::Repeat;
        self
    }

    /// PNG bytes and MIME type for embedding.
    ///
    /// Rasters are encoded; already encoded images are passed through.
    pub fn encoded(&self) -> prism_paint::Result<(Vec<u8>, &str)> {
        match &self.image {
            TextureImage::Raster(image) => Ok((image.encode_png()?, "image/png")),
            TextureImage::Encoded { mime_type, data } => Ok((data.clone(), mime_type.as_str())),
        }
    }

    /// Mark the texture released.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.version = self.version.wrapping_add(1);
    }

    /// Revive a released texture.
    pub fn revive(&mut self) {
        if self.disposed {
            self.disposed = false;
            self.version = self.version.wrapping_add(1);
        }
    }
}

/// Image source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextureImage {
    /// Decoded RGBA pixels.
    Raster(RgbaImage),
    /// Encoded image data.
    Encoded {
        /// MIME type (e.g., "image/png").
        mime_type: String,
        /// Raw image data.
        data: Vec<u8>,
    },
}

/// Texture sampler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Sampler {
    /// Magnification filter.
    pub mag_filter: Filter,
    /// Minification filter.
    pub min_filter: Filter,
    /// U (horizontal) wrapping mode.
    pub wrap_u: Wrap,
    /// V (vertical) wrapping mode.
    pub wrap_v: Wrap,
}

/// Texture filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter {
    /// Nearest neighbor.
    Nearest,
    /// Bilinear.
    #[default]
    Linear,
}

/// Texture wrap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Wrap {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirroredRepeat,
}
