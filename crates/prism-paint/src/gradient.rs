//! Procedural gradient textures.
//!
//! A [`GradientSpec`] describes one of five topologies over an ordered list of
//! color stops. [`generate`] rasterizes it into a square RGBA8 image by
//! evaluating every pixel center; no native gradient primitive is assumed, so
//! the output is identical on every platform for identical input.
//!
//! Canvas conventions: the origin is the top-left corner, y grows downward and
//! angles are measured in degrees from the +x axis towards +y.

use crate::color::{interpolate, Color};
use crate::error::{PaintError, Result};
use crate::image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Smallest value `scale`, `repeat` and `smoothness` are clamped to.
pub const MIN_PARAMETER: f32 = 1e-4;

/// Angles within this distance of a full turn wrap back to zero.
const SEAM_EPSILON: f32 = 1e-6;

/// Gradient topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    /// Stops run along a line through the canvas center.
    #[default]
    Linear,
    /// Stops run outward from a (possibly offset) center.
    Radial,
    /// Stops sweep around the center (conic).
    Angular,
    /// Stops follow the Manhattan distance from the center.
    Diamond,
    /// Hard-edged bands cycling through the stop colors.
    Stripe,
}

/// One anchor of a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: Color,
    /// Position in [0, 1]; `None` means evenly spaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f32>,
}

impl ColorStop {
    /// A stop at an explicit position.
    pub fn new(color: Color, position: f32) -> Self {
        Self {
            color,
            position: Some(position),
        }
    }

    /// A stop whose position is derived from its index.
    pub fn auto(color: Color) -> Self {
        Self {
            color,
            position: None,
        }
    }
}

/// Parametric description of a gradient texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GradientSpec {
    pub kind: GradientKind,
    pub stops: Vec<ColorStop>,
    /// Rotation in degrees.
    pub angle: f32,
    /// Radial radius / diamond extent, relative to half the canvas.
    pub scale: f32,
    /// Number of repetitions (angular, diamond, stripe).
    pub repeat: u32,
    /// Angular falloff exponent; values below 1 sharpen, above 1 soften.
    pub smoothness: f32,
    /// Radial center offset in half-canvas units.
    pub offset_x: f32,
    pub offset_y: f32,
    /// Mirror the color order without moving positions.
    pub reverse: bool,
}

impl Default for GradientSpec {
    fn default() -> Self {
        Self {
            kind: GradientKind::Linear,
            stops: Vec::new(),
            angle: 0.0,
            scale: 1.0,
            repeat: 1,
            smoothness: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            reverse: false,
        }
    }
}

impl GradientSpec {
    /// Create a spec with evenly spaced stops.
    pub fn new(kind: GradientKind, colors: impl IntoIterator<Item = Color>) -> Self {
        Self {
            kind,
            stops: colors.into_iter().map(ColorStop::auto).collect(),
            ..Default::default()
        }
    }

    /// Create a spec with explicit stops.
    pub fn with_stops(kind: GradientKind, stops: Vec<ColorStop>) -> Self {
        Self {
            kind,
            stops,
            ..Default::default()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_smoothness(mut self, smoothness: f32) -> Self {
        self.smoothness = smoothness;
        self
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Check stops and parameters without rasterizing.
    pub fn validate(&self) -> Result<()> {
        Resolved::from_spec(self).map(|_| ())
    }

    /// Evaluate the gradient at canvas point `(x, y)` of a `size`×`size` canvas.
    pub fn sample(&self, x: f32, y: f32, size: u32) -> Result<Color> {
        if size == 0 {
            return Err(PaintError::InvalidSize);
        }
        Ok(Resolved::from_spec(self)?.sample(x, y, size as f32))
    }
}

/// Largest texture edge [`generate`] accepts.
pub const MAX_TEXTURE_SIZE: u32 = 16384;

/// Rasterize `spec` into a `size`×`size` RGBA8 image.
pub fn generate(spec: &GradientSpec, size: u32) -> Result<RgbaImage> {
    if size == 0 || size > MAX_TEXTURE_SIZE {
        return Err(PaintError::InvalidSize);
    }
    let resolved = Resolved::from_spec(spec)?;
    let extent = size as f32;

    let image = match resolved.solid() {
        Some(color) => RgbaImage::filled(size, size, color),
        None => {
            let mut image = RgbaImage::new(size, size);
            for y in 0..size {
                for x in 0..size {
                    let color = resolved.sample(x as f32 + 0.5, y as f32 + 0.5, extent);
                    image.put_pixel(x, y, color);
                }
            }
            image
        }
    };

    tracing::debug!(kind = ?spec.kind, size, stops = spec.stops.len(), "rasterized gradient");
    Ok(image)
}

/// Validated spec with positions filled in and parameters clamped.
struct Resolved {
    kind: GradientKind,
    stops: Vec<(f32, Color)>,
    angle: f32,
    scale: f32,
    repeat: f32,
    smoothness: f32,
    offset_x: f32,
    offset_y: f32,
}

impl Resolved {
    fn from_spec(spec: &GradientSpec) -> Result<Self> {
        if spec.stops.is_empty() {
            return Err(PaintError::EmptyStops);
        }
        for (name, value) in [
            ("angle", spec.angle),
            ("scale", spec.scale),
            ("smoothness", spec.smoothness),
            ("offsetX", spec.offset_x),
            ("offsetY", spec.offset_y),
        ] {
            if !value.is_finite() {
                return Err(PaintError::InvalidParameter { name, value });
            }
        }

        let last = (spec.stops.len() - 1).max(1) as f32;
        let mut positions = Vec::with_capacity(spec.stops.len());
        for (index, stop) in spec.stops.iter().enumerate() {
            let position = stop.position.unwrap_or(index as f32 / last);
            if !(0.0..=1.0).contains(&position) {
                return Err(PaintError::StopOutOfRange { index, position });
            }
            if let Some(&previous) = positions.last() {
                if position < previous {
                    return Err(PaintError::NonMonotonicStops { index });
                }
            }
            positions.push(position);
        }

        let mut colors: Vec<Color> = spec.stops.iter().map(|s| s.color).collect();
        if spec.reverse {
            colors.reverse();
        }

        Ok(Self {
            kind: spec.kind,
            stops: positions.into_iter().zip(colors).collect(),
            angle: spec.angle.rem_euclid(360.0),
            scale: spec.scale.max(MIN_PARAMETER),
            repeat: (spec.repeat as f32).max(MIN_PARAMETER),
            smoothness: spec.smoothness.max(MIN_PARAMETER),
            offset_x: spec.offset_x.clamp(-1.0, 1.0),
            offset_y: spec.offset_y.clamp(-1.0, 1.0),
        })
    }

    fn solid(&self) -> Option<Color> {
        match self.stops.as_slice() {
            [(_, only)] => Some(*only),
            _ => None,
        }
    }

    fn sample(&self, x: f32, y: f32, size: f32) -> Color {
        if let Some(color) = self.solid() {
            return color;
        }
        let half = size / 2.0;
        let dx = x - half;
        let dy = y - half;
        let (sin, cos) = self.angle.to_radians().sin_cos();

        match self.kind {
            GradientKind::Linear => {
                let along = dx * cos + dy * sin;
                self.at((along / half + 1.0) / 2.0)
            }
            GradientKind::Radial => {
                let cx = self.offset_x * half;
                let cy = self.offset_y * half;
                let radius = (self.scale * half).max(MIN_PARAMETER);
                let dist = ((dx - cx).powi(2) + (dy - cy).powi(2)).sqrt();
                self.at(dist / radius)
            }
            GradientKind::Angular => {
                let t = angular_t(dy.atan2(dx), self.angle, self.repeat, self.smoothness);
                self.at(t)
            }
            GradientKind::Diamond => {
                let dist = (dx.abs() + dy.abs()) / half / self.scale;
                self.at((dist * self.repeat).rem_euclid(1.0))
            }
            GradientKind::Stripe => {
                let bands = self.repeat.round().max(1.0) * 2.0;
                let width = size / bands;
                let along = dx * cos + dy * sin + half;
                let band = (along / width).floor() as i64;
                let index = band.rem_euclid(self.stops.len() as i64) as usize;
                self.stops[index].1
            }
        }
    }

    /// Interpolate between the two stops bracketing `t`.
    fn at(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let mut prev = self.stops[0];
        if t <= prev.0 {
            return prev.1;
        }
        for &stop in &self.stops {
            if stop.0 >= t {
                if stop.0 == prev.0 {
                    return stop.1;
                }
                let local = (t - prev.0) / (stop.0 - prev.0);
                return interpolate(prev.1, stop.1, local);
            }
            prev = stop;
        }
        prev.1
    }
}

/// Stop parameter for an angular gradient at polar angle `theta` (radians).
fn angular_t(theta: f32, rotation_degrees: f32, repeat: f32, smoothness: f32) -> f32 {
    let mut turn = (theta / TAU).rem_euclid(1.0);
    if turn >= 1.0 - SEAM_EPSILON {
        turn = 0.0;
    }
    let rotated = (turn + rotation_degrees / 360.0).rem_euclid(1.0);
    let repeated = (rotated * repeat).rem_euclid(1.0);
    repeated.powf(1.0 / smoothness)
}
