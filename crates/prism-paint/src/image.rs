//! A minimal square-or-rectangular RGBA8 raster.

use crate::color::Color;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Row-major RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Create a transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Create an image filled with one opaque color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let rgba = color.to_rgba8();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Read a pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Read a pixel's RGB channels as a [`Color`].
    pub fn color_at(&self, x: u32, y: u32) -> Color {
        let [r, g, b, _] = self.pixel(x, y);
        Color::rgb(r, g, b)
    }

    /// Write an opaque pixel. Panics when out of bounds.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&color.to_rgba8());
    }

    /// Encode as a PNG file.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        crate::png::encode_png(&self.pixels, self.width, self.height)
    }
}
