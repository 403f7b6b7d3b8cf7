//! Raster drawing surface: dots and 1-px strokes into an RGBA buffer.

pub mod color;
mod raster;

pub use color::Color;

use std::path::Path;

use gbc_lang::{Pen, Surface};
use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::Point;

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("invalid color `{0}`, expected RRGGBB or RRGGBBAA")]
    InvalidColor(String),
    #[error("canvas must be at least 1x1, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub background: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { width: 512, height: 512, background: Color::TRANSPARENT }
    }
}

/// Concrete `Surface`. Points resolve through the shared `Pen`, then land on
/// the pixel grid by truncation; anything off the grid is dropped.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    pen: Pen,
    color: Color,
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Result<Self, CanvasError> {
        let CanvasConfig { width, height, background } = config;
        if width == 0 || height == 0 {
            return Err(CanvasError::EmptyCanvas { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, Rgba(background.to_bytes())),
            pen: Pen::new(),
            color: Color::BLACK,
        })
    }

    pub fn width(&self) -> u32 { self.pixels.width() }

    pub fn height(&self) -> u32 { self.pixels.height() }

    pub fn color(&self) -> Color { self.color }

    pub fn pen(&self) -> &Pen { &self.pen }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn image(&self) -> &RgbaImage { &self.pixels }

    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), CanvasError> {
        self.pixels.save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }

    fn plot(&mut self, x: i64, y: i64) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        let color = self.color;
        if let Some(px) = self.pixels.get_pixel_mut_checked(x, y) {
            px.0 = color.over(px.0);
        }
    }

    fn stroke(&mut self, from: Point, to: Point) {
        let bounds = raster::bounds(self.width(), self.height());
        let Some((from, to)) = raster::clip(from, to, bounds) else {
            tracing::trace!(?from, ?to, "line off canvas");
            return;
        };
        for (x, y) in raster::segment(from, to) {
            self.plot(x, y);
        }
    }
}

impl Surface for Canvas {
    fn set_color(&mut self, r: i32, g: i32, b: i32, a: f64) { self.color = Color::rgba(r, g, b, a); }

    fn set_hsl(&mut self, h: i32, s: i32, l: i32, a: f64) { self.color = Color::hsla(h, s, l, a); }

    fn set_cursor(&mut self, x: f64, y: f64) { self.pen.set_cursor(x, y); }

    fn translate(&mut self, dx: f64, dy: f64) { self.pen.translate(dx, dy); }

    fn rotate(&mut self, theta: f64) { self.pen.rotate(theta); }

    fn scale(&mut self, sx: f64, sy: f64) { self.pen.scale(sx, sy); }

    fn clear_transforms(&mut self) { self.pen.clear_transforms(); }

    fn pop_transform(&mut self) { self.pen.pop_transform(); }

    fn draw_dot(&mut self) {
        let p = self.pen.dot();
        if let Some((x, y)) = raster::cell(p) {
            self.plot(x, y);
        }
    }

    fn draw_line(&mut self) {
        let (from, to) = self.pen.line();
        self.stroke(from, to);
    }
}
