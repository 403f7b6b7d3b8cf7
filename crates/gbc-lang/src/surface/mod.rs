//! The drawing-surface boundary.
//!
//! Programs never touch pixels themselves; every drawing op is forwarded to a
//! `Surface`. `Pen` carries the cursor and transform bookkeeping that every
//! concrete surface shares, `Recorder` keeps the call sequence for inspection.

pub mod recorder;
pub mod transform;

pub use recorder::{Recorder, SurfaceCall};
pub use transform::{Pen, Transform, TransformStack};

/// Receiver of drawing side effects.
///
/// Color channels arrive already truncated to integers. `draw_dot` and
/// `draw_line` operate on the surface's own resolved cursor point.
pub trait Surface {
    fn set_color(&mut self, r: i32, g: i32, b: i32, a: f64);
    /// Saturation and lightness are percentages.
    fn set_hsl(&mut self, h: i32, s: i32, l: i32, a: f64);
    fn set_cursor(&mut self, x: f64, y: f64);
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, theta: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    fn clear_transforms(&mut self);
    fn pop_transform(&mut self);
    fn draw_dot(&mut self);
    fn draw_line(&mut self);
}
