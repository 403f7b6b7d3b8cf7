use std::fmt;

use kurbo::{Point, Vec2};

use crate::surface::{Pen, Surface};

/// One call received by a surface. Dots and lines carry the point they
/// resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    SetColor { r: i32, g: i32, b: i32, a: f64 },
    SetHsl { h: i32, s: i32, l: i32, a: f64 },
    SetCursor(Point),
    Translate(Vec2),
    Rotate(f64),
    Scale(Vec2),
    ClearTransforms,
    PopTransform,
    Dot(Point),
    Line { from: Point, to: Point },
}

impl fmt::Display for SurfaceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetColor { r, g, b, a } => write!(f, "set_color {r} {g} {b} {a}"),
            Self::SetHsl { h, s, l, a }   => write!(f, "set_hsl {h} {s}% {l}% {a}"),
            Self::SetCursor(p)            => write!(f, "set_cursor {} {}", p.x, p.y),
            Self::Translate(v)            => write!(f, "translate {} {}", v.x, v.y),
            Self::Rotate(theta)           => write!(f, "rotate {theta}"),
            Self::Scale(v)                => write!(f, "scale {} {}", v.x, v.y),
            Self::ClearTransforms         => f.write_str("clear_transforms"),
            Self::PopTransform            => f.write_str("pop_transform"),
            Self::Dot(p)                  => write!(f, "dot {} {}", p.x, p.y),
            Self::Line { from, to }       => write!(f, "line {} {} -> {} {}", from.x, from.y, to.x, to.y),
        }
    }
}

/// Surface that draws nothing and remembers everything.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pen: Pen,
    calls: Vec<SurfaceCall>,
}

impl Recorder {
    pub fn new() -> Self { Self::default() }

    pub fn calls(&self) -> &[SurfaceCall] { &self.calls }

    pub fn into_calls(self) -> Vec<SurfaceCall> { self.calls }

    pub fn pen(&self) -> &Pen { &self.pen }
}

impl Surface for Recorder {
    fn set_color(&mut self, r: i32, g: i32, b: i32, a: f64) {
        self.calls.push(SurfaceCall::SetColor { r, g, b, a });
    }

    fn set_hsl(&mut self, h: i32, s: i32, l: i32, a: f64) {
        self.calls.push(SurfaceCall::SetHsl { h, s, l, a });
    }

    fn set_cursor(&mut self, x: f64, y: f64) {
        self.pen.set_cursor(x, y);
        self.calls.push(SurfaceCall::SetCursor(Point::new(x, y)));
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.pen.translate(dx, dy);
        self.calls.push(SurfaceCall::Translate(Vec2::new(dx, dy)));
    }

    fn rotate(&mut self, theta: f64) {
        self.pen.rotate(theta);
        self.calls.push(SurfaceCall::Rotate(theta));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.pen.scale(sx, sy);
        self.calls.push(SurfaceCall::Scale(Vec2::new(sx, sy)));
    }

    fn clear_transforms(&mut self) {
        self.pen.clear_transforms();
        self.calls.push(SurfaceCall::ClearTransforms);
    }

    fn pop_transform(&mut self) {
        self.pen.pop_transform();
        self.calls.push(SurfaceCall::PopTransform);
    }

    fn draw_dot(&mut self) {
        let p = self.pen.dot();
        self.calls.push(SurfaceCall::Dot(p));
    }

    fn draw_line(&mut self) {
        let (from, to) = self.pen.line();
        self.calls.push(SurfaceCall::Line { from, to });
    }
}
