use std::str::FromStr;

use crate::CanvasError;

/// Straight (non-premultiplied) RGBA with a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `0.0..=1.0`
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0.0 };

    /// Channels outside `0..=255` clamp, as does alpha outside `0..=1`.
    /// A NaN alpha counts as fully transparent.
    pub fn rgba(r: i32, g: i32, b: i32, a: f64) -> Self {
        Self { r: channel(r), g: channel(g), b: channel(b), a: unit(a) }
    }

    /// `h` in degrees (wrapping), `s` and `l` in percent.
    pub fn hsla(h: i32, s: i32, l: i32, a: f64) -> Self {
        let h = (h.rem_euclid(360)) as f64 / 360.0;
        let s = s.clamp(0, 100) as f64 / 100.0;
        let l = l.clamp(0, 100) as f64 / 100.0;

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let to_byte = |t: f64| (hue_to_rgb(p, q, t) * 255.0).round() as u8;

        Self {
            r: to_byte(h + 1.0 / 3.0),
            g: to_byte(h),
            b: to_byte(h - 1.0 / 3.0),
            a: unit(a),
        }
    }

    pub fn to_bytes(self) -> [u8; 4] { [self.r, self.g, self.b, (self.a * 255.0).round() as u8] }

    /// Source-over compositing of `self` onto `dst`.
    pub fn over(self, dst: [u8; 4]) -> [u8; 4] {
        let sa = self.a;
        let da = dst[3] as f64 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return [0, 0, 0, 0];
        }
        let mix = |s: u8, d: u8| {
            let v = (s as f64 * sa + d as f64 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        [mix(self.r, dst[0]), mix(self.g, dst[1]), mix(self.b, dst[2]), (out_a * 255.0).round() as u8]
    }
}

impl Default for Color {
    fn default() -> Self { Self::BLACK }
}

/// `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
impl FromStr for Color {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let invalid = || CanvasError::InvalidColor(s.to_string());
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { byte(6)? as f64 / 255.0 } else { 1.0 };
        Ok(Self { r: byte(0)?, g: byte(2)?, b: byte(4)?, a })
    }
}

fn channel(v: i32) -> u8 { v.clamp(0, 255) as u8 }

fn unit(a: f64) -> f64 { if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) } }

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
