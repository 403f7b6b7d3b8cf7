//! Grid geometry: point to cell, segment clipping and Bresenham stepping.

use kurbo::{Point, Rect};

/// Area whose points truncate onto the pixel grid.
pub(crate) fn bounds(width: u32, height: u32) -> Rect {
    Rect::new(0.0, 0.0, width as f64, height as f64)
}

/// Cell holding `p`, truncating toward zero. `None` for non-finite points.
pub(crate) fn cell(p: Point) -> Option<(i64, i64)> {
    if !p.is_finite() {
        return None;
    }
    Some((p.x as i64, p.y as i64))
}

/// Liang-Barsky clip of `a..b` against `r`.
pub(crate) fn clip(a: Point, b: Point, r: Rect) -> Option<(Point, Point)> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-d.x, a.x - r.x0),
        (d.x, r.x1 - a.x),
        (-d.y, a.y - r.y0),
        (d.y, r.y1 - a.y),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

/// Cells visited from `a` to `b`, both ends included.
pub(crate) fn segment(a: Point, b: Point) -> impl Iterator<Item = (i64, i64)> {
    let (x0, y0) = cell(a).unwrap_or((0, 0));
    let (x1, y1) = cell(b).unwrap_or((x0, y0));
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut state = Some((x0, y0, dx + dy));
    std::iter::from_fn(move || {
        let (x, y, err) = state?;
        state = if x == x1 && y == y1 {
            None
        } else {
            let (mut nx, mut ny, mut nerr) = (x, y, err);
            if 2 * err >= dy {
                nerr += dy;
                nx += sx;
            }
            if 2 * err <= dx {
                nerr += dx;
                ny += sy;
            }
            Some((nx, ny, nerr))
        };
        Some((x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_segment() {
        let cells: Vec<_> = segment(Point::new(0.0, 0.0), Point::new(3.0, 3.0)).collect();
        assert_eq!(cells, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn degenerate_segment_is_one_cell() {
        let cells: Vec<_> = segment(Point::new(2.5, 2.5), Point::new(2.9, 2.1)).collect();
        assert_eq!(cells, vec![(2, 2)]);
    }

    #[test]
    fn reversed_segment() {
        let cells: Vec<_> = segment(Point::new(3.0, 0.0), Point::new(0.0, 1.0)).collect();
        assert_eq!(cells.first(), Some(&(3, 0)));
        assert_eq!(cells.last(), Some(&(0, 1)));
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn clip_outside_is_none() {
        let r = bounds(4, 4);
        assert_eq!(clip(Point::new(-5.0, -5.0), Point::new(-1.0, 10.0), r), None);
        assert_eq!(clip(Point::new(f64::INFINITY, 0.0), Point::new(1.0, 1.0), r), None);
    }

    #[test]
    fn clip_trims_to_bounds() {
        let (a, b) = clip(Point::new(-10.0, 2.0), Point::new(10.0, 2.0), bounds(4, 4)).unwrap();
        assert_eq!(a, Point::new(0.0, 2.0));
        assert_eq!(b, Point::new(4.0, 2.0));
    }
}
