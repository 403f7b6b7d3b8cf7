use kurbo::{Affine, Point, Vec2};

/// One entry of the transform stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(Vec2),
    /// Radians.
    Rotate(f64),
    Scale(Vec2),
}

impl Transform {
    pub fn affine(self) -> Affine {
        match self {
            Self::Translate(v) => Affine::translate(v),
            Self::Rotate(theta) => Affine::rotate(theta),
            Self::Scale(v) => Affine::scale_non_uniform(v.x, v.y),
        }
    }

    /// Fold `next` into `self` when both are the same kind. Translations and
    /// rotations add up, scales multiply.
    fn merge(&mut self, next: Transform) -> bool {
        match (self, next) {
            (Self::Translate(a), Self::Translate(b)) => *a += b,
            (Self::Rotate(a), Self::Rotate(b)) => *a += b,
            (Self::Scale(a), Self::Scale(b)) => {
                a.x *= b.x;
                a.y *= b.y;
            }
            _ => return false,
        }
        true
    }
}

/// Ordered transforms, oldest first. Consecutive transforms of one kind share
/// a single entry, so `pop` removes every merged relative move at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformStack {
    entries: Vec<Transform>,
}

impl TransformStack {
    pub fn push(&mut self, t: Transform) {
        if let Some(top) = self.entries.last_mut() {
            if top.merge(t) {
                return;
            }
        }
        self.entries.push(t);
    }

    pub fn pop(&mut self) -> Option<Transform> { self.entries.pop() }

    pub fn clear(&mut self) { self.entries.clear(); }

    pub fn entries(&self) -> &[Transform] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The origin carried through every transform in stack order.
    pub fn origin(&self) -> Point {
        self.entries.iter().fold(Point::ORIGIN, |p, t| t.affine() * p)
    }
}

// ─── Pen ─────────────────────────────────────────────────────────────────────

/// Cursor, transform stack and last drawn point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pen {
    cursor: Point,
    transforms: TransformStack,
    last_point: Point,
}

impl Pen {
    pub fn new() -> Self { Self::default() }

    pub fn set_cursor(&mut self, x: f64, y: f64) { self.cursor = Point::new(x, y); }

    pub fn translate(&mut self, dx: f64, dy: f64) { self.transforms.push(Transform::Translate(Vec2::new(dx, dy))); }

    pub fn rotate(&mut self, theta: f64) { self.transforms.push(Transform::Rotate(theta)); }

    pub fn scale(&mut self, sx: f64, sy: f64) { self.transforms.push(Transform::Scale(Vec2::new(sx, sy))); }

    pub fn clear_transforms(&mut self) { self.transforms.clear(); }

    pub fn pop_transform(&mut self) { self.transforms.pop(); }

    pub fn cursor(&self) -> Point { self.cursor }

    pub fn transforms(&self) -> &TransformStack { &self.transforms }

    pub fn last_point(&self) -> Point { self.last_point }

    /// Transformed origin plus the cursor.
    pub fn resolve(&self) -> Point { self.transforms.origin() + self.cursor.to_vec2() }

    /// Resolve the point for a dot and make it the start of the next line.
    pub fn dot(&mut self) -> Point {
        self.last_point = self.resolve();
        self.last_point
    }

    /// Segment from the last point to the resolved cursor.
    pub fn line(&mut self) -> (Point, Point) {
        let from = self.last_point;
        self.last_point = self.resolve();
        (from, self.last_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool { (a - b).hypot() < 1e-9 }

    #[test]
    fn consecutive_translates_merge() {
        let mut pen = Pen::new();
        pen.translate(2.0, 3.0);
        pen.translate(4.0, -1.0);
        assert_eq!(pen.transforms().len(), 1);
        pen.set_cursor(1.0, 1.0);
        assert_eq!(pen.resolve(), Point::new(7.0, 3.0));
    }

    #[test]
    fn pop_removes_merged_entry() {
        let mut pen = Pen::new();
        pen.scale(2.0, 2.0);
        pen.translate(1.0, 0.0);
        pen.translate(1.0, 0.0);
        pen.pop_transform();
        assert_eq!(pen.transforms().entries(), &[Transform::Scale(Vec2::new(2.0, 2.0))]);
    }

    #[test]
    fn scales_multiply_and_rotations_add() {
        let mut stack = TransformStack::default();
        stack.push(Transform::Scale(Vec2::new(2.0, 3.0)));
        stack.push(Transform::Scale(Vec2::new(0.5, 2.0)));
        stack.push(Transform::Rotate(0.25));
        stack.push(Transform::Rotate(0.5));
        assert_eq!(stack.entries(), &[Transform::Scale(Vec2::new(1.0, 6.0)), Transform::Rotate(0.75)]);
    }

    #[test]
    fn transforms_apply_oldest_first() {
        let mut pen = Pen::new();
        pen.translate(10.0, 0.0);
        pen.rotate(std::f64::consts::FRAC_PI_2);
        assert!(close(pen.resolve(), Point::new(0.0, 10.0)));
        pen.clear_transforms();
        assert_eq!(pen.resolve(), Point::ORIGIN);
    }

    #[test]
    fn line_starts_at_last_point() {
        let mut pen = Pen::new();
        pen.set_cursor(3.0, 4.0);
        assert_eq!(pen.dot(), Point::new(3.0, 4.0));
        pen.set_cursor(5.0, 6.0);
        assert_eq!(pen.line(), (Point::new(3.0, 4.0), Point::new(5.0, 6.0)));
        assert_eq!(pen.last_point(), Point::new(5.0, 6.0));
    }
}
