//! Axis-aligned rectangle geometry.
//!
//! All overlap math in the crate goes through this module. Boxes arrive in
//! image pixel coordinates; a detector occasionally produces a zero-area or
//! inverted box, so every ratio guards against degenerate input and returns
//! zero overlap instead of dividing by zero.

/// An axis-aligned rectangle in integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and size.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle has strictly positive extent.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Area in pixels; 0 for degenerate rectangles.
    pub fn area(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    /// X coordinate one past the right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Y coordinate one past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Center point as floating coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Intersection area with another rectangle; 0 when disjoint or when
    /// either rectangle is degenerate.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        if !self.is_valid() || !other.is_valid() {
            log::debug!(
                "degenerate rectangle in overlap computation: {:?} / {:?}",
                self,
                other
            );
            return 0;
        }

        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0 || h <= 0 {
            return 0;
        }
        w as i64 * h as i64
    }

    /// Intersection over union, in [0, 1].
    pub fn iou(&self, other: &Rect) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union <= 0 {
            return 0.0;
        }
        inter as f64 / union as f64
    }

    /// Intersection over the *smaller* of the two areas, in [0, 1].
    ///
    /// Deliberately asymmetric: a small cue (a hand) fully inside a large
    /// context (a torso) scores 1.0 here where IoU would stay near zero.
    pub fn cover_rate(&self, other: &Rect) -> f64 {
        let min_area = self.area().min(other.area());
        if min_area <= 0 {
            return 0.0;
        }
        self.intersection_area(other) as f64 / min_area as f64
    }

    /// Minimum bounding rectangle of the two.
    ///
    /// A degenerate operand contributes nothing, so the other rectangle is
    /// returned unchanged.
    pub fn union_rect(&self, other: &Rect) -> Rect {
        if !self.is_valid() {
            return *other;
        }
        if !other.is_valid() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_area() {
        assert_eq!(Rect::new(0, 0, 10, 20).area(), 200);
        assert_eq!(Rect::new(5, 5, 0, 20).area(), 0);
        assert_eq!(Rect::new(5, 5, -10, 20).area(), 0);
    }

    #[test]
    fn test_intersection_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 10, 10);
        assert_eq!(a.intersection_area(&b), 0);
    }

    #[test]
    fn test_intersection_touching_edges() {
        // Shared edge: zero-width intersection
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert_eq!(a.intersection_area(&b), 0);
    }

    #[test]
    fn test_intersection_partial() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection_area(&b), 25);
        assert_eq!(b.intersection_area(&a), 25);
    }

    #[test]
    fn test_intersection_contained() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(10, 10, 20, 20);
        assert_eq!(outer.intersection_area(&inner), inner.area());
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 0, 10, 10);
        // inter = 50, union = 150
        assert_relative_eq!(a.iou(&b), 50.0 / 150.0, epsilon = 1e-10);

        assert_relative_eq!(a.iou(&a), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_iou_degenerate_is_zero() {
        let a = Rect::new(0, 0, 10, 10);
        let zero = Rect::new(0, 0, 0, 0);
        let inverted = Rect::new(0, 0, -5, 10);
        assert_eq!(a.iou(&zero), 0.0);
        assert_eq!(a.iou(&inverted), 0.0);
        assert_eq!(zero.iou(&zero), 0.0);
    }

    #[test]
    fn test_cover_rate_asymmetric_metric() {
        // Small box fully inside a large one: cover rate 1.0, IoU small
        let large = Rect::new(0, 0, 100, 100);
        let small = Rect::new(10, 10, 10, 10);
        assert_relative_eq!(large.cover_rate(&small), 1.0, epsilon = 1e-10);
        assert!(large.iou(&small) < 0.02);
    }

    #[test]
    fn test_cover_rate_half_overlap() {
        // Fixture from the fusion contract: intersection / min(area) = 0.5
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 0, 10, 10);
        assert_relative_eq!(a.cover_rate(&b), 0.5, epsilon = 1e-10);
        assert_relative_eq!(b.cover_rate(&a), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_cover_rate_degenerate_is_zero() {
        let a = Rect::new(0, 0, 10, 10);
        let zero = Rect::new(3, 3, 0, 0);
        assert_eq!(a.cover_rate(&zero), 0.0);
    }

    #[test]
    fn test_union_rect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 5, 10, 10);
        let u = a.union_rect(&b);
        assert_eq!(u, Rect::new(0, 0, 30, 15));
    }

    #[test]
    fn test_union_rect_with_degenerate() {
        let a = Rect::new(0, 0, 10, 10);
        let zero = Rect::default();
        assert_eq!(a.union_rect(&zero), a);
        assert_eq!(zero.union_rect(&a), a);
    }

    #[test]
    fn test_center() {
        let (cx, cy) = Rect::new(0, 0, 10, 20).center();
        assert_relative_eq!(cx, 5.0, epsilon = 1e-10);
        assert_relative_eq!(cy, 10.0, epsilon = 1e-10);
    }
}
