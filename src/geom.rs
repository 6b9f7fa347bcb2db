//! Planar geometric predicates and primitives.
//!
//! Every predicate threads an explicit [`Tolerance`] rather than consulting a
//! module-wide constant, so the same epsilon is guaranteed to be used by point
//! location, insertion and edge legalization — mixing thresholds between the
//! in-circle test and the split/coincidence tests is how incremental Delaunay
//! implementations end up in infinite flip loops. The predicates are plain
//! `f64` determinant evaluations; this crate deliberately does not use exact
//! or adaptive-precision arithmetic.

use nalgebra::{Point2, Vector2};

/// Result of the orientation test for an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Counter-clockwise turn (positive signed area).
    Ccw,
    /// Clockwise turn (negative signed area).
    Cw,
    /// No turn within tolerance.
    Collinear,
}

/// Shared numeric tolerance for all geometric predicates.
///
/// The single `eps` value is compared against Euclidean distances (point
/// coincidence, point-on-segment) and against the raw determinants of the
/// orientation and in-circle tests. Determinants scale with the square and
/// fourth power of coordinate magnitudes, so the default assumes coordinates
/// of roughly unit order, which the mesh generator's bounding rectangles
/// satisfy in practice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// The epsilon threshold. See [`Tolerance::DEFAULT_EPS`].
    pub eps: f64,
}

impl Tolerance {
    /// Default epsilon, `1e-9`.
    ///
    /// Small enough that distinct generator points (spaced by fractions of
    /// `h0`) are never merged, large enough to absorb the rounding noise of
    /// the determinant evaluations on unit-order coordinates.
    pub const DEFAULT_EPS: f64 = 1e-9;

    /// A tolerance with a caller-chosen epsilon.
    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    /// Orientation of the ordered triple `(a, b, c)`.
    pub fn orientation(&self, a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Orientation {
        let det = signed_area2(a, b, c);
        if det > self.eps {
            Orientation::Ccw
        } else if det < -self.eps {
            Orientation::Cw
        } else {
            Orientation::Collinear
        }
    }

    /// Whether `p` lies strictly inside the circumcircle of the
    /// counter-clockwise triangle `(a, b, c)`.
    ///
    /// Lifted 3×3 determinant with `p` translated to the origin; positive
    /// beyond `eps` means strictly inside. Cocircular configurations report
    /// `false`, which keeps legalization from flipping back and forth.
    pub fn in_circle(
        &self,
        a: Point2<f64>,
        b: Point2<f64>,
        c: Point2<f64>,
        p: Point2<f64>,
    ) -> bool {
        let adx = a.x - p.x;
        let ady = a.y - p.y;
        let bdx = b.x - p.x;
        let bdy = b.y - p.y;
        let cdx = c.x - p.x;
        let cdy = c.y - p.y;

        let ab_det = adx * bdy - bdx * ady;
        let bc_det = bdx * cdy - cdx * bdy;
        let ca_det = cdx * ady - adx * cdy;

        let a_lift = adx * adx + ady * ady;
        let b_lift = bdx * bdx + bdy * bdy;
        let c_lift = cdx * cdx + cdy * cdy;

        a_lift * bc_det + b_lift * ca_det + c_lift * ab_det > self.eps
    }

    /// Whether two points coincide within tolerance.
    #[inline]
    pub fn points_coincide(&self, a: Point2<f64>, b: Point2<f64>) -> bool {
        (a - b).norm_squared() <= self.eps * self.eps
    }

    /// Whether `p` lies on the segment `a..b` within tolerance.
    pub fn on_segment(&self, p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> bool {
        let ab = b - a;
        let len2 = ab.norm_squared();
        if len2 <= self.eps * self.eps {
            return self.points_coincide(p, a);
        }
        // Clamp the projection parameter so endpoints count as "on".
        let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
        let closest = a + ab * t;
        self.points_coincide(p, closest)
    }

    /// Whether `p` lies inside or on the counter-clockwise triangle
    /// `(a, b, c)`.
    pub fn point_in_triangle(
        &self,
        p: Point2<f64>,
        a: Point2<f64>,
        b: Point2<f64>,
        c: Point2<f64>,
    ) -> bool {
        self.orientation(a, b, p) != Orientation::Cw
            && self.orientation(b, c, p) != Orientation::Cw
            && self.orientation(c, a, p) != Orientation::Cw
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            eps: Self::DEFAULT_EPS,
        }
    }
}

/// Twice the signed area of the triangle `(a, b, c)`; positive for a
/// counter-clockwise triple.
#[inline]
pub fn signed_area2(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Shape quality of the triangle `(a, b, c)`.
///
/// `q = (b + c − a)(c + a − b)(a + b − c) / (a·b·c)` over the edge lengths:
/// 0 for a degenerate triangle, 1 for an equilateral one. Equivalently twice
/// the ratio of in-radius to circum-radius.
pub fn triangle_quality(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    let la = (b - c).norm();
    let lb = (c - a).norm();
    let lc = (a - b).norm();
    let denom = la * lb * lc;
    if denom == 0.0 {
        return 0.0;
    }
    let q = (lb + lc - la) * (lc + la - lb) * (la + lb - lc) / denom;
    q.clamp(0.0, 1.0)
}

/// Centroid of the triangle `(a, b, c)`.
#[inline]
pub fn centroid(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Point2<f64> {
    Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
}

/// An axis-aligned rectangle, the bounding region of a triangulation or of a
/// meshing domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Lower-left corner.
    pub min: Point2<f64>,
    /// Upper-right corner.
    pub max: Point2<f64>,
}

impl Rect {
    /// A rectangle from its lower-left and upper-right corners.
    pub fn new(min: Point2<f64>, max: Point2<f64>) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y, "inverted rect corners");
        Self { min, max }
    }

    /// A rectangle from raw corner coordinates.
    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(
            Point2::new(x0.min(x1), y0.min(y1)),
            Point2::new(x0.max(x1), y0.max(y1)),
        )
    }

    /// Width along x.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along y.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center point.
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Length of the diagonal.
    pub fn diagonal(&self) -> f64 {
        Vector2::new(self.width(), self.height()).norm()
    }

    /// Whether the rectangle contains `p` (boundary inclusive).
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// The four corners in counter-clockwise order from the lower-left.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_signs() {
        let tol = Tolerance::default();
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);

        assert_eq!(
            tol.orientation(a, b, Point2::new(0.0, 1.0)),
            Orientation::Ccw
        );
        assert_eq!(
            tol.orientation(a, b, Point2::new(0.0, -1.0)),
            Orientation::Cw
        );
        assert_eq!(
            tol.orientation(a, b, Point2::new(2.0, 0.0)),
            Orientation::Collinear
        );
    }

    #[test]
    fn test_in_circle_unit_triangle() {
        let tol = Tolerance::default();
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);

        // Circumcircle has center (0.5, 0.5), radius sqrt(0.5).
        assert!(tol.in_circle(a, b, c, Point2::new(0.5, 0.5)));
        assert!(!tol.in_circle(a, b, c, Point2::new(2.0, 2.0)));
        // Cocircular: (1, 1) lies exactly on the circle, not strictly inside.
        assert!(!tol.in_circle(a, b, c, Point2::new(1.0, 1.0)));
    }

    #[test]
    fn test_coincidence_and_segments() {
        let tol = Tolerance::default();
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);

        assert!(tol.points_coincide(a, Point2::new(1e-12, -1e-12)));
        assert!(!tol.points_coincide(a, Point2::new(1e-3, 0.0)));

        assert!(tol.on_segment(Point2::new(1.0, 0.0), a, b));
        assert!(tol.on_segment(a, a, b));
        assert!(!tol.on_segment(Point2::new(1.0, 0.1), a, b));
        assert!(!tol.on_segment(Point2::new(3.0, 0.0), a, b));
    }

    #[test]
    fn test_triangle_containment() {
        let tol = Tolerance::default();
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(1.0, 2.0);

        assert!(tol.point_in_triangle(Point2::new(1.0, 0.5), a, b, c));
        assert!(tol.point_in_triangle(a, a, b, c));
        assert!(tol.point_in_triangle(Point2::new(1.0, 0.0), a, b, c));
        assert!(!tol.point_in_triangle(Point2::new(1.0, -0.1), a, b, c));
    }

    #[test]
    fn test_quality_range() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let equilateral = Point2::new(0.5, 3f64.sqrt() / 2.0);
        let q = triangle_quality(a, b, equilateral);
        assert!((q - 1.0).abs() < 1e-12);

        // Collinear triple is fully degenerate.
        assert_eq!(triangle_quality(a, b, Point2::new(2.0, 0.0)), 0.0);

        // A thin sliver scores low but positive.
        let sliver = triangle_quality(a, b, Point2::new(0.5, 0.01));
        assert!(sliver > 0.0 && sliver < 0.1);
    }

    #[test]
    fn test_rect_queries() {
        let r = Rect::from_coords(-1.0, -2.0, 3.0, 2.0);
        assert_eq!(r.width(), 4.0);
        assert_eq!(r.height(), 4.0);
        assert_eq!(r.center(), Point2::new(1.0, 0.0));
        assert!(r.contains(Point2::new(0.0, 0.0)));
        assert!(r.contains(r.min));
        assert!(!r.contains(Point2::new(3.1, 0.0)));
        assert!((r.diagonal() - 32f64.sqrt()).abs() < 1e-12);
    }
}
