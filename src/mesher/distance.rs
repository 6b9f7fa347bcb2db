//! Signed distance functions describing meshing domains, and sizing
//! functions describing the desired edge-length field.

use nalgebra::Point2;

use crate::error::{MeshError, Result};
use crate::geom::{Rect, Tolerance};

/// A domain described by its signed distance function.
///
/// The convention is negative inside the domain, zero on its boundary and
/// positive outside. The magnitude should approximate the true distance to
/// the boundary near the zero level set; the mesh generator projects stray
/// vertices back along the numerical gradient, so a rough approximation
/// further away is fine.
///
/// Closures implement the trait directly:
///
/// ```
/// use tessella::mesher::SignedDistance;
/// use nalgebra::Point2;
///
/// // Unit disk.
/// let disk = |p: Point2<f64>| p.coords.norm() - 1.0;
/// assert!(disk.distance(Point2::new(0.0, 0.0)) < 0.0);
/// assert!(disk.distance(Point2::new(2.0, 0.0)) > 0.0);
/// ```
pub trait SignedDistance: Sync {
    /// Signed distance from `p` to the domain boundary; negative inside.
    fn distance(&self, p: Point2<f64>) -> f64;

    /// The union of this domain and `other`.
    ///
    /// Computed as the pointwise minimum, which is the exact distance
    /// outside the union and an inside-conservative approximation within.
    fn union<D: SignedDistance>(self, other: D) -> Union<Self, D>
    where
        Self: Sized,
    {
        Union { a: self, b: other }
    }

    /// The intersection of this domain and `other` (pointwise maximum).
    fn intersection<D: SignedDistance>(self, other: D) -> Intersection<Self, D>
    where
        Self: Sized,
    {
        Intersection { a: self, b: other }
    }

    /// This domain with `other` cut out of it.
    ///
    /// Computed as `max(d_self, -d_other)`; the usual way to punch holes.
    fn difference<D: SignedDistance>(self, other: D) -> Difference<Self, D>
    where
        Self: Sized,
    {
        Difference { a: self, b: other }
    }
}

impl<F> SignedDistance for F
where
    F: Fn(Point2<f64>) -> f64 + Sync,
{
    fn distance(&self, p: Point2<f64>) -> f64 {
        self(p)
    }
}

/// A circular domain.
#[derive(Debug, Clone, Copy)]
pub struct Disk {
    center: Point2<f64>,
    radius: f64,
}

impl Disk {
    /// A disk with the given center and radius.
    pub fn new(center: Point2<f64>, radius: f64) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(MeshError::invalid_param(
                "radius",
                radius,
                "must be positive and finite",
            ));
        }
        Ok(Self { center, radius })
    }

    /// A disk of the given radius centered on the origin.
    pub fn centered(radius: f64) -> Result<Self> {
        Self::new(Point2::origin(), radius)
    }
}

impl SignedDistance for Disk {
    fn distance(&self, p: Point2<f64>) -> f64 {
        (p - self.center).norm() - self.radius
    }
}

/// An axis-aligned rectangular domain.
#[derive(Debug, Clone, Copy)]
pub struct RectDomain {
    rect: Rect,
}

impl RectDomain {
    /// A rectangular domain filling `rect`.
    pub fn new(rect: Rect) -> Self {
        Self { rect }
    }
}

impl SignedDistance for RectDomain {
    fn distance(&self, p: Point2<f64>) -> f64 {
        // Exact box distance: componentwise distance to the slab, combined
        // by max inside and by the Euclidean norm outside.
        let dx = (self.rect.min.x - p.x).max(p.x - self.rect.max.x);
        let dy = (self.rect.min.y - p.y).max(p.y - self.rect.max.y);
        if dx <= 0.0 && dy <= 0.0 {
            dx.max(dy)
        } else {
            (dx.max(0.0).powi(2) + dy.max(0.0).powi(2)).sqrt()
        }
    }
}

/// A simple polygonal domain.
#[derive(Debug, Clone)]
pub struct PolygonDomain {
    vertices: Vec<Point2<f64>>,
}

impl PolygonDomain {
    /// A polygon from its boundary vertices, in order; the boundary closes
    /// itself from the last vertex back to the first. Winding direction does
    /// not matter, but the polygon must not self-intersect and must enclose
    /// some area.
    pub fn new(vertices: Vec<Point2<f64>>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(MeshError::invalid_param(
                "vertices",
                vertices.len(),
                "a polygon needs at least three vertices",
            ));
        }
        // Shoelace sum; collinear vertex chains have no interior and would
        // make the even-odd test meaningless.
        let n = vertices.len();
        let area2: f64 = (0..n)
            .map(|i| {
                let a = vertices[i];
                let b = vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        if area2.abs() <= Tolerance::DEFAULT_EPS {
            return Err(MeshError::degenerate(
                "polygon vertices are collinear and enclose no area",
            ));
        }
        Ok(Self { vertices })
    }

    /// The boundary vertices.
    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }
}

impl SignedDistance for PolygonDomain {
    fn distance(&self, p: Point2<f64>) -> f64 {
        let n = self.vertices.len();
        let mut min_d2 = f64::INFINITY;
        let mut inside = false;

        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];

            let ab = b - a;
            let ab2 = ab.norm_squared();
            let t = if ab2 > 0.0 {
                ((p - a).dot(&ab) / ab2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let closest = a + ab * t;
            min_d2 = min_d2.min((p - closest).norm_squared());

            // Even-odd ray crossing; the guard keeps horizontal edges out of
            // the division.
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }

        let d = min_d2.sqrt();
        if inside {
            -d
        } else {
            d
        }
    }
}

/// Union of two domains; see [`SignedDistance::union`].
#[derive(Debug, Clone, Copy)]
pub struct Union<A, B> {
    a: A,
    b: B,
}

impl<A: SignedDistance, B: SignedDistance> SignedDistance for Union<A, B> {
    fn distance(&self, p: Point2<f64>) -> f64 {
        self.a.distance(p).min(self.b.distance(p))
    }
}

/// Intersection of two domains; see [`SignedDistance::intersection`].
#[derive(Debug, Clone, Copy)]
pub struct Intersection<A, B> {
    a: A,
    b: B,
}

impl<A: SignedDistance, B: SignedDistance> SignedDistance for Intersection<A, B> {
    fn distance(&self, p: Point2<f64>) -> f64 {
        self.a.distance(p).max(self.b.distance(p))
    }
}

/// One domain minus another; see [`SignedDistance::difference`].
#[derive(Debug, Clone, Copy)]
pub struct Difference<A, B> {
    a: A,
    b: B,
}

impl<A: SignedDistance, B: SignedDistance> SignedDistance for Difference<A, B> {
    fn distance(&self, p: Point2<f64>) -> f64 {
        self.a.distance(p).max(-self.b.distance(p))
    }
}

/// The desired relative edge length across the domain.
///
/// Values are relative: a region where `size` returns 2.0 gets edges twice
/// as long as a region where it returns 1.0. The absolute scale comes from
/// the mesher's base edge length and a global equilibrium factor, so any
/// positive, smoothly varying function works.
///
/// Closures implement the trait directly:
///
/// ```
/// use tessella::mesher::EdgeSizing;
/// use nalgebra::Point2;
///
/// // Finer edges near the origin.
/// let graded = |p: Point2<f64>| 0.2 + p.coords.norm();
/// assert!(graded.size(Point2::new(0.0, 0.0)) < graded.size(Point2::new(1.0, 0.0)));
/// ```
pub trait EdgeSizing: Sync {
    /// Relative desired edge length around `p`.
    fn size(&self, p: Point2<f64>) -> f64;
}

impl<F> EdgeSizing for F
where
    F: Fn(Point2<f64>) -> f64 + Sync,
{
    fn size(&self, p: Point2<f64>) -> f64 {
        self(p)
    }
}

/// The constant sizing function: equally sized edges everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSizing;

impl EdgeSizing for UniformSizing {
    fn size(&self, _p: Point2<f64>) -> f64 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_disk_distances() {
        let disk = Disk::new(Point2::new(1.0, 1.0), 2.0).unwrap();
        assert_relative_eq!(disk.distance(Point2::new(1.0, 1.0)), -2.0);
        assert_relative_eq!(disk.distance(Point2::new(3.0, 1.0)), 0.0);
        assert_relative_eq!(disk.distance(Point2::new(1.0, 5.0)), 2.0);

        assert!(Disk::centered(0.0).is_err());
        assert!(Disk::centered(f64::NAN).is_err());
    }

    #[test]
    fn test_rect_distances() {
        let dom = RectDomain::new(Rect::from_coords(0.0, 0.0, 2.0, 1.0));
        // Center: half the short side from the boundary.
        assert_relative_eq!(dom.distance(Point2::new(1.0, 0.5)), -0.5);
        // On an edge.
        assert_relative_eq!(dom.distance(Point2::new(1.0, 0.0)), 0.0);
        // Straight out from an edge.
        assert_relative_eq!(dom.distance(Point2::new(1.0, -0.5)), 0.5);
        // Diagonally out from a corner.
        assert_relative_eq!(
            dom.distance(Point2::new(3.0, 2.0)),
            2.0_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_polygon_sign_and_magnitude() {
        let square = PolygonDomain::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ])
        .unwrap();

        assert_relative_eq!(square.distance(Point2::new(1.0, 1.0)), -1.0);
        assert_relative_eq!(square.distance(Point2::new(1.0, 0.25)), -0.25);
        assert_relative_eq!(square.distance(Point2::new(1.0, -0.5)), 0.5);
        assert_relative_eq!(square.distance(Point2::new(3.0, 1.0)), 1.0);

        assert!(PolygonDomain::new(vec![Point2::origin()]).is_err());
    }

    #[test]
    fn test_collinear_polygon_is_degenerate() {
        let err = PolygonDomain::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        ])
        .unwrap_err();
        assert!(matches!(err, MeshError::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_polygon_winding_does_not_matter() {
        let ccw = PolygonDomain::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap();
        let cw = PolygonDomain::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
        ])
        .unwrap();

        let q = Point2::new(0.25, 0.25);
        assert_relative_eq!(ccw.distance(q), cw.distance(q));
        assert!(ccw.distance(q) < 0.0);
    }

    #[test]
    fn test_combinators_compose() {
        let left = Disk::new(Point2::new(-0.5, 0.0), 1.0).unwrap();
        let right = Disk::new(Point2::new(0.5, 0.0), 1.0).unwrap();

        // The union contains both centers, the intersection only the lens
        // between them.
        let union = left.union(right);
        assert!(union.distance(Point2::new(-0.5, 0.0)) < 0.0);
        assert!(union.distance(Point2::new(0.5, 0.0)) < 0.0);

        let lens = left.intersection(right);
        assert!(lens.distance(Point2::new(0.0, 0.0)) < 0.0);
        assert!(lens.distance(Point2::new(-0.5, 0.0)) >= 0.0);

        // An annulus keeps the rim and loses the middle.
        let ring = Disk::centered(1.0)
            .unwrap()
            .difference(Disk::centered(0.5).unwrap());
        assert!(ring.distance(Point2::new(0.75, 0.0)) < 0.0);
        assert!(ring.distance(Point2::new(0.0, 0.0)) > 0.0);
        assert!(ring.distance(Point2::new(1.5, 0.0)) > 0.0);
    }

    #[test]
    fn test_closures_as_fields() {
        let halfplane = |p: Point2<f64>| p.y;
        assert!(halfplane.distance(Point2::new(0.0, -1.0)) < 0.0);

        let sizing = |p: Point2<f64>| 1.0 + p.x.abs();
        assert_relative_eq!(sizing.size(Point2::new(2.0, 0.0)), 3.0);
        assert_relative_eq!(UniformSizing.size(Point2::new(9.0, 9.0)), 1.0);
    }
}
