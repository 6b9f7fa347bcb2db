//! Incremental Delaunay triangulation with fast point location.
//!
//! This module provides the triangulation engine the mesh generator is
//! built on:
//!
//! - **Incremental insertion** (Bowyer, 1981; Watson, 1981): each point
//!   splits the triangle or edge it lands on, followed by edge flips
//!   (Lawson, 1977) until the empty-circumcircle property holds again
//! - **Vertex removal**: the star of the vertex is excised and the hole
//!   re-triangulated by ear clipping, then legalized
//! - **Point location**: a remembering orientation walk, started from a
//!   Delaunay hierarchy (Devillers, 2002) of coarse sub-triangulations
//!
//! All points live inside a caller-supplied bounding rectangle. The
//! rectangle sits far inside a triangle spanned by three *virtual* corner
//! vertices, so every real point is interior and hull bookkeeping never
//! leaks into the update logic. Faces touching a virtual corner are
//! excluded from [`DelaunayTriangulation::interior_faces`].
//!
//! # Example
//!
//! ```
//! use tessella::delaunay::DelaunayTriangulation;
//! use tessella::geom::Rect;
//! use nalgebra::Point2;
//!
//! let bound = Rect::from_coords(0.0, 0.0, 10.0, 10.0);
//! let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(bound);
//!
//! tri.insert_all((0..10).map(|i| {
//!     let t = i as f64 / 10.0;
//!     Point2::new(10.0 * t, 5.0 + 4.0 * (t * 12.0).sin())
//! })).unwrap();
//!
//! assert!(tri.is_delaunay());
//! let f = tri.locate(Point2::new(5.0, 5.0)).unwrap();
//! assert!(f.is_valid());
//! ```

mod locate;
mod triangulation;

pub use triangulation::DelaunayTriangulation;
