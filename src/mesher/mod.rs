//! Force-based planar mesh generation.
//!
//! This module turns an implicit domain description into a triangle mesh of
//! near-equilateral elements, in the style of DistMesh (Persson & Strang,
//! 2004):
//!
//! - **Domains** are [`SignedDistance`] functions: negative inside, zero on
//!   the boundary. Primitives ([`Disk`], [`RectDomain`], [`PolygonDomain`])
//!   combine through union, intersection and difference; closures work too
//! - **Edge lengths** follow an [`EdgeSizing`] field, relative to the base
//!   length `h0`; [`UniformSizing`] gives a uniform mesh
//! - **Relaxation**: points seed a hexagonal lattice, every Delaunay edge
//!   pushes its endpoints apart toward the desired length, escapees are
//!   projected back onto the boundary, and the points are re-triangulated
//!   each iteration until the movement stagnates
//!
//! # Example
//!
//! ```
//! use tessella::mesher::{Disk, Mesher, MesherOptions, SignedDistance, UniformSizing};
//! use tessella::geom::Rect;
//! use nalgebra::Point2;
//!
//! // A disk with an off-center hole, meshed at edge length 0.25.
//! let domain = Disk::new(Point2::new(0.0, 0.0), 1.0)
//!     .unwrap()
//!     .difference(Disk::new(Point2::new(0.4, 0.0), 0.3).unwrap());
//!
//! let options = MesherOptions::with_edge_length(0.25).with_max_iterations(60);
//! let bound = Rect::from_coords(-1.1, -1.1, 1.1, 1.1);
//! let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
//!
//! let result = mesher.generate().unwrap();
//! assert!(result.state.is_terminal());
//! assert!(result.quality.mean_quality > 0.5);
//! ```

mod distance;
mod eikmesh;
mod progress;

pub use distance::{
    Difference, Disk, EdgeSizing, Intersection, PolygonDomain, RectDomain, SignedDistance, Union,
    UniformSizing,
};
pub use eikmesh::{GeneratedMesh, Mesher, MesherOptions, MesherState, QualityReport, SeedStrategy};
pub use progress::Progress;
