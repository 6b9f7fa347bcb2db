//! # Tessella
//!
//! A planar mesh generation library built on an incremental Delaunay
//! triangulation.
//!
//! Tessella provides a half-edge mesh data structure for planar
//! triangulations, a dynamic Delaunay triangulation with fast point
//! location, and a force-based mesh generator that turns signed distance
//! functions into high-quality unstructured triangle meshes.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **Dynamic Delaunay triangulation**: incremental insertion *and* removal,
//!   with a Delaunay hierarchy for logarithmic point location
//! - **Implicit domains**: disks, rectangles, polygons and arbitrary signed
//!   distance closures, combined with union/intersection/difference
//! - **Adaptive sizing**: meshes graded by an edge-length field
//!
//! ## Quick Start
//!
//! ```
//! use tessella::prelude::*;
//! use nalgebra::Point2;
//!
//! // Triangulate a handful of points
//! let bound = Rect::from_coords(0.0, 0.0, 1.0, 1.0);
//! let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(bound);
//! tri.insert_all([
//!     Point2::new(0.1, 0.1),
//!     Point2::new(0.9, 0.2),
//!     Point2::new(0.8, 0.9),
//!     Point2::new(0.2, 0.8),
//!     Point2::new(0.5, 0.5),
//! ]).unwrap();
//!
//! assert!(tri.is_delaunay());
//!
//! // Query the triangulation
//! let face = tri.locate(Point2::new(0.4, 0.4)).unwrap();
//! let [a, b, c] = tri.mesh().face_triangle(face);
//! println!("containing triangle: {a:?} {b:?} {c:?}");
//! ```
//!
//! ## Generating a Mesh
//!
//! ```
//! use tessella::mesher::{Disk, Mesher, MesherOptions, UniformSizing};
//! use tessella::geom::Rect;
//! use nalgebra::Point2;
//!
//! // Mesh the unit disk with edges of roughly 0.3
//! let domain = Disk::new(Point2::new(0.0, 0.0), 1.0).unwrap();
//! let bound = Rect::from_coords(-1.1, -1.1, 1.1, 1.1);
//! let options = MesherOptions::with_edge_length(0.3).with_max_iterations(50);
//!
//! let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
//! let result = mesher.generate().unwrap();
//!
//! println!(
//!     "{} triangles, mean quality {:.2}",
//!     result.quality.num_triangles, result.quality.mean_quality
//! );
//! for f in result.mesh.interior_face_ids() {
//!     let [a, b, c] = result.mesh.face_positions(f);
//!     // hand the triangle to a solver, a renderer, ...
//!     # let _ = (a, b, c);
//! }
//! ```
//!
//! ## Mesh Traversal
//!
//! The half-edge structure enables efficient traversal of mesh elements:
//!
//! ```
//! use tessella::prelude::*;
//! use nalgebra::Point2;
//!
//! # let bound = Rect::from_coords(0.0, 0.0, 1.0, 1.0);
//! # let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(bound);
//! # tri.insert_all([
//! #     Point2::new(0.2, 0.2),
//! #     Point2::new(0.8, 0.2),
//! #     Point2::new(0.5, 0.8),
//! # ]).unwrap();
//! # let mesh = tri.mesh();
//! # let v = tri.find_vertex(Point2::new(0.5, 0.8)).unwrap();
//! // Iterate over neighbors of a vertex
//! for neighbor in mesh.adjacent_vertices(v) {
//!     println!("Neighbor: {:?}", neighbor);
//! }
//!
//! // Iterate over interior faces around a vertex
//! for face in mesh.surrounding_faces(v) {
//!     println!("Adjacent face: {:?}", face);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod delaunay;
pub mod error;
pub mod geom;
pub mod mesh;
pub mod mesher;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tessella::prelude::*;
/// ```
pub mod prelude {
    pub use crate::delaunay::DelaunayTriangulation;
    pub use crate::error::{MeshError, Result};
    pub use crate::geom::{Rect, Tolerance};
    pub use crate::mesh::{
        Face, FaceId, FaceKind, HalfEdge, HalfEdgeId, MeshIndex, PlanarMesh, Vertex, VertexId,
    };
    pub use crate::mesher::{EdgeSizing, Mesher, MesherOptions, SignedDistance};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point2;

    #[test]
    fn test_square_triangulation() {
        let bound = Rect::from_coords(0.0, 0.0, 1.0, 1.0);
        let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(bound);
        tri.insert_all([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.5, 0.5),
        ])
        .unwrap();

        // Four corners and the center: four triangles, fully Delaunay.
        assert_eq!(tri.num_points(), 5);
        assert_eq!(tri.interior_faces().count(), 4);
        assert!(tri.is_delaunay());
        assert!(tri.mesh().is_valid());

        // The mesh includes the three virtual corners.
        assert_eq!(tri.mesh().num_vertices(), 8);
        assert_eq!(tri.mesh().euler_characteristic(), 2);
    }
}
