//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and related types
//! for planar triangulations.
//!
//! # Overview
//!
//! The primary type is [`PlanarMesh`], which represents a 2D triangle mesh
//! using a half-edge (doubly-connected edge list) data structure. This
//! representation provides O(1) adjacency queries, making it efficient for
//! the incremental Delaunay algorithms built on top of it.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`]
//! trait), allowing you to choose `u16`, `u32`, or `u64` based on mesh size.
//!
//! # Construction
//!
//! Meshes are usually produced by the triangulator rather than built by hand:
//!
//! ```
//! use tessella::delaunay::DelaunayTriangulation;
//! use tessella::geom::Rect;
//! use nalgebra::Point2;
//!
//! let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(Rect::from_coords(0.0, 0.0, 1.0, 1.0));
//! tri.insert(Point2::new(0.25, 0.25)).unwrap();
//! tri.insert(Point2::new(0.75, 0.5)).unwrap();
//! // Two inserted points plus the three virtual corners of the outer triangle.
//! assert_eq!(tri.mesh().num_vertices(), 2 + 3);
//! ```
//!
//! Hand construction through [`PlanarMesh::create_vertex`] and the link
//! surgery methods is possible and is how the triangulator itself works.

mod halfedge;
mod index;
mod iter;

pub use halfedge::{Face, FaceKind, HalfEdge, PlanarMesh, Vertex};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use iter::{FaceEdgeIter, FaceGraphIter, VertexEdgeIter};
