//! Half-edge mesh data structure for planar triangulations.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for 2D triangle meshes. The structure enables O(1) adjacency queries and is
//! the foundation of the Delaunay triangulator and the mesh generator.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions
//! - Each half-edge knows its **twin** (opposite half-edge), **next** and
//!   **prev** (neighbors around the face), the vertex it **ends** at, and its
//!   incident **face**
//! - Each vertex stores one incoming half-edge (a half-edge ending at it)
//! - Each face stores one half-edge on its boundary
//!
//! Half-edges identify their *destination* vertex rather than their origin;
//! the origin is reached through the twin. Every link of a well-formed mesh is
//! valid: there are no open twins. Holes and the unbounded exterior are
//! modeled as faces of kind [`FaceKind::Boundary`], so walking `next` on a
//! boundary face traces the rim of the hole.
//!
//! # Storage
//!
//! Vertices, half-edges and faces live in arenas indexed by the typed ids of
//! [`super::index`]. Destroying an element marks it dead and recycles the slot
//! through a free list; ids of dead elements must not be dereferenced. Counts
//! reported by the mesh are live counts.

use nalgebra::{Point2, Vector2};

use crate::geom::{self, Rect};

use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

/// Classification of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    /// A triangle of the mesh proper.
    Interior,
    /// A hole or the unbounded exterior.
    Boundary,
}

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 2D position of this vertex.
    pub position: Point2<f64>,

    /// One half-edge ending at this vertex.
    pub halfedge: HalfEdgeId<I>,

    /// The copy of this vertex on the next-finer point-location level.
    /// Invalid everywhere except in the coarse levels of a
    /// point-location hierarchy.
    pub down: VertexId<I>,

    pub(crate) alive: bool,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new vertex at the given position.
    pub fn new(position: Point2<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
            down: VertexId::invalid(),
            alive: true,
        }
    }

    /// Create a new vertex from coordinates.
    pub fn from_coords(x: f64, y: f64) -> Self {
        Self::new(Point2::new(x, y))
    }

    /// Check if this vertex is live.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// A half-edge in the mesh.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge points to.
    pub end: VertexId<I>,

    /// The opposite half-edge (pointing in the reverse direction).
    pub twin: HalfEdgeId<I>,

    /// The next half-edge around the face (counter-clockwise for interior
    /// faces).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face.
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    pub face: FaceId<I>,

    pub(crate) alive: bool,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new half-edge ending at the given vertex, with all links
    /// unset.
    pub fn new(end: VertexId<I>) -> Self {
        Self {
            end,
            twin: HalfEdgeId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            alive: true,
        }
    }

    /// Check if this half-edge is live.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId<I>,

    /// Whether this face is part of the mesh or marks a hole.
    pub kind: FaceKind,

    pub(crate) alive: bool,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face of the given kind with no half-edge yet.
    pub fn new(kind: FaceKind) -> Self {
        Self {
            halfedge: HalfEdgeId::invalid(),
            kind,
            alive: true,
        }
    }

    /// Check if this face is live.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Check if this face marks a hole or the exterior.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.kind == FaceKind::Boundary
    }
}

/// A half-edge mesh for planar triangulations.
///
/// Stores vertices, half-edges, and faces with full connectivity information
/// in index arenas. Elements are created and destroyed individually; destroyed
/// slots are recycled. The mesh itself enforces no geometric properties, only
/// referential consistency — the triangulator layered on top keeps the
/// geometry meaningful.
#[derive(Debug, Clone)]
pub struct PlanarMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,

    free_vertices: Vec<VertexId<I>>,
    free_halfedges: Vec<HalfEdgeId<I>>,
    free_faces: Vec<FaceId<I>>,

    live_vertices: usize,
    live_halfedges: usize,
    live_faces: usize,
}

impl<I: MeshIndex> Default for PlanarMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PlanarMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
            free_vertices: Vec::new(),
            free_halfedges: Vec::new(),
            free_faces: Vec::new(),
            live_vertices: 0,
            live_halfedges: 0,
            live_faces: 0,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Each triangle has 3 half-edges; interior edges are shared, so a
        // planar triangulation has roughly 3 half-edges per face.
        let num_halfedges = num_faces * 3 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
            free_vertices: Vec::new(),
            free_halfedges: Vec::new(),
            free_faces: Vec::new(),
            live_vertices: 0,
            live_halfedges: 0,
            live_faces: 0,
        }
    }

    // ==================== Accessors ====================

    /// Get the number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.live_vertices
    }

    /// Get the number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.live_halfedges
    }

    /// Get the number of live faces, boundary faces included.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.live_faces
    }

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by ID.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    /// Get a mutable half-edge by ID.
    #[inline]
    pub fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    /// Get a mutable face by ID.
    #[inline]
    pub fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> Point2<f64> {
        self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point2<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).twin
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the vertex a half-edge points to.
    #[inline]
    pub fn end(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).end
    }

    /// Get the vertex a half-edge starts from.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.end(self.twin(he))
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Get the representative half-edge of a face.
    #[inline]
    pub fn face_edge(&self, f: FaceId<I>) -> HalfEdgeId<I> {
        self.face(f).halfedge
    }

    /// Get the representative incoming half-edge of a vertex.
    #[inline]
    pub fn vertex_edge(&self, v: VertexId<I>) -> HalfEdgeId<I> {
        self.vertex(v).halfedge
    }

    /// Check if a face marks a hole or the exterior.
    #[inline]
    pub fn is_boundary_face(&self, f: FaceId<I>) -> bool {
        self.face(f).is_boundary()
    }

    /// Check if an edge (represented by one of its half-edges) borders a hole
    /// or the exterior.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_face(self.face_of(he)) || self.is_boundary_face(self.face_of(self.twin(he)))
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.alive)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live vertices with their IDs.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &Vertex<I>)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.alive)
            .map(|(i, v)| (VertexId::new(i), v))
    }

    /// Iterate over all live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| he.alive)
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over all live half-edges with their IDs.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfEdgeId<I>, &HalfEdge<I>)> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| he.alive)
            .map(|(i, he)| (HalfEdgeId::new(i), he))
    }

    /// Iterate over all live face IDs, boundary faces included.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over all live faces with their IDs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &Face<I>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive)
            .map(|(i, f)| (FaceId::new(i), f))
    }

    /// Iterate over the IDs of live interior faces.
    pub fn interior_face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces()
            .filter(|(_, f)| f.kind == FaceKind::Interior)
            .map(|(id, _)| id)
    }

    /// Get the three vertices of a triangular face, in counter-clockwise
    /// order for interior faces.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face_edge(f);
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.end(he0), self.end(he1), self.end(he2)]
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point2<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [self.position(v0), self.position(v1), self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Compute the signed area of a face; positive for counter-clockwise
    /// triangles.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * geom::signed_area2(p0, p1, p2)
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point2<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        geom::centroid(p0, p1, p2)
    }

    /// Compute the shape quality of a face, 0 (degenerate) to 1
    /// (equilateral).
    pub fn face_quality(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        geom::triangle_quality(p0, p1, p2)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm()
    }

    /// Compute the edge vector (from origin to destination).
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector2<f64> {
        self.position(self.end(he)) - self.position(self.origin(he))
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, he: HalfEdgeId<I>) -> Point2<f64> {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.end(he));
        Point2::from((p0.coords + p1.coords) * 0.5)
    }

    /// Compute the bounding rectangle of all live vertices.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut iter = self.vertices().map(|(_, v)| v.position);
        let first = iter.next()?;

        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Rect::new(min, max))
    }

    /// Compute the Euler characteristic V − E + F over live elements.
    ///
    /// A well-formed triangulation with its exterior boundary face counts as
    /// a topological sphere and yields 2.
    pub fn euler_characteristic(&self) -> isize {
        self.live_vertices as isize - (self.live_halfedges / 2) as isize + self.live_faces as isize
    }

    // ==================== Construction ====================

    /// Add a new vertex and return its ID. Recycles a dead slot if one is
    /// available.
    pub fn create_vertex(&mut self, position: Point2<f64>) -> VertexId<I> {
        self.live_vertices += 1;
        if let Some(id) = self.free_vertices.pop() {
            self.vertices[id.index()] = Vertex::new(position);
            id
        } else {
            let id = VertexId::new(self.vertices.len());
            self.vertices.push(Vertex::new(position));
            id
        }
    }

    /// Add a new half-edge ending at `end` and return its ID. All links
    /// start out invalid and must be wired by the caller.
    pub fn create_halfedge(&mut self, end: VertexId<I>) -> HalfEdgeId<I> {
        self.live_halfedges += 1;
        if let Some(id) = self.free_halfedges.pop() {
            self.halfedges[id.index()] = HalfEdge::new(end);
            id
        } else {
            let id = HalfEdgeId::new(self.halfedges.len());
            self.halfedges.push(HalfEdge::new(end));
            id
        }
    }

    /// Add a new face of the given kind and return its ID.
    pub fn create_face(&mut self, kind: FaceKind) -> FaceId<I> {
        self.live_faces += 1;
        if let Some(id) = self.free_faces.pop() {
            self.faces[id.index()] = Face::new(kind);
            id
        } else {
            let id = FaceId::new(self.faces.len());
            self.faces.push(Face::new(kind));
            id
        }
    }

    /// Mark a vertex dead and recycle its slot. The caller must first rewire
    /// everything that referenced it.
    pub fn destroy_vertex(&mut self, v: VertexId<I>) {
        let vertex = &mut self.vertices[v.index()];
        debug_assert!(vertex.alive, "double destroy of {:?}", v);
        vertex.alive = false;
        vertex.halfedge = HalfEdgeId::invalid();
        vertex.down = VertexId::invalid();
        self.free_vertices.push(v);
        self.live_vertices -= 1;
    }

    /// Mark a half-edge dead and recycle its slot. The caller must first
    /// rewire everything that referenced it.
    pub fn destroy_halfedge(&mut self, he: HalfEdgeId<I>) {
        let edge = &mut self.halfedges[he.index()];
        debug_assert!(edge.alive, "double destroy of {:?}", he);
        edge.alive = false;
        edge.end = VertexId::invalid();
        edge.twin = HalfEdgeId::invalid();
        edge.next = HalfEdgeId::invalid();
        edge.prev = HalfEdgeId::invalid();
        edge.face = FaceId::invalid();
        self.free_halfedges.push(he);
        self.live_halfedges -= 1;
    }

    /// Mark a face dead and recycle its slot. The caller must first rewire
    /// everything that referenced it.
    pub fn destroy_face(&mut self, f: FaceId<I>) {
        let face = &mut self.faces[f.index()];
        debug_assert!(face.alive, "double destroy of {:?}", f);
        face.alive = false;
        face.halfedge = HalfEdgeId::invalid();
        self.free_faces.push(f);
        self.live_faces -= 1;
    }

    // ==================== Link Surgery ====================

    /// Link `he` and `n` as consecutive half-edges: sets `next` of `he` and
    /// `prev` of `n` together so the two pointers never disagree.
    #[inline]
    pub fn set_next(&mut self, he: HalfEdgeId<I>, n: HalfEdgeId<I>) {
        self.halfedge_mut(he).next = n;
        self.halfedge_mut(n).prev = he;
    }

    /// Link two half-edges as twins of each other, both directions at once.
    #[inline]
    pub fn set_twin(&mut self, he: HalfEdgeId<I>, t: HalfEdgeId<I>) {
        self.halfedge_mut(he).twin = t;
        self.halfedge_mut(t).twin = he;
    }

    /// Set the face of a half-edge.
    #[inline]
    pub fn set_face(&mut self, he: HalfEdgeId<I>, f: FaceId<I>) {
        self.halfedge_mut(he).face = f;
    }

    /// Set the end vertex of a half-edge.
    #[inline]
    pub fn set_end(&mut self, he: HalfEdgeId<I>, v: VertexId<I>) {
        self.halfedge_mut(he).end = v;
    }

    /// Set the representative half-edge of a face.
    #[inline]
    pub fn set_face_edge(&mut self, f: FaceId<I>, he: HalfEdgeId<I>) {
        self.face_mut(f).halfedge = he;
    }

    /// Set the representative incoming half-edge of a vertex. The half-edge
    /// must end at the vertex.
    #[inline]
    pub fn set_vertex_edge(&mut self, v: VertexId<I>, he: HalfEdgeId<I>) {
        debug_assert!(self.end(he) == v, "{:?} does not end at {:?}", he, v);
        self.vertex_mut(v).halfedge = he;
    }

    /// Set the coarser-level copy of a vertex.
    #[inline]
    pub fn set_down(&mut self, v: VertexId<I>, down: VertexId<I>) {
        self.vertex_mut(v).down = down;
    }

    /// Flip the edge shared by two interior triangles.
    ///
    /// The edge `he`/`twin(he)` separating triangles (u0, u1, a) and
    /// (u1, u0, b) is replaced by the opposite diagonal a–b. Pure
    /// connectivity surgery; the caller decides whether the flip is
    /// geometrically admissible. No elements are created or destroyed and
    /// both face ids survive with new vertex sets.
    pub fn flip_edge(&mut self, he: HalfEdgeId<I>) {
        let e = he;
        let t = self.twin(e);
        let f1 = self.face_of(e);
        let f2 = self.face_of(t);
        debug_assert!(
            !self.face(f1).is_boundary() && !self.face(f2).is_boundary(),
            "flip across a boundary face"
        );

        let a = self.next(e);
        let b = self.prev(e);
        let c = self.next(t);
        let d = self.prev(t);

        let end_e = self.end(e);
        let end_t = self.end(t);
        let apex1 = self.end(a);
        let apex2 = self.end(c);

        // Rotate the diagonal onto the apexes.
        self.set_end(e, apex1);
        self.set_end(t, apex2);

        // f1 keeps e and picks up c; f2 keeps t and picks up a.
        self.set_next(e, b);
        self.set_next(b, c);
        self.set_next(c, e);
        self.set_face(c, f1);
        self.set_face_edge(f1, e);

        self.set_next(t, d);
        self.set_next(d, a);
        self.set_next(a, t);
        self.set_face(a, f2);
        self.set_face_edge(f2, t);

        // The old endpoints may have used e or t as their incoming edge.
        if self.vertex(end_e).halfedge == e {
            self.set_vertex_edge(end_e, d);
        }
        if self.vertex(end_t).halfedge == t {
            self.set_vertex_edge(end_t, b);
        }
    }

    // ==================== Validation ====================

    /// Check if the mesh is valid (all connectivity is consistent).
    ///
    /// Verifies twin involution, mutual next/prev links, closed face cycles
    /// with interior faces being triangles, and that every representative
    /// points at a live element of the right owner.
    pub fn is_valid(&self) -> bool {
        // Check vertices.
        for (vid, v) in self.vertices() {
            if !v.halfedge.is_valid() || !self.halfedge(v.halfedge).alive {
                return false;
            }
            if self.end(v.halfedge) != vid {
                return false;
            }
        }

        // Check half-edges.
        for (heid, he) in self.halfedges() {
            if !he.twin.is_valid() || !he.next.is_valid() || !he.prev.is_valid() {
                return false;
            }
            if !he.end.is_valid() || !he.face.is_valid() {
                return false;
            }
            if !self.vertex(he.end).alive || !self.face(he.face).alive {
                return false;
            }
            if !self.halfedge(he.twin).alive || self.twin(he.twin) != heid {
                return false;
            }
            if he.twin == heid {
                return false;
            }
            if !self.halfedge(he.next).alive || self.prev(he.next) != heid {
                return false;
            }
            if !self.halfedge(he.prev).alive || self.next(he.prev) != heid {
                return false;
            }
            if self.face_of(he.next) != he.face {
                return false;
            }
        }

        // Check faces: representative edges close into cycles, and interior
        // cycles are triangles.
        for (fid, f) in self.faces() {
            if !f.halfedge.is_valid() || !self.halfedge(f.halfedge).alive {
                return false;
            }
            if self.face_of(f.halfedge) != fid {
                return false;
            }

            let mut steps = 0usize;
            let mut he = f.halfedge;
            loop {
                he = self.next(he);
                steps += 1;
                if he == f.halfedge {
                    break;
                }
                if steps > self.live_halfedges {
                    return false;
                }
            }
            if f.kind == FaceKind::Interior && steps != 3 {
                return false;
            }
        }

        true
    }
}
