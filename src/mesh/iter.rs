//! Topology iterators over the half-edge mesh.
//!
//! Orbits around a vertex enumerate *incoming* half-edges (half-edges ending
//! at the vertex), one per incident undirected edge, in counter-clockwise
//! order. Face cycles follow `next` (counter-clockwise for interior faces) or
//! `prev`. All iterators require a well-formed mesh: every link valid, holes
//! and the exterior represented by boundary faces rather than missing twins.

use std::collections::VecDeque;

use super::halfedge::PlanarMesh;
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};

impl<I: MeshIndex> PlanarMesh<I> {
    /// Iterate over the half-edges ending at a vertex, counter-clockwise.
    pub fn vertex_edges(&self, v: VertexId<I>) -> VertexEdgeIter<'_, I> {
        VertexEdgeIter::new(self, v)
    }

    /// Iterate over the vertices adjacent to a vertex, counter-clockwise.
    pub fn adjacent_vertices(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_edges(v).map(|he| self.origin(he))
    }

    /// Iterate over the interior faces around a vertex, counter-clockwise.
    /// Boundary faces touching the vertex are skipped.
    pub fn surrounding_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_edges(v)
            .map(|he| self.face_of(he))
            .filter(|&f| !self.face(f).is_boundary())
    }

    /// Iterate over the half-edges of a face, following `next`.
    pub fn face_edges(&self, f: FaceId<I>) -> FaceEdgeIter<'_, I> {
        FaceEdgeIter::new(self, f, true)
    }

    /// Iterate over the half-edges of a face in reverse, following `prev`.
    pub fn face_edges_rev(&self, f: FaceId<I>) -> FaceEdgeIter<'_, I> {
        FaceEdgeIter::new(self, f, false)
    }

    /// Iterate over the vertices of a face.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_edges(f).map(|he| self.end(he))
    }

    /// Iterate over the faces sharing an edge with a face, boundary faces
    /// included.
    pub fn neighbor_faces(&self, f: FaceId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.face_edges(f).map(|he| self.face_of(self.twin(he)))
    }

    /// Compute the valence (number of incident edges) of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_edges(v).count()
    }

    /// Check if a vertex lies on the rim of a hole or of the exterior.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        self.vertex_edges(v)
            .any(|he| self.is_boundary_edge(he))
    }

    /// Traverse interior faces breadth-first from `seed`, visiting only
    /// faces accepted by the predicate. Boundary faces stop the traversal;
    /// the region explored is the connected patch of accepted interior faces
    /// around the seed.
    pub fn face_graph<P>(&self, seed: FaceId<I>, accept: P) -> FaceGraphIter<'_, I, P>
    where
        P: FnMut(FaceId<I>) -> bool,
    {
        FaceGraphIter::new(self, seed, accept)
    }
}

/// Iterator over half-edges ending at a vertex.
pub struct VertexEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a PlanarMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexEdgeIter<'a, I> {
    fn new(mesh: &'a PlanarMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // If he ends at v, twin(he) starts at v, and the half-edge before
        // twin(he) in its face ends at v again. This steps one face
        // counter-clockwise around v.
        self.current = self.mesh.prev(self.mesh.twin(self.current));

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face, in either direction.
pub struct FaceEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a PlanarMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    forward: bool,
    done: bool,
}

impl<'a, I: MeshIndex> FaceEdgeIter<'a, I> {
    fn new(mesh: &'a PlanarMesh<I>, f: FaceId<I>, forward: bool) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            forward,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = if self.forward {
            self.mesh.next(self.current)
        } else {
            self.mesh.prev(self.current)
        };

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Breadth-first traversal over a connected patch of interior faces.
pub struct FaceGraphIter<'a, I: MeshIndex, P> {
    mesh: &'a PlanarMesh<I>,
    queue: VecDeque<FaceId<I>>,
    visited: Vec<bool>,
    accept: P,
}

impl<'a, I: MeshIndex, P> FaceGraphIter<'a, I, P>
where
    P: FnMut(FaceId<I>) -> bool,
{
    fn new(mesh: &'a PlanarMesh<I>, seed: FaceId<I>, mut accept: P) -> Self {
        let mut visited = vec![false; mesh.faces.len()];
        let mut queue = VecDeque::new();

        if seed.is_valid() && mesh.face(seed).is_alive() && !mesh.face(seed).is_boundary() {
            visited[seed.index()] = true;
            if accept(seed) {
                queue.push_back(seed);
            }
        }

        Self {
            mesh,
            queue,
            visited,
            accept,
        }
    }
}

impl<'a, I: MeshIndex, P> Iterator for FaceGraphIter<'a, I, P>
where
    P: FnMut(FaceId<I>) -> bool,
{
    type Item = FaceId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let face = self.queue.pop_front()?;

        for neighbor in self.mesh.neighbor_faces(face) {
            if self.visited[neighbor.index()] {
                continue;
            }
            self.visited[neighbor.index()] = true;
            if !self.mesh.face(neighbor).is_boundary() && (self.accept)(neighbor) {
                self.queue.push_back(neighbor);
            }
        }

        Some(face)
    }
}
