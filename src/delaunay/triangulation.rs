//! Incremental Delaunay triangulation over a bounding rectangle.

use std::cell::Cell;

use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{MeshError, Result};
use crate::geom::{Rect, Tolerance};
use crate::mesh::{FaceId, FaceKind, HalfEdgeId, MeshIndex, PlanarMesh, VertexId};

use super::locate::{LocateHierarchy, Location};

/// Default seed for the promotion coin-flips of the point-location
/// hierarchy. Fixed so that repeated runs build identical structures.
const DEFAULT_RNG_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// What an insertion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertOutcome<I: MeshIndex = u32> {
    /// A new vertex was created at the requested position.
    Created(VertexId<I>),
    /// The position coincided with an existing vertex; nothing changed.
    Existing(VertexId<I>),
}

impl<I: MeshIndex> InsertOutcome<I> {
    pub(crate) fn vertex(self) -> VertexId<I> {
        match self {
            InsertOutcome::Created(v) | InsertOutcome::Existing(v) => v,
        }
    }
}

/// The triangulation engine: a planar mesh plus the surgery that keeps it
/// Delaunay under insertion and removal.
///
/// The whole bounding rectangle sits far inside one big triangle whose three
/// corners are *virtual* vertices. Every real point is therefore interior,
/// which spares all hull special cases: stars of real vertices are always
/// closed, and the single boundary face only ever touches virtual corners.
/// Faces incident to a virtual corner are excluded from
/// [`TriCore::interior_faces`].
///
/// This type is crate-internal; each level of the point-location hierarchy
/// is its own `TriCore`, and [`DelaunayTriangulation`] bundles the bottom
/// level with the hierarchy.
#[derive(Debug, Clone)]
pub(crate) struct TriCore<I: MeshIndex = u32> {
    pub(crate) mesh: PlanarMesh<I>,
    pub(crate) bound: Rect,
    pub(crate) tol: Tolerance,
    pub(crate) virtual_vertices: [VertexId<I>; 3],
    /// Face of the most recent walk; the default start for the next one.
    pub(crate) hint: Cell<FaceId<I>>,
}

impl<I: MeshIndex> TriCore<I> {
    /// Create a core covering `bound`, consisting of the outer triangle and
    /// its exterior face.
    pub(crate) fn new(bound: Rect, tol: Tolerance) -> Self {
        let mut mesh = PlanarMesh::new();

        // The outer triangle encloses a disk of radius r around the bound's
        // center; r is eight diagonals, so every circumcircle of well-shaped
        // interior triangles stays clear of the virtual corners. The extra
        // unit keeps a degenerate (zero-size) bound workable.
        let r = 8.0 * bound.diagonal() + 1.0;
        let c = bound.center();
        let va = mesh.create_vertex(Point2::new(c.x, c.y + 2.0 * r));
        let vb = mesh.create_vertex(Point2::new(c.x - 2.0 * r, c.y - r));
        let vc = mesh.create_vertex(Point2::new(c.x + 2.0 * r, c.y - r));

        let eab = mesh.create_halfedge(vb);
        let ebc = mesh.create_halfedge(vc);
        let eca = mesh.create_halfedge(va);
        let eba = mesh.create_halfedge(va);
        let ecb = mesh.create_halfedge(vb);
        let eac = mesh.create_halfedge(vc);

        let inner = mesh.create_face(FaceKind::Interior);
        let outer = mesh.create_face(FaceKind::Boundary);

        mesh.set_next(eab, ebc);
        mesh.set_next(ebc, eca);
        mesh.set_next(eca, eab);
        mesh.set_next(eba, eac);
        mesh.set_next(eac, ecb);
        mesh.set_next(ecb, eba);

        mesh.set_twin(eab, eba);
        mesh.set_twin(ebc, ecb);
        mesh.set_twin(eca, eac);

        for he in [eab, ebc, eca] {
            mesh.set_face(he, inner);
        }
        for he in [eba, eac, ecb] {
            mesh.set_face(he, outer);
        }
        mesh.set_face_edge(inner, eab);
        mesh.set_face_edge(outer, eba);

        mesh.set_vertex_edge(va, eba);
        mesh.set_vertex_edge(vb, ecb);
        mesh.set_vertex_edge(vc, eac);

        Self {
            mesh,
            bound,
            tol,
            virtual_vertices: [va, vb, vc],
            hint: Cell::new(inner),
        }
    }

    /// Check if a vertex is one of the three outer-triangle corners.
    #[inline]
    pub(crate) fn is_virtual(&self, v: VertexId<I>) -> bool {
        self.virtual_vertices.contains(&v)
    }

    /// Check if a face touches a virtual corner.
    pub(crate) fn face_is_virtual(&self, f: FaceId<I>) -> bool {
        self.mesh
            .face_triangle(f)
            .iter()
            .any(|&v| self.is_virtual(v))
    }

    /// Iterate over the triangles of the triangulation proper: interior
    /// faces whose vertices are all real points.
    pub(crate) fn interior_faces(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.mesh
            .interior_face_ids()
            .filter(move |&f| !self.face_is_virtual(f))
    }

    /// Iterate over real vertices with their positions.
    pub(crate) fn real_vertices(&self) -> impl Iterator<Item = (VertexId<I>, Point2<f64>)> + '_ {
        self.mesh
            .vertices()
            .filter(move |(v, _)| !self.is_virtual(*v))
            .map(|(v, vert)| (v, vert.position))
    }

    /// Number of real points.
    pub(crate) fn num_points(&self) -> usize {
        self.mesh.num_vertices() - 3
    }

    /// Find the vertex coinciding with `p` within tolerance, if any.
    pub(crate) fn find_vertex(&self, p: Point2<f64>) -> Option<VertexId<I>> {
        if !self.bound.contains(p) {
            return None;
        }
        let f = self.walk(p, self.hint.get());
        self.hint.set(f);
        match self.classify(f, p) {
            Location::OnVertex(v) => Some(v),
            _ => None,
        }
    }

    // ==================== Insertion ====================

    /// Insert `p`, walking from this core's own hint.
    pub(crate) fn insert(&mut self, p: Point2<f64>) -> Result<InsertOutcome<I>> {
        let start = self.hint.get();
        self.insert_with_start(p, start)
    }

    /// Insert `p`, walking from `start` (which may be invalid or stale).
    ///
    /// A position coinciding with an existing vertex is reported as
    /// [`InsertOutcome::Existing`] and leaves the triangulation untouched. A
    /// position on an edge splits the edge and its two triangles; anywhere
    /// else splits the containing triangle into three. Either split is
    /// followed by legalization, so the triangulation is Delaunay again when
    /// this returns.
    pub(crate) fn insert_with_start(
        &mut self,
        p: Point2<f64>,
        start: FaceId<I>,
    ) -> Result<InsertOutcome<I>> {
        if !self.bound.contains(p) {
            return Err(MeshError::PointOutsideBounds { x: p.x, y: p.y });
        }

        let f = self.walk(p, start);
        let outcome = match self.classify(f, p) {
            Location::OnVertex(v) => InsertOutcome::Existing(v),
            Location::OnEdge(e) => InsertOutcome::Created(self.split_edge(e, p)),
            Location::InFace(f) => InsertOutcome::Created(self.split_face(f, p)),
        };

        let near = match outcome {
            InsertOutcome::Created(v) => self.mesh.face_of(self.mesh.vertex_edge(v)),
            InsertOutcome::Existing(_) => f,
        };
        self.hint.set(near);
        Ok(outcome)
    }

    /// Split a triangle into three around a new vertex at `p`.
    fn split_face(&mut self, f: FaceId<I>, p: Point2<f64>) -> VertexId<I> {
        let e0 = self.mesh.face_edge(f);
        let e1 = self.mesh.next(e0);
        let e2 = self.mesh.next(e1);
        let a = self.mesh.end(e2);
        let b = self.mesh.end(e0);
        let c = self.mesh.end(e1);

        let w = self.mesh.create_vertex(p);
        let sbw = self.mesh.create_halfedge(w);
        let swb = self.mesh.create_halfedge(b);
        let scw = self.mesh.create_halfedge(w);
        let swc = self.mesh.create_halfedge(c);
        let saw = self.mesh.create_halfedge(w);
        let swa = self.mesh.create_halfedge(a);
        self.mesh.set_twin(sbw, swb);
        self.mesh.set_twin(scw, swc);
        self.mesh.set_twin(saw, swa);

        // (a, b, w) reuses f; (b, c, w) and (c, a, w) are fresh.
        self.mesh.set_next(e0, sbw);
        self.mesh.set_next(sbw, swa);
        self.mesh.set_next(swa, e0);
        for he in [sbw, swa] {
            self.mesh.set_face(he, f);
        }
        self.mesh.set_face_edge(f, e0);

        let g1 = self.mesh.create_face(FaceKind::Interior);
        self.mesh.set_next(e1, scw);
        self.mesh.set_next(scw, swb);
        self.mesh.set_next(swb, e1);
        for he in [e1, scw, swb] {
            self.mesh.set_face(he, g1);
        }
        self.mesh.set_face_edge(g1, e1);

        let g2 = self.mesh.create_face(FaceKind::Interior);
        self.mesh.set_next(e2, saw);
        self.mesh.set_next(saw, swc);
        self.mesh.set_next(swc, e2);
        for he in [e2, saw, swc] {
            self.mesh.set_face(he, g2);
        }
        self.mesh.set_face_edge(g2, e2);

        self.mesh.set_vertex_edge(w, sbw);

        self.legalize(vec![e0, e1, e2]);
        w
    }

    /// Split an edge at `p`, dividing both adjacent triangles in two.
    fn split_edge(&mut self, e: HalfEdgeId<I>, p: Point2<f64>) -> VertexId<I> {
        let t = self.mesh.twin(e);
        let f1 = self.mesh.face_of(e);
        let f2 = self.mesh.face_of(t);
        debug_assert!(
            !self.mesh.face(f1).is_boundary() && !self.mesh.face(f2).is_boundary(),
            "point on an outer-triangle edge"
        );

        let n1 = self.mesh.next(e);
        let p1 = self.mesh.prev(e);
        let n2 = self.mesh.next(t);
        let p2 = self.mesh.prev(t);
        let b = self.mesh.end(e);
        let c1 = self.mesh.end(n1);
        let c2 = self.mesh.end(n2);

        let w = self.mesh.create_vertex(p);

        // e keeps its origin and now ends at w; its twin t implicitly starts
        // at w and still ends where it did.
        self.mesh.set_end(e, w);

        let e2 = self.mesh.create_halfedge(b);
        let t2 = self.mesh.create_halfedge(w);
        self.mesh.set_twin(e2, t2);
        let s1 = self.mesh.create_halfedge(c1);
        let s1t = self.mesh.create_halfedge(w);
        self.mesh.set_twin(s1, s1t);
        let s2 = self.mesh.create_halfedge(w);
        let s2t = self.mesh.create_halfedge(c2);
        self.mesh.set_twin(s2, s2t);

        // f1 becomes (a, w, c1); a fresh face takes (w, b, c1).
        self.mesh.set_next(e, s1);
        self.mesh.set_next(s1, p1);
        self.mesh.set_next(p1, e);
        for he in [e, s1, p1] {
            self.mesh.set_face(he, f1);
        }
        self.mesh.set_face_edge(f1, e);

        let g1 = self.mesh.create_face(FaceKind::Interior);
        self.mesh.set_next(e2, n1);
        self.mesh.set_next(n1, s1t);
        self.mesh.set_next(s1t, e2);
        for he in [e2, n1, s1t] {
            self.mesh.set_face(he, g1);
        }
        self.mesh.set_face_edge(g1, e2);

        // f2 becomes (w, a, c2); a fresh face takes (c2, b, w).
        self.mesh.set_next(t, n2);
        self.mesh.set_next(n2, s2);
        self.mesh.set_next(s2, t);
        for he in [t, n2, s2] {
            self.mesh.set_face(he, f2);
        }
        self.mesh.set_face_edge(f2, t);

        let g2 = self.mesh.create_face(FaceKind::Interior);
        self.mesh.set_next(p2, t2);
        self.mesh.set_next(t2, s2t);
        self.mesh.set_next(s2t, p2);
        for he in [p2, t2, s2t] {
            self.mesh.set_face(he, g2);
        }
        self.mesh.set_face_edge(g2, t2);

        self.mesh.set_vertex_edge(w, t2);
        if self.mesh.vertex(b).halfedge == e {
            self.mesh.set_vertex_edge(b, e2);
        }

        self.legalize(vec![n1, p1, n2, p2]);
        w
    }

    // ==================== Legalization ====================

    /// Whether the edge fails the local Delaunay criterion.
    ///
    /// Edges bordering the exterior face are always legal. A virtual apex
    /// counts as lying outside every circumcircle, matching a corner pushed
    /// to infinity; apart from that the test is the plain lifted in-circle
    /// predicate, evaluated from both sides so that quads with one virtual
    /// apex are still judged by their real apex.
    pub(crate) fn edge_violates_delaunay(&self, e: HalfEdgeId<I>) -> bool {
        let t = self.mesh.twin(e);
        if self.mesh.face(self.mesh.face_of(e)).is_boundary()
            || self.mesh.face(self.mesh.face_of(t)).is_boundary()
        {
            return false;
        }

        let a = self.mesh.origin(e);
        let b = self.mesh.end(e);
        let c = self.mesh.end(self.mesh.next(e));
        let d = self.mesh.end(self.mesh.next(t));
        let pa = self.mesh.position(a);
        let pb = self.mesh.position(b);
        let pc = self.mesh.position(c);
        let pd = self.mesh.position(d);

        (!self.is_virtual(d) && self.tol.in_circle(pa, pb, pc, pd))
            || (!self.is_virtual(c) && self.tol.in_circle(pb, pa, pd, pc))
    }

    /// Flip edges until every candidate (and everything disturbed by a
    /// flip) satisfies the local Delaunay criterion.
    ///
    /// Lawson's scheme with an explicit worklist; each flip re-queues the
    /// four outer edges of the affected quad. Terminates because a flip
    /// needs a strict in-circle violation.
    fn legalize(&mut self, mut stack: Vec<HalfEdgeId<I>>) {
        while let Some(e) = stack.pop() {
            if !self.edge_violates_delaunay(e) {
                continue;
            }
            let t = self.mesh.twin(e);
            let fixups = [
                self.mesh.next(e),
                self.mesh.prev(e),
                self.mesh.next(t),
                self.mesh.prev(t),
            ];
            self.mesh.flip_edge(e);
            stack.extend_from_slice(&fixups);
        }
    }

    /// Check every interior edge against the local Delaunay criterion.
    pub(crate) fn is_delaunay(&self) -> bool {
        self.mesh.halfedge_ids().all(|e| {
            // One check per undirected edge.
            self.mesh.twin(e).index() < e.index() || !self.edge_violates_delaunay(e)
        })
    }

    // ==================== Removal ====================

    /// Remove the vertex coinciding with `p`.
    pub(crate) fn remove(&mut self, p: Point2<f64>) -> Result<()> {
        let v = self
            .find_vertex(p)
            .ok_or(MeshError::VertexNotFound { x: p.x, y: p.y })?;
        if self.is_virtual(v) {
            return Err(MeshError::VertexNotFound { x: p.x, y: p.y });
        }
        self.remove_vertex(v);
        Ok(())
    }

    /// Excise a vertex's star and re-triangulate the hole.
    fn remove_vertex(&mut self, v: VertexId<I>) {
        // Link of v, counter-clockwise. Real vertices are never on the outer
        // hull, so the star is always a closed polygon.
        let spokes: Vec<HalfEdgeId<I>> = self.mesh.vertex_edges(v).collect();
        let k = spokes.len();
        debug_assert!(k >= 3);

        let mut ring = Vec::with_capacity(k);
        let mut incoming = Vec::with_capacity(k);
        for &e in &spokes {
            ring.push(self.mesh.origin(e));
            // Third edge of e's face: the link edge ending at origin(e).
            incoming.push(self.mesh.next(self.mesh.next(e)));
        }

        // Link edges re-indexed so edges[i] runs ring[i] -> ring[i+1], and
        // ring vertices re-anchored before their old spokes die.
        let edges: Vec<HalfEdgeId<I>> = (0..k).map(|i| incoming[(i + 1) % k]).collect();
        for i in 0..k {
            self.mesh.set_vertex_edge(ring[i], incoming[i]);
        }

        for &e in &spokes {
            let t = self.mesh.twin(e);
            let f = self.mesh.face_of(e);
            self.mesh.destroy_face(f);
            self.mesh.destroy_halfedge(e);
            self.mesh.destroy_halfedge(t);
        }
        self.mesh.destroy_vertex(v);

        self.fill_hole(ring, edges);
    }

    /// Triangulate the polygonal hole left by a star excision and legalize
    /// the result. `edges[i]` is the surviving half-edge from `ring[i]` to
    /// `ring[i + 1]`; every one of them is rewired into a new face here.
    fn fill_hole(&mut self, mut ring: Vec<VertexId<I>>, mut edges: Vec<HalfEdgeId<I>>) {
        let mut stack = edges.clone();

        while ring.len() > 3 {
            let i = self.find_ear(&ring);
            let n = ring.len();
            let i1 = (i + 1) % n;
            let i2 = (i + 2) % n;

            let diag = self.mesh.create_halfedge(ring[i2]);
            let diag_t = self.mesh.create_halfedge(ring[i]);
            self.mesh.set_twin(diag, diag_t);

            let g = self.mesh.create_face(FaceKind::Interior);
            self.mesh.set_next(edges[i], edges[i1]);
            self.mesh.set_next(edges[i1], diag_t);
            self.mesh.set_next(diag_t, edges[i]);
            for he in [edges[i], edges[i1], diag_t] {
                self.mesh.set_face(he, g);
            }
            self.mesh.set_face_edge(g, edges[i]);
            stack.push(diag);

            // The clipped corner leaves; the diagonal takes over the slot of
            // the edge that started at ring[i].
            let slot = if i1 < i { i - 1 } else { i };
            ring.remove(i1);
            edges.remove(i1);
            edges[slot] = diag;
        }

        let g = self.mesh.create_face(FaceKind::Interior);
        self.mesh.set_next(edges[0], edges[1]);
        self.mesh.set_next(edges[1], edges[2]);
        self.mesh.set_next(edges[2], edges[0]);
        for he in [edges[0], edges[1], edges[2]] {
            self.mesh.set_face(he, g);
        }
        self.mesh.set_face_edge(g, edges[0]);

        self.hint.set(g);
        self.legalize(stack);
    }

    /// Pick an ear of the hole polygon: a strictly convex corner whose
    /// triangle contains no other ring vertex. Falls back to accepting a
    /// collinear corner when the polygon has degenerated, and to the first
    /// corner as a last resort; legalization cleans up afterwards.
    fn find_ear(&self, ring: &[VertexId<I>]) -> usize {
        use crate::geom::Orientation;

        let n = ring.len();
        for strict in [true, false] {
            'corner: for i in 0..n {
                let a = self.mesh.position(ring[i]);
                let b = self.mesh.position(ring[(i + 1) % n]);
                let c = self.mesh.position(ring[(i + 2) % n]);
                let orient = self.tol.orientation(a, b, c);
                let convex = if strict {
                    orient == Orientation::Ccw
                } else {
                    orient != Orientation::Cw
                };
                if !convex {
                    continue;
                }
                for (j, &q) in ring.iter().enumerate() {
                    if j == i || j == (i + 1) % n || j == (i + 2) % n {
                        continue;
                    }
                    if self.tol.point_in_triangle(self.mesh.position(q), a, b, c) {
                        continue 'corner;
                    }
                }
                return i;
            }
        }
        0
    }
}

/// An incremental Delaunay triangulation of points in a bounding rectangle.
///
/// Built with the Bowyer–Watson scheme: each point is located, the local
/// triangles are split, and edges are flipped until the Delaunay criterion
/// holds again. Point location runs through a hierarchy of coarser copies of
/// the triangulation ([Devillers' Delaunay hierarchy]) that is refreshed by
/// [`DelaunayTriangulation::finish`].
///
/// The triangulation always contains three *virtual* corner vertices spanning
/// a triangle far outside the bounding rectangle. They make every real point
/// interior, and the faces touching them are hidden from
/// [`DelaunayTriangulation::interior_faces`].
///
/// [Devillers' Delaunay hierarchy]: https://doi.org/10.1142/S0218195902000773
///
/// # Example
///
/// ```
/// use tessella::delaunay::DelaunayTriangulation;
/// use tessella::geom::Rect;
/// use nalgebra::Point2;
///
/// let bound = Rect::from_coords(0.0, 0.0, 1.0, 1.0);
/// let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(bound);
/// tri.insert_all([
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ]).unwrap();
///
/// assert_eq!(tri.interior_faces().count(), 2);
/// assert!(tri.is_delaunay());
/// ```
#[derive(Debug, Clone)]
pub struct DelaunayTriangulation<I: MeshIndex = u32> {
    pub(crate) core: TriCore<I>,
    pub(crate) locator: LocateHierarchy<I>,
    pub(crate) rng: StdRng,
}

impl<I: MeshIndex> DelaunayTriangulation<I> {
    /// Create an empty triangulation covering `bound`.
    pub fn new(bound: Rect) -> Self {
        Self::with_tolerance(bound, Tolerance::default(), DEFAULT_RNG_SEED)
    }

    /// Create an empty triangulation with a caller-chosen seed for the
    /// point-location hierarchy.
    pub fn with_seed(bound: Rect, seed: u64) -> Self {
        Self::with_tolerance(bound, Tolerance::default(), seed)
    }

    /// Create an empty triangulation with explicit tolerance and seed.
    pub fn with_tolerance(bound: Rect, tol: Tolerance, seed: u64) -> Self {
        Self {
            core: TriCore::new(bound, tol),
            locator: LocateHierarchy::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The bounding rectangle points must lie in.
    pub fn bound(&self) -> Rect {
        self.core.bound
    }

    /// The tolerance used by all geometric predicates.
    pub fn tolerance(&self) -> Tolerance {
        self.core.tol
    }

    /// The underlying half-edge mesh, virtual corners included.
    pub fn mesh(&self) -> &PlanarMesh<I> {
        &self.core.mesh
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut PlanarMesh<I> {
        &mut self.core.mesh
    }

    /// Consume the triangulation and keep its mesh.
    pub fn into_mesh(self) -> PlanarMesh<I> {
        self.core.mesh
    }

    /// The three virtual outer-corner vertices.
    pub fn virtual_vertices(&self) -> [VertexId<I>; 3] {
        self.core.virtual_vertices
    }

    /// Number of real (inserted) points.
    pub fn num_points(&self) -> usize {
        self.core.num_points()
    }

    /// Iterate over real vertices with their positions.
    pub fn points(&self) -> impl Iterator<Item = (VertexId<I>, Point2<f64>)> + '_ {
        self.core.real_vertices()
    }

    /// Iterate over the triangles of the triangulation proper, excluding
    /// faces that touch a virtual corner.
    pub fn interior_faces(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.core.interior_faces()
    }

    /// Check if a vertex is one of the three virtual outer corners.
    pub fn is_virtual(&self, v: VertexId<I>) -> bool {
        self.core.is_virtual(v)
    }

    /// Insert a point.
    ///
    /// Returns the new vertex, or the existing one when `p` coincides with
    /// an already-inserted point (which leaves the triangulation unchanged).
    /// Fails with [`MeshError::PointOutsideBounds`] for points outside the
    /// bounding rectangle.
    ///
    /// The point-location hierarchy is *not* extended here; call
    /// [`DelaunayTriangulation::finish`] after a batch of insertions to keep
    /// location fast.
    pub fn insert(&mut self, p: Point2<f64>) -> Result<VertexId<I>> {
        let start = self.locator.core_start(&self.core, p);
        Ok(self.core.insert_with_start(p, start)?.vertex())
    }

    /// Insert every point of an iterator, then rebuild the point-location
    /// hierarchy.
    pub fn insert_all(&mut self, points: impl IntoIterator<Item = Point2<f64>>) -> Result<()> {
        for p in points {
            self.insert(p)?;
        }
        self.finish();
        Ok(())
    }

    /// Rebuild the point-location hierarchy to match the current points.
    ///
    /// Insertions leave the hierarchy stale (still correct, since it is only
    /// a source of walk starting points, but increasingly ineffective).
    /// Rebuilding re-samples every level.
    ///
    /// In debug builds this also checks the mesh connectivity and that every
    /// live interior face is a triangle.
    pub fn finish(&mut self) {
        debug_assert!(self.core.mesh.is_valid());
        debug_assert!(self
            .core
            .interior_faces()
            .all(|f| self.core.mesh.face_edges(f).count() == 3));
        self.locator.rebuild(&self.core, &mut self.rng);
    }

    /// Remove the point coinciding with `p`.
    ///
    /// The hole left by the vertex's triangles is re-triangulated and
    /// legalized, and every hierarchy level holding a copy of the point
    /// drops it too. Fails with [`MeshError::VertexNotFound`] when no vertex
    /// lies at `p` within tolerance.
    pub fn remove(&mut self, p: Point2<f64>) -> Result<()> {
        self.core.remove(p)?;
        for level in self.locator.levels_mut() {
            match level.remove(p) {
                Ok(()) => {}
                // A point absent from one level is absent from all coarser
                // ones; promotion only ever copies points upward.
                Err(MeshError::VertexNotFound { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Find the face containing `p`.
    ///
    /// If `p` coincides with a vertex or lies on an edge, one of the
    /// incident faces is returned. Fails with
    /// [`MeshError::PointOutsideBounds`] for points outside the bounding
    /// rectangle.
    pub fn locate(&self, p: Point2<f64>) -> Result<FaceId<I>> {
        if !self.core.bound.contains(p) {
            return Err(MeshError::PointOutsideBounds { x: p.x, y: p.y });
        }
        let start = self.locator.core_start(&self.core, p);
        let f = self.core.walk(p, start);
        self.core.hint.set(f);
        Ok(f)
    }

    /// Find the vertex coinciding with `p` within tolerance, if any.
    pub fn find_vertex(&self, p: Point2<f64>) -> Option<VertexId<I>> {
        self.core.find_vertex(p)
    }

    /// Check that every edge satisfies the local Delaunay criterion.
    ///
    /// Intended for tests and debugging; insertion and removal maintain the
    /// property, so this should never report `false` between operations.
    pub fn is_delaunay(&self) -> bool {
        self.core.is_delaunay()
    }
}
