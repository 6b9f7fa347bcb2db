//! Point location: the remembering orientation walk and the hierarchy of
//! coarse triangulations that provides good walk starting points.

use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::Rng;

use crate::geom::Orientation;
use crate::mesh::{FaceId, HalfEdgeId, MeshIndex, VertexId};

use super::triangulation::{InsertOutcome, TriCore};

/// Probability that a point is promoted one level up the hierarchy.
const PROMOTE_PROBABILITY: f64 = 1.0 / 13.0;

/// Hard cap on the number of coarse levels.
const MAX_LEVELS: usize = 8;

/// A level that would hold fewer points than this is not built.
const MIN_LEVEL_POINTS: usize = 8;

/// Where a point sits relative to a triangle, within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location<I: MeshIndex = u32> {
    /// Coincides with a vertex of the triangle.
    OnVertex(VertexId<I>),
    /// Lies on an edge; the half-edge belongs to the queried face.
    OnEdge(HalfEdgeId<I>),
    /// Strictly inside the face.
    InFace(FaceId<I>),
}

impl<I: MeshIndex> TriCore<I> {
    /// Find the face containing `p` by walking from `start`.
    ///
    /// Each step crosses one edge the query point lies on the far side of,
    /// never re-crossing the edge just came through. When `p` is outside the
    /// outer triangle the last face before the exterior is returned. Stale
    /// or invalid `start` values fall back to the hint, then to any interior
    /// face.
    pub(crate) fn walk(&self, p: Point2<f64>, start: FaceId<I>) -> FaceId<I> {
        let mut current = self.sanitize_start(start);
        let mut came_from = HalfEdgeId::invalid();
        // Orientation walks can cycle on near-degenerate geometry; cap the
        // number of crossings and fall back to scanning.
        let mut remaining = 2 * self.mesh.num_faces() + 8;

        loop {
            if remaining == 0 {
                return self.scan_for(p).unwrap_or(current);
            }
            remaining -= 1;

            let e0 = self.mesh.face_edge(current);
            let edges = [e0, self.mesh.next(e0), self.mesh.prev(e0)];
            let mut crossed = false;
            for e in edges {
                if e == came_from {
                    continue;
                }
                let a = self.mesh.position(self.mesh.origin(e));
                let b = self.mesh.position(self.mesh.end(e));
                if self.tol.orientation(a, b, p) == Orientation::Cw {
                    let t = self.mesh.twin(e);
                    let next_face = self.mesh.face_of(t);
                    if self.mesh.face(next_face).is_boundary() {
                        return current;
                    }
                    came_from = t;
                    current = next_face;
                    crossed = true;
                    break;
                }
            }
            if !crossed {
                return current;
            }
        }
    }

    /// Classify `p` against the face it was located in.
    pub(crate) fn classify(&self, f: FaceId<I>, p: Point2<f64>) -> Location<I> {
        let e0 = self.mesh.face_edge(f);
        let edges = [e0, self.mesh.next(e0), self.mesh.prev(e0)];

        for e in edges {
            let v = self.mesh.end(e);
            if self.tol.points_coincide(p, self.mesh.position(v)) {
                return Location::OnVertex(v);
            }
        }
        for e in edges {
            let a = self.mesh.position(self.mesh.origin(e));
            let b = self.mesh.position(self.mesh.end(e));
            if self.tol.on_segment(p, a, b) {
                return Location::OnEdge(e);
            }
        }
        Location::InFace(f)
    }

    fn sanitize_start(&self, start: FaceId<I>) -> FaceId<I> {
        for f in [start, self.hint.get()] {
            if f.is_valid()
                && f.index() < self.mesh.faces.len()
                && self.mesh.face(f).is_alive()
                && !self.mesh.face(f).is_boundary()
            {
                return f;
            }
        }
        // The outer triangle's face exists even in an empty core.
        self.mesh
            .interior_face_ids()
            .next()
            .expect("triangulation always has an interior face")
    }

    fn scan_for(&self, p: Point2<f64>) -> Option<FaceId<I>> {
        self.mesh.interior_face_ids().find(|&f| {
            let [a, b, c] = self.mesh.face_positions(f);
            self.tol.point_in_triangle(p, a, b, c)
        })
    }

    /// The corner of `f` nearest to `p` that links into the next finer
    /// level; returns the link target.
    fn nearest_down_link(&self, f: FaceId<I>, p: Point2<f64>) -> Option<VertexId<I>> {
        let mut best: Option<(f64, VertexId<I>)> = None;
        for v in self.mesh.face_triangle(f) {
            if !self.mesh.vertex(v).down.is_valid() {
                continue;
            }
            let d2 = (self.mesh.position(v) - p).norm_squared();
            if best.map_or(true, |(best_d2, _)| d2 < best_d2) {
                best = Some((d2, v));
            }
        }
        best.map(|(_, v)| self.mesh.vertex(v).down)
    }
}

/// The Delaunay hierarchy: a stack of ever-coarser triangulations of random
/// subsets of the points, used to find a good starting face for the walk in
/// the full triangulation.
///
/// `levels[0]` is the finest coarse level; each level holds roughly a
/// thirteenth of the one below and links every vertex to its copy there via
/// [`crate::mesh::Vertex::down`]. A query walks the coarsest level from its
/// hint, then hops down the links, walking each level from the face around
/// the previous level's nearest vertex.
///
/// Insertions into the main triangulation leave the hierarchy untouched;
/// locating stays correct (walk starts are hints, nothing more) but slows
/// toward a plain walk until [`LocateHierarchy::rebuild`] re-samples the
/// levels. Removals, by contrast, update affected levels immediately.
#[derive(Debug, Clone)]
pub(crate) struct LocateHierarchy<I: MeshIndex = u32> {
    levels: Vec<TriCore<I>>,
}

impl<I: MeshIndex> LocateHierarchy<I> {
    pub(crate) fn new() -> Self {
        Self { levels: Vec::new() }
    }

    #[cfg(test)]
    pub(crate) fn levels(&self) -> &[TriCore<I>] {
        &self.levels
    }

    pub(crate) fn levels_mut(&mut self) -> impl Iterator<Item = &mut TriCore<I>> {
        self.levels.iter_mut()
    }

    /// Drop all levels and re-sample them from the core's current points.
    pub(crate) fn rebuild(&mut self, core: &TriCore<I>, rng: &mut StdRng) {
        self.levels.clear();

        // Points of the level below, keyed by their vertex ids there.
        let mut below: Vec<(VertexId<I>, Point2<f64>)> = core.real_vertices().collect();
        for _ in 0..MAX_LEVELS {
            let sample: Vec<(VertexId<I>, Point2<f64>)> = below
                .iter()
                .copied()
                .filter(|_| rng.gen_bool(PROMOTE_PROBABILITY))
                .collect();
            if sample.len() < MIN_LEVEL_POINTS {
                break;
            }

            let mut level = TriCore::new(core.bound, core.tol);
            let mut promoted = Vec::with_capacity(sample.len());
            for (below_id, p) in sample {
                match level.insert(p) {
                    Ok(InsertOutcome::Created(v)) => {
                        level.mesh.set_down(v, below_id);
                        promoted.push((v, p));
                    }
                    // Core points are inside the bound and pairwise
                    // distinct, so neither arm is reachable.
                    Ok(InsertOutcome::Existing(_)) | Err(_) => {}
                }
            }
            self.levels.push(level);
            below = promoted;
        }
    }

    /// A starting face for a walk in the core, found by descending the
    /// levels. Falls back to the core's own hint when there are no levels
    /// or the descent loses the trail.
    pub(crate) fn core_start(&self, core: &TriCore<I>, p: Point2<f64>) -> FaceId<I> {
        match self.descend(p) {
            Some(v) => core.mesh.face_of(core.mesh.vertex_edge(v)),
            None => core.hint.get(),
        }
    }

    /// Walk the levels from coarsest to finest; the result is a core vertex
    /// near `p`.
    fn descend(&self, p: Point2<f64>) -> Option<VertexId<I>> {
        let mut down: Option<VertexId<I>> = None;
        for level in self.levels.iter().rev() {
            let start = match down {
                Some(v) => level.mesh.face_of(level.mesh.vertex_edge(v)),
                None => level.hint.get(),
            };
            let f = level.walk(p, start);
            level.hint.set(f);
            down = level.nearest_down_link(f, p);
        }
        down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delaunay::DelaunayTriangulation;
    use crate::geom::Rect;
    use rand::SeedableRng;

    fn unit_bound() -> Rect {
        Rect::from_coords(0.0, 0.0, 1.0, 1.0)
    }

    fn square_triangulation() -> DelaunayTriangulation {
        let mut tri = DelaunayTriangulation::new(unit_bound());
        tri.insert_all([
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap();
        tri
    }

    #[test]
    fn test_walk_reaches_containing_face() {
        let tri = square_triangulation();
        for q in [
            Point2::new(0.2, 0.1),
            Point2::new(0.9, 0.8),
            Point2::new(0.1, 0.85),
        ] {
            let f = tri.core.walk(q, FaceId::invalid());
            let [a, b, c] = tri.mesh().face_positions(f);
            assert!(tri.tolerance().point_in_triangle(q, a, b, c));
        }
    }

    #[test]
    fn test_classify_distinguishes_cases() {
        let tri = square_triangulation();

        let corner = Point2::new(1.0, 1.0);
        let f = tri.core.walk(corner, FaceId::invalid());
        match tri.core.classify(f, corner) {
            Location::OnVertex(v) => assert_eq!(tri.mesh().position(v), corner),
            other => panic!("expected OnVertex, got {other:?}"),
        }

        let edge_mid = Point2::new(0.5, 0.0);
        let f = tri.core.walk(edge_mid, FaceId::invalid());
        match tri.core.classify(f, edge_mid) {
            Location::OnEdge(e) => {
                let a = tri.mesh().position(tri.mesh().origin(e));
                let b = tri.mesh().position(tri.mesh().end(e));
                assert!(tri.tolerance().on_segment(edge_mid, a, b));
            }
            other => panic!("expected OnEdge, got {other:?}"),
        }

        let inside = Point2::new(0.3, 0.2);
        let f = tri.core.walk(inside, FaceId::invalid());
        assert_eq!(tri.core.classify(f, inside), Location::InFace(f));
    }

    #[test]
    fn test_hierarchy_links_resolve_to_matching_points() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(unit_bound());
        for _ in 0..300 {
            tri.insert(Point2::new(
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
            ))
            .unwrap();
        }
        tri.finish();

        let levels = tri.locator.levels();
        for (k, level) in levels.iter().enumerate() {
            assert!(level.num_points() >= MIN_LEVEL_POINTS);
            for (v, p) in level.real_vertices() {
                let down = level.mesh.vertex(v).down;
                assert!(down.is_valid());
                let below_pos = if k == 0 {
                    tri.core.mesh.position(down)
                } else {
                    levels[k - 1].mesh.position(down)
                };
                assert_eq!(p, below_pos);
            }
        }
    }

    #[test]
    fn test_located_faces_contain_their_queries() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(unit_bound());
        let points: Vec<Point2<f64>> = (0..400)
            .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect();
        tri.insert_all(points).unwrap();

        for _ in 0..100 {
            let q = Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let f = tri.locate(q).unwrap();
            let [a, b, c] = tri.mesh().face_positions(f);
            assert!(tri.tolerance().point_in_triangle(q, a, b, c));
        }
    }

    #[test]
    fn test_stale_hierarchy_still_locates() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut tri: DelaunayTriangulation = DelaunayTriangulation::new(unit_bound());
        let points: Vec<Point2<f64>> = (0..120)
            .map(|_| Point2::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect();

        // No finish() yet: every locate runs on hint fallbacks alone.
        for &p in &points {
            tri.insert(p).unwrap();
        }
        for &q in points.iter().step_by(7) {
            let f = tri.locate(q).unwrap();
            let [a, b, c] = tri.mesh().face_positions(f);
            assert!(tri.tolerance().point_in_triangle(q, a, b, c));
        }

        // After rebuilding and removing points the hierarchy keeps working.
        tri.finish();
        for &p in points.iter().step_by(3) {
            tri.remove(p).unwrap();
        }
        for &q in points.iter().skip(1).step_by(7) {
            let f = tri.locate(q).unwrap();
            let [a, b, c] = tri.mesh().face_positions(f);
            assert!(tri.tolerance().point_in_triangle(q, a, b, c));
        }
    }
}
