//! Force-based mesh generation over a signed distance function.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::delaunay::DelaunayTriangulation;
use crate::error::{MeshError, Result};
use crate::geom::{Rect, Tolerance};
use crate::mesh::{FaceId, FaceKind, HalfEdgeId, MeshIndex, PlanarMesh, VertexId};

use super::distance::{EdgeSizing, PolygonDomain, SignedDistance};
use super::progress::Progress;

// ==================== Options ====================

/// How the initial point set is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStrategy {
    /// A hexagonal lattice with spacing `h0`, odd rows shifted half a step.
    /// Gives the relaxation a near-optimal start.
    Grid,
    /// Uniformly random candidates over the bounding rectangle.
    Random {
        /// Number of candidates drawn before clipping against the domain.
        count: usize,
    },
}

/// Tuning parameters for the mesh generator.
///
/// Start from [`MesherOptions::with_edge_length`] and chain the builders:
///
/// ```
/// use tessella::mesher::MesherOptions;
///
/// let options = MesherOptions::with_edge_length(0.05)
///     .with_max_iterations(100)
///     .sequential();
/// ```
#[derive(Debug, Clone)]
pub struct MesherOptions {
    /// Base edge length; the sizing function scales relative to this.
    pub h0: f64,

    /// Maximum number of relaxation iterations before giving up on
    /// convergence.
    pub max_iterations: usize,

    /// Pseudo-time step of the damped Euler update.
    pub delta_t: f64,

    /// Stability clamp: no point moves farther than this fraction of `h0`
    /// in one step, no matter how large its accumulated force.
    pub max_move_frac: f64,

    /// Over-scaling of desired edge lengths. Values slightly above one keep
    /// every edge mildly compressed, which spreads points outward and fills
    /// the domain.
    pub fscale: f64,

    /// Convergence threshold: iteration stops when no point moves farther
    /// than this fraction of `h0` in one step.
    pub convergence_tol: f64,

    /// Compute per-vertex forces in parallel. The result is identical to
    /// the sequential path.
    pub parallel: bool,

    /// Seed for the triangulation's point-location hierarchy and for random
    /// seeding.
    pub seed: u64,

    /// How the initial points are placed.
    pub seed_strategy: SeedStrategy,

    /// Points that become mesh vertices verbatim and never move. Domain
    /// corners a relaxation would otherwise round off belong here.
    pub fixed_points: Vec<Point2<f64>>,

    /// Polygons excluded from the domain, on top of whatever the distance
    /// function already cuts out.
    pub obstacles: Vec<PolygonDomain>,

    /// Extra convergence criterion: stop as soon as every domain triangle's
    /// quality reaches this value, in `(0, 1]`.
    pub min_quality: Option<f64>,

    /// Tolerance handed to the triangulation's geometric predicates.
    pub tolerance: Tolerance,
}

impl MesherOptions {
    /// Options for a mesh with base edge length `h0`.
    pub fn with_edge_length(h0: f64) -> Self {
        Self {
            h0,
            max_iterations: 200,
            delta_t: 0.2,
            max_move_frac: 0.5,
            fscale: 1.2,
            convergence_tol: 1e-3,
            parallel: true,
            seed: 0,
            seed_strategy: SeedStrategy::Grid,
            fixed_points: Vec::new(),
            obstacles: Vec::new(),
            min_quality: None,
            tolerance: Tolerance::default(),
        }
    }

    /// Set the maximum number of relaxation iterations (at least 1).
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations.max(1);
        self
    }

    /// Set the pseudo-time step, clamped to `[0.01, 1.0]`.
    pub fn with_delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = delta_t.clamp(0.01, 1.0);
        self
    }

    /// Set the per-step displacement clamp as a fraction of `h0`, clamped
    /// to `[0.01, 1.0]`.
    pub fn with_max_move_frac(mut self, frac: f64) -> Self {
        self.max_move_frac = frac.clamp(0.01, 1.0);
        self
    }

    /// Set the edge-length over-scaling factor, clamped to `[1.0, 2.0]`.
    pub fn with_fscale(mut self, fscale: f64) -> Self {
        self.fscale = fscale.clamp(1.0, 2.0);
        self
    }

    /// Set the convergence threshold as a fraction of `h0`.
    pub fn with_convergence_tol(mut self, tol: f64) -> Self {
        self.convergence_tol = tol.max(1e-9);
        self
    }

    /// Disable parallel force computation.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the seed for the triangulation's point-location hierarchy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the points that are pinned in place.
    pub fn with_fixed_points(mut self, points: Vec<Point2<f64>>) -> Self {
        self.fixed_points = points;
        self
    }

    /// Set how the initial points are placed.
    pub fn with_seed_strategy(mut self, strategy: SeedStrategy) -> Self {
        self.seed_strategy = strategy;
        self
    }

    /// Set the polygons excluded from the domain.
    pub fn with_obstacles(mut self, obstacles: Vec<PolygonDomain>) -> Self {
        self.obstacles = obstacles;
        self
    }

    /// Stop once every domain triangle reaches this quality.
    pub fn with_min_quality(mut self, quality: f64) -> Self {
        self.min_quality = Some(quality);
        self
    }

    /// Set the tolerance used by the triangulation's geometric predicates.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.h0 > 0.0 && self.h0.is_finite()) {
            return Err(MeshError::invalid_param(
                "h0",
                self.h0,
                "must be positive and finite",
            ));
        }
        if self.max_iterations == 0 {
            return Err(MeshError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must be at least one",
            ));
        }
        if !(self.delta_t > 0.0 && self.delta_t <= 1.0) {
            return Err(MeshError::invalid_param(
                "delta_t",
                self.delta_t,
                "must lie in (0, 1]",
            ));
        }
        if !(self.max_move_frac > 0.0 && self.max_move_frac.is_finite()) {
            return Err(MeshError::invalid_param(
                "max_move_frac",
                self.max_move_frac,
                "must be positive and finite",
            ));
        }
        if !(self.fscale >= 1.0 && self.fscale.is_finite()) {
            return Err(MeshError::invalid_param(
                "fscale",
                self.fscale,
                "must be at least one",
            ));
        }
        if !(self.convergence_tol > 0.0 && self.convergence_tol.is_finite()) {
            return Err(MeshError::invalid_param(
                "convergence_tol",
                self.convergence_tol,
                "must be positive and finite",
            ));
        }
        if let Some(q) = self.min_quality {
            if !(q > 0.0 && q <= 1.0) {
                return Err(MeshError::invalid_param(
                    "min_quality",
                    q,
                    "must lie in (0, 1]",
                ));
            }
        }
        if let SeedStrategy::Random { count: 0 } = self.seed_strategy {
            return Err(MeshError::invalid_param(
                "seed_strategy",
                "Random { count: 0 }",
                "needs at least one candidate",
            ));
        }
        Ok(())
    }
}

impl Default for MesherOptions {
    fn default() -> Self {
        Self::with_edge_length(0.1)
    }
}

// ==================== Generator ====================

/// Where the generator stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MesherState {
    /// Points seeded, nothing triangulated yet.
    Seeded,
    /// Initial triangulation built, no relaxation performed.
    Triangulated,
    /// At least one relaxation step taken.
    Relaxing,
    /// No point moved more than the convergence threshold in the last step.
    Converged,
    /// The iteration budget ran out before convergence.
    MaxIterationsReached,
}

impl MesherState {
    /// Whether generation has finished, by convergence or by budget.
    pub fn is_terminal(self) -> bool {
        matches!(self, MesherState::Converged | MesherState::MaxIterationsReached)
    }
}

/// Summary statistics of a generated mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    /// Number of mesh vertices.
    pub num_vertices: usize,
    /// Number of triangles inside the domain.
    pub num_triangles: usize,
    /// Mean triangle quality over the domain, in `[0, 1]`.
    pub mean_quality: f64,
    /// Worst triangle quality over the domain.
    pub min_quality: f64,
}

/// The output of [`Mesher::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedMesh<I: MeshIndex = u32> {
    /// The generated mesh. Triangles inside the domain are
    /// [`FaceKind::Interior`]; everything else, including the region between
    /// the domain and the virtual outer triangle, is [`FaceKind::Boundary`].
    pub mesh: PlanarMesh<I>,
    /// Terminal state: converged, or iteration budget exhausted.
    pub state: MesherState,
    /// Number of relaxation iterations performed.
    pub iterations: usize,
    /// Quality statistics over the domain triangles.
    pub quality: QualityReport,
}

/// A force-based mesh generator in the DistMesh family (Persson & Strang,
/// 2004).
///
/// Points are seeded on a hexagonal lattice clipped against a signed
/// distance function, then iteratively relaxed: every Delaunay edge acts as
/// a compressed bar pushing its endpoints apart with a strength taken from
/// the sizing function, points that escape the domain are projected back to
/// the boundary, and the point set is re-triangulated after every step.
/// The result is a mesh of near-equilateral triangles whose edge lengths
/// follow the sizing field.
///
/// [`Mesher::generate`] runs the whole pipeline; [`Mesher::triangulate`]
/// and [`Mesher::step`] expose it one iteration at a time.
///
/// # Example
///
/// ```
/// use tessella::mesher::{Disk, Mesher, MesherOptions, UniformSizing};
/// use tessella::geom::Rect;
/// use nalgebra::Point2;
///
/// let domain = Disk::new(Point2::new(0.0, 0.0), 1.0).unwrap();
/// let bound = Rect::from_coords(-1.1, -1.1, 1.1, 1.1);
/// let options = MesherOptions::with_edge_length(0.3).with_max_iterations(40);
///
/// let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
/// let result = mesher.generate().unwrap();
///
/// assert!(result.state.is_terminal());
/// assert!(result.quality.num_triangles > 10);
/// ```
pub struct Mesher<D, H, I: MeshIndex = u32> {
    distance: D,
    sizing: H,
    bound: Rect,
    options: MesherOptions,
    tri: DelaunayTriangulation<I>,
    /// Current point set; the first `num_fixed` entries never move. After
    /// each (re)triangulation, entry `k` corresponds to the `k`-th real
    /// vertex of the mesh in arena order.
    points: Vec<Point2<f64>>,
    num_fixed: usize,
    state: MesherState,
    iterations: usize,
    stop: Arc<AtomicBool>,
}

impl<D, H, I> Mesher<D, H, I>
where
    D: SignedDistance,
    H: EdgeSizing,
    I: MeshIndex,
{
    /// Seed the generator: fixed points first, then the chosen seeding
    /// strategy clipped against the distance function and the obstacles.
    ///
    /// Fails when an option is out of range, a fixed point lies outside
    /// `bound`, or no seed point at all lands inside the domain.
    pub fn new(distance: D, sizing: H, bound: Rect, options: MesherOptions) -> Result<Self> {
        options.validate()?;

        let inside = |p: Point2<f64>| {
            options
                .obstacles
                .iter()
                .fold(distance.distance(p), |d, o| d.max(-o.distance(p)))
        };

        let mut points: Vec<Point2<f64>> = Vec::new();
        for &p in &options.fixed_points {
            if !bound.contains(p) {
                return Err(MeshError::PointOutsideBounds { x: p.x, y: p.y });
            }
            if points.iter().all(|q| (p - q).norm() > 0.25 * options.h0) {
                points.push(p);
            }
        }
        let num_fixed = points.len();

        // Every seed must land inside (or within geps of) the domain and
        // clear of the fixed points.
        let geps = 0.001 * options.h0;
        let accepts = |p: Point2<f64>, seeds: &[Point2<f64>]| {
            inside(p) < geps
                && seeds[..num_fixed]
                    .iter()
                    .all(|q| (p - q).norm() >= 0.5 * options.h0)
        };
        match options.seed_strategy {
            SeedStrategy::Grid => {
                // Hexagonal lattice: rows dy apart, odd rows shifted half a
                // step.
                let dy = options.h0 * 3.0_f64.sqrt() / 2.0;
                let mut row = 0;
                loop {
                    let y = bound.min.y + row as f64 * dy;
                    if y > bound.max.y {
                        break;
                    }
                    let x0 = bound.min.x + if row % 2 == 1 { 0.5 * options.h0 } else { 0.0 };
                    let mut col = 0;
                    loop {
                        let x = x0 + col as f64 * options.h0;
                        if x > bound.max.x {
                            break;
                        }
                        let p = Point2::new(x, y);
                        if accepts(p, &points) {
                            points.push(p);
                        }
                        col += 1;
                    }
                    row += 1;
                }
            }
            SeedStrategy::Random { count } => {
                let mut rng = StdRng::seed_from_u64(options.seed);
                for _ in 0..count {
                    let p = Point2::new(
                        rng.gen_range(bound.min.x..=bound.max.x),
                        rng.gen_range(bound.min.y..=bound.max.y),
                    );
                    if accepts(p, &points) {
                        points.push(p);
                    }
                }
            }
        }

        if points.is_empty() {
            return Err(MeshError::EmptyDomain);
        }

        let tri = DelaunayTriangulation::with_tolerance(bound, options.tolerance, options.seed);
        Ok(Self {
            distance,
            sizing,
            bound,
            options,
            tri,
            points,
            num_fixed,
            state: MesherState::Seeded,
            iterations: 0,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Signed distance of the effective domain: the distance function with
    /// every obstacle polygon cut out.
    fn domain_distance(&self, p: Point2<f64>) -> f64 {
        self.options
            .obstacles
            .iter()
            .fold(self.distance.distance(p), |d, o| d.max(-o.distance(p)))
    }

    /// The current lifecycle state.
    pub fn state(&self) -> MesherState {
        self.state
    }

    /// Relaxation iterations performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The current point set, fixed points first.
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    /// The current triangulation.
    pub fn triangulation(&self) -> &DelaunayTriangulation<I> {
        &self.tri
    }

    /// A flag that asks the generator to stop. Checked once per iteration;
    /// the current iteration always completes, and the mesh so far is kept.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Ask the generator to stop after the current iteration.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Build the Delaunay triangulation of the current point set and mark
    /// the triangles outside the domain.
    pub fn triangulate(&mut self) -> Result<()> {
        self.retriangulate()?;
        self.classify_faces();
        if self.state == MesherState::Seeded {
            self.state = MesherState::Triangulated;
        }
        Ok(())
    }

    /// Run one relaxation iteration: move every free point along its
    /// accumulated edge force, project escapees back onto the boundary, and
    /// re-triangulate.
    ///
    /// Returns `true` once the generator has reached a terminal state;
    /// calling [`Mesher::step`] again after that is a no-op.
    pub fn step(&mut self) -> Result<bool> {
        match self.state {
            MesherState::Seeded => self.triangulate()?,
            s if s.is_terminal() => return Ok(true),
            _ => {}
        }
        if self.stop.load(Ordering::Relaxed) {
            // A requested stop is not an error; the caller keeps the
            // partially relaxed mesh, as with an exhausted budget.
            self.state = MesherState::MaxIterationsReached;
            return Ok(true);
        }

        let max_move = self.relax_step();
        self.retriangulate()?;
        self.classify_faces();
        self.iterations += 1;

        self.state = if max_move < self.options.convergence_tol * self.options.h0
            || self.quality_target_met()
        {
            MesherState::Converged
        } else if self.iterations >= self.options.max_iterations {
            MesherState::MaxIterationsReached
        } else {
            MesherState::Relaxing
        };
        Ok(self.state.is_terminal())
    }

    /// Whether the optional quality stop criterion holds: the domain has
    /// triangles and the worst of them reaches the configured quality.
    fn quality_target_met(&self) -> bool {
        let Some(target) = self.options.min_quality else {
            return false;
        };
        let mesh = self.tri.mesh();
        let mut any = false;
        for f in mesh.interior_face_ids() {
            if mesh.face_quality(f) < target {
                return false;
            }
            any = true;
        }
        any
    }

    /// Run the full pipeline: triangulate, relax until convergence or the
    /// iteration budget, and classify the final faces against the domain.
    pub fn generate(self) -> Result<GeneratedMesh<I>> {
        self.generate_with_progress(&Progress::none())
    }

    /// Like [`Mesher::generate`], reporting each iteration to `progress`.
    pub fn generate_with_progress(mut self, progress: &Progress) -> Result<GeneratedMesh<I>> {
        if self.state == MesherState::Seeded {
            self.triangulate()?;
        }
        while !self.state.is_terminal() {
            progress.report(self.iterations, self.options.max_iterations, "relaxing mesh");
            self.step()?;
        }
        self.finalize();

        let quality = self.quality_report();
        Ok(GeneratedMesh {
            state: self.state,
            iterations: self.iterations,
            quality,
            mesh: self.tri.into_mesh(),
        })
    }

    /// Rebuild the triangulation from `self.points`.
    ///
    /// Coincident movers merge during insertion; when that happens the point
    /// list is re-derived from the mesh so list order and arena order stay
    /// aligned. Fixed points are inserted first and keep their slots.
    fn retriangulate(&mut self) -> Result<()> {
        let mut tri = DelaunayTriangulation::with_tolerance(
            self.bound,
            self.options.tolerance,
            self.options.seed,
        );
        for &p in &self.points {
            tri.insert(p)?;
        }
        if tri.num_points() != self.points.len() {
            self.points = tri.points().map(|(_, p)| p).collect();
        }
        self.tri = tri;
        Ok(())
    }

    /// Move every free point one damped Euler step along its accumulated
    /// edge forces; returns the largest displacement.
    fn relax_step(&mut self) -> f64 {
        let mesh = self.tri.mesh();
        let virt = self.tri.virtual_vertices();
        let h0 = self.options.h0;

        let verts: Vec<VertexId<I>> =
            mesh.vertex_ids().filter(|v| !virt.contains(v)).collect();
        debug_assert_eq!(verts.len(), self.points.len());

        // Equilibrium scale relating current edge lengths to the sizing
        // field, so forces neither collapse nor explode the point set. Only
        // edges bordering a domain triangle act; edges spanning holes or the
        // exterior exert nothing.
        let mut len2 = 0.0;
        let mut want2 = 0.0;
        for e in mesh.halfedge_ids() {
            if mesh.twin(e).index() < e.index() {
                continue;
            }
            if !edge_is_active(mesh, e) {
                continue;
            }
            let l = mesh.edge_length(e);
            let h = h0 * self.sizing.size(mesh.edge_midpoint(e));
            len2 += l * l;
            want2 += h * h;
        }
        if want2 <= 0.0 {
            return 0.0;
        }

        let field = ForceField {
            mesh,
            sizing: &self.sizing,
            scale: (len2 / want2).sqrt(),
            h0,
            fscale: self.options.fscale,
        };
        // Forces accumulate per vertex over its own edge orbit, so the
        // parallel result is bitwise identical to the sequential one.
        let forces: Vec<Vector2<f64>> = if self.options.parallel {
            verts.par_iter().map(|&v| field.force_at(v)).collect()
        } else {
            verts.iter().map(|&v| field.force_at(v)).collect()
        };

        let max_step = self.options.max_move_frac * h0;
        let mut max_move = 0.0_f64;
        let mut moved = Vec::with_capacity(self.points.len());
        for (k, &v) in verts.iter().enumerate() {
            let old = mesh.position(v);
            if k < self.num_fixed {
                moved.push(old);
                continue;
            }
            let mut step = forces[k] * self.options.delta_t;
            let norm = step.norm();
            if norm > max_step {
                step *= max_step / norm;
            }
            let mut p = old + step;
            if self.domain_distance(p) > 0.0 {
                p = self.project_to_boundary(p);
            }
            p.x = p.x.clamp(self.bound.min.x, self.bound.max.x);
            p.y = p.y.clamp(self.bound.min.y, self.bound.max.y);
            max_move = max_move.max((p - old).norm());
            moved.push(p);
        }
        self.points = moved;
        max_move
    }

    /// One Newton step toward the zero level set, using a forward-difference
    /// gradient.
    fn project_to_boundary(&self, p: Point2<f64>) -> Point2<f64> {
        let h = f64::EPSILON.sqrt() * self.options.h0;
        let d = self.domain_distance(p);
        let gx = (self.domain_distance(Point2::new(p.x + h, p.y)) - d) / h;
        let gy = (self.domain_distance(Point2::new(p.x, p.y + h)) - d) / h;
        let g2 = gx * gx + gy * gy;
        if g2 <= f64::MIN_POSITIVE {
            return p;
        }
        Point2::new(p.x - d * gx / g2, p.y - d * gy / g2)
    }

    /// Demote every triangle outside the domain to a boundary face: faces
    /// touching a virtual corner, and faces whose centroid is not clearly
    /// inside the zero level set. One rule covers the exterior, holes,
    /// obstacles and boundary slivers alike.
    fn classify_faces(&mut self) {
        let geps = 0.001 * self.options.h0;

        let outside: Vec<FaceId<I>> = {
            let mesh = self.tri.mesh();
            let virt = self.tri.virtual_vertices();
            mesh.interior_face_ids()
                .filter(|&f| {
                    mesh.face_triangle(f).iter().any(|v| virt.contains(v))
                        || self.domain_distance(mesh.face_centroid(f)) > -geps
                })
                .collect()
        };
        let mesh = self.tri.mesh_mut();
        for f in outside {
            mesh.face_mut(f).kind = FaceKind::Boundary;
        }
    }

    /// Rebuild the point-location hierarchy and settle the final face
    /// classification.
    fn finalize(&mut self) {
        self.tri.finish();
        self.classify_faces();
    }

    fn quality_report(&self) -> QualityReport {
        let mesh = self.tri.mesh();
        let mut count = 0;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        for f in mesh.interior_face_ids() {
            let q = mesh.face_quality(f);
            sum += q;
            min = min.min(q);
            count += 1;
        }
        QualityReport {
            num_vertices: self.tri.num_points(),
            num_triangles: count,
            mean_quality: if count > 0 { sum / count as f64 } else { 0.0 },
            min_quality: if count > 0 { min } else { 0.0 },
        }
    }
}

// The distance and sizing functions are often closures, so a derive is out.
impl<D, H, I: MeshIndex> std::fmt::Debug for Mesher<D, H, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesher")
            .field("bound", &self.bound)
            .field("state", &self.state)
            .field("iterations", &self.iterations)
            .field("num_points", &self.points.len())
            .finish_non_exhaustive()
    }
}

/// Whether an edge borders at least one domain triangle. Only such edges
/// carry forces; edges spanning holes, obstacles, or the strip between the
/// domain and the outer triangle are inert.
fn edge_is_active<I: MeshIndex>(mesh: &PlanarMesh<I>, e: HalfEdgeId<I>) -> bool {
    !mesh.face(mesh.face_of(e)).is_boundary()
        || !mesh.face(mesh.face_of(mesh.twin(e))).is_boundary()
}

/// Everything the per-vertex force computation reads; shared across worker
/// threads in the parallel path.
struct ForceField<'a, H, I: MeshIndex> {
    mesh: &'a PlanarMesh<I>,
    sizing: &'a H,
    scale: f64,
    h0: f64,
    fscale: f64,
}

impl<H: EdgeSizing, I: MeshIndex> ForceField<'_, H, I> {
    /// Net repulsive force on `v` from its active incident edges. Edges
    /// shorter than desired push `v` away from the neighbor; longer edges
    /// exert nothing.
    fn force_at(&self, v: VertexId<I>) -> Vector2<f64> {
        let pv = self.mesh.position(v);
        let mut force = Vector2::zeros();
        for e in self.mesh.vertex_edges(v) {
            if !edge_is_active(self.mesh, e) {
                continue;
            }
            let u = self.mesh.origin(e);
            let d = pv - self.mesh.position(u);
            let len = d.norm();
            if len <= 0.0 {
                continue;
            }
            let desired =
                self.fscale * self.scale * self.h0 * self.sizing.size(self.mesh.edge_midpoint(e));
            let excess = desired - len;
            if excess > 0.0 {
                force += d * (excess / len);
            }
        }
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::distance::{Disk, RectDomain, UniformSizing};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn disk_setup(h0: f64) -> (Disk, Rect, MesherOptions) {
        let domain = Disk::new(Point2::new(0.0, 0.0), 1.0).unwrap();
        let bound = Rect::from_coords(-1.1, -1.1, 1.1, 1.1);
        let options = MesherOptions::with_edge_length(h0);
        (domain, bound, options)
    }

    #[test]
    fn test_rejects_bad_options() {
        let (domain, bound, _) = disk_setup(0.2);

        let bad_h0 = MesherOptions::with_edge_length(0.0);
        let err = Mesher::<_, _, u32>::new(domain, UniformSizing, bound, bad_h0).unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter { name: "h0", .. }));

        let bad_dt = MesherOptions {
            delta_t: 0.0,
            ..MesherOptions::default()
        };
        let err = Mesher::<_, _, u32>::new(domain, UniformSizing, bound, bad_dt).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "delta_t", .. }
        ));

        let bad_fscale = MesherOptions {
            fscale: 0.5,
            ..MesherOptions::default()
        };
        let err = Mesher::<_, _, u32>::new(domain, UniformSizing, bound, bad_fscale).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "fscale", .. }
        ));

        let bad_clamp = MesherOptions {
            max_move_frac: 0.0,
            ..MesherOptions::default()
        };
        let err = Mesher::<_, _, u32>::new(domain, UniformSizing, bound, bad_clamp).unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "max_move_frac", .. }
        ));
    }

    #[test]
    fn test_debug_elides_the_distance_and_sizing_functions() {
        let (_, bound, options) = disk_setup(0.3);
        // Closures carry no Debug impl of their own; the mesher still has one.
        let domain = |p: Point2<f64>| p.coords.norm() - 1.0;
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();

        let text = format!("{mesher:?}");
        assert!(text.contains("Mesher"));
        assert!(text.contains("Seeded"));
        assert!(text.contains(".."));
    }

    #[test]
    fn test_rejects_fixed_point_outside_bound() {
        let (domain, bound, options) = disk_setup(0.2);
        let options = options.with_fixed_points(vec![Point2::new(5.0, 0.0)]);
        let err = Mesher::<_, _, u32>::new(domain, UniformSizing, bound, options).unwrap_err();
        assert!(matches!(err, MeshError::PointOutsideBounds { .. }));
    }

    #[test]
    fn test_empty_domain_is_an_error() {
        // A speck far smaller than the lattice spacing catches no seeds.
        let domain = Disk::new(Point2::new(0.5, 0.5), 0.05).unwrap();
        let bound = Rect::from_coords(0.0, 0.0, 1.0, 1.0);
        let options = MesherOptions::with_edge_length(0.5);
        let err = Mesher::<_, _, u32>::new(domain, UniformSizing, bound, options).unwrap_err();
        assert!(matches!(err, MeshError::EmptyDomain));
    }

    #[test]
    fn test_state_machine_walks_to_terminal() {
        let (domain, bound, options) = disk_setup(0.35);
        let options = options.with_max_iterations(4);
        let mut mesher: Mesher<_, _> =
            Mesher::new(domain, UniformSizing, bound, options).unwrap();
        assert_eq!(mesher.state(), MesherState::Seeded);

        mesher.triangulate().unwrap();
        assert_eq!(mesher.state(), MesherState::Triangulated);
        assert!(mesher.triangulation().is_delaunay());

        let mut steps = 0;
        while !mesher.step().unwrap() {
            steps += 1;
            assert!(steps <= 4);
        }
        assert!(mesher.state().is_terminal());
        assert!(mesher.iterations() <= 4);

        // Stepping past the end changes nothing.
        let iterations = mesher.iterations();
        assert!(mesher.step().unwrap());
        assert_eq!(mesher.iterations(), iterations);
    }

    #[test]
    fn test_unit_disk_mesh_is_well_shaped() {
        let (domain, bound, options) = disk_setup(0.1);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        let result = mesher.generate().unwrap();

        assert!(result.state.is_terminal());
        assert!(result.quality.num_vertices > 200);
        assert!(result.quality.num_triangles > 400);
        assert!(result.quality.mean_quality >= 0.7);
        assert!(result.quality.min_quality > 0.0);
        assert!(result.mesh.is_valid());

        // Every kept triangle is counter-clockwise and sits inside the disk.
        let geps = 0.001 * 0.1;
        for f in result.mesh.interior_face_ids() {
            assert!(result.mesh.face_area(f) > 0.0);
            assert!(domain.distance(result.mesh.face_centroid(f)) < geps);
        }
    }

    #[test]
    fn test_square_keeps_fixed_corners() {
        let domain = RectDomain::new(Rect::from_coords(0.0, 0.0, 1.0, 1.0));
        let bound = Rect::from_coords(-0.1, -0.1, 1.1, 1.1);
        let corners = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let options = MesherOptions::with_edge_length(0.25)
            .with_max_iterations(80)
            .with_fixed_points(corners.clone());
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        let result = mesher.generate().unwrap();

        for corner in &corners {
            assert!(
                result.mesh.vertices().any(|(_, v)| v.position == *corner),
                "fixed corner {corner} missing from the mesh"
            );
        }
        assert!(result.quality.num_triangles > 10);
        assert!(result.quality.mean_quality > 0.6);
    }

    #[test]
    fn test_hole_stays_empty() {
        let plate = RectDomain::new(Rect::from_coords(0.0, 0.0, 1.0, 1.0));
        let hole = Disk::new(Point2::new(0.5, 0.5), 0.25).unwrap();
        let domain = plate.difference(hole);
        let bound = Rect::from_coords(-0.1, -0.1, 1.1, 1.1);
        let options = MesherOptions::with_edge_length(0.1).with_max_iterations(100);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        let result = mesher.generate().unwrap();

        assert!(result.quality.num_triangles > 50);
        let geps = 0.001 * 0.1;
        for f in result.mesh.interior_face_ids() {
            let c = result.mesh.face_centroid(f);
            assert!(domain.distance(c) < geps);
            // In particular nothing inside the hole.
            assert!((c - Point2::new(0.5, 0.5)).norm() > 0.25 - 0.1);
        }
    }

    #[test]
    fn test_obstacle_polygons_are_excluded() {
        use crate::mesher::distance::PolygonDomain;

        let domain = RectDomain::new(Rect::from_coords(0.0, 0.0, 2.0, 1.0));
        let obstacle = PolygonDomain::new(vec![
            Point2::new(0.8, 0.3),
            Point2::new(1.2, 0.3),
            Point2::new(1.2, 0.7),
            Point2::new(0.8, 0.7),
        ])
        .unwrap();
        let bound = Rect::from_coords(-0.1, -0.1, 2.1, 1.1);
        let options = MesherOptions::with_edge_length(0.12)
            .with_max_iterations(60)
            .with_obstacles(vec![obstacle.clone()]);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        let result = mesher.generate().unwrap();

        assert!(result.quality.num_triangles > 50);
        for f in result.mesh.interior_face_ids() {
            let c = result.mesh.face_centroid(f);
            assert!(domain.distance(c) < 0.0);
            assert!(
                obstacle.distance(c) > 0.0,
                "centroid {c} fell inside the obstacle"
            );
        }
    }

    #[test]
    fn test_random_seeding_strategy() {
        let (domain, bound, options) = disk_setup(0.25);
        let options = options
            .with_seed_strategy(SeedStrategy::Random { count: 400 })
            .with_seed(5)
            .with_max_iterations(120);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        let result = mesher.generate().unwrap();

        assert!(result.state.is_terminal());
        assert!(result.quality.num_triangles > 20);
        assert!(result.quality.mean_quality > 0.5);

        // Zero candidates is a configuration error, not an empty domain.
        let err = Mesher::<_, _, u32>::new(
            domain,
            UniformSizing,
            bound,
            MesherOptions::with_edge_length(0.25)
                .with_seed_strategy(SeedStrategy::Random { count: 0 }),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidParameter { name: "seed_strategy", .. }
        ));
    }

    #[test]
    fn test_min_quality_short_circuits() {
        let (domain, bound, options) = disk_setup(0.3);
        // A target any triangulation of the lattice meets immediately.
        let options = options.with_min_quality(0.05).with_max_iterations(100);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        let result = mesher.generate().unwrap();

        assert_eq!(result.state, MesherState::Converged);
        assert!(result.iterations <= 2);
        assert!(result.quality.min_quality >= 0.05);
    }

    #[test]
    fn test_stop_request_is_honored() {
        let (domain, bound, options) = disk_setup(0.2);
        let options = options.with_max_iterations(500).with_convergence_tol(1e-9);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();

        mesher.request_stop();
        let result = mesher.generate().unwrap();

        assert_eq!(result.state, MesherState::MaxIterationsReached);
        assert_eq!(result.iterations, 0);
        // The initial triangulation survives the early exit.
        assert!(result.quality.num_triangles > 0);
    }

    #[test]
    fn test_max_move_frac_limits_displacement() {
        let (domain, bound, options) = disk_setup(0.3);
        let frac = 0.05;
        let options = options.with_max_move_frac(frac).with_max_iterations(50);
        let mut mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        mesher.triangulate().unwrap();

        let before = mesher.points().to_vec();
        mesher.step().unwrap();
        let after = mesher.points();
        assert_eq!(before.len(), after.len());

        // Clamped step plus at most one boundary projection of equal size.
        let cap = 2.0 * frac * 0.3 + 1e-12;
        for (p, q) in before.iter().zip(after) {
            assert!((q - p).norm() <= cap, "point moved {} > {cap}", (q - p).norm());
        }
    }

    #[test]
    fn test_tolerance_option_reaches_the_triangulation() {
        let (domain, bound, options) = disk_setup(0.3);
        let options = options.with_tolerance(Tolerance::new(1e-6));
        let mut mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();
        mesher.triangulate().unwrap();
        assert_eq!(mesher.triangulation().tolerance(), Tolerance::new(1e-6));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let (domain, bound, options) = disk_setup(0.25);
        let par = options.clone().with_max_iterations(10);
        let seq = options.with_max_iterations(10).sequential();

        let mut a: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, par).unwrap();
        let mut b: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, seq).unwrap();

        for _ in 0..10 {
            let done_a = a.step().unwrap();
            let done_b = b.step().unwrap();
            assert_eq!(done_a, done_b);
            assert_eq!(a.points(), b.points());
            if done_a {
                break;
            }
        }
    }

    #[test]
    fn test_progress_is_reported() {
        let (domain, bound, options) = disk_setup(0.35);
        let options = options.with_max_iterations(5);
        let mesher: Mesher<_, _> = Mesher::new(domain, UniformSizing, bound, options).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let progress = Progress::new(move |_, total, _| {
            assert_eq!(total, 5);
            seen.fetch_add(1, Ordering::Relaxed);
        });

        mesher.generate_with_progress(&progress).unwrap();
        let reported = calls.load(Ordering::Relaxed);
        assert!(reported >= 1 && reported <= 5);
    }
}
