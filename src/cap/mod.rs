//! **Cap triangulation**
//!
//! A [`Capper`] collects the directed cut edges produced while slicing and
//! closes the cross-section they bound with flat triangles:
//!
//! 1. the boundary is flattened into a [`PlaneFrame`] whose +Z is the cut normal
//!    and normalised to its bounding box,
//! 2. every boundary vertex is inserted into a super-triangle,
//! 3. missing boundary edges are recovered by diagonal swaps or Steiner points,
//! 4. triangles inside the boundary are found by flood fill from the triangles
//!    that lie along it, and appended to the mesh.
//!
//! The interior of the boundary lies to the left of each edge when looking
//! against the cut normal, so nested loops of opposite winding leave holes.

mod recovery;
mod triangulation;

use crate::config::{CapVertexMode, SlabConfig, StuckPolicy};
use crate::errors::SlabError;
use crate::float_types::Real;
use crate::plane::PlaneFrame;
use crate::registry::{HashMap, HashSet};
use crate::surface::{Face, FaceTarget, MeshStore, SurfaceVertex};
use nalgebra::{Point2, Point3, Vector3};
use recovery::{Boundary, BoundaryEdge};
use triangulation::{CapPoint, PointOrigin, Triangulation};

/// Room left between the boundary and the super-triangle, in normalised units.
const SUPER_MARGIN: Real = 0.5;

/// Summary of one [`Capper::create_cap`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapOutcome {
    /// Boundary edges handed to the triangulation (after condensation).
    pub boundary_edges: usize,
    /// Cap triangles appended to the mesh.
    pub triangles: usize,
    /// Vertices appended to the mesh (copies and Steiner points).
    pub vertices_added: usize,
    pub steiner_points: usize,
    pub swaps: usize,
    /// Boundary vertices merged into a neighbour, either as coincident points
    /// or by tiny-edge condensation.
    pub merged_vertices: usize,
    /// Emitted (or dropped) triangles below the degeneracy thresholds.
    pub degenerate_triangles: usize,
    /// Boundary edges split by a vertex or a Steiner point during recovery.
    pub split_edges: usize,
    /// Mesh vertex pairs of boundary edges that could not be recovered.
    pub unrecovered_edges: Vec<(usize, usize)>,
}

impl CapOutcome {
    pub fn is_capped(&self) -> bool {
        self.triangles > 0
    }
}

/// Accumulates boundary edges for one cap.
#[derive(Debug, Clone)]
pub struct Capper {
    config: SlabConfig,
    edges: Vec<(usize, usize, u32)>,
    seen: HashSet<(usize, usize)>,
    /// Contour and colour given to the cap faces.
    style: Option<(Option<u32>, u32)>,
}

impl Capper {
    pub fn new(config: SlabConfig) -> Self {
        Capper {
            config,
            edges: Vec::new(),
            seen: HashSet::new(),
            style: None,
        }
    }

    /// Record the directed boundary edge `from -> to` (mesh vertex indices) of
    /// vertex set `set`. Repeated and zero-length edges are ignored.
    pub fn add_edge(&mut self, from: usize, to: usize, set: u32) {
        if from == to {
            return;
        }
        if !self.seen.insert((from, to)) {
            log::debug!("duplicate cap edge {} -> {} ignored", from, to);
            return;
        }
        self.edges.push((from, to, set));
    }

    /// [`add_edge`](Self::add_edge) for an edge cut from `parent`. The cap takes
    /// the contour id and colour of the first parent face it is given.
    pub fn add_face_edge(&mut self, from: usize, to: usize, set: u32, parent: &Face) {
        self.style.get_or_insert((parent.contour, parent.color));
        self.add_edge(from, to, set);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Directed edges collected so far.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().map(|&(a, b, _)| (a, b))
    }

    /// **Triangulate the collected boundary and append the cap to `mesh`.**
    ///
    /// `cut_normal` points away from the kept material; without one the Newell
    /// normal of the boundary is used. Either way its sign is reconciled with
    /// the boundary winding.
    ///
    /// Fewer than three edges, or a boundary that does not span an area, give an
    /// empty outcome. With [`StuckPolicy::Fail`] an unrecoverable edge aborts
    /// before the mesh is touched.
    pub fn create_cap<M: MeshStore + ?Sized>(
        mut self,
        mesh: &mut M,
        cut_normal: Option<Vector3<Real>>,
    ) -> Result<CapOutcome, SlabError> {
        let mut outcome = CapOutcome::default();
        if self.config.min_edge_length > 0.0 {
            outcome.merged_vertices += self.condense(mesh);
        }
        outcome.boundary_edges = self.edges.len();
        if self.edges.len() < 3 {
            log::debug!("{} boundary edges; no cap", self.edges.len());
            return Ok(outcome);
        }
        for &(a, b, _) in &self.edges {
            if a.max(b) >= mesh.vertex_count() {
                return Err(SlabError::VertexOutOfRange {
                    index: a.max(b),
                    count: mesh.vertex_count(),
                });
            }
        }

        let Some(normal) = self.cap_normal(mesh, cut_normal) else {
            log::warn!("cap boundary of {} edges spans no area", self.edges.len());
            return Ok(outcome);
        };
        let Some((mut tri, lookup)) = self.flatten(mesh, normal) else {
            log::warn!("cap boundary of {} edges is degenerate in its plane", self.edges.len());
            return Ok(outcome);
        };
        let order: Vec<usize> = (0..lookup.len()).collect();
        tri.insert_all(order, self.config.delaunay);

        let mut boundary = Boundary::default();
        for &(a, b, _) in &self.edges {
            boundary.push(BoundaryEdge {
                from: tri.resolve(lookup[&a]),
                to: tri.resolve(lookup[&b]),
                needs_reprocessing: false,
                origin: (a, b),
            });
        }

        let recovery = recovery::recover_edges(&mut tri, &mut boundary, &self.config);
        outcome.unrecovered_edges = recovery
            .stuck
            .iter()
            .map(|&ei| boundary.edges[ei].origin)
            .collect();
        if let (StuckPolicy::Fail, Some(&(from, to))) =
            (self.config.stuck_policy, outcome.unrecovered_edges.first())
        {
            return Err(SlabError::RecoveryStuck { from, to });
        }
        let interior = recovery::mark_interior(&mut tri, &boundary);
        log::debug!("{} cap triangles marked interior", interior);

        outcome.steiner_points = recovery.steiner_points;
        outcome.swaps = tri.swaps;
        outcome.merged_vertices += tri.merged;
        outcome.split_edges = boundary.edges.iter().filter(|e| e.needs_reprocessing).count();
        self.emit(mesh, &tri, &mut outcome);

        log::info!(
            "cap: {} edges -> {} triangles ({} steiner, {} swaps, {} unrecovered)",
            outcome.boundary_edges,
            outcome.triangles,
            outcome.steiner_points,
            outcome.swaps,
            outcome.unrecovered_edges.len()
        );
        Ok(outcome)
    }

    /// Merge each boundary edge shorter than `min_edge_length` into the edge
    /// that ends where it starts. Returns the number of edges removed.
    fn condense<M: MeshStore + ?Sized>(&mut self, mesh: &M) -> usize {
        let min2 = self.config.min_edge_length * self.config.min_edge_length;
        let count = mesh.vertex_count();
        let mut incoming: HashMap<usize, usize> = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, &(_, to, _))| (to, i))
            .collect();
        let mut removed = vec![false; self.edges.len()];

        for i in 0..self.edges.len() {
            let (a, b, _) = self.edges[i];
            if removed[i] || a >= count || b >= count {
                continue;
            }
            if (mesh.vertex(b).pos - mesh.vertex(a).pos).norm_squared() >= min2 {
                continue;
            }
            let Some(&p) = incoming.get(&a) else {
                continue;
            };
            if p == i || removed[p] {
                continue;
            }
            self.edges[p].1 = b;
            incoming.insert(b, p);
            removed[i] = true;
        }

        let before = self.edges.len();
        let mut index = 0;
        self.edges.retain(|&(a, b, _)| {
            let keep = !removed[index] && a != b;
            index += 1;
            keep
        });
        let merged = before - self.edges.len();
        if merged > 0 {
            log::debug!("condensed {} tiny boundary edges", merged);
        }
        merged
    }

    fn cap_normal<M: MeshStore + ?Sized>(
        &self,
        mesh: &M,
        cut_normal: Option<Vector3<Real>>,
    ) -> Option<Vector3<Real>> {
        let newell: Vector3<Real> = self
            .edges
            .iter()
            .map(|&(a, b, _)| mesh.vertex(a).pos.coords.cross(&mesh.vertex(b).pos.coords))
            .sum();
        let mut normal = cut_normal
            .filter(|n| n.norm_squared() > Real::EPSILON)
            .unwrap_or(newell);
        if newell.dot(&normal) < 0.0 {
            normal = -normal;
        }
        normal.try_normalize(Real::EPSILON)
    }

    /// Build the cap points (boundary vertices in first-use order, then the
    /// super-triangle corners) and the initial triangulation.
    fn flatten<M: MeshStore + ?Sized>(
        &self,
        mesh: &M,
        normal: Vector3<Real>,
    ) -> Option<(Triangulation, HashMap<usize, usize>)> {
        let mut lookup: HashMap<usize, usize> = HashMap::new();
        let mut order: Vec<(usize, u32)> = Vec::new();
        for &(a, b, set) in &self.edges {
            for v in [a, b] {
                lookup.entry(v).or_insert_with(|| {
                    order.push((v, set));
                    order.len() - 1
                });
            }
        }

        let first = mesh.vertex(self.edges[0].0).pos;
        let last = mesh.vertex(self.edges[self.edges.len() - 1].0).pos;
        let frame = PlaneFrame::from_axes(first, first - last, normal);
        let raw: Vec<Point2<Real>> = order
            .iter()
            .map(|&(v, _)| frame.to_local(&mesh.vertex(v).pos).xy())
            .collect();

        let (mut lo, mut hi) = (raw[0], raw[0]);
        for p in &raw {
            lo = lo.inf(p);
            hi = hi.sup(p);
        }
        let extent = hi - lo;
        let scale = extent.x.max(extent.y);
        if !(scale > Real::EPSILON) {
            return None;
        }
        let (ex, ey) = (extent.x / scale, extent.y / scale);

        let mut points: Vec<CapPoint> = order
            .iter()
            .zip(&raw)
            .map(|(&(v, set), p)| {
                let vertex = mesh.vertex(v);
                CapPoint {
                    local: Point2::from((p - lo) / scale),
                    world: vertex.pos,
                    value: vertex.value,
                    set,
                    origin: PointOrigin::Mesh(v),
                }
            })
            .collect();

        let (x0, y0) = (-SUPER_MARGIN, -SUPER_MARGIN);
        let (x1, y1) = (ex + SUPER_MARGIN, ey + SUPER_MARGIN);
        let n = points.len();
        for (x, y) in [(x0, y0), (2.0 * x1 - x0, y0), (x0, 2.0 * y1 - y0)] {
            let local = Point2::new(x, y);
            let unscaled = lo + local.coords * scale;
            points.push(CapPoint {
                local,
                world: frame.to_world(&Point3::new(unscaled.x, unscaled.y, 0.0)),
                value: 0.0,
                set: 0,
                origin: PointOrigin::Super,
            });
        }
        Some((Triangulation::new(points, [n, n + 1, n + 2], &self.config), lookup))
    }

    fn emit<M: MeshStore + ?Sized>(&self, mesh: &mut M, tri: &Triangulation, outcome: &mut CapOutcome) {
        let mut mapped: Vec<Option<usize>> = vec![None; tri.points.len()];
        for t in tri.live() {
            let cap = &tri.triangles[t];
            if !(cap.ok && cap.valid) {
                continue;
            }
            if cap.degenerate {
                outcome.degenerate_triangles += 1;
                log::warn!("degenerate cap triangle {:?}", cap.vs);
                if self.config.drop_degenerate {
                    continue;
                }
            }

            let mut indices = [0usize; 3];
            for (slot, &p) in cap.vs.iter().enumerate() {
                indices[slot] = match mapped[p] {
                    Some(index) => index,
                    None => {
                        let point = &tri.points[p];
                        let index = match (point.origin, self.config.cap_vertices) {
                            (PointOrigin::Mesh(v), CapVertexMode::Share) => v,
                            (PointOrigin::Mesh(v), CapVertexMode::Copy) => {
                                outcome.vertices_added += 1;
                                let copy = mesh.vertex(v).with_set(point.set);
                                mesh.append_vertex(copy)
                            },
                            _ => {
                                outcome.vertices_added += 1;
                                mesh.append_vertex(
                                    SurfaceVertex::new(point.world, point.value).with_set(point.set),
                                )
                            },
                        };
                        mapped[p] = Some(index);
                        index
                    },
                };
            }

            // check bit k covers edge (v_k, v_k+1), which is side k+2
            let check = (0..3).fold(0u8, |bits, k| {
                if cap.edge_type & (1 << ((k + 2) % 3)) != 0 {
                    bits | (1 << k)
                } else {
                    bits
                }
            });
            let (contour, color) = self.style.unwrap_or((None, 0));
            let face = Face {
                contour,
                color,
                ..Face::new(indices).with_check(check)
            };
            mesh.append_face(face, FaceTarget::Display);
            outcome.triangles += 1;
        }
    }
}
