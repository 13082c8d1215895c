//! **Slicing engine**
//!
//! [`Slicer`] cuts the live triangles of a [`MeshStore`] against a
//! [`Classifier`]. Each triangle is classified by the signs of its three vertex
//! residuals:
//!
//! * no negative vertex: kept as is,
//! * no positive vertex: hidden (moved to the ghost set in ghost mode),
//! * mixed: clipped into a kept polygon and a discarded polygon that share the
//!   new crossing vertices, each fanned back into triangles.
//!
//! Crossing vertices are registered per edge, so the two triangles sharing a
//! cut edge use one vertex and the kept surface stays watertight. The cut edges
//! of the kept pieces feed a [`Capper`] when a cap is requested.

pub mod brillouin;
pub mod classify;
pub mod slab;

pub use brillouin::{FoldOutcome, Lattice};
pub use classify::Classifier;
pub use slab::{Slab, SlabKind, SlabOutcome};

use crate::cap::{CapOutcome, Capper};
use crate::config::SlabConfig;
use crate::errors::SlabError;
use crate::float_types::Real;
use crate::registry::{EdgeKey, EdgeVertexMap, HashSet};
use crate::surface::{Face, FaceTarget, MeshStore};
use nalgebra::Point3;

/// Counters of one slice. `sliced == false` means the mesh was not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceOutcome {
    pub sliced: bool,
    /// Live triangles (or points) left untouched.
    pub kept: usize,
    /// Live triangles (or points) hidden whole.
    pub discarded: usize,
    /// Triangles replaced by their clipped pieces.
    pub split: usize,
    pub faces_added: usize,
    pub vertices_added: usize,
    /// Directed cut edges collected for the cap.
    pub boundary_edges: usize,
    pub cap: Option<CapOutcome>,
}

/// Where a clipped polygon corner sits on the original triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    /// Original vertex `k`.
    Corner(usize),
    /// Crossing on edge `k`, from vertex `k` to vertex `k + 1`.
    Edge(usize),
}

impl Location {
    /// Original edges this location lies on, as a bit mask.
    const fn edge_mask(self) -> u8 {
        match self {
            Location::Corner(c) => (1 << c) | (1 << ((c + 2) % 3)),
            Location::Edge(k) => 1 << k,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    index: usize,
    location: Location,
    on_cut: bool,
}

/// Cuts one mesh. The slicer borrows the mesh for its lifetime; all scratch
/// state lives inside a single call.
pub struct Slicer<'m, M: MeshStore + ?Sized> {
    mesh: &'m mut M,
    config: SlabConfig,
}

impl<'m, M: MeshStore + ?Sized> Slicer<'m, M> {
    pub fn new(mesh: &'m mut M) -> Self {
        Self::with_config(mesh, SlabConfig::default())
    }

    pub fn with_config(mesh: &'m mut M, config: SlabConfig) -> Self {
        Slicer { mesh, config }
    }

    pub fn config(&self) -> &SlabConfig {
        &self.config
    }

    pub fn mesh(&self) -> &M {
        self.mesh
    }

    /// Cut away everything with a negative residual, optionally closing the
    /// cross-section with a cap.
    pub fn slice(&mut self, classifier: &Classifier, cap: bool) -> Result<SliceOutcome, SlabError> {
        self.slice_with(classifier, cap, false)
    }

    /// Cut in ghost mode: the discarded parts are kept in the ghost set instead
    /// of being dropped. Never caps.
    pub fn slice_ghost(&mut self, classifier: &Classifier) -> Result<SliceOutcome, SlabError> {
        self.slice_with(classifier, false, true)
    }

    pub(crate) fn slice_with(
        &mut self,
        classifier: &Classifier,
        cap: bool,
        ghost: bool,
    ) -> Result<SliceOutcome, SlabError> {
        let mut outcome = SliceOutcome::default();
        if !self.mesh.slab_enabled() {
            log::debug!("slicing disabled for this mesh");
            return Ok(outcome);
        }
        if self.mesh.face_count() == 0 {
            if self.mesh.vertex_count() > 0 {
                self.slice_points(classifier, &mut outcome);
            }
            return Ok(outcome);
        }
        outcome.sliced = true;

        let residuals = classifier.residuals(&*self.mesh, &self.config);
        let mut crossings = EdgeVertexMap::new();
        let mut capper = (cap && !ghost).then(|| Capper::new(self.config));
        let face_count = self.mesh.face_count();
        let vertex_count = self.mesh.vertex_count();
        let coplanar = if capper.is_some() {
            self.coplanar_edges(&residuals)
        } else {
            HashSet::new()
        };

        for fi in 0..face_count {
            let Some(face) = self.mesh.live_face(fi) else {
                continue;
            };
            let r = face.indices.map(|i| residuals[i]);
            if r.iter().any(|x| x.is_nan()) {
                continue;
            }
            let positive = r.iter().filter(|&&x| x > 0.0).count();
            let negative = r.iter().filter(|&&x| x < 0.0).count();

            if negative == 0 {
                outcome.kept += 1;
                // a kept edge lying on the cut is part of the cap boundary,
                // unless a kept face already covers the cut beyond it
                if let (Some(capper), 1) = (capper.as_mut(), positive) {
                    for (k, (a, b)) in face.edges().enumerate() {
                        if r[k] == 0.0 && r[(k + 1) % 3] == 0.0 && !coplanar.contains(&EdgeKey::new(a, b)) {
                            capper.add_face_edge(b, a, self.mesh.vertex(a).set, &face);
                        }
                    }
                }
                continue;
            }
            if positive == 0 {
                outcome.discarded += 1;
                self.mesh.display_mut().remove(fi);
                if ghost {
                    self.mesh.ghost_mut().insert(fi);
                }
                continue;
            }

            outcome.split += 1;
            self.split_face(fi, &face, r, classifier, &residuals, &mut crossings, ghost, capper.as_mut(), &mut outcome);
        }
        outcome.vertices_added = self.mesh.vertex_count() - vertex_count;

        if let Some(capper) = capper {
            outcome.boundary_edges = capper.edge_count();
            let cap = capper.create_cap(&mut *self.mesh, classifier.cut_normal())?;
            outcome.faces_added += cap.triangles;
            outcome.vertices_added += cap.vertices_added;
            outcome.cap = Some(cap);
        }

        log::info!(
            "slice by {}: {} kept, {} discarded, {} split, {} crossings",
            classifier,
            outcome.kept,
            outcome.discarded,
            outcome.split,
            crossings.len()
        );
        Ok(outcome)
    }

    /// Edges of live triangles lying wholly on the cut (all residuals zero).
    fn coplanar_edges(&self, residuals: &[Real]) -> HashSet<EdgeKey> {
        let mut edges = HashSet::new();
        for fi in 0..self.mesh.face_count() {
            let Some(face) = self.mesh.live_face(fi) else {
                continue;
            };
            if face.indices.iter().all(|&i| residuals[i] == 0.0) {
                edges.extend(face.edges().map(|(a, b)| EdgeKey::new(a, b)));
            }
        }
        edges
    }

    /// Point cloud: hide every displayed vertex that is invalid or discarded.
    fn slice_points(&mut self, classifier: &Classifier, outcome: &mut SliceOutcome) {
        outcome.sliced = true;
        let residuals = classifier.residuals(&*self.mesh, &self.config);
        let displayed: Vec<usize> = self.mesh.display().iter().collect();
        for i in displayed {
            match residuals.get(i) {
                Some(&r) if r >= 0.0 => outcome.kept += 1,
                _ => {
                    self.mesh.display_mut().remove(i);
                    outcome.discarded += 1;
                },
            }
        }
        log::info!(
            "slice points by {}: {} kept, {} discarded",
            classifier,
            outcome.kept,
            outcome.discarded
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn split_face(
        &mut self,
        fi: usize,
        face: &Face,
        r: [Real; 3],
        classifier: &Classifier,
        residuals: &[Real],
        crossings: &mut EdgeVertexMap,
        ghost: bool,
        capper: Option<&mut Capper>,
        outcome: &mut SliceOutcome,
    ) {
        let set = self.mesh.vertex(face.indices[0]).set;
        let mut kept: Vec<Node> = Vec::with_capacity(4);
        let mut tossed: Vec<Node> = Vec::with_capacity(4);

        for k in 0..3 {
            let j = (k + 1) % 3;
            let corner = Node {
                index: face.indices[k],
                location: Location::Corner(k),
                on_cut: r[k] == 0.0,
            };
            if r[k] >= 0.0 {
                kept.push(corner);
            }
            if r[k] <= 0.0 {
                tossed.push(corner);
            }
            if r[k] * r[j] < 0.0 {
                let (a, b) = (face.indices[k], face.indices[j]);
                let index = crossings.get_or_insert_with(a, b, || {
                    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                    let (vl, vh) = (self.mesh.vertex(lo), self.mesh.vertex(hi));
                    let f = classifier.crossing_fraction(&vl, &vh, residuals[lo], residuals[hi]);
                    self.mesh.append_vertex(vl.interpolate(&vh, f).with_set(set))
                });
                let crossing = Node {
                    index,
                    location: Location::Edge(k),
                    on_cut: true,
                };
                kept.push(crossing);
                tossed.push(crossing);
            }
        }

        if let Some(capper) = capper {
            let n = kept.len();
            for i in 0..n {
                let (p, q) = (kept[i], kept[(i + 1) % n]);
                if p.on_cut && q.on_cut {
                    capper.add_face_edge(q.index, p.index, set, face);
                }
            }
        }

        self.mesh.display_mut().remove(fi);
        outcome.faces_added += self.fan(&kept, face, FaceTarget::Display);
        if ghost {
            outcome.faces_added += self.fan(&tossed, face, FaceTarget::Ghost);
        }
    }

    /// Fan-triangulate a convex clipped polygon from the corner that maximises
    /// the smallest triangle area, and append the pieces.
    fn fan(&mut self, polygon: &[Node], parent: &Face, target: FaceTarget) -> usize {
        let n = polygon.len();
        if n < 3 {
            return 0;
        }
        let positions: Vec<Point3<Real>> = polygon.iter().map(|p| self.mesh.vertex(p.index).pos).collect();
        let min_area = |start: usize| {
            (1..n - 1)
                .map(|i| {
                    let (a, b, c) = (positions[start], positions[(start + i) % n], positions[(start + i + 1) % n]);
                    (b - a).cross(&(c - a)).norm_squared()
                })
                .fold(Real::INFINITY, Real::min)
        };
        let mut start = 0;
        let mut best = min_area(0);
        for s in 1..n {
            let area = min_area(s);
            if area > best {
                start = s;
                best = area;
            }
        }

        let edge_check = |p: &Node, q: &Node| -> bool {
            let shared = p.location.edge_mask() & q.location.edge_mask();
            (p.on_cut && q.on_cut && shared == 0) || parent.check & shared != 0
        };
        for i in 1..n - 1 {
            let (a, b, c) = (start, (start + i) % n, (start + i + 1) % n);
            let tri = [&polygon[a], &polygon[b], &polygon[c]];
            let mut check = 0u8;
            // only polygon sides carry check bits, the fan diagonals never do
            if i == 1 && edge_check(tri[0], tri[1]) {
                check |= 0b001;
            }
            if edge_check(tri[1], tri[2]) {
                check |= 0b010;
            }
            if i == n - 2 && edge_check(tri[2], tri[0]) {
                check |= 0b100;
            }
            let face = Face {
                indices: tri.map(|p| p.index),
                check,
                ..*parent
            };
            self.mesh.append_face(face, target);
        }
        n - 2
    }

    /// Crossing segments of every live triangle with the cut, without touching
    /// the mesh.
    pub fn intersection_segments(&self, classifier: &Classifier) -> Vec<[Point3<Real>; 2]> {
        let mesh = &*self.mesh;
        let residuals = classifier.residuals(mesh, &self.config);
        let mut segments = Vec::new();
        for fi in 0..mesh.face_count() {
            let Some(face) = mesh.live_face(fi) else {
                continue;
            };
            let r = face.indices.map(|i| residuals[i]);
            if r.iter().any(|x| x.is_nan()) {
                continue;
            }
            let positive = r.iter().filter(|&&x| x > 0.0).count();
            let negative = r.iter().filter(|&&x| x < 0.0).count();
            if positive == 0 || (negative == 0 && positive != 1) {
                continue;
            }

            let mut ends: Vec<Point3<Real>> = Vec::with_capacity(2);
            for k in 0..3 {
                let j = (k + 1) % 3;
                let (a, b) = (face.indices[k], face.indices[j]);
                if r[k] == 0.0 {
                    ends.push(mesh.vertex(a).pos);
                }
                if r[k] * r[j] < 0.0 {
                    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
                    let (vl, vh) = (mesh.vertex(lo), mesh.vertex(hi));
                    let f = classifier.crossing_fraction(&vl, &vh, residuals[lo], residuals[hi]);
                    ends.push(vl.pos + (vh.pos - vl.pos) * f);
                }
            }
            if let [p, q] = ends[..] {
                segments.push([p, q]);
            }
        }
        segments
    }
}
