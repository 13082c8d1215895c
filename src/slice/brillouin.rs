//! **Periodic folding into a Wigner–Seitz cell**
//!
//! The cell around a lattice point is bounded by the bisecting planes between
//! that point and its 26 nearest lattice neighbours. Folding slices the mesh
//! against each plane in ghost mode, moves a copy of whatever was cut off back
//! across the cell by the neighbour's lattice offset, and starts over until one
//! full pass moves nothing.

use super::{Classifier, Slicer};
use crate::aabb::Aabb;
use crate::errors::SlabError;
use crate::float_types::Real;
use crate::plane::Plane;
use crate::registry::HashMap;
use crate::surface::{Face, FaceTarget, MeshStore};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    pub origin: Point3<Real>,
    pub vectors: [Vector3<Real>; 3],
}

impl Lattice {
    pub fn new(a: Vector3<Real>, b: Vector3<Real>, c: Vector3<Real>) -> Self {
        Lattice {
            origin: Point3::origin(),
            vectors: [a, b, c],
        }
    }

    pub fn cubic(edge: Real) -> Self {
        Self::new(Vector3::x() * edge, Vector3::y() * edge, Vector3::z() * edge)
    }

    pub fn with_origin(mut self, origin: Point3<Real>) -> Self {
        self.origin = origin;
        self
    }

    /// Signed volume of the cell spanned by the lattice vectors.
    pub fn volume(&self) -> Real {
        let [a, b, c] = self.vectors;
        a.dot(&b.cross(&c))
    }

    /// The 26 offsets `i·a + j·b + k·c` with `i, j, k` in `{-1, 0, 1}`, not all
    /// zero, in lexicographic order of `(i, j, k)`.
    pub fn neighbour_offsets(&self) -> Vec<Vector3<Real>> {
        let [a, b, c] = self.vectors;
        let mut offsets = Vec::with_capacity(26);
        for i in -1..=1 {
            for j in -1..=1 {
                for k in -1..=1 {
                    if (i, j, k) != (0, 0, 0) {
                        offsets.push(a * i as Real + b * j as Real + c * k as Real);
                    }
                }
            }
        }
        offsets
    }

    /// Each neighbour offset with the plane bisecting the origin and that
    /// neighbour, oriented so the origin side is kept.
    pub fn bisecting_planes(&self) -> Vec<(Vector3<Real>, Plane)> {
        self.neighbour_offsets()
            .into_iter()
            .map(|offset| (offset, Plane::bisecting(&self.origin, &(self.origin + offset))))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldOutcome {
    /// Passes over the planes, counting the final clean one.
    pub passes: usize,
    /// Vertices moved (copied and translated, or translated for point clouds).
    pub moved: usize,
    /// Ghost triangles carried back into the cell.
    pub faces_folded: usize,
}

impl<M: MeshStore + ?Sized> Slicer<'_, M> {
    /// Fold the mesh into the Wigner–Seitz cell of `lattice`. `None` does
    /// nothing.
    ///
    /// Returns [`SlabError::FoldDidNotConverge`] once `max_fold_passes` passes
    /// have each moved something, and [`SlabError::DegenerateLattice`] for
    /// lattice vectors that do not span space.
    pub fn fold_to_periodic_cell(&mut self, lattice: Option<&Lattice>) -> Result<FoldOutcome, SlabError> {
        let mut outcome = FoldOutcome::default();
        let Some(lattice) = lattice else {
            return Ok(outcome);
        };
        let volume = lattice.volume();
        let scale: Real = lattice.vectors.iter().map(|v| v.norm()).product();
        if !(volume.abs() > Real::EPSILON * scale) {
            return Err(SlabError::DegenerateLattice(volume));
        }
        if !self.mesh.slab_enabled() {
            return Ok(outcome);
        }

        let planes = lattice.bisecting_planes();
        let point_cloud = self.mesh.face_count() == 0;
        'passes: loop {
            if outcome.passes >= self.config.max_fold_passes {
                log::error!(
                    "periodic fold still moving after {} passes ({} vertices moved)",
                    outcome.passes,
                    outcome.moved
                );
                return Err(SlabError::FoldDidNotConverge {
                    passes: outcome.passes,
                    moved: outcome.moved,
                });
            }
            outcome.passes += 1;
            for (offset, plane) in &planes {
                let moved = if point_cloud {
                    self.fold_points(offset, plane)
                } else {
                    self.fold_faces(offset, plane, &mut outcome)?
                };
                if moved > 0 {
                    log::debug!("pass {}: folded {} vertices across {:?}", outcome.passes, moved, offset);
                    outcome.moved += moved;
                    continue 'passes;
                }
            }
            break;
        }

        self.refresh_bounding_box();
        log::info!(
            "periodic fold: {} passes, {} vertices moved, {} faces folded",
            outcome.passes,
            outcome.moved,
            outcome.faces_folded
        );
        Ok(outcome)
    }

    /// Ghost-slice against `plane` and carry copies of the ghost faces back
    /// by `-offset`. Returns the number of vertex copies made.
    fn fold_faces(
        &mut self,
        offset: &Vector3<Real>,
        plane: &Plane,
        outcome: &mut FoldOutcome,
    ) -> Result<usize, SlabError> {
        self.slice_ghost(&Classifier::Plane(*plane))?;
        let ghosts: Vec<usize> = self.mesh.ghost().iter().collect();
        if ghosts.is_empty() {
            return Ok(0);
        }

        let mut copies: HashMap<usize, usize> = HashMap::new();
        for fi in ghosts {
            let Some(face) = self.mesh.face(fi) else {
                continue;
            };
            let mut indices = [0usize; 3];
            for (slot, &v) in face.indices.iter().enumerate() {
                indices[slot] = match copies.get(&v) {
                    Some(&copy) => copy,
                    None => {
                        let mut vertex = self.mesh.vertex(v);
                        vertex.pos -= *offset;
                        let copy = self.mesh.append_vertex(vertex);
                        copies.insert(v, copy);
                        copy
                    },
                };
            }
            self.mesh.append_face(Face { indices, ..face }, FaceTarget::Display);
            outcome.faces_folded += 1;
        }
        self.mesh.ghost_mut().clear();
        Ok(copies.len())
    }

    /// Translate every displayed point on the far side of `plane` by `-offset`.
    fn fold_points(&mut self, offset: &Vector3<Real>, plane: &Plane) -> usize {
        let displayed: Vec<usize> = self.mesh.display().iter().collect();
        let mut moved = 0;
        for i in displayed {
            let vertex = self.mesh.vertex(i);
            if !vertex.is_valid() {
                continue;
            }
            if self.config.snap_residual(plane.signed_distance(&vertex.pos)) < 0.0 {
                self.mesh.set_position(i, vertex.pos - *offset);
                moved += 1;
            }
        }
        moved
    }

    /// Bounding box over the vertices of live faces (displayed points for a
    /// point cloud).
    pub(crate) fn refresh_bounding_box(&mut self) {
        let mesh = &*self.mesh;
        let mut bbox = Aabb::empty();
        if mesh.face_count() == 0 {
            for i in mesh.display().iter().filter(|&i| i < mesh.vertex_count()) {
                bbox.add_point(&mesh.vertex(i).pos);
            }
        } else {
            for fi in mesh.display().iter() {
                if let Some(face) = mesh.live_face(fi) {
                    for v in face.indices {
                        bbox.add_point(&mesh.vertex(v).pos);
                    }
                }
            }
        }
        self.mesh.set_bounding_box(bbox);
    }
}
