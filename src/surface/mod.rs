//! **Host meshes**
//!
//! The slicer and capper never own geometry. They work through [`MeshStore`],
//! the narrow interface a host mesh exposes: indexed vertex and triangle
//! access, append-only growth, and two membership sets. `display` holds the
//! live triangles (or the live vertices of a point cloud); `ghost` holds the
//! triangles tossed by a ghost-mode slice.
//!
//! [`SurfaceMesh`] is the stock implementation.

pub mod element_set;
pub mod shapes;
pub mod topology;
pub mod vertex;

use crate::aabb::Aabb;
use crate::errors::SlabError;
use crate::float_types::Real;
use nalgebra::Point3;
use std::fmt::Debug;
use std::sync::OnceLock;

pub use element_set::ElementSet;
pub use vertex::SurfaceVertex;

/// A triangle of a host mesh.
///
/// Bit `k` of `check` marks edge `(indices[k], indices[k + 1])` as a real mesh
/// edge (as opposed to an internal diagonal) for mesh-line rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub indices: [usize; 3],
    pub check: u8,
    pub contour: Option<u32>,
    pub color: u32,
}

impl Face {
    pub const fn new(indices: [usize; 3]) -> Self {
        Self {
            indices,
            check: 0b111,
            contour: None,
            color: 0,
        }
    }

    pub const fn with_check(mut self, check: u8) -> Self {
        self.check = check;
        self
    }

    pub const fn with_contour(mut self, contour: u32) -> Self {
        self.contour = Some(contour);
        self
    }

    pub const fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Directed edges in winding order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..3).map(|k| (self.indices[k], self.indices[(k + 1) % 3]))
    }
}

/// Which membership set a newly appended triangle joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceTarget {
    Display,
    Ghost,
}

/// Mesh storage the slicing engine reads and grows.
///
/// Vertex and face indices are stable: slicing only appends, and removal is
/// expressed by clearing membership bits.
pub trait MeshStore {
    fn vertex_count(&self) -> usize;
    fn face_count(&self) -> usize;
    fn vertex(&self, index: usize) -> SurfaceVertex;
    fn set_position(&mut self, index: usize, pos: Point3<Real>);
    fn face(&self, index: usize) -> Option<Face>;
    /// Append a vertex and return its index.
    fn append_vertex(&mut self, vertex: SurfaceVertex) -> usize;
    /// Append a triangle, add it to `target` and return its index.
    fn append_face(&mut self, face: Face, target: FaceTarget) -> usize;
    fn display(&self) -> &ElementSet;
    fn display_mut(&mut self) -> &mut ElementSet;
    fn ghost(&self) -> &ElementSet;
    fn ghost_mut(&mut self) -> &mut ElementSet;
    fn set_bounding_box(&mut self, bbox: Aabb);

    /// Whether this mesh accepts slab operations at all.
    fn slab_enabled(&self) -> bool {
        true
    }

    /// Remember the pre-slab state the first time a slab is applied. Returns
    /// `false` when the mesh has neither vertices nor faces.
    fn begin_slab(&mut self) -> bool;

    /// Drop everything appended by slabs and show every original element again.
    fn reset_slab(&mut self);

    /// Append a description of an applied slab to the mesh's slab history.
    fn record_slab(&mut self, description: String);

    /// The face at `index` if it is displayed and none of its vertex values is NaN.
    fn live_face(&self, index: usize) -> Option<Face> {
        if !self.display().contains(index) {
            return None;
        }
        let face = self.face(index)?;
        face.indices
            .iter()
            .all(|&v| v < self.vertex_count() && self.vertex(v).is_valid())
            .then_some(face)
    }
}

#[derive(Debug, Clone, Default)]
struct SlabState {
    /// Vertex and face counts before the first slab.
    base: Option<(usize, usize)>,
    history: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SurfaceMesh<S: Clone + Debug = ()> {
    pub vertices: Vec<SurfaceVertex>,
    pub faces: Vec<Face>,
    display: ElementSet,
    ghost: ElementSet,
    slab: SlabState,
    /// Meshes with slabbing disabled ignore every slab operation.
    pub slab_enabled: bool,

    /// Lazily calculated AABB that spans `vertices`, or the box set by the last fold.
    pub bounding_box: OnceLock<Aabb>,

    /// Metadata
    pub metadata: Option<S>,
}

impl<S: Clone + Debug> Default for SurfaceMesh<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Debug> SurfaceMesh<S> {
    pub fn new() -> Self {
        SurfaceMesh {
            vertices: Vec::new(),
            faces: Vec::new(),
            display: ElementSet::new(),
            ghost: ElementSet::new(),
            slab: SlabState::default(),
            slab_enabled: true,
            bounding_box: OnceLock::new(),
            metadata: None,
        }
    }

    /// Triangle mesh from positions and index triples, all faces displayed and
    /// all values zero.
    pub fn from_triangles(
        positions: &[Point3<Real>],
        triangles: &[[usize; 3]],
    ) -> Result<Self, SlabError> {
        let mut mesh = Self::new();
        mesh.vertices = positions
            .iter()
            .map(|&p| SurfaceVertex::new(p, 0.0))
            .collect();
        for &indices in triangles {
            if let Some(&index) = indices.iter().find(|&&i| i >= positions.len()) {
                return Err(SlabError::VertexOutOfRange {
                    index,
                    count: positions.len(),
                });
            }
            if indices[0] == indices[1] || indices[1] == indices[2] || indices[0] == indices[2] {
                return Err(SlabError::InvalidFace(indices));
            }
            mesh.faces.push(Face::new(indices));
        }
        mesh.display = ElementSet::full(mesh.faces.len());
        Ok(mesh)
    }

    /// Point cloud: no faces, every vertex displayed.
    pub fn from_points(positions: &[Point3<Real>]) -> Self {
        let mut mesh = Self::new();
        mesh.vertices = positions
            .iter()
            .map(|&p| SurfaceVertex::new(p, 0.0))
            .collect();
        mesh.display = ElementSet::full(mesh.vertices.len());
        mesh
    }

    pub fn with_metadata(mut self, metadata: S) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Assign every vertex value from its position.
    pub fn with_values<F>(mut self, field: F) -> Self
    where
        F: Fn(&Point3<Real>) -> Real,
    {
        for v in &mut self.vertices {
            v.value = field(&v.pos);
        }
        self
    }

    /// Assign every vertex the same set id.
    pub fn with_set(mut self, set: u32) -> Self {
        for v in &mut self.vertices {
            v.set = set;
        }
        self
    }

    /// Faces that are displayed and have no NaN vertex value.
    pub fn live_faces(&self) -> impl Iterator<Item = (usize, Face)> + '_ {
        self.display
            .iter()
            .filter(|&i| i < self.faces.len())
            .filter_map(|i| self.live_face(i).map(|f| (i, f)))
    }

    /// Total area of the live faces.
    pub fn live_area(&self) -> Real {
        self.live_faces()
            .map(|(_, f)| {
                let [a, b, c] = f.indices.map(|i| self.vertices[i].pos);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Descriptions of the slabs applied since the last reset.
    pub fn slab_history(&self) -> &[String] {
        &self.slab.history
    }

    /// Returns the stored bounding box, computing it over all vertices if unset.
    pub fn bounding_box(&self) -> Aabb {
        *self
            .bounding_box
            .get_or_init(|| Aabb::from_points(self.vertices.iter().map(|v| &v.pos)))
    }

    /// Drop hidden faces and the vertices no live face references, remapping
    /// indices. Ghost membership and the slab reset point are discarded, so a
    /// compacted mesh starts a fresh slab history.
    ///
    /// For a point cloud, hidden vertices are dropped instead.
    pub fn compact(&mut self) {
        if self.faces.is_empty() {
            let kept: Vec<SurfaceVertex> = self
                .display
                .iter()
                .filter_map(|i| self.vertices.get(i).copied())
                .collect();
            self.vertices = kept;
            self.display = ElementSet::full(self.vertices.len());
        } else {
            let live: Vec<Face> = self.live_faces().map(|(_, f)| f).collect();
            let mut remap: Vec<Option<usize>> = vec![None; self.vertices.len()];
            let mut vertices = Vec::new();
            let faces = live
                .into_iter()
                .map(|mut face| {
                    for idx in &mut face.indices {
                        let old = *idx;
                        *idx = match remap[old] {
                            Some(new) => new,
                            None => {
                                vertices.push(self.vertices[old]);
                                remap[old] = Some(vertices.len() - 1);
                                vertices.len() - 1
                            },
                        };
                    }
                    face
                })
                .collect::<Vec<_>>();
            log::debug!(
                "compacted mesh: {} -> {} faces, {} -> {} vertices",
                self.faces.len(),
                faces.len(),
                self.vertices.len(),
                vertices.len()
            );
            self.vertices = vertices;
            self.faces = faces;
            self.display = ElementSet::full(self.faces.len());
        }
        self.ghost.clear();
        self.slab = SlabState::default();
        self.bounding_box = OnceLock::new();
    }

    fn display_everything(&mut self) {
        self.display = if self.faces.is_empty() {
            ElementSet::full(self.vertices.len())
        } else {
            ElementSet::full(self.faces.len())
        };
    }
}

impl<S: Clone + Debug> MeshStore for SurfaceMesh<S> {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn vertex(&self, index: usize) -> SurfaceVertex {
        self.vertices[index]
    }

    fn set_position(&mut self, index: usize, pos: Point3<Real>) {
        self.vertices[index].pos = pos;
        self.bounding_box = OnceLock::new();
    }

    fn face(&self, index: usize) -> Option<Face> {
        self.faces.get(index).copied()
    }

    fn append_vertex(&mut self, vertex: SurfaceVertex) -> usize {
        self.vertices.push(vertex);
        self.bounding_box = OnceLock::new();
        self.vertices.len() - 1
    }

    fn append_face(&mut self, face: Face, target: FaceTarget) -> usize {
        self.faces.push(face);
        let index = self.faces.len() - 1;
        match target {
            FaceTarget::Display => self.display.insert(index),
            FaceTarget::Ghost => self.ghost.insert(index),
        }
        index
    }

    fn display(&self) -> &ElementSet {
        &self.display
    }

    fn display_mut(&mut self) -> &mut ElementSet {
        &mut self.display
    }

    fn ghost(&self) -> &ElementSet {
        &self.ghost
    }

    fn ghost_mut(&mut self) -> &mut ElementSet {
        &mut self.ghost
    }

    fn set_bounding_box(&mut self, bbox: Aabb) {
        self.bounding_box = OnceLock::from(bbox);
    }

    fn slab_enabled(&self) -> bool {
        self.slab_enabled
    }

    fn begin_slab(&mut self) -> bool {
        if self.slab.base.is_none() {
            self.slab.base = Some((self.vertices.len(), self.faces.len()));
        }
        !(self.vertices.is_empty() && self.faces.is_empty())
    }

    fn reset_slab(&mut self) {
        if let Some((vertex_count, face_count)) = self.slab.base.take() {
            self.vertices.truncate(vertex_count);
            self.faces.truncate(face_count);
        }
        self.display_everything();
        self.ghost.clear();
        self.slab.history.clear();
        self.bounding_box = OnceLock::new();
    }

    fn record_slab(&mut self, description: String) {
        self.slab.history.push(description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SurfaceMesh {
        SurfaceMesh::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .expect("valid quad")
    }

    #[test]
    fn rejects_bad_faces() {
        let pts = [Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(
            SurfaceMesh::<()>::from_triangles(&pts, &[[0, 1, 2]]).unwrap_err(),
            SlabError::VertexOutOfRange { index: 2, count: 2 }
        );
        assert_eq!(
            SurfaceMesh::<()>::from_triangles(&pts, &[[0, 1, 1]]).unwrap_err(),
            SlabError::InvalidFace([0, 1, 1])
        );
    }

    #[test]
    fn nan_value_hides_face() {
        let mut mesh = quad();
        mesh.vertices[3].value = Real::NAN;
        let live: Vec<usize> = mesh.live_faces().map(|(i, _)| i).collect();
        assert_eq!(live, vec![0]);
    }

    #[test]
    fn compact_drops_hidden_faces_and_orphans() {
        let mut mesh = quad();
        mesh.display_mut().remove(1);
        mesh.compact();
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces[0].indices, [0, 1, 2]);
    }

    #[test]
    fn reset_restores_pre_slab_state() {
        let mut mesh = quad();
        assert!(mesh.begin_slab());
        let v = mesh.append_vertex(SurfaceVertex::new(Point3::new(0.5, 0.5, 0.0), 0.0));
        mesh.append_face(Face::new([0, 1, v]), FaceTarget::Display);
        mesh.display_mut().remove(0);
        mesh.record_slab("slab plane".to_string());

        mesh.reset_slab();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.display().len(), 2);
        assert!(mesh.slab_history().is_empty());
    }
}
