//! **Slab orchestration**
//!
//! A [`Slab`] is a named, replayable cut: one or more slices (or a periodic
//! fold) applied together and recorded in the mesh's slab history. Applying
//! [`SlabKind::None`] restores the mesh to its state before the first slab.

use super::{Classifier, FoldOutcome, Lattice, SliceOutcome, Slicer};
use crate::aabb::Aabb;
use crate::errors::SlabError;
use crate::float_types::Real;
use crate::plane::Plane;
use crate::surface::MeshStore;
use nalgebra::Point3;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SlabKind {
    /// Drop every slab applied so far.
    None,
    Plane(Plane),
    /// Keep the inside of a box.
    Box(Aabb),
    Within {
        points: Vec<Point3<Real>>,
        distance: Real,
    },
    /// Keep values in `[min, max]`; with `max < min`, keep values outside
    /// `(max, min)` instead.
    Range { min: Real, max: Real },
    Data { values: Vec<Real>, threshold: Real },
    Sources(BTreeSet<u32>),
    /// Distance to the vertices of another mesh, as gathered by
    /// [`Classifier::near_mesh`].
    Mesh {
        points: Vec<Point3<Real>>,
        distance: Real,
    },
    Brillouin(Option<Lattice>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    pub kind: SlabKind,
    pub cap: bool,
    pub ghost: bool,
}

impl Slab {
    pub const fn new(kind: SlabKind) -> Self {
        Slab {
            kind,
            cap: false,
            ghost: false,
        }
    }

    pub fn with_cap(mut self, cap: bool) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_ghost(mut self, ghost: bool) -> Self {
        self.ghost = ghost;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlabOutcome {
    /// The mesh was restored to its pre-slab state.
    Reset,
    /// Slabs are disabled for this mesh, or it is empty.
    Skipped,
    Sliced(Vec<SliceOutcome>),
    Folded(FoldOutcome),
}

impl<M: MeshStore + ?Sized> Slicer<'_, M> {
    /// Apply `slab` and record it in the mesh's slab history. Ghost slabs and
    /// periodic folds never cap.
    pub fn slab(&mut self, slab: &Slab) -> Result<SlabOutcome, SlabError> {
        if !self.mesh.slab_enabled() {
            return Ok(SlabOutcome::Skipped);
        }
        if slab.kind == SlabKind::None {
            self.mesh.reset_slab();
            log::info!("slab reset");
            return Ok(SlabOutcome::Reset);
        }
        if !self.mesh.begin_slab() {
            return Ok(SlabOutcome::Skipped);
        }

        let (cap, ghost) = (slab.cap && !slab.ghost, slab.ghost);
        let outcome = match &slab.kind {
            SlabKind::None => SlabOutcome::Reset,
            SlabKind::Plane(plane) => {
                SlabOutcome::Sliced(vec![self.slice_with(&Classifier::Plane(*plane), cap, ghost)?])
            },
            SlabKind::Box(bbox) => {
                let mut outcomes = Vec::with_capacity(6);
                for plane in Plane::box_faces(bbox) {
                    outcomes.push(self.slice_with(&Classifier::Plane(plane), cap, ghost)?);
                }
                SlabOutcome::Sliced(outcomes)
            },
            SlabKind::Within { points, distance } | SlabKind::Mesh { points, distance } => {
                let classifier = Classifier::WithinPoints {
                    points: points.clone(),
                    distance: *distance,
                };
                SlabOutcome::Sliced(vec![self.slice_with(&classifier, cap, ghost)?])
            },
            SlabKind::Range { min, max } if min <= max => SlabOutcome::Sliced(vec![
                self.slice_with(&Classifier::MinValue(*min), cap, ghost)?,
                self.slice_with(&Classifier::MaxValue(*max), cap, ghost)?,
            ]),
            SlabKind::Range { min, max } => SlabOutcome::Sliced(self.slice_outside(*max, *min, ghost)?),
            SlabKind::Data { values, threshold } => {
                let classifier = Classifier::Data {
                    values: values.clone(),
                    threshold: *threshold,
                };
                SlabOutcome::Sliced(vec![self.slice_with(&classifier, cap, ghost)?])
            },
            SlabKind::Sources(sources) => {
                SlabOutcome::Sliced(vec![self.slice_with(&Classifier::Sources(sources.clone()), cap, ghost)?])
            },
            SlabKind::Brillouin(lattice) => SlabOutcome::Folded(self.fold_to_periodic_cell(lattice.as_ref())?),
        };

        self.mesh.record_slab(slab.to_string());
        Ok(outcome)
    }

    /// Keep `value <= low` together with `value >= high`: each side is cut
    /// from the same starting display set and the two results are merged.
    fn slice_outside(&mut self, low: Real, high: Real, ghost: bool) -> Result<Vec<SliceOutcome>, SlabError> {
        let before = self.mesh.display().clone();
        let below = self.slice_with(&Classifier::MaxValue(low), false, ghost)?;
        let kept_below = self.mesh.display().clone();
        *self.mesh.display_mut() = before;
        let above = self.slice_with(&Classifier::MinValue(high), false, ghost)?;
        self.mesh.display_mut().union_with(&kept_below);
        Ok(vec![below, above])
    }
}

impl fmt::Display for SlabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlabKind::None => write!(f, "none"),
            SlabKind::Plane(plane) => write!(f, "{}", Classifier::Plane(*plane)),
            SlabKind::Box(bbox) => write!(
                f,
                "box {{{} {} {}}} {{{} {} {}}}",
                bbox.mins.x, bbox.mins.y, bbox.mins.z, bbox.maxs.x, bbox.maxs.y, bbox.maxs.z
            ),
            SlabKind::Within { points, distance } => {
                write!(f, "within {} of {} points", distance, points.len())
            },
            SlabKind::Range { min, max } => write!(f, "range {} {}", min, max),
            SlabKind::Data { values, threshold } => {
                write!(f, "data >= {} ({} values)", threshold, values.len())
            },
            SlabKind::Sources(sources) => write!(f, "{}", Classifier::Sources(sources.clone())),
            SlabKind::Mesh { points, distance } => {
                write!(f, "mesh within {} of {} vertices", distance, points.len())
            },
            SlabKind::Brillouin(Some(lattice)) => {
                let [a, b, c] = lattice.vectors;
                write!(
                    f,
                    "brillouin {{{} {} {}}} {{{} {} {}}} {{{} {} {}}}",
                    a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z
                )
            },
            SlabKind::Brillouin(None) => write!(f, "brillouin"),
        }
    }
}

impl fmt::Display for Slab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slab {}", self.kind)?;
        if self.cap {
            write!(f, " cap")?;
        }
        if self.ghost {
            write!(f, " ghost")?;
        }
        Ok(())
    }
}
