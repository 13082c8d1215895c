//! **Vertex classification**
//!
//! A [`Classifier`] turns every vertex into a signed residual: positive means
//! the vertex is kept, negative that it is cut away, and zero that it lies on
//! the cut. Residuals are computed once per slice, then snapped to zero within
//! [`SlabConfig::residual_epsilon`].

use crate::config::SlabConfig;
use crate::float_types::Real;
use crate::plane::Plane;
use crate::surface::{MeshStore, SurfaceVertex};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Classifier {
    /// Keep the side the plane normal points to.
    Plane(Plane),
    /// Distance to the nearest of `points`. A positive `distance` keeps what is
    /// within it, a negative one keeps what is farther than `|distance|`.
    WithinPoints {
        points: Vec<Point3<Real>>,
        distance: Real,
    },
    /// Keep vertices whose value is at least the threshold.
    MinValue(Real),
    /// Keep vertices whose value is at most the threshold.
    MaxValue(Real),
    /// Keep vertices whose external datum is at least `threshold`. Vertices
    /// without a datum are never tested.
    Data { values: Vec<Real>, threshold: Real },
    /// Keep vertices generated by one of the listed source elements.
    Sources(BTreeSet<u32>),
}

impl Classifier {
    /// Distance classifier against the live vertices of another mesh.
    pub fn near_mesh<M: MeshStore + ?Sized>(other: &M, distance: Real) -> Self {
        let points: Vec<Point3<Real>> = if other.face_count() == 0 {
            other
                .display()
                .iter()
                .filter(|&i| i < other.vertex_count())
                .map(|i| other.vertex(i))
                .filter(SurfaceVertex::is_valid)
                .map(|v| v.pos)
                .collect()
        } else {
            let mut used = vec![false; other.vertex_count()];
            for fi in other.display().iter() {
                if let Some(face) = other.live_face(fi) {
                    for i in face.indices {
                        used[i] = true;
                    }
                }
            }
            used.iter()
                .enumerate()
                .filter(|&(_, &u)| u)
                .map(|(i, _)| other.vertex(i).pos)
                .collect()
        };
        Classifier::WithinPoints { points, distance }
    }

    pub fn plane(&self) -> Option<&Plane> {
        match self {
            Classifier::Plane(plane) => Some(plane),
            _ => None,
        }
    }

    /// Raw (unsnapped) residual of vertex `index`. NaN for a vertex that must
    /// not be tested.
    pub fn residual(&self, index: usize, vertex: &SurfaceVertex) -> Real {
        if !vertex.is_valid() {
            return Real::NAN;
        }
        match self {
            Classifier::Plane(plane) => plane.signed_distance(&vertex.pos),
            Classifier::WithinPoints { points, distance } => {
                let d = nearest_distance(points, &vertex.pos);
                if *distance > 0.0 {
                    distance - d
                } else {
                    d - distance.abs()
                }
            },
            Classifier::MinValue(t) => vertex.value - t,
            Classifier::MaxValue(t) => t - vertex.value,
            Classifier::Data { values, threshold } => {
                values.get(index).map_or(Real::NAN, |v| v - threshold)
            },
            Classifier::Sources(sources) => match vertex.source {
                Some(s) if sources.contains(&s) => 1.0,
                _ => -1.0,
            },
        }
    }

    /// Snapped residuals of every vertex of `mesh`.
    #[cfg(not(feature = "parallel"))]
    pub fn residuals<M: MeshStore + ?Sized>(&self, mesh: &M, config: &SlabConfig) -> Vec<Real> {
        (0..mesh.vertex_count())
            .map(|i| config.snap_residual(self.residual(i, &mesh.vertex(i))))
            .collect()
    }

    /// Snapped residuals of every vertex of `mesh`, computed in parallel.
    #[cfg(feature = "parallel")]
    pub fn residuals<M: MeshStore + ?Sized>(&self, mesh: &M, config: &SlabConfig) -> Vec<Real> {
        let vertices: Vec<SurfaceVertex> = (0..mesh.vertex_count()).map(|i| mesh.vertex(i)).collect();
        vertices
            .par_iter()
            .enumerate()
            .map(|(i, v)| config.snap_residual(self.residual(i, v)))
            .collect()
    }

    /// Fraction along `a -> b` where the residual crosses zero, given residuals
    /// of opposite sign.
    ///
    /// Distance classifiers solve for the point whose distance to the nearest
    /// centre equals the threshold, treating both endpoints as measured from
    /// the same centre. Everything else interpolates linearly.
    pub fn crossing_fraction(&self, a: &SurfaceVertex, b: &SurfaceVertex, ra: Real, rb: Real) -> Real {
        let linear = ra / (ra - rb);
        let fraction = match self {
            Classifier::WithinPoints { distance, .. } => {
                spherical_fraction(a, b, ra, rb, *distance).unwrap_or(linear)
            },
            _ => linear,
        };
        if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Normal of the cut, pointing towards the discarded side, when the
    /// classifier defines one.
    pub fn cut_normal(&self) -> Option<Vector3<Real>> {
        self.plane().map(|p| -p.normal())
    }
}

fn nearest_distance(points: &[Point3<Real>], p: &Point3<Real>) -> Real {
    points
        .iter()
        .map(|c| (p - c).norm())
        .fold(Real::INFINITY, Real::min)
}

/// Root in `[0, 1]` of `|a + f (b - a) - c| = R`, using the law of cosines on
/// the endpoint distances `da`, `db` (recovered from the residuals) and the
/// edge length.
fn spherical_fraction(a: &SurfaceVertex, b: &SurfaceVertex, ra: Real, rb: Real, distance: Real) -> Option<Real> {
    let radius = distance.abs();
    let (da, db) = if distance > 0.0 {
        (distance - ra, distance - rb)
    } else {
        (ra + radius, rb + radius)
    };
    let length = (b.pos - a.pos).norm();
    if !(length > Real::EPSILON) || !da.is_finite() || !db.is_finite() {
        return None;
    }
    let (ra, rb, r) = (da / length, db / length, radius / length);
    let q = ra * ra - rb * rb + 1.0;
    let p = 4.0 * (r * r - ra * ra);
    let root = (q * q + p).max(0.0).sqrt();
    let f = if ra < rb { (q + root) / 2.0 } else { (q - root) / 2.0 };
    f.is_finite().then_some(f)
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classifier::Plane(plane) => {
                let n = plane.normal();
                write!(f, "plane {{{} {} {} {}}}", n.x, n.y, n.z, plane.offset())
            },
            Classifier::WithinPoints { points, distance } => {
                write!(f, "within {} of {} points", distance, points.len())
            },
            Classifier::MinValue(t) => write!(f, "value >= {}", t),
            Classifier::MaxValue(t) => write!(f, "value <= {}", t),
            Classifier::Data { values, threshold } => {
                write!(f, "data >= {} ({} values)", threshold, values.len())
            },
            Classifier::Sources(sources) => {
                let ids: Vec<String> = sources.iter().map(u32::to_string).collect();
                write!(f, "sources [{}]", ids.join(" "))
            },
        }
    }
}
