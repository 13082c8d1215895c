//! **Cut planes and planar frames**
//!
//! A [`Plane`] is stored as a unit normal plus a signed offset so that the signed
//! distance of a point is `p·n + offset`. Positive distances are on the side the
//! normal points to, which is the side a slab keeps.
//!
//! A [`PlaneFrame`] is the rigid motion that takes an arbitrary 3D plane onto the
//! XY plane (and back), used to flatten a cross-section before triangulating it.

use crate::aabb::Aabb;
use crate::float_types::Real;
use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Signed offset (plane equation: n·p + offset = 0)
    pub offset: Real,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vector3::z(),
            offset: 0.0,
        }
    }
}

impl Plane {
    /// Build a plane from a (not necessarily unit) normal and the offset that goes
    /// with it, so that `distance = (p·normal + offset) / |normal|`.
    ///
    /// A zero normal is replaced by `+Z` with offset 0.
    pub fn from_normal(normal: Vector3<Real>, offset: Real) -> Self {
        let len = normal.norm();
        if !len.is_finite() || len < Real::EPSILON {
            log::warn!("degenerate plane normal {:?}; using +Z", normal);
            return Self::default();
        }
        Plane {
            normal: normal / len,
            offset: offset / len,
        }
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: &Point3<Real>, normal: Vector3<Real>) -> Self {
        let plane = Self::from_normal(normal, 0.0);
        Plane {
            normal: plane.normal,
            offset: -plane.normal.dot(&point.coords),
        }
    }

    /// Create a plane from three points
    /// The normal direction follows the right-hand rule: (p2-p1) × (p3-p1)
    pub fn from_points(p1: Point3<Real>, p2: Point3<Real>, p3: Point3<Real>) -> Self {
        let normal = (p2 - p1).cross(&(p3 - p1));
        if normal.norm_squared() < Real::EPSILON * Real::EPSILON {
            // Degenerate triangle, return default plane
            return Self::default();
        }
        Self::from_point_normal(&p1, normal)
    }

    /// The perpendicular bisector of `keep` and `toss`, oriented so that `keep`
    /// lies on the positive side.
    pub fn bisecting(keep: &Point3<Real>, toss: &Point3<Real>) -> Self {
        Self::from_point_normal(&nalgebra::center(keep, toss), keep - toss)
    }

    /// The six faces of a box, each oriented with its normal pointing inward, so
    /// slicing by all of them keeps what lies inside.
    pub fn box_faces(bbox: &Aabb) -> [Plane; 6] {
        let (lo, hi) = (bbox.mins, bbox.maxs);
        [
            Plane::from_normal(Vector3::x(), -lo.x),
            Plane::from_normal(-Vector3::x(), hi.x),
            Plane::from_normal(Vector3::y(), -lo.y),
            Plane::from_normal(-Vector3::y(), hi.y),
            Plane::from_normal(Vector3::z(), -lo.z),
            Plane::from_normal(-Vector3::z(), hi.z),
        ]
    }

    #[inline]
    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    #[inline]
    pub const fn offset(&self) -> Real {
        self.offset
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.offset = -self.offset;
    }

    pub fn flipped(mut self) -> Self {
        self.flip();
        self
    }

    #[inline]
    pub fn signed_distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) + self.offset
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Point3<Real>) -> Point3<Real> {
        p - self.normal * self.signed_distance(p)
    }

    /// A frame whose XY plane is this plane, with +Z along the normal.
    pub fn to_xy_frame(&self) -> PlaneFrame {
        let origin = self.project(&Point3::origin());
        PlaneFrame::from_axes(origin, any_perpendicular(&self.normal), self.normal)
    }
}

/// Rigid transform between world space and a local frame whose +Z is a cut normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    isometry: Isometry3<Real>,
}

impl PlaneFrame {
    /// Frame with the given origin, X axis along the part of `x_hint` orthogonal to
    /// `normal`, and Z along `normal`. Degenerate inputs fall back to `+Z` and an
    /// arbitrary perpendicular X.
    pub fn from_axes(origin: Point3<Real>, x_hint: Vector3<Real>, normal: Vector3<Real>) -> Self {
        let z = normal
            .try_normalize(Real::EPSILON)
            .unwrap_or_else(Vector3::z);
        let mut x = x_hint - z * x_hint.dot(&z);
        if x.norm_squared() < Real::EPSILON {
            x = any_perpendicular(&z);
        }
        let x = x.normalize();
        let y = z.cross(&x);

        let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        let isometry = Isometry3::from_parts(
            Translation3::from(origin.coords),
            UnitQuaternion::from_rotation_matrix(&rotation),
        );
        Self { isometry }
    }

    #[inline]
    pub fn to_local(&self, p: &Point3<Real>) -> Point3<Real> {
        self.isometry.inverse_transform_point(p)
    }

    #[inline]
    pub fn to_world(&self, p: &Point3<Real>) -> Point3<Real> {
        self.isometry.transform_point(p)
    }

    /// World-space direction of the local +Z axis.
    pub fn normal(&self) -> Vector3<Real> {
        self.isometry.rotation * Vector3::z()
    }
}

fn any_perpendicular(v: &Vector3<Real>) -> Vector3<Real> {
    let axis = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&axis).normalize()
}
