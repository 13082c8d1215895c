//! **Surface vertices**
//!
//! Besides its position, a vertex of a sliced isosurface carries the scalar
//! field value it was generated at (NaN marks a vertex that must never be
//! slab-tested), the id of the source element it came from, and the id of
//! the vertex set (surface fragment) it belongs to.

use crate::float_types::Real;
use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceVertex {
    pub pos: Point3<Real>,
    pub value: Real,
    pub source: Option<u32>,
    pub set: u32,
}

impl SurfaceVertex {
    /// Create a new vertex with a sanitized position. The value is kept as is:
    /// NaN is meaningful there.
    #[inline]
    pub const fn new(mut pos: Point3<Real>, value: Real) -> Self {
        let [[x, y, z]]: &mut [[_; 3]; 1] = &mut pos.coords.data.0;
        if !x.is_finite() {
            *x = 0.0;
        }
        if !y.is_finite() {
            *y = 0.0;
        }
        if !z.is_finite() {
            *z = 0.0;
        }

        SurfaceVertex {
            pos,
            value,
            source: None,
            set: 0,
        }
    }

    #[inline]
    pub const fn with_source(mut self, source: u32) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub const fn with_set(mut self, set: u32) -> Self {
        self.set = set;
        self
    }

    /// A vertex is testable when its value is a number.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        !self.value.is_nan()
    }

    /// Point at fraction `t` from `self` towards `other`. Position and value are
    /// interpolated linearly; the source id comes from the nearer endpoint and
    /// the set id from `self`.
    pub fn interpolate(&self, other: &SurfaceVertex, t: Real) -> SurfaceVertex {
        let pos = self.pos + (other.pos - self.pos) * t;
        let value = self.value + (other.value - self.value) * t;
        SurfaceVertex {
            source: if t <= 0.5 { self.source } else { other.source },
            ..SurfaceVertex::new(pos, value).with_set(self.set)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_positions_are_zeroed() {
        let v = SurfaceVertex::new(Point3::new(Real::NAN, 1.0, Real::INFINITY), Real::NAN);
        assert_eq!(v.pos, Point3::new(0.0, 1.0, 0.0));
        assert!(!v.is_valid());
    }

    #[test]
    fn interpolation_takes_nearer_source() {
        let a = SurfaceVertex::new(Point3::origin(), 0.0).with_source(1).with_set(4);
        let b = SurfaceVertex::new(Point3::new(2.0, 0.0, 0.0), 10.0).with_source(2);
        let near_a = a.interpolate(&b, 0.25);
        assert_eq!(near_a.pos, Point3::new(0.5, 0.0, 0.0));
        assert_eq!(near_a.value, 2.5);
        assert_eq!(near_a.source, Some(1));
        assert_eq!(near_a.set, 4);
        assert_eq!(a.interpolate(&b, 0.75).source, Some(2));
    }
}
