use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// An inverted box that any added point turns into a valid one.
    pub fn empty() -> Self {
        Self {
            mins: Point3::new(Real::MAX, Real::MAX, Real::MAX),
            maxs: Point3::new(-Real::MAX, -Real::MAX, -Real::MAX),
        }
    }

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<Real>>,
    {
        let mut bbox = Self::empty();
        for p in points {
            bbox.add_point(p);
        }
        bbox
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y || self.mins.z > self.maxs.z
    }

    pub fn add_point(&mut self, p: &Point3<Real>) {
        self.mins = self.mins.inf(p);
        self.maxs = self.maxs.sup(p);
    }

    /// Grow the box by `margin` on every side.
    pub fn with_margin(&self, margin: Real) -> Self {
        let m = Vector3::repeat(margin);
        Self::new(self.mins - m, self.maxs + m)
    }

    #[inline]
    pub fn extents(&self) -> Vector3<Real> {
        self.maxs - self.mins
    }

    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.maxs.x >= other.mins.x
            && self.mins.x <= other.maxs.x
            && self.maxs.y >= other.mins.y
            && self.mins.y <= other.maxs.y
            && self.maxs.z >= other.mins.z
            && self.mins.z <= other.maxs.z
    }

    #[inline]
    pub fn contains(&self, p: &Point3<Real>) -> bool {
        p.x >= self.mins.x
            && p.x <= self.maxs.x
            && p.y >= self.mins.y
            && p.y <= self.maxs.y
            && p.z >= self.mins.z
            && p.z <= self.maxs.z
    }

    #[inline]
    pub fn center(&self) -> Point3<Real> {
        nalgebra::center(&self.mins, &self.maxs)
    }

    /// The eight corners, bit `k` of the index choosing `maxs` along axis `k`.
    pub fn corners(&self) -> [Point3<Real>; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { self.mins.x } else { self.maxs.x },
                if i & 2 == 0 { self.mins.y } else { self.maxs.y },
                if i & 4 == 0 { self.mins.z } else { self.maxs.z },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_from_points() {
        let points = [Point3::new(1.0, -2.0, 0.5), Point3::new(-1.0, 3.0, 0.0)];
        let bbox = Aabb::from_points(&points);
        assert_eq!(bbox.mins, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.maxs, Point3::new(1.0, 3.0, 0.5));
        assert!(Aabb::empty().is_empty());
        assert!(!bbox.is_empty());
    }

    #[test]
    fn corners_span_the_box() {
        let bbox = Aabb::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0)).with_margin(1.0);
        let corners = bbox.corners();
        assert_eq!(corners[0], Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(corners[7], Point3::new(2.0, 3.0, 4.0));
        assert!(corners.iter().all(|c| bbox.contains(c)));
        assert_eq!(Aabb::from_points(&corners), bbox);
    }
}
