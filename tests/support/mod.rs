//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use isoslab::{Classifier, MeshStore, SurfaceMesh, float_types::Real};
use nalgebra::Point3;

/// Returns the approximate bounding box `[min_x, min_y, min_z, max_x, max_y, max_z]`
/// of the vertices used by live faces.
pub fn bounding_box(mesh: &SurfaceMesh) -> [Real; 6] {
    let mut min = [Real::MAX; 3];
    let mut max = [Real::MIN; 3];
    for (_, face) in mesh.live_faces() {
        for &i in &face.indices {
            let p = mesh.vertices[i].pos;
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
    }
    [min[0], min[1], min[2], max[0], max[1], max[2]]
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// The unit right triangle in the XY plane.
pub fn unit_triangle() -> SurfaceMesh {
    SurfaceMesh::triangle(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    )
}

/// Smallest snapped residual over the vertices of live faces.
pub fn min_live_residual(mesh: &SurfaceMesh, classifier: &Classifier) -> Real {
    mesh.live_faces()
        .flat_map(|(_, f)| f.indices)
        .map(|i| classifier.residual(i, &mesh.vertex(i)))
        .fold(Real::INFINITY, Real::min)
}

/// Positions of the vertices appended after the first `count`.
pub fn new_positions(mesh: &SurfaceMesh, count: usize) -> Vec<Point3<Real>> {
    mesh.vertices[count..].iter().map(|v| v.pos).collect()
}

/// Whether `points` contains a point within `eps` of `p`.
pub fn contains_point(points: &[Point3<Real>], p: Point3<Real>, eps: Real) -> bool {
    points.iter().any(|q| (q - p).norm() < eps)
}
