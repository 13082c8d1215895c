//! Closed test surfaces with outward (counter-clockwise from outside) winding.

use super::SurfaceMesh;
use crate::errors::SlabError;
use crate::float_types::Real;
use nalgebra::Point3;
use std::f64::consts::{PI, TAU};
use std::fmt::Debug;

impl<S: Clone + Debug> SurfaceMesh<S> {
    /// Mesh from raw coordinates and triangular faces.
    pub fn polyhedron(points: &[[Real; 3]], faces: &[[usize; 3]]) -> Result<Self, SlabError> {
        let positions: Vec<Point3<Real>> =
            points.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();
        Self::from_triangles(&positions, faces)
    }

    /// A single triangle.
    pub fn triangle(a: Point3<Real>, b: Point3<Real>, c: Point3<Real>) -> Self {
        let mut mesh = Self::new();
        mesh.vertices = [a, b, c]
            .into_iter()
            .map(|p| super::SurfaceVertex::new(p, 0.0))
            .collect();
        mesh.faces.push(super::Face::new([0, 1, 2]));
        mesh.display_everything();
        mesh
    }

    /// Axis-aligned box centred on the origin, each quad face split in two.
    ///
    /// ```text
    ///       4-------5
    ///      /|      /|
    ///     7-------6 |
    ///     | 0-----|-1
    ///     |/      |/
    ///     3-------2
    /// ```
    pub fn cuboid(width: Real, length: Real, height: Real) -> Self {
        let (hx, hy, hz) = (width / 2.0, length / 2.0, height / 2.0);
        let points = [
            [-hx, -hy, -hz],
            [hx, -hy, -hz],
            [hx, hy, -hz],
            [-hx, hy, -hz],
            [-hx, -hy, hz],
            [hx, -hy, hz],
            [hx, hy, hz],
            [-hx, hy, hz],
        ];
        let quads = [
            [0, 3, 2, 1], // bottom (-Z)
            [4, 5, 6, 7], // top (+Z)
            [0, 1, 5, 4], // front (-Y)
            [3, 7, 6, 2], // back (+Y)
            [0, 4, 7, 3], // left (-X)
            [1, 2, 6, 5], // right (+X)
        ];
        let faces: Vec<[usize; 3]> = quads
            .iter()
            .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
            .collect();
        let positions: Vec<Point3<Real>> =
            points.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();
        let mut mesh = Self::new();
        mesh.vertices = positions
            .iter()
            .map(|&p| super::SurfaceVertex::new(p, 0.0))
            .collect();
        mesh.faces = faces.into_iter().map(super::Face::new).collect();
        mesh.display_everything();
        mesh
    }

    pub fn cube(width: Real) -> Self {
        Self::cuboid(width, width, width)
    }

    /// Regular octahedron with vertices on the axes at distance `radius`.
    pub fn octahedron(radius: Real) -> Self {
        let r = radius;
        let points = [
            [r, 0.0, 0.0],
            [-r, 0.0, 0.0],
            [0.0, r, 0.0],
            [0.0, -r, 0.0],
            [0.0, 0.0, r],
            [0.0, 0.0, -r],
        ];
        let faces = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [5, 2, 0],
            [5, 1, 2],
            [5, 3, 1],
            [5, 0, 3],
        ];
        let positions: Vec<Point3<Real>> =
            points.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();
        let mut mesh = Self::new();
        mesh.vertices = positions
            .iter()
            .map(|&p| super::SurfaceVertex::new(p, 0.0))
            .collect();
        mesh.faces = faces.into_iter().map(super::Face::new).collect();
        mesh.display_everything();
        mesh
    }

    /// **UV sphere with shared poles**
    ///
    /// `segments` slices around the Y axis and `stacks` bands from pole to pole.
    /// Each vertex value is set to its distance from the origin, so the mesh is
    /// also a convenient scalar-field fixture.
    pub fn sphere(radius: Real, segments: usize, stacks: usize) -> Self {
        let segments = segments.max(3);
        let stacks = stacks.max(2);
        let mut points = vec![Point3::new(0.0, radius, 0.0)];
        for j in 1..stacks {
            let phi = (j as f64 / stacks as f64 * PI) as Real;
            let y = radius * phi.cos();
            let ring_radius = radius * phi.sin();
            for i in 0..segments {
                let theta = (i as f64 / segments as f64 * TAU) as Real;
                points.push(Point3::new(
                    ring_radius * theta.cos(),
                    y,
                    ring_radius * theta.sin(),
                ));
            }
        }
        points.push(Point3::new(0.0, -radius, 0.0));

        let north = 0;
        let south = points.len() - 1;
        let mut faces = Vec::new();
        for i in 0..segments {
            let next = (i + 1) % segments;
            faces.push([north, 1 + next, 1 + i]);
        }
        for j in 1..stacks - 1 {
            let ring = 1 + (j - 1) * segments;
            let next_ring = 1 + j * segments;
            for i in 0..segments {
                let next = (i + 1) % segments;
                let (v1, v2) = (ring + i, ring + next);
                let (v3, v4) = (next_ring + i, next_ring + next);
                faces.push([v1, v2, v3]);
                faces.push([v2, v4, v3]);
            }
        }
        let last_ring = 1 + (stacks - 2) * segments;
        for i in 0..segments {
            let next = (i + 1) % segments;
            faces.push([last_ring + i, last_ring + next, south]);
        }

        let mut mesh = Self::new();
        mesh.vertices = points
            .iter()
            .map(|&p| super::SurfaceVertex::new(p, p.coords.norm()))
            .collect();
        mesh.faces = faces.into_iter().map(super::Face::new).collect();
        mesh.display_everything();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shapes_are_closed() {
        let cube: SurfaceMesh = SurfaceMesh::cube(2.0);
        let octa: SurfaceMesh = SurfaceMesh::octahedron(1.0);
        let sphere: SurfaceMesh = SurfaceMesh::sphere(1.0, 12, 6);
        for mesh in [cube, octa, sphere] {
            let report = mesh.analyze_topology(None);
            assert!(report.is_closed(), "{:?}", report);
        }
    }

    #[test]
    fn sphere_faces_point_outward() {
        let sphere: SurfaceMesh = SurfaceMesh::sphere(1.0, 12, 6);
        for face in &sphere.faces {
            let [a, b, c] = face.indices.map(|i| sphere.vertices[i].pos);
            let centroid = (a.coords + b.coords + c.coords) / 3.0;
            assert!((b - a).cross(&(c - a)).dot(&centroid) > 0.0, "{:?}", face.indices);
        }
    }

    #[test]
    fn cube_area() {
        let cube: SurfaceMesh = SurfaceMesh::cube(2.0);
        assert_relative_eq!(cube.live_area(), 24.0, epsilon = 1e-9);
    }
}
