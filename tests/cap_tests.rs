mod support;

use isoslab::{
    CapVertexMode, Capper, Classifier, Plane, SlabConfig, SlabError, Slicer, StuckPolicy, SurfaceMesh,
    float_types::Real,
};
use nalgebra::{Point3, Vector3};
use support::approx_eq;

fn flat_mesh(points: &[[Real; 2]]) -> SurfaceMesh {
    let positions: Vec<Point3<Real>> = points.iter().map(|&[x, y]| Point3::new(x, y, 0.0)).collect();
    SurfaceMesh::from_points(&positions)
}

fn loop_edges(range: std::ops::Range<usize>) -> Vec<(usize, usize)> {
    let n = range.len();
    let start = range.start;
    (0..n).map(|i| (start + i, start + (i + 1) % n)).collect()
}

fn share() -> SlabConfig {
    SlabConfig::default().with_cap_vertices(CapVertexMode::Share)
}

/// Each boundary edge is a side, in its own direction, of exactly one cap face.
fn assert_closes(mesh: &SurfaceMesh, edges: &[(usize, usize)]) {
    for &(a, b) in edges {
        let uses = mesh
            .faces
            .iter()
            .filter(|f| f.edges().any(|e| e == (a, b)))
            .count();
        assert_eq!(uses, 1, "boundary edge {} -> {} used {} times", a, b, uses);
        let reversed = mesh.faces.iter().filter(|f| f.edges().any(|e| e == (b, a))).count();
        assert_eq!(reversed, 0, "boundary edge {} -> {} used backwards", a, b);
    }
}

fn cap(mesh: &mut SurfaceMesh, edges: &[(usize, usize)], config: SlabConfig) -> isoslab::CapOutcome {
    let mut capper = Capper::new(config);
    for &(a, b) in edges {
        capper.add_edge(a, b, 0);
    }
    capper.create_cap(mesh, None).expect("cap")
}

#[test]
fn square_loop() {
    let mut mesh = flat_mesh(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    let edges = loop_edges(0..4);
    let outcome = cap(&mut mesh, &edges, share());
    assert_eq!(outcome.triangles, 2);
    assert_eq!(outcome.steiner_points, 0);
    assert_closes(&mesh, &edges);
    assert!(approx_eq(mesh.live_area(), 1.0, 1e-12));
}

#[test]
fn square_with_a_point_on_one_side() {
    let mesh = flat_mesh(&[[0.0, 0.0], [0.5, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    let edges = loop_edges(0..5);
    for delaunay in [true, false] {
        let mut mesh = mesh.clone();
        let outcome = cap(&mut mesh, &edges, share().with_delaunay(delaunay));
        assert!(outcome.unrecovered_edges.is_empty());
        // the side point is inserted onto the existing edge, no Steiner point needed
        assert_eq!(outcome.steiner_points, 0);
        assert_eq!(outcome.triangles, 3);
        assert_closes(&mesh, &edges);
        assert!(approx_eq(mesh.live_area(), 1.0, 1e-12));
        assert_eq!(mesh.analyze_topology(None).non_manifold_edges, 0);
    }
}

#[test]
fn concave_outline() {
    // an L made of three unit squares
    let mut mesh = flat_mesh(&[[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]]);
    let edges = loop_edges(0..6);
    let outcome = cap(&mut mesh, &edges, share());
    assert!(outcome.unrecovered_edges.is_empty());
    assert_eq!(outcome.steiner_points, 0);
    assert_eq!(outcome.triangles, 4);
    assert_closes(&mesh, &edges);
    assert!(approx_eq(mesh.live_area(), 3.0, 1e-12));
}

#[test]
fn reversed_inner_loop_is_a_hole() {
    let mut mesh = flat_mesh(&[
        [0.0, 0.0],
        [1.0, 0.0],
        [1.0, 1.0],
        [0.0, 1.0],
        [0.25, 0.25],
        [0.25, 0.75],
        [0.75, 0.75],
        [0.75, 0.25],
    ]);
    let mut edges = loop_edges(0..4);
    edges.extend(loop_edges(4..8));
    let outcome = cap(&mut mesh, &edges, share());
    assert!(outcome.unrecovered_edges.is_empty());
    assert_closes(&mesh, &edges);
    assert!(approx_eq(mesh.live_area(), 0.75, 1e-12));
    let report = mesh.analyze_topology(None);
    assert_eq!(report.boundary_edges, 8);
    assert_eq!(report.non_manifold_edges, 0);
}

#[test]
fn cap_follows_the_boundary_plane() {
    // a square tilted out of every coordinate plane
    let frame = isoslab::PlaneFrame::from_axes(
        Point3::new(1.0, 2.0, 3.0),
        Vector3::new(1.0, 1.0, 0.0),
        Vector3::new(1.0, -1.0, 2.0),
    );
    let positions: Vec<Point3<Real>> = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [0.0, 1.0]]
        .iter()
        .map(|&[x, y]| frame.to_world(&Point3::new(x, y, 0.0)))
        .collect();
    let mut mesh: SurfaceMesh = SurfaceMesh::from_points(&positions);
    let edges = loop_edges(0..4);
    let outcome = cap(&mut mesh, &edges, share());
    assert_eq!(outcome.triangles, 2);
    assert!(approx_eq(mesh.live_area(), 2.0, 1e-9));
    for face in &mesh.faces {
        let [a, b, c] = face.indices.map(|i| mesh.vertices[i].pos);
        let n = (b - a).cross(&(c - a));
        assert!(n.dot(&frame.normal()) > 0.0);
    }
}

#[test]
fn fewer_than_three_edges() {
    let mut mesh = flat_mesh(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
    let outcome = cap(&mut mesh, &[(0, 1), (1, 2)], share());
    assert!(!outcome.is_capped());
    assert!(mesh.faces.is_empty());
}

#[test]
fn out_of_range_edge_is_rejected() {
    let mut mesh = flat_mesh(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
    let mut capper = Capper::new(SlabConfig::default());
    for (a, b) in [(0, 1), (1, 2), (2, 7)] {
        capper.add_edge(a, b, 0);
    }
    assert_eq!(
        capper.create_cap(&mut mesh, None).unwrap_err(),
        SlabError::VertexOutOfRange { index: 7, count: 3 }
    );
}

#[test]
fn cap_vertices_carry_the_edge_set() {
    let mut mesh = flat_mesh(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    let mut capper = Capper::new(SlabConfig::default());
    for (a, b) in [(0, 1), (1, 2), (2, 0)] {
        capper.add_edge(a, b, 9);
    }
    let outcome = capper.create_cap(&mut mesh, None).expect("cap");
    assert_eq!(outcome.triangles, 1);
    assert_eq!(outcome.vertices_added, 3);
    assert!(mesh.vertices[3..].iter().all(|v| v.set == 9));
    assert_eq!(mesh.faces[0].check, 0b111);
}

#[test]
fn without_delaunay_the_cap_still_closes() {
    let mut mesh = flat_mesh(&[
        [0.0, 0.0],
        [3.0, 0.0],
        [3.0, 0.2],
        [2.0, 0.2],
        [2.0, 2.0],
        [1.0, 2.0],
        [1.0, 0.2],
        [0.0, 0.2],
    ]);
    let edges = loop_edges(0..8);
    let config = share().with_delaunay(false).with_stuck_policy(StuckPolicy::Fail);
    let outcome = cap(&mut mesh, &edges, config);
    assert!(outcome.unrecovered_edges.is_empty());
    assert!(approx_eq(mesh.live_area(), 0.6 + 1.8, 1e-9));
    let report = mesh.analyze_topology(None);
    assert_eq!(report.boundary_edges, 8 + outcome.split_edges);
}

#[test]
fn sliced_solids_close_with_shared_vertices() {
    let cases: Vec<(SurfaceMesh, Plane)> = vec![
        (SurfaceMesh::octahedron(1.0), Plane::from_normal(Vector3::new(0.2, 0.1, -1.0), 0.15)),
        (SurfaceMesh::cube(2.0), Plane::from_normal(Vector3::new(1.0, 1.0, 1.0), 0.4)),
        (SurfaceMesh::sphere(1.0, 18, 9), Plane::from_normal(Vector3::new(0.5, -1.0, 0.25), 0.2)),
    ];
    for (mut mesh, plane) in cases {
        let outcome = Slicer::with_config(&mut mesh, share())
            .slice(&Classifier::Plane(plane), true)
            .expect("slice");
        let cap = outcome.cap.expect("cap");
        assert!(cap.is_capped());
        assert!(cap.unrecovered_edges.is_empty());
        let report = mesh.analyze_topology(None);
        assert!(report.is_closed(), "{:?}", report);
    }
}
