mod support;

use isoslab::{CapVertexMode, Classifier, MeshStore, Plane, SlabConfig, Slicer, SurfaceMesh, float_types::Real};
use nalgebra::{Point3, Vector3};
use support::*;

fn keep_below_half_x() -> Classifier {
    Classifier::Plane(Plane::from_normal(-Vector3::x(), 0.5))
}

#[test]
fn triangle_cut_by_plane() {
    let mut mesh = unit_triangle();
    let outcome = Slicer::new(&mut mesh)
        .slice(&keep_below_half_x(), false)
        .expect("slice");

    assert!(outcome.sliced);
    assert_eq!(outcome.split, 1);
    assert_eq!(outcome.vertices_added, 2);
    assert_eq!(mesh.live_faces().count(), 2);

    let added = new_positions(&mesh, 3);
    assert_eq!(added.len(), 2);
    assert!(contains_point(&added, Point3::new(0.5, 0.0, 0.0), 1e-12));
    assert!(contains_point(&added, Point3::new(0.5, 0.5, 0.0), 1e-12));
    assert!(approx_eq(mesh.live_area(), 0.375, 1e-12));
}

#[test]
fn two_edge_boundary_gives_no_cap() {
    let mut mesh = unit_triangle();
    let outcome = Slicer::new(&mut mesh)
        .slice(&keep_below_half_x(), true)
        .expect("slice");
    let cap = outcome.cap.expect("cap attempted");
    assert!(!cap.is_capped());
    assert!(outcome.boundary_edges < 3);
    assert_eq!(mesh.live_faces().count(), 2);
}

#[test]
fn plane_missing_the_mesh_changes_nothing() {
    let mut mesh: SurfaceMesh = SurfaceMesh::cube(2.0);
    let (faces, vertices) = (mesh.faces.len(), mesh.vertices.len());
    let far = Classifier::Plane(Plane::from_normal(-Vector3::x(), 5.0));
    let outcome = Slicer::new(&mut mesh).slice(&far, true).expect("slice");

    assert_eq!(outcome.kept, faces);
    assert_eq!(outcome.split, 0);
    assert_eq!(mesh.faces.len(), faces);
    assert_eq!(mesh.vertices.len(), vertices);
    assert_eq!(mesh.live_faces().count(), faces);
}

#[test]
fn shared_edge_is_cut_once() {
    let mut mesh: SurfaceMesh = SurfaceMesh::from_triangles(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        &[[0, 1, 2], [0, 2, 3]],
    )
    .expect("quad");
    let outcome = Slicer::new(&mut mesh)
        .slice(&keep_below_half_x(), false)
        .expect("slice");

    // edges 0-1, 0-2 (shared diagonal) and 2-3
    assert_eq!(outcome.vertices_added, 3);
    assert!(approx_eq(mesh.live_area(), 0.5, 1e-12));
    let report = mesh.analyze_topology(None);
    assert_eq!(report.non_manifold_edges, 0);
    assert_eq!(report.connected_components, 1);
}

#[test]
fn kept_vertices_are_on_the_kept_side() {
    let mut mesh: SurfaceMesh = SurfaceMesh::sphere(1.0, 24, 12);
    let plane = Plane::from_point_normal(&Point3::new(0.1, 0.2, -0.05), Vector3::new(1.0, 2.0, 3.0));
    let classifier = Classifier::Plane(plane);
    Slicer::new(&mut mesh).slice(&classifier, false).expect("slice");

    assert!(min_live_residual(&mesh, &classifier) > -1e-4);
    let report = mesh.analyze_topology(None);
    assert_eq!(report.non_manifold_edges, 0);
    assert_eq!(report.inconsistent_edges, 0);
    assert!(report.boundary_edges > 0);
}

#[test]
fn capped_cube_is_closed() {
    let mut mesh: SurfaceMesh = SurfaceMesh::cube(2.0);
    let plane = Plane::from_point_normal(&Point3::new(0.0, 0.0, 0.25), Vector3::new(0.3, -0.2, -1.0));
    let config = SlabConfig::default().with_cap_vertices(CapVertexMode::Share);
    let outcome = Slicer::with_config(&mut mesh, config)
        .slice(&Classifier::Plane(plane), true)
        .expect("slice");

    let cap = outcome.cap.expect("cap");
    assert!(cap.is_capped());
    assert!(cap.unrecovered_edges.is_empty());
    let report = mesh.analyze_topology(None);
    assert!(report.is_closed(), "{:?}", report);
    assert_eq!(report.connected_components, 1);
}

#[test]
fn capped_sphere_is_closed_after_welding() {
    let mut mesh: SurfaceMesh = SurfaceMesh::sphere(1.0, 20, 10);
    let plane = Plane::from_normal(Vector3::new(0.0, -1.0, 0.0), 0.3);
    let outcome = Slicer::new(&mut mesh)
        .slice(&Classifier::Plane(plane), true)
        .expect("slice");

    let cap = outcome.cap.expect("cap");
    assert!(cap.is_capped());
    // copied cap vertices sit exactly on the boundary vertices
    assert!(mesh.analyze_topology(Some(1e-9)).is_closed());
    assert!(mesh.analyze_topology(None).boundary_edges > 0);
}

#[test]
fn distance_cut_lands_on_the_sphere() {
    let mut mesh: SurfaceMesh = SurfaceMesh::sphere(1.0, 24, 12);
    let count = mesh.vertices.len();
    let pole = Point3::new(0.0, 1.0, 0.0);
    let classifier = Classifier::WithinPoints {
        points: vec![pole],
        distance: 0.8,
    };
    Slicer::new(&mut mesh).slice(&classifier, false).expect("slice");

    let added = new_positions(&mesh, count);
    assert!(!added.is_empty());
    for p in added {
        assert!(approx_eq((p - pole).norm(), 0.8, 1e-9));
    }
    assert!(min_live_residual(&mesh, &classifier) > -1e-4);
}

#[test]
fn value_threshold_interpolates_values() {
    let mut mesh: SurfaceMesh = SurfaceMesh::sphere(1.0, 16, 8).with_values(|p| p.y);
    let count = mesh.vertices.len();
    Slicer::new(&mut mesh)
        .slice(&Classifier::MinValue(0.1), false)
        .expect("slice");
    for v in &mesh.vertices[count..] {
        assert!(approx_eq(v.value, 0.1, 1e-9));
        assert!(approx_eq(v.pos.y, 0.1, 1e-9));
    }
}

#[test]
fn nan_faces_are_not_tested() {
    let mut mesh = unit_triangle();
    mesh.vertices[1].value = Real::NAN;
    let outcome = Slicer::new(&mut mesh)
        .slice(&keep_below_half_x(), false)
        .expect("slice");
    assert_eq!(outcome.split + outcome.kept + outcome.discarded, 0);
    assert_eq!(mesh.faces.len(), 1);
    assert!(mesh.display().contains(0));
}

#[test]
fn fully_discarded_face_is_hidden() {
    let mut mesh = unit_triangle();
    let beyond = Classifier::Plane(Plane::from_normal(Vector3::x(), -5.0));
    let outcome = Slicer::new(&mut mesh).slice(&beyond, false).expect("slice");
    assert_eq!(outcome.discarded, 1);
    assert_eq!(mesh.live_faces().count(), 0);
    assert!(mesh.ghost().is_empty());
}

#[test]
fn ghost_slice_keeps_both_sides() {
    let mut mesh: SurfaceMesh = SurfaceMesh::octahedron(1.0);
    let area = mesh.live_area();
    Slicer::new(&mut mesh)
        .slice_ghost(&Classifier::Plane(Plane::from_normal(-Vector3::x(), 0.25)))
        .expect("slice");

    let ghost_area: Real = mesh
        .ghost()
        .iter()
        .map(|i| {
            let [a, b, c] = mesh.faces[i].indices.map(|v| mesh.vertices[v].pos);
            (b - a).cross(&(c - a)).norm() * 0.5
        })
        .sum();
    assert!(!mesh.ghost().is_empty());
    assert!(approx_eq(mesh.live_area() + ghost_area, area, 1e-9));
}

#[test]
fn point_cloud_hides_discarded_points() {
    let mut mesh: SurfaceMesh = SurfaceMesh::from_points(&[
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.4, 0.0, 0.0),
        Point3::new(0.6, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
    ]);
    mesh.vertices[1].value = Real::NAN;
    let outcome = Slicer::new(&mut mesh)
        .slice(&keep_below_half_x(), false)
        .expect("slice");
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.discarded, 3);
    assert_eq!(mesh.display().iter().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn source_selection_keeps_listed_fragments() {
    let mut mesh: SurfaceMesh = SurfaceMesh::octahedron(1.0);
    for (i, v) in mesh.vertices.iter_mut().enumerate() {
        *v = v.with_source(if i == 5 { 2 } else { 1 });
    }
    let classifier = Classifier::Sources([1].into_iter().collect());
    Slicer::new(&mut mesh).slice(&classifier, false).expect("slice");
    // the four lower faces touch vertex 5 and are cut halfway down their edges
    let box_ = bounding_box(&mesh);
    assert!(approx_eq(box_[2], -0.5, 1e-12));
    assert!(approx_eq(box_[5], 1.0, 1e-12));
}

#[test]
fn intersection_segments_leave_the_mesh_alone() {
    let mut mesh = unit_triangle();
    let slicer = Slicer::new(&mut mesh);
    let segments = slicer.intersection_segments(&keep_below_half_x());
    assert_eq!(segments.len(), 1);
    let ends = segments[0].to_vec();
    assert!(contains_point(&ends, Point3::new(0.5, 0.0, 0.0), 1e-12));
    assert!(contains_point(&ends, Point3::new(0.5, 0.5, 0.0), 1e-12));
    drop(slicer);
    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.faces.len(), 1);
}

#[test]
fn cube_section_segments_form_the_outline() {
    let mut mesh: SurfaceMesh = SurfaceMesh::cube(2.0);
    let slicer = Slicer::new(&mut mesh);
    let segments = slicer.intersection_segments(&Classifier::Plane(Plane::from_normal(Vector3::z(), 0.0)));
    // every side face contributes two segments (one per triangle)
    assert_eq!(segments.len(), 8);
    let length: Real = segments.iter().map(|[p, q]| (q - p).norm()).sum();
    assert!(approx_eq(length, 8.0, 1e-12));
}

#[test]
fn cut_along_an_existing_face_stays_closed() {
    let mut mesh: SurfaceMesh = SurfaceMesh::cube(2.0);
    let faces = mesh.faces.len();
    let config = SlabConfig::default().with_cap_vertices(CapVertexMode::Share);
    let outcome = Slicer::with_config(&mut mesh, config)
        .slice(&Classifier::Plane(Plane::from_normal(-Vector3::z(), 1.0)), true)
        .expect("slice");

    // the top face lies on the plane and is kept, so there is nothing to cap
    assert!(!outcome.cap.expect("cap attempted").is_capped());
    assert_eq!(mesh.faces.len(), faces);
    let report = mesh.analyze_topology(None);
    assert!(report.is_closed(), "{:?}", report);
}

#[test]
fn cap_faces_take_the_surface_contour_and_colour() {
    let mut mesh: SurfaceMesh = SurfaceMesh::cube(2.0);
    for face in &mut mesh.faces {
        *face = face.with_contour(3).with_color(0x00ff00);
    }
    let faces = mesh.faces.len();
    let outcome = Slicer::new(&mut mesh)
        .slice(&Classifier::Plane(Plane::from_normal(-Vector3::z(), 0.0)), true)
        .expect("slice");

    assert!(outcome.cap.expect("cap").is_capped());
    assert!(mesh.faces.len() > faces);
    for (_, face) in mesh.live_faces() {
        assert_eq!(face.contour, Some(3));
        assert_eq!(face.color, 0x00ff00);
    }
}
