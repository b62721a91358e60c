//! End-to-end tests of the smoothing operators on synthetic meshes.
//!
//! The fixtures cover the operator families: a unit tetrahedron subdivided
//! around one interior node and a hexagonal fan of near-regular cells for
//! the volume operators, a ring of four boundary triangles around one face
//! node on a flat plane for the surface operators, and a straight geometry
//! edge for the curve search.

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector2};

use tet_geom::{DerivativeOrder, GeometryBackend, PlanarEdge, PlanarFace, PlanarGeometry};
use tet_metric::{
    min_face_area_uv, node_aspect_ratio, node_face_mean_ratio, node_volume, tet_aspect_ratio,
};
use tet_smooth::{SmoothEngine, SmoothError, SmoothOutcome, SmoothParams};
use tet_types::{Class, Node, TetMesh, Vector3};

/// The unit tetrahedron split into four cells around an interior node at
/// `apex`. All four sub-cells are positively oriented while `apex` stays
/// inside. Returns the mesh and the interior node index.
fn star_tet(apex: Point3<f64>) -> (TetMesh, usize) {
    let mut mesh = TetMesh::new();
    let a = mesh.add_node(Node::with_class(Point3::new(0.0, 0.0, 0.0), Class::Corner));
    let b = mesh.add_node(Node::with_class(Point3::new(1.0, 0.0, 0.0), Class::Corner));
    let c = mesh.add_node(Node::with_class(Point3::new(0.0, 1.0, 0.0), Class::Corner));
    let d = mesh.add_node(Node::with_class(Point3::new(0.0, 0.0, 1.0), Class::Corner));
    let p = mesh.add_node(Node::interior(apex));
    mesh.add_cell([p, b, c, d]);
    mesh.add_cell([a, p, c, d]);
    mesh.add_cell([a, b, p, d]);
    mesh.add_cell([a, b, c, p]);
    (mesh, p)
}

/// Six tetrahedra sharing the axis edge between an interior node at
/// `interior` and a fixed apex, fanning around a hexagonal ring in the
/// z = 0 plane. With the interior node at `(0, 0, -0.5)` every edge is
/// within fifteen percent of unit length, so all six cells are
/// near-regular. Returns the mesh and the interior node index.
fn hex_ring(interior: Point3<f64>) -> (TetMesh, usize) {
    let mut mesh = TetMesh::new();
    let p = mesh.add_node(Node::interior(interior));
    let q = mesh.add_node(Node::with_class(Point3::new(0.0, 0.0, 0.5), Class::Corner));
    let radius = 3.0_f64.sqrt() / 2.0;
    let mut ring = [0; 6];
    for (i, corner) in ring.iter_mut().enumerate() {
        let angle = std::f64::consts::FRAC_PI_3 * i as f64;
        *corner = mesh.add_node(Node::with_class(
            Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0),
            Class::Corner,
        ));
    }
    for i in 0..6 {
        let j = (i + 1) % 6;
        mesh.add_cell([p, ring[i], ring[j], q]);
    }
    (mesh, p)
}

/// Aspect ratio of each cell incident to `node`, in incidence order.
fn cell_aspect_ratios(mesh: &TetMesh, node: usize) -> Vec<f64> {
    mesh.node_cells(node)
        .iter()
        .map(|&cell| {
            let corners = mesh.cell(cell).unwrap().nodes.map(|n| mesh.xyz(n).unwrap());
            tet_aspect_ratio(&corners)
        })
        .collect()
}

/// A ring of four boundary triangles around one face node on the plane
/// x = 0, where `(u, v)` maps to `(y, z)`. The ring corners sit at unit
/// distance; every triangle has positive parametric area while the center
/// stays inside the ring. Returns the mesh, the backend, and the center
/// node index.
fn plane_ring(center_uv: Vector2<f64>) -> (TetMesh, PlanarGeometry, usize) {
    let mut geom = PlanarGeometry::new();
    geom.add_face(PlanarFace::x_plane(1, 0.0));

    let mut mesh = TetMesh::new();
    let center_xyz = Point3::new(0.0, center_uv.x, center_uv.y);
    let center = mesh.add_node(Node::with_class(center_xyz, Class::OnFace(1)));
    let ring_uv = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]];
    let mut ring = [0; 4];
    for (i, uv) in ring_uv.iter().enumerate() {
        let xyz = Point3::new(0.0, uv[0], uv[1]);
        ring[i] = mesh.add_node(Node::with_class(xyz, Class::Corner));
    }
    let c_uv = [center_uv.x, center_uv.y];
    for i in 0..4 {
        let j = (i + 1) % 4;
        mesh.add_face([center, ring[i], ring[j]], 1, [c_uv, ring_uv[i], ring_uv[j]]);
    }
    (mesh, geom, center)
}

/// A straight geometry edge along x with three nodes at t = 0, 1, 4; the
/// middle node starts three times closer to one neighbor than the other.
fn uneven_edge() -> (TetMesh, PlanarGeometry, usize) {
    let mut geom = PlanarGeometry::new();
    geom.add_edge(PlanarEdge {
        id: 2,
        origin: Point3::new(0.0, 0.0, 0.0),
        direction: Vector3::new(1.0, 0.0, 0.0),
    });

    let mut mesh = TetMesh::new();
    let a = mesh.add_node(Node::with_class(Point3::new(0.0, 0.0, 0.0), Class::Corner));
    let b = mesh.add_node(Node::with_class(Point3::new(1.0, 0.0, 0.0), Class::OnEdge(2)));
    let c = mesh.add_node(Node::with_class(Point3::new(4.0, 0.0, 0.0), Class::Corner));
    mesh.add_edge([a, b], 2, [0.0, 1.0]);
    mesh.add_edge([b, c], 2, [1.0, 4.0]);
    (mesh, geom, b)
}

#[test]
fn test_interior_lp_improves_perturbed_node() {
    let (mut mesh, p) = star_tet(Point3::new(0.05, 0.05, 0.05));
    let before = node_aspect_ratio(&mesh, p).unwrap();
    let geom = PlanarGeometry::new();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let outcome = engine.smooth_node(p).unwrap();

    assert_eq!(outcome, SmoothOutcome::Moved);
    let after = node_aspect_ratio(&mesh, p).unwrap();
    assert!(after > before, "aspect ratio {before} -> {after}");
    assert!(node_volume(&mesh, p).unwrap() > 0.0);
}

#[test]
fn test_interior_lp_keeps_ring_neighbors_healthy() {
    // off-axis start squashes the cells on one side of the fan; every cell
    // starts at or below its near-regular quality
    let (mut mesh, p) = hex_ring(Point3::new(0.25, 0.1, -0.5));
    let before = cell_aspect_ratios(&mesh, p);
    let worst_before = node_aspect_ratio(&mesh, p).unwrap();
    let geom = PlanarGeometry::new();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let outcome = engine.smooth_node(p).unwrap();
    assert_eq!(outcome, SmoothOutcome::Moved);

    assert!(node_aspect_ratio(&mesh, p).unwrap() > worst_before);
    // raising the worst cell must not trade the healthy cells away
    let after = cell_aspect_ratios(&mesh, p);
    for (cell, (a, b)) in after.iter().zip(&before).enumerate() {
        assert!(*a >= *b - 0.05, "cell {cell} regressed: {b} -> {a}");
    }
}

#[test]
fn test_untangle_volume_equalizes_inverted_star() {
    // apex outside the outer tetrahedron, so one sub-cell is inverted
    let (mut mesh, p) = star_tet(Point3::new(0.6, 0.6, 0.6));
    assert!(node_volume(&mesh, p).unwrap() < 0.0);
    let geom = PlanarGeometry::new();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    engine.untangle_volume(p, 0, false).unwrap();

    // the equalized volumes split the invariant total, a quarter of 1/6
    let worst = node_volume(&mesh, p).unwrap();
    assert_relative_eq!(worst, 1.0 / 24.0, epsilon = 1e-10);
}

#[test]
fn test_untangle_volume_rejects_boundary_node() {
    let (mut mesh, _) = star_tet(Point3::new(0.25, 0.25, 0.25));
    let geom = PlanarGeometry::new();
    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    assert!(matches!(
        engine.untangle_volume(0, 0, false),
        Err(SmoothError::NotInterior(0))
    ));
}

#[test]
fn test_relax_negative_cells_repairs_mesh() {
    let (mut mesh, p) = star_tet(Point3::new(0.6, 0.6, 0.6));
    let geom = PlanarGeometry::new();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let repaired = engine.relax_negative_cells().unwrap();

    assert!(repaired > 0);
    assert!(node_volume(&mesh, p).unwrap() > 0.0);
}

#[test]
fn test_smart_laplacian_centers_star_node() {
    let (mut mesh, p) = star_tet(Point3::new(0.1, 0.2, 0.15));
    let before = node_aspect_ratio(&mesh, p).unwrap();
    let geom = PlanarGeometry::new();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let outcome = engine.smart_laplacian(p).unwrap();

    assert_eq!(outcome, SmoothOutcome::Moved);
    // the centroid of the neighbor ring is the outer corner average
    assert_relative_eq!(
        mesh.xyz(p).unwrap(),
        Point3::new(0.25, 0.25, 0.25),
        epsilon = 1e-12
    );
    assert!(node_aspect_ratio(&mesh, p).unwrap() >= before);
}

#[test]
fn test_smart_laplacian_keeps_better_position() {
    // already at the neighbor centroid; the retried position is identical,
    // so the guard must not report a regression
    let (mut mesh, p) = star_tet(Point3::new(0.25, 0.25, 0.25));
    let geom = PlanarGeometry::new();
    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    engine.smart_laplacian(p).unwrap();
    assert_relative_eq!(mesh.xyz(p).unwrap(), Point3::new(0.25, 0.25, 0.25));
}

#[test]
fn test_line_search_equalizes_edge_node() {
    let (mut mesh, geom, b) = uneven_edge();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let outcome = engine.smooth_node(b).unwrap();
    assert_eq!(outcome, SmoothOutcome::Moved);

    // the node slid toward the far neighbor but not past the midpoint
    let t = mesh.node_t(b, 2).unwrap();
    assert!(t > 1.0 && t <= 2.0, "t = {t}");
    // position and parameter stay synchronized
    assert_relative_eq!(mesh.xyz(b).unwrap(), Point3::new(t, 0.0, 0.0));
}

#[test]
fn test_line_search_rejects_corner_pair_mismatch() {
    let (mut mesh, mut geom, _) = uneven_edge();
    geom.add_edge(PlanarEdge {
        id: 3,
        origin: Point3::new(0.0, 0.0, 0.0),
        direction: Vector3::new(0.0, 1.0, 0.0),
    });
    // a node whose two segments lie on different geometry edges
    let x = mesh.add_node(Node::with_class(Point3::new(5.0, 0.0, 0.0), Class::OnEdge(2)));
    let y = mesh.add_node(Node::with_class(Point3::new(5.0, 1.0, 0.0), Class::Corner));
    let z = mesh.add_node(Node::with_class(Point3::new(6.0, 0.0, 0.0), Class::Corner));
    mesh.add_edge([x, z], 2, [5.0, 6.0]);
    mesh.add_edge([x, y], 3, [0.0, 1.0]);

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    assert!(matches!(
        engine.line_search_t(x),
        Err(SmoothError::NotOnSingleEdge(_))
    ));
}

#[test]
fn test_surface_lp_improves_ring_node() {
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.3, 0.2));
    let before = node_face_mean_ratio(&mesh, center).unwrap();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let outcome = engine.smooth_node(center).unwrap();
    assert_eq!(outcome, SmoothOutcome::Moved);

    let after = node_face_mean_ratio(&mesh, center).unwrap();
    assert!(after > before, "mean ratio {before} -> {after}");

    // the committed position is the forward evaluation of the committed uv
    let uv = mesh.node_uv(center, 1).unwrap();
    let eval = geom.eval_on_face(1, &uv, DerivativeOrder::None).unwrap();
    assert_relative_eq!(mesh.xyz(center).unwrap(), eval.xyz, epsilon = 1e-12);
}

#[test]
fn test_volume_only_params_pin_surface_nodes() {
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.3, 0.2));
    let uv_before = mesh.node_uv(center, 1).unwrap();

    let mut engine = SmoothEngine::with_params(&mut mesh, &geom, SmoothParams::volume_only());
    let outcome = engine.smooth_node(center).unwrap();

    assert_eq!(outcome, SmoothOutcome::Unchanged);
    assert_relative_eq!(mesh.node_uv(center, 1).unwrap(), uv_before);
}

#[test]
fn test_simplex_raises_min_parametric_area() {
    // strongly off-center: the worst triangle is thin but not yet folded
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.9, 0.0));
    let reversed = |id: usize| geom.reversed_face_normal(id);
    let before = min_face_area_uv(&mesh, center, reversed).unwrap();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let outcome = engine.smooth_face_area_uv(center).unwrap();
    assert_eq!(outcome, SmoothOutcome::Moved);

    let after = min_face_area_uv(&mesh, center, reversed).unwrap();
    assert!(after > before, "min area {before} -> {after}");
}

#[test]
fn test_simplex_restarts_never_lower_min_area() {
    // each pass commits the best simplex vertex, and the starting point is
    // always a vertex, so the minimum area is non-decreasing call to call
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.9, 0.0));
    let reversed = |id: usize| geom.reversed_face_normal(id);

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let mut last = min_face_area_uv(engine.mesh(), center, reversed).unwrap();
    for pass in 0..3 {
        engine.smooth_face_area_uv(center).unwrap();
        let area = min_face_area_uv(engine.mesh(), center, reversed).unwrap();
        assert!(area >= last, "pass {pass} lowered min area: {last} -> {area}");
        last = area;
    }
}

#[test]
fn test_untangle_area_uv_recovers_folded_ring() {
    // center outside the ring: two triangles are folded in the parameter
    // plane
    let (mut mesh, geom, center) = plane_ring(Vector2::new(1.2, 0.0));
    let reversed = |id: usize| geom.reversed_face_normal(id);
    assert!(min_face_area_uv(&mesh, center, reversed).unwrap() < 0.0);

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    engine.untangle_area_uv(center, 0, false).unwrap();

    assert!(min_face_area_uv(&mesh, center, reversed).unwrap() > 0.0);
    // position committed through the geometry, not just the parameter
    let uv = mesh.node_uv(center, 1).unwrap();
    assert_relative_eq!(
        mesh.xyz(center).unwrap(),
        Point3::new(0.0, uv.x, uv.y),
        epsilon = 1e-12
    );
}

#[test]
fn test_untangle_area_uv_needs_three_triangles() {
    let mut geom = PlanarGeometry::new();
    geom.add_face(PlanarFace::x_plane(1, 0.0));
    let mut mesh = TetMesh::new();
    let c = mesh.add_node(Node::with_class(Point3::origin(), Class::OnFace(1)));
    let r0 = mesh.add_node(Node::with_class(Point3::new(0.0, 1.0, 0.0), Class::Corner));
    let r1 = mesh.add_node(Node::with_class(Point3::new(0.0, 0.0, 1.0), Class::Corner));
    mesh.add_face([c, r0, r1], 1, [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    assert!(matches!(
        engine.untangle_area_uv(c, 0, false),
        Err(SmoothError::Infeasible {
            needed: 3,
            usable: 1
        })
    ));
}

#[test]
fn test_ghost_nodes_are_refused() {
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.3, 0.2));
    mesh.node_mut(center).unwrap().ghost = true;
    mesh.node_mut(center).unwrap().local = false;

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    assert!(matches!(
        engine.untangle_area_uv(center, 0, true),
        Err(SmoothError::GhostNode(_))
    ));
}

#[test]
fn test_evaluate_face_at_uv_syncs_position() {
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.0, 0.0));
    let target = Vector2::new(0.25, -0.5);

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    engine.evaluate_face_at_uv(center, &target).unwrap();

    assert_relative_eq!(mesh.xyz(center).unwrap(), Point3::new(0.0, 0.25, -0.5));
    assert_relative_eq!(mesh.node_uv(center, 1).unwrap(), target);
}

#[test]
fn test_projection_displacement_is_a_dry_run() {
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.3, 0.2));
    // knock the node off its plane without touching the parameter
    let off = Point3::new(0.5, 0.3, 0.2);
    mesh.set_xyz(center, off).unwrap();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    let displacement = engine.projection_displacement(center).unwrap();

    assert_relative_eq!(displacement, Vector3::new(-0.5, 0.0, 0.0), epsilon = 1e-12);
    // the query must not have moved the node
    assert_relative_eq!(mesh.xyz(center).unwrap(), off);
}

#[test]
fn test_project_node_returns_to_surface() {
    let (mut mesh, geom, center) = plane_ring(Vector2::new(0.3, 0.2));
    mesh.set_xyz(center, Point3::new(0.7, 0.4, -0.1)).unwrap();

    let mut engine = SmoothEngine::new(&mut mesh, &geom);
    engine.project_node(center).unwrap();

    assert_relative_eq!(mesh.xyz(center).unwrap(), Point3::new(0.0, 0.4, -0.1));
    assert_relative_eq!(
        mesh.node_uv(center, 1).unwrap(),
        Vector2::new(0.4, -0.1),
        epsilon = 1e-12
    );
}
