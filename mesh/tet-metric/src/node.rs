//! Node-level metric aggregation over incident entities.

use nalgebra::{Point3, Vector2};
use tet_types::{MeshResult, TetMesh};

use crate::element::{tet_aspect_ratio, tet_volume, tri_mean_ratio, uv_area};

fn cell_positions(mesh: &TetMesh, cell: usize) -> MeshResult<[Point3<f64>; 4]> {
    let nodes = mesh.cell(cell)?.nodes;
    Ok([
        mesh.xyz(nodes[0])?,
        mesh.xyz(nodes[1])?,
        mesh.xyz(nodes[2])?,
        mesh.xyz(nodes[3])?,
    ])
}

fn face_positions(mesh: &TetMesh, face: usize) -> MeshResult<[Point3<f64>; 3]> {
    let nodes = mesh.face(face)?.nodes;
    Ok([
        mesh.xyz(nodes[0])?,
        mesh.xyz(nodes[1])?,
        mesh.xyz(nodes[2])?,
    ])
}

/// Minimum aspect ratio over the node's incident cells; `+∞` when the node
/// has none.
///
/// # Errors
///
/// Fails when the node index is out of range.
pub fn node_aspect_ratio(mesh: &TetMesh, node: usize) -> MeshResult<f64> {
    mesh.node(node)?;
    let mut min = f64::INFINITY;
    for &cell in mesh.node_cells(node) {
        min = min.min(tet_aspect_ratio(&cell_positions(mesh, cell)?));
    }
    Ok(min)
}

/// Minimum signed volume over the node's incident cells; `+∞` when the
/// node has none.
///
/// # Errors
///
/// Fails when the node index is out of range.
pub fn node_volume(mesh: &TetMesh, node: usize) -> MeshResult<f64> {
    mesh.node(node)?;
    let mut min = f64::INFINITY;
    for &cell in mesh.node_cells(node) {
        min = min.min(tet_volume(&cell_positions(mesh, cell)?));
    }
    Ok(min)
}

/// Minimum mean ratio over the node's incident boundary faces; `+∞` when
/// the node has none.
///
/// # Errors
///
/// Fails when the node index is out of range.
pub fn node_face_mean_ratio(mesh: &TetMesh, node: usize) -> MeshResult<f64> {
    mesh.node(node)?;
    let mut min = f64::INFINITY;
    for &face in mesh.node_faces(node) {
        min = min.min(tri_mean_ratio(&face_positions(mesh, face)?));
    }
    Ok(min)
}

/// Minimum signed parametric area over the node's incident boundary faces,
/// with the sign convention of each owning face applied through `reversed`;
/// `+∞` when the node has none.
///
/// # Errors
///
/// Fails when the node index is out of range.
pub fn min_face_area_uv(
    mesh: &TetMesh,
    node: usize,
    reversed: impl Fn(usize) -> bool,
) -> MeshResult<f64> {
    mesh.node(node)?;
    let mut min = f64::INFINITY;
    for &f in mesh.node_faces(node) {
        let face = mesh.face(f)?;
        let uv0 = Vector2::new(face.uv[0][0], face.uv[0][1]);
        let uv1 = Vector2::new(face.uv[1][0], face.uv[1][1]);
        let uv2 = Vector2::new(face.uv[2][0], face.uv[2][1]);
        let mut area = uv_area(&uv0, &uv1, &uv2);
        if reversed(face.face_id) {
            area = -area;
        }
        min = min.min(area);
    }
    Ok(min)
}

/// Average Cartesian length of the distinct mesh edges touching the node,
/// gathered from its incident cells, faces, and segments. Zero when the
/// node has no neighbors.
///
/// # Errors
///
/// Fails when the node index is out of range.
pub fn average_edge_length(mesh: &TetMesh, node: usize) -> MeshResult<f64> {
    let origin = mesh.xyz(node)?;
    let mut neighbors: Vec<usize> = Vec::new();
    let mut push = |n: usize| {
        if n != node && !neighbors.contains(&n) {
            neighbors.push(n);
        }
    };
    for &cell in mesh.node_cells(node) {
        for &n in &mesh.cell(cell)?.nodes {
            push(n);
        }
    }
    for &face in mesh.node_faces(node) {
        for &n in &mesh.face(face)?.nodes {
            push(n);
        }
    }
    for &edge in mesh.node_edges(node) {
        for &n in &mesh.edge(edge)?.nodes {
            push(n);
        }
    }
    if neighbors.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for &n in &neighbors {
        total += (mesh.xyz(n)? - origin).norm();
    }
    Ok(total / neighbors.len() as f64)
}

/// Length of the chord between two nodes in the induced metric: `√(dᵀMd)`
/// with `M` the average of the endpoint tensors.
///
/// # Errors
///
/// Fails when either node index is out of range.
pub fn edge_ratio(mesh: &TetMesh, n0: usize, n1: usize) -> MeshResult<f64> {
    let d = mesh.xyz(n1)? - mesh.xyz(n0)?;
    let m = mesh.metric(n0)?.average(&mesh.metric(n1)?);
    Ok(m.quadratic_form(&d).max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tet_math::SymTensor3;
    use tet_types::{Class, Node};

    fn two_tets() -> TetMesh {
        let mut mesh = TetMesh::new();
        mesh.add_node(Node::interior(Point3::new(0.0, 0.0, 0.0)));
        mesh.add_node(Node::interior(Point3::new(1.0, 0.0, 0.0)));
        mesh.add_node(Node::interior(Point3::new(0.0, 1.0, 0.0)));
        mesh.add_node(Node::interior(Point3::new(0.0, 0.0, 1.0)));
        mesh.add_node(Node::interior(Point3::new(1.0, 1.0, 1.0)));
        mesh.add_cell([0, 1, 2, 3]);
        mesh.add_cell([1, 4, 2, 3]);
        mesh
    }

    #[test]
    fn test_node_minima_over_incident_cells() {
        let mesh = two_tets();
        let ar0 = node_aspect_ratio(&mesh, 0).unwrap();
        let ar1 = node_aspect_ratio(&mesh, 1).unwrap();
        assert!(ar0 > 0.0 && ar0 < 1.0);
        // node 1 sees both cells, so its minimum can only be lower
        assert!(ar1 <= ar0 + 1e-12);

        assert_relative_eq!(node_volume(&mesh, 0).unwrap(), 1.0 / 6.0);
    }

    #[test]
    fn test_isolated_node_minima_are_infinite() {
        let mut mesh = two_tets();
        let lonely = mesh.add_node(Node::interior(Point3::new(9.0, 9.0, 9.0)));
        assert_eq!(node_aspect_ratio(&mesh, lonely).unwrap(), f64::INFINITY);
        assert_eq!(node_volume(&mesh, lonely).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_min_face_area_uv_orientation() {
        let mut mesh = TetMesh::new();
        let a = mesh.add_node(Node::with_class(Point3::origin(), Class::OnFace(1)));
        let b = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        let c = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        mesh.add_face([a, b, c], 1, [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);

        let plain = min_face_area_uv(&mesh, a, |_| false).unwrap();
        assert_relative_eq!(plain, 0.5);
        let corrected = min_face_area_uv(&mesh, a, |_| true).unwrap();
        assert_relative_eq!(corrected, -0.5);
    }

    #[test]
    fn test_average_edge_length_deduplicates() {
        let mesh = two_tets();
        // node 0 has three unit-length neighbors in one cell
        assert_relative_eq!(average_edge_length(&mesh, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_edge_ratio_in_stretched_metric() {
        let mut mesh = two_tets();
        let m = SymTensor3::diagonal(4.0, 1.0, 1.0);
        mesh.set_metric(0, m).unwrap();
        mesh.set_metric(1, m).unwrap();
        // chord (1,0,0): sqrt(4) in the metric
        assert_relative_eq!(edge_ratio(&mesh, 0, 1).unwrap(), 2.0);
    }
}
