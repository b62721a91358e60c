//! The tetrahedral mesh container.

use nalgebra::{Point3, Vector2};
use tet_math::SymTensor3;

use crate::entity::{Cell, Edge, Face};
use crate::error::{MeshError, MeshResult};
use crate::node::{Class, Node};

/// A tetrahedral mesh with classified boundary entities.
///
/// Stores nodes, cells, boundary faces, and boundary edges in flat arrays,
/// plus a per-node incidence list for each entity kind. Incidence lists are
/// maintained by the `add_*` methods and iterate in insertion order.
///
/// # Example
///
/// ```
/// use tet_types::{Node, Point3, TetMesh};
///
/// let mut mesh = TetMesh::new();
/// let n0 = mesh.add_node(Node::interior(Point3::new(0.0, 0.0, 0.0)));
/// let n1 = mesh.add_node(Node::interior(Point3::new(1.0, 0.0, 0.0)));
/// let n2 = mesh.add_node(Node::interior(Point3::new(0.0, 1.0, 0.0)));
/// let n3 = mesh.add_node(Node::interior(Point3::new(0.0, 0.0, 1.0)));
/// mesh.add_cell([n0, n1, n2, n3]);
///
/// assert_eq!(mesh.cell_degree(n0), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TetMesh {
    nodes: Vec<Node>,
    cells: Vec<Cell>,
    faces: Vec<Face>,
    edges: Vec<Edge>,
    node_cells: Vec<Vec<usize>>,
    node_faces: Vec<Vec<usize>>,
    node_edges: Vec<Vec<usize>>,
}

impl TetMesh {
    /// An empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index.
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.node_cells.push(Vec::new());
        self.node_faces.push(Vec::new());
        self.node_edges.push(Vec::new());
        self.nodes.len() - 1
    }

    /// Add a positively oriented tetrahedron, returning its index.
    pub fn add_cell(&mut self, nodes: [usize; 4]) -> usize {
        let id = self.cells.len();
        self.cells.push(Cell { nodes });
        for &n in &nodes {
            if let Some(list) = self.node_cells.get_mut(n) {
                list.push(id);
            }
        }
        id
    }

    /// Add a boundary triangle with its per-corner surface parameters.
    pub fn add_face(&mut self, nodes: [usize; 3], face_id: usize, uv: [[f64; 2]; 3]) -> usize {
        let id = self.faces.len();
        self.faces.push(Face { nodes, face_id, uv });
        for &n in &nodes {
            if let Some(list) = self.node_faces.get_mut(n) {
                list.push(id);
            }
        }
        id
    }

    /// Add a boundary segment with its per-corner curve parameters.
    pub fn add_edge(&mut self, nodes: [usize; 2], edge_id: usize, t: [f64; 2]) -> usize {
        let id = self.edges.len();
        self.edges.push(Edge { nodes, edge_id, t });
        for &n in &nodes {
            if let Some(list) = self.node_edges.get_mut(n) {
                list.push(id);
            }
        }
        id
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of boundary faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of boundary edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All cells.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All boundary faces.
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// All boundary edges.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// A node by index.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn node(&self, node: usize) -> MeshResult<&Node> {
        self.nodes.get(node).ok_or(MeshError::InvalidNode(node))
    }

    /// A mutable node by index.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn node_mut(&mut self, node: usize) -> MeshResult<&mut Node> {
        self.nodes.get_mut(node).ok_or(MeshError::InvalidNode(node))
    }

    /// A cell by index.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn cell(&self, cell: usize) -> MeshResult<&Cell> {
        self.cells.get(cell).ok_or(MeshError::InvalidCell(cell))
    }

    /// A boundary face by index.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn face(&self, face: usize) -> MeshResult<&Face> {
        self.faces.get(face).ok_or(MeshError::InvalidFace(face))
    }

    /// A boundary edge by index.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn edge(&self, edge: usize) -> MeshResult<&Edge> {
        self.edges.get(edge).ok_or(MeshError::InvalidEdge(edge))
    }

    /// Cartesian position of a node.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn xyz(&self, node: usize) -> MeshResult<Point3<f64>> {
        Ok(self.node(node)?.xyz)
    }

    /// Overwrite the Cartesian position of a node.
    ///
    /// Callers that move classified nodes must re-synchronize the stored
    /// parameters through the geometry backend before returning.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn set_xyz(&mut self, node: usize, xyz: Point3<f64>) -> MeshResult<()> {
        self.node_mut(node)?.xyz = xyz;
        Ok(())
    }

    /// Geometric classification of a node.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn classification(&self, node: usize) -> MeshResult<Class> {
        Ok(self.node(node)?.class)
    }

    /// The node's metric tensor.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range.
    pub fn metric(&self, node: usize) -> MeshResult<SymTensor3> {
        Ok(self.node(node)?.metric)
    }

    /// Install a metric tensor on a node.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range or the tensor is not positive
    /// definite.
    pub fn set_metric(&mut self, node: usize, metric: SymTensor3) -> MeshResult<()> {
        if !metric.is_positive_definite() {
            return Err(MeshError::MetricNotPositiveDefinite(node));
        }
        self.node_mut(node)?.metric = metric;
        Ok(())
    }

    /// Whether the index names a node.
    #[must_use]
    pub fn valid_node(&self, node: usize) -> bool {
        node < self.nodes.len()
    }

    /// Whether the node is pinned to a geometry vertex.
    #[must_use]
    pub fn is_corner(&self, node: usize) -> bool {
        matches!(self.classification(node), Ok(Class::Corner))
    }

    /// Whether the node is constrained to a geometry edge.
    #[must_use]
    pub fn on_geometry_edge(&self, node: usize) -> bool {
        matches!(self.classification(node), Ok(Class::OnEdge(_)))
    }

    /// Whether the node is constrained to a geometry face.
    #[must_use]
    pub fn on_geometry_face(&self, node: usize) -> bool {
        matches!(self.classification(node), Ok(Class::OnFace(_)))
    }

    /// Whether the node is free in the volume.
    #[must_use]
    pub fn is_interior(&self, node: usize) -> bool {
        matches!(self.classification(node), Ok(Class::Interior))
    }

    /// Whether the node is a ghost copy owned by another partition.
    #[must_use]
    pub fn is_ghost(&self, node: usize) -> bool {
        self.node(node).map(|n| n.ghost).unwrap_or(false)
    }

    /// Whether the node is frozen.
    #[must_use]
    pub fn is_frozen(&self, node: usize) -> bool {
        self.node(node).map(|n| n.frozen).unwrap_or(false)
    }

    /// Whether this partition owns the node.
    #[must_use]
    pub fn is_local(&self, node: usize) -> bool {
        self.node(node).map(|n| n.local).unwrap_or(false)
    }

    /// Whether any cell incident to the node has a ghost corner.
    #[must_use]
    pub fn near_ghost(&self, node: usize) -> bool {
        self.node_cells(node).iter().any(|&c| {
            self.cells[c].nodes.iter().any(|&n| self.is_ghost(n))
        })
    }

    /// Cells incident to a node, in insertion order.
    #[must_use]
    pub fn node_cells(&self, node: usize) -> &[usize] {
        self.node_cells.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Boundary faces incident to a node, in insertion order.
    #[must_use]
    pub fn node_faces(&self, node: usize) -> &[usize] {
        self.node_faces.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Boundary edges incident to a node, in insertion order.
    #[must_use]
    pub fn node_edges(&self, node: usize) -> &[usize] {
        self.node_edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of cells incident to a node.
    #[must_use]
    pub fn cell_degree(&self, node: usize) -> usize {
        self.node_cells(node).len()
    }

    /// Number of boundary faces incident to a node.
    #[must_use]
    pub fn face_degree(&self, node: usize) -> usize {
        self.node_faces(node).len()
    }

    /// Number of boundary edges incident to a node.
    #[must_use]
    pub fn edge_degree(&self, node: usize) -> usize {
        self.node_edges(node).len()
    }

    /// The node's curve parameter on a geometry edge, read from the first
    /// incident segment carrying that edge id.
    ///
    /// # Errors
    ///
    /// Fails when the node index is out of range or no incident segment
    /// carries the edge id.
    pub fn node_t(&self, node: usize, edge_id: usize) -> MeshResult<f64> {
        self.node(node)?;
        for &e in self.node_edges(node) {
            let edge = &self.edges[e];
            if edge.edge_id == edge_id {
                if let Some(corner) = edge.corner_of(node) {
                    return Ok(edge.t[corner]);
                }
            }
        }
        Err(MeshError::NotOnGeometryEdge { node, edge_id })
    }

    /// Write the node's curve parameter on every incident segment carrying
    /// the edge id.
    ///
    /// # Errors
    ///
    /// Fails when the node index is out of range or no incident segment
    /// carries the edge id.
    pub fn set_node_t(&mut self, node: usize, edge_id: usize, t: f64) -> MeshResult<()> {
        self.node(node)?;
        let mut hit = false;
        for e in 0..self.node_edges(node).len() {
            let id = self.node_edges[node][e];
            let edge = &mut self.edges[id];
            if edge.edge_id == edge_id {
                if let Some(corner) = edge.corner_of(node) {
                    edge.t[corner] = t;
                    hit = true;
                }
            }
        }
        if hit {
            Ok(())
        } else {
            Err(MeshError::NotOnGeometryEdge { node, edge_id })
        }
    }

    /// The node's surface parameter on a geometry face, read from the first
    /// incident triangle carrying that face id.
    ///
    /// # Errors
    ///
    /// Fails when the node index is out of range or no incident triangle
    /// carries the face id.
    pub fn node_uv(&self, node: usize, face_id: usize) -> MeshResult<Vector2<f64>> {
        self.node(node)?;
        for &f in self.node_faces(node) {
            let face = &self.faces[f];
            if face.face_id == face_id {
                if let Some(corner) = face.corner_of(node) {
                    let uv = face.uv[corner];
                    return Ok(Vector2::new(uv[0], uv[1]));
                }
            }
        }
        Err(MeshError::NotOnGeometryFace { node, face_id })
    }

    /// Write the node's surface parameter on every incident triangle
    /// carrying the face id.
    ///
    /// # Errors
    ///
    /// Fails when the node index is out of range or no incident triangle
    /// carries the face id.
    pub fn set_node_uv(&mut self, node: usize, face_id: usize, uv: Vector2<f64>) -> MeshResult<()> {
        self.node(node)?;
        let mut hit = false;
        for f in 0..self.node_faces(node).len() {
            let id = self.node_faces[node][f];
            let face = &mut self.faces[id];
            if face.face_id == face_id {
                if let Some(corner) = face.corner_of(node) {
                    face.uv[corner] = [uv.x, uv.y];
                    hit = true;
                }
            }
        }
        if hit {
            Ok(())
        } else {
            Err(MeshError::NotOnGeometryFace { node, face_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn single_tet() -> TetMesh {
        let mut mesh = TetMesh::new();
        mesh.add_node(Node::interior(Point3::new(0.0, 0.0, 0.0)));
        mesh.add_node(Node::interior(Point3::new(1.0, 0.0, 0.0)));
        mesh.add_node(Node::interior(Point3::new(0.0, 1.0, 0.0)));
        mesh.add_node(Node::interior(Point3::new(0.0, 0.0, 1.0)));
        mesh.add_cell([0, 1, 2, 3]);
        mesh
    }

    #[test]
    fn test_incidence_maintained_by_add() {
        let mesh = single_tet();
        for n in 0..4 {
            assert_eq!(mesh.node_cells(n), &[0]);
            assert_eq!(mesh.cell_degree(n), 1);
        }
        assert_eq!(mesh.node_cells(17), &[] as &[usize]);
    }

    #[test]
    fn test_predicates_follow_classification() {
        let mut mesh = TetMesh::new();
        let corner = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        let on_edge = mesh.add_node(Node::with_class(Point3::origin(), Class::OnEdge(2)));
        let on_face = mesh.add_node(Node::with_class(Point3::origin(), Class::OnFace(1)));
        let interior = mesh.add_node(Node::interior(Point3::origin()));

        assert!(mesh.is_corner(corner));
        assert!(mesh.on_geometry_edge(on_edge));
        assert!(mesh.on_geometry_face(on_face));
        assert!(mesh.is_interior(interior));
        assert!(!mesh.is_interior(on_face));
        assert!(!mesh.valid_node(99));
        assert!(!mesh.is_corner(99));
    }

    #[test]
    fn test_node_t_reads_and_writes_all_corners() {
        let mut mesh = TetMesh::new();
        let a = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        let b = mesh.add_node(Node::with_class(Point3::origin(), Class::OnEdge(5)));
        let c = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        mesh.add_edge([a, b], 5, [0.0, 1.0]);
        mesh.add_edge([b, c], 5, [1.0, 2.0]);

        assert_relative_eq!(mesh.node_t(b, 5).unwrap(), 1.0);
        mesh.set_node_t(b, 5, 1.5).unwrap();
        assert_relative_eq!(mesh.edges()[0].t[1], 1.5);
        assert_relative_eq!(mesh.edges()[1].t[0], 1.5);

        assert_eq!(
            mesh.node_t(a, 9),
            Err(MeshError::NotOnGeometryEdge { node: a, edge_id: 9 })
        );
    }

    #[test]
    fn test_node_uv_reads_and_writes_all_corners() {
        let mut mesh = TetMesh::new();
        let a = mesh.add_node(Node::with_class(Point3::origin(), Class::OnFace(2)));
        let b = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        let c = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        let d = mesh.add_node(Node::with_class(Point3::origin(), Class::Corner));
        mesh.add_face([a, b, c], 2, [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        mesh.add_face([a, c, d], 2, [[0.0, 0.0], [0.0, 1.0], [-1.0, 0.0]]);

        assert_relative_eq!(mesh.node_uv(a, 2).unwrap(), Vector2::new(0.0, 0.0));
        mesh.set_node_uv(a, 2, Vector2::new(0.25, -0.5)).unwrap();
        assert_eq!(mesh.faces()[0].uv[0], [0.25, -0.5]);
        assert_eq!(mesh.faces()[1].uv[0], [0.25, -0.5]);
    }

    #[test]
    fn test_set_metric_rejects_indefinite() {
        let mut mesh = single_tet();
        let err = mesh.set_metric(0, SymTensor3::diagonal(1.0, -1.0, 1.0));
        assert_eq!(err, Err(MeshError::MetricNotPositiveDefinite(0)));

        mesh.set_metric(0, SymTensor3::diagonal(4.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(mesh.metric(0).unwrap().quadratic_form(&Vector3::x()), 4.0);
    }

    #[test]
    fn test_near_ghost() {
        let mut mesh = single_tet();
        assert!(!mesh.near_ghost(0));
        mesh.node_mut(3).unwrap().ghost = true;
        assert!(mesh.near_ghost(0));
    }
}
