//! Mesh node: position, classification, metric, and status flags.

use nalgebra::Point3;
use tet_math::SymTensor3;

/// Geometric classification of a node.
///
/// Classification decides which operator may move the node and how its
/// position is kept on the geometry: corners never move, edge nodes slide
/// along one curve, face nodes slide in one surface chart, interior nodes
/// move freely in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// Pinned to a geometry vertex; position is immutable.
    Corner,
    /// Constrained to the geometry edge with this id.
    OnEdge(usize),
    /// Constrained to the geometry face with this id.
    OnFace(usize),
    /// Free in the volume.
    Interior,
}

/// A mesh node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Cartesian position.
    pub xyz: Point3<f64>,
    /// Geometric classification.
    pub class: Class,
    /// Symmetric anisotropic sizing tensor. Positive definite whenever it
    /// is set through [`TetMesh::set_metric`](crate::TetMesh::set_metric).
    pub metric: SymTensor3,
    /// Frozen nodes are skipped by whole-mesh sweeps.
    pub frozen: bool,
    /// Ghost nodes belong to another partition; operators must not move
    /// them or, unless told otherwise, their neighbors.
    pub ghost: bool,
    /// Whether this partition owns the node.
    pub local: bool,
}

impl Node {
    /// An interior node at `xyz` with an identity metric.
    #[must_use]
    pub fn interior(xyz: Point3<f64>) -> Self {
        Self::with_class(xyz, Class::Interior)
    }

    /// A node at `xyz` with the given classification.
    #[must_use]
    pub fn with_class(xyz: Point3<f64>, class: Class) -> Self {
        Self {
            xyz,
            class,
            metric: SymTensor3::identity(),
            frozen: false,
            ghost: false,
            local: true,
        }
    }

    /// Mark the node frozen.
    #[must_use]
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Mark the node as a ghost copy owned by another partition.
    #[must_use]
    pub fn ghost(mut self) -> Self {
        self.ghost = true;
        self.local = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let n = Node::interior(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(n.class, Class::Interior);
        assert!(n.local);
        assert!(!n.frozen);

        let g = Node::with_class(Point3::origin(), Class::OnEdge(3)).ghost();
        assert_eq!(g.class, Class::OnEdge(3));
        assert!(g.ghost);
        assert!(!g.local);
    }
}
