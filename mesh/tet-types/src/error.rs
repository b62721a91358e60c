//! Error types for mesh container operations.

use thiserror::Error;

/// Errors reported by [`TetMesh`](crate::TetMesh) mutations and lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The node index is out of range.
    #[error("invalid node {0}")]
    InvalidNode(usize),

    /// The cell index is out of range.
    #[error("invalid cell {0}")]
    InvalidCell(usize),

    /// The face index is out of range.
    #[error("invalid face {0}")]
    InvalidFace(usize),

    /// The edge index is out of range.
    #[error("invalid edge {0}")]
    InvalidEdge(usize),

    /// The node has no incident entity on the named geometry edge.
    #[error("node {node} is not on geometry edge {edge_id}")]
    NotOnGeometryEdge {
        /// Node index.
        node: usize,
        /// Geometry edge id.
        edge_id: usize,
    },

    /// The node has no incident entity on the named geometry face.
    #[error("node {node} is not on geometry face {face_id}")]
    NotOnGeometryFace {
        /// Node index.
        node: usize,
        /// Geometry face id.
        face_id: usize,
    },

    /// A metric tensor was rejected because it is not positive definite.
    #[error("metric for node {0} is not positive definite")]
    MetricNotPositiveDefinite(usize),
}

/// Result type for mesh container operations.
pub type MeshResult<T> = std::result::Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::NotOnGeometryEdge { node: 4, edge_id: 2 };
        assert_eq!(err.to_string(), "node 4 is not on geometry edge 2");
    }
}
