//! Error types for smoothing and untangling operators.

use thiserror::Error;

use tet_geom::GeomError;
use tet_math::MathError;
use tet_tableau::TableauError;
use tet_types::MeshError;

/// Errors reported by the smoothing engine.
///
/// A smoother that simply finds no improving step is not an error; it
/// returns [`SmoothOutcome::Unchanged`](crate::SmoothOutcome::Unchanged) so
/// a whole-mesh sweep can continue past it.
#[derive(Debug, Error)]
pub enum SmoothError {
    /// The geometry backend failed; the operation aborted without a commit.
    #[error(transparent)]
    Geometry(#[from] GeomError),

    /// The mesh container rejected a lookup or mutation.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// The simplex solve failed.
    #[error(transparent)]
    Tableau(#[from] TableauError),

    /// A math kernel failed.
    #[error(transparent)]
    Math(#[from] MathError),

    /// The untangler had fewer usable elements than constraint rows.
    #[error("constraint system infeasible: {usable} usable elements, {needed} needed")]
    Infeasible {
        /// Constraint rows required.
        needed: usize,
        /// Usable element columns after degenerate removal.
        usable: usize,
    },

    /// The node index does not name a node.
    #[error("invalid node {0}")]
    InvalidNode(usize),

    /// The node is a ghost copy and may not be moved.
    #[error("node {0} is a ghost and cannot move")]
    GhostNode(usize),

    /// The operator needs a node constrained to a single geometry edge.
    #[error("node {0} is not on a single geometry edge")]
    NotOnSingleEdge(usize),

    /// The operator needs a node constrained to a single geometry face.
    #[error("node {0} is not on a single geometry face")]
    NotOnSingleFace(usize),

    /// The operator needs an interior (unconstrained) node.
    #[error("node {0} is not interior")]
    NotInterior(usize),
}

/// Result type for smoothing operations.
pub type SmoothResult<T> = std::result::Result<T, SmoothError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasible_display() {
        let err = SmoothError::Infeasible { needed: 4, usable: 2 };
        assert_eq!(
            err.to_string(),
            "constraint system infeasible: 2 usable elements, 4 needed"
        );
    }

    #[test]
    fn test_geometry_error_converts() {
        let err: SmoothError = GeomError::UnknownFace(3).into();
        assert!(matches!(err, SmoothError::Geometry(GeomError::UnknownFace(3))));
    }
}
