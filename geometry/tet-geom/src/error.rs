//! Error types for geometry backend operations.

use thiserror::Error;

/// Errors reported by a geometry backend.
///
/// Any of these aborts the calling mesh operation; the engine must not
/// commit a partial position/parameter update after a backend failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeomError {
    /// The backend has no edge with this id.
    #[error("unknown geometry edge {0}")]
    UnknownEdge(usize),

    /// The backend has no face with this id.
    #[error("unknown geometry face {0}")]
    UnknownFace(usize),

    /// Evaluation failed at the given parameter.
    #[error("evaluation failed on {entity} {id}")]
    EvaluationFailed {
        /// `"edge"` or `"face"`.
        entity: &'static str,
        /// Entity id.
        id: usize,
    },

    /// Nearest-point projection did not converge.
    #[error("projection failed on {entity} {id}")]
    ProjectionFailed {
        /// `"edge"` or `"face"`.
        entity: &'static str,
        /// Entity id.
        id: usize,
    },

    /// Mapping between local and global frames failed.
    #[error("coordinate frame mapping failed")]
    FrameMapping,
}

/// Result type for geometry backend operations.
pub type GeomResult<T> = std::result::Result<T, GeomError>;
