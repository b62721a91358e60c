//! Error types for math kernel operations.

use thiserror::Error;

/// Errors that can occur in the math kernel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    /// The QL iteration failed to converge on an eigenvalue.
    #[error("eigenvalue {0} did not converge within 30 QL sweeps")]
    EigenNoConvergence(usize),

    /// Gaussian elimination hit a zero pivot column.
    #[error("constraint system is singular (zero pivot in column {0})")]
    SingularSystem(usize),

    /// An augmented matrix was sized inconsistently with its row/column counts.
    #[error("matrix storage of length {len} does not match {rows}x{cols}")]
    BadDimensions {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
        /// Actual slice length.
        len: usize,
    },
}

/// Result type for math kernel operations.
pub type MathResult<T> = std::result::Result<T, MathError>;
