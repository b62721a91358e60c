//! Error types for the tableau solver.

use thiserror::Error;

/// Errors that can occur while setting up or solving a tableau.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableauError {
    /// Input slice length did not match the tableau shape.
    #[error("expected {expected} entries, got {got}")]
    DimensionMismatch {
        /// Expected number of entries.
        expected: usize,
        /// Provided number of entries.
        got: usize,
    },

    /// The simplex iteration exceeded its pivot budget.
    #[error("simplex exceeded {0} pivot iterations")]
    MaxIterations(usize),

    /// A requested pivot lies outside the tableau.
    #[error("pivot row {row} column {column} outside tableau")]
    PivotOutOfRange {
        /// Requested pivot row.
        row: usize,
        /// Requested pivot column.
        column: usize,
    },

    /// A requested pivot column is already in the basis.
    #[error("pivot column {0} is already active")]
    ColumnActive(usize),

    /// A slack column survived in the final basis.
    #[error("slack column {column} was not eliminated from basis row {row}")]
    SlackNotEliminated {
        /// Basis row still holding a slack column.
        row: usize,
        /// The offending column index.
        column: usize,
    },
}

/// Result type for tableau operations.
pub type TableauResult<T> = std::result::Result<T, TableauError>;
