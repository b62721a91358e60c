//! Primal simplex tableau solver for small dense linear programs.
//!
//! Solves `minimize c·x subject to A x = b, x ≥ 0` by pivoting on an
//! explicit tableau. Slack variables bootstrap the initial basis and are
//! driven out by an auxiliary pivot phase; the solve fails if any survives.
//! The problems fed to this crate are tiny (a handful of constraints,
//! node-degree many columns), so the dense representation and the
//! largest-pivot rule are a good fit.
//!
//! The caller reads back the optimal [`Tableau::basis`]; the untangler uses
//! that basis to reconstruct the repair position by duality.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod tableau;

pub use error::{TableauError, TableauResult};
pub use tableau::Tableau;
