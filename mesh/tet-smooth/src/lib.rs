//! Node smoothing and untangling operators for tetrahedral meshes.
//!
//! All operators run through a [`SmoothEngine`], which borrows a
//! [`TetMesh`](tet_types::TetMesh) and a
//! [`GeometryBackend`](tet_geom::GeometryBackend) and keeps node positions
//! and boundary parameters synchronized across every move:
//!
//! - [`SmoothEngine::smooth_node`] - quality smoothing dispatched on the
//!   node's geometric classification: a golden-section curve search for
//!   edge nodes, worst-element linear-program steps in `(u, v)` for face
//!   nodes and in `(x, y, z)` for interior nodes
//! - [`SmoothEngine::smart_laplacian`] - centroid smoothing with an
//!   accept-if-not-worse guard
//! - [`SmoothEngine::smooth_face_area_uv`] - derivative-free simplex
//!   maximization of the minimum parametric face area
//! - [`SmoothEngine::untangle_area_uv`] / [`SmoothEngine::untangle_volume`]
//!   - linear-programming untanglers that equalize the worst signed
//!   measures around a node, with optional recursion into the neighborhood
//! - [`SmoothEngine::relax_negative_cells`] - whole-mesh repair driver for
//!   inverted cells
//! - projection operators that put classified nodes back on their
//!   geometry and re-resolve stored parameters

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod engine;
mod error;
mod laplacian;
mod line_search;
mod linear_program;
mod params;
mod project;
mod simplex_uv;
mod untangle;

pub use engine::{LpStep, SmoothEngine, SmoothOutcome};
pub use error::{SmoothError, SmoothResult};
pub use params::{CostFunction, SmoothParams};
