//! Tetrahedral mesh container for the adaptation engine.
//!
//! This crate provides the entity data model the smoothing and untangling
//! operators work over:
//!
//! - [`Node`] - A mesh node with position, geometric classification, metric
//!   tensor, and status flags
//! - [`Cell`] - A tetrahedron as 4 node indices
//! - [`Face`] - A boundary triangle carrying its geometry face id and
//!   per-corner `(u, v)` parameters
//! - [`Edge`] - A boundary segment carrying its geometry edge id and
//!   per-corner `t` parameters
//! - [`TetMesh`] - The container, with per-node incidence lists
//!
//! Parametric coordinates live on entity corners, not on nodes: a node on a
//! geometry face has one `(u, v)` per incident mesh face. The node-level
//! accessors ([`TetMesh::node_uv`], [`TetMesh::set_node_uv`] and the edge
//! equivalents) read one incident corner and write all of them.
//!
//! Topology here is append-only. Entity creation and destruction belong to
//! the adaptation passes that own connectivity; the operators in
//! `tet-smooth` mutate positions and parameters of existing nodes only.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod entity;
mod error;
mod mesh;
mod node;

pub use entity::{Cell, Edge, Face};
pub use error::{MeshError, MeshResult};
pub use mesh::TetMesh;
pub use node::{Class, Node};

pub use nalgebra::{Point3, Vector2, Vector3};
pub use tet_math::SymTensor3;
