//! Quality metrics for tetrahedral meshes.
//!
//! Element-level metrics are pure functions over corner positions:
//!
//! - [`tet_volume`] - signed volume
//! - [`tet_aspect_ratio`] - normalized insphere/circumsphere ratio, 1 for a
//!   regular tetrahedron, sign follows the signed volume
//! - [`tri_mean_ratio`] - normalized triangle shape measure, 1 for
//!   equilateral
//! - [`uv_area`] - signed parametric triangle area
//!
//! The `*_derivative` variants return the value together with its gradient
//! with respect to the first corner, by central finite differences.
//!
//! Node-level conveniences take the worst value over a node's incident
//! entities ([`node_aspect_ratio`], [`node_volume`],
//! [`node_face_mean_ratio`], [`min_face_area_uv`]) or aggregate its
//! neighborhood ([`average_edge_length`], [`edge_ratio`]).

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod element;
mod node;

pub use element::{
    tet_aspect_ratio, tet_aspect_ratio_derivative, tet_volume, tri_mean_ratio,
    tri_mean_ratio_derivative, uv_area,
};
pub use node::{
    average_edge_length, edge_ratio, min_face_area_uv, node_aspect_ratio, node_face_mean_ratio,
    node_volume,
};
