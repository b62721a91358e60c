//! Small dense math kernel for mesh quality computations.
//!
//! This crate provides the numeric primitives the smoothing and untangling
//! code builds on:
//!
//! - [`SymTensor3`] - symmetric 3×3 tensor with an iterative eigendecomposition
//! - [`gaussian_elimination`] / [`gaussian_backsolve`] - general m×(m+1) solves
//! - [`orthogonalize`] - Gram-Schmidt projection helper
//!
//! Everything here is a pure function of its inputs; there is no mesh
//! knowledge in this crate.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod eigen;
mod error;
mod gauss;
mod tensor;
mod vector;

pub use eigen::Eigen3;
pub use error::{MathError, MathResult};
pub use gauss::{gaussian_backsolve, gaussian_elimination};
pub use tensor::SymTensor3;
pub use vector::{det3, orthogonalize};

// Re-export nalgebra types used throughout the workspace
pub use nalgebra::{Point2, Point3, Vector2, Vector3};
