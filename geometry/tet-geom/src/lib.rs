//! Geometry backend abstraction for mesh adaptation.
//!
//! The smoothing engine never talks to a CAD kernel directly. It consumes
//! the [`GeometryBackend`] trait: parametric evaluation with derivatives,
//! nearest-point projection, parameter resolution for periodic charts, and
//! an optional local/global coordinate frame.
//!
//! [`PlanarGeometry`] is a concrete synthetic backend built from flat faces
//! and straight edges. It is what the engine's own tests run against; a real
//! CAD kernel plugs in through the same trait.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod backend;
mod error;
mod planar;

pub use backend::{DerivativeOrder, EdgeEval, FaceEval, GeometryBackend};
pub use error::{GeomError, GeomResult};
pub use planar::{PlanarEdge, PlanarFace, PlanarGeometry};
