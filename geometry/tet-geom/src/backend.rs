//! The geometry backend trait.

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::GeomResult;

/// How many derivative levels an evaluation should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DerivativeOrder {
    /// Position only.
    None,
    /// Position and first derivatives.
    First,
    /// Position, first, and second derivatives.
    Second,
}

/// Result of evaluating a parametric edge at a parameter `t`.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEval {
    /// Position on the curve.
    pub xyz: Point3<f64>,
    /// First derivative d/dt, when requested.
    pub dt: Option<Vector3<f64>>,
    /// Second derivative d²/dt², when requested.
    pub dtt: Option<Vector3<f64>>,
}

/// Result of evaluating a parametric face at a parameter `(u, v)`.
#[derive(Debug, Clone, Copy)]
pub struct FaceEval {
    /// Position on the surface.
    pub xyz: Point3<f64>,
    /// First derivative d/du, when requested.
    pub du: Option<Vector3<f64>>,
    /// First derivative d/dv, when requested.
    pub dv: Option<Vector3<f64>>,
    /// Second derivative d²/du², when requested.
    pub duu: Option<Vector3<f64>>,
    /// Mixed second derivative d²/dudv, when requested.
    pub duv: Option<Vector3<f64>>,
    /// Second derivative d²/dv², when requested.
    pub dvv: Option<Vector3<f64>>,
}

/// A pluggable source of truth for curve/surface shape.
///
/// Ids are the mesh's owning-geometry ids (`edge_id`, `face_id`). Every
/// method returns a `Result`; a failure must abort the calling operation
/// before it commits any state.
pub trait GeometryBackend {
    /// Nearest-point projection of `xyz` onto an edge.
    ///
    /// Returns the curve parameter and the projected Cartesian point, in
    /// the global frame. `t_seed` starts the search near a known parameter;
    /// `None` asks for a cold search.
    ///
    /// # Errors
    ///
    /// Fails when the edge id is unknown or the projection search fails.
    fn nearest_on_edge(
        &self,
        edge_id: usize,
        xyz: &Point3<f64>,
        t_seed: Option<f64>,
    ) -> GeomResult<(f64, Point3<f64>)>;

    /// Nearest-point projection of `xyz` onto a face.
    ///
    /// `uv_seed` starts the search near a known parameter; `None` asks for
    /// a cold search.
    ///
    /// # Errors
    ///
    /// Fails when the face id is unknown or the projection search fails.
    fn nearest_on_face(
        &self,
        face_id: usize,
        xyz: &Point3<f64>,
        uv_seed: Option<Vector2<f64>>,
    ) -> GeomResult<(Vector2<f64>, Point3<f64>)>;

    /// Forward-evaluate an edge at parameter `t` (no search).
    ///
    /// # Errors
    ///
    /// Fails when the edge id is unknown or evaluation fails at `t`.
    fn eval_on_edge(&self, edge_id: usize, t: f64, order: DerivativeOrder)
        -> GeomResult<EdgeEval>;

    /// Forward-evaluate a face at parameter `(u, v)` (no search).
    ///
    /// # Errors
    ///
    /// Fails when the face id is unknown or evaluation fails at `(u, v)`.
    fn eval_on_face(
        &self,
        face_id: usize,
        uv: &Vector2<f64>,
        order: DerivativeOrder,
    ) -> GeomResult<FaceEval>;

    /// Surface position and outward normal at `(u, v)`.
    ///
    /// # Errors
    ///
    /// Fails when the face id is unknown.
    fn face_normal(
        &self,
        face_id: usize,
        uv: &Vector2<f64>,
    ) -> GeomResult<(Point3<f64>, Vector3<f64>)>;

    /// Snap an edge parameter to the branch consistent with a known global
    /// position, without moving the position. The guess seeds periodic
    /// charts.
    ///
    /// # Errors
    ///
    /// Fails when the edge id is unknown or no consistent branch exists.
    fn resolve_on_edge(&self, edge_id: usize, xyz: &Point3<f64>, t_guess: f64) -> GeomResult<f64>;

    /// Snap a face parameter to the branch consistent with a known global
    /// position.
    ///
    /// # Errors
    ///
    /// Fails when the face id is unknown or no consistent branch exists.
    fn resolve_on_face(
        &self,
        face_id: usize,
        xyz: &Point3<f64>,
        uv_guess: &Vector2<f64>,
    ) -> GeomResult<Vector2<f64>>;

    /// Whether the face's surface normal is reversed relative to its
    /// parameterization; fixes the sign convention of parametric area.
    fn reversed_face_normal(&self, face_id: usize) -> bool;

    /// Whether the local and global coordinate frames coincide.
    ///
    /// Backends with a non-identity displacement must implement
    /// [`Self::map_point`] and [`Self::unmap_point`]; projection queries
    /// un-map into the local frame and re-map the result.
    fn displacement_is_identity(&self) -> bool {
        true
    }

    /// Map a point from the local frame to the global frame.
    ///
    /// # Errors
    ///
    /// Fails when the backend cannot apply its frame transform.
    fn map_point(&self, local: &Point3<f64>) -> GeomResult<Point3<f64>> {
        Ok(*local)
    }

    /// Map a point from the global frame to the local frame.
    ///
    /// # Errors
    ///
    /// Fails when the backend cannot invert its frame transform.
    fn unmap_point(&self, global: &Point3<f64>) -> GeomResult<Point3<f64>> {
        Ok(*global)
    }
}
