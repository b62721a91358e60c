//! Synthetic planar geometry backend.
//!
//! Faces are flat planes with an orthonormal `(u, v)` basis; edges are
//! straight lines parameterized by arc length along their direction. This
//! is the stand-in geometry used to exercise the smoothing engine without a
//! CAD kernel.

use nalgebra::{Point3, Vector2, Vector3};

use crate::backend::{DerivativeOrder, EdgeEval, FaceEval, GeometryBackend};
use crate::error::{GeomError, GeomResult};

/// A flat parametric face: `xyz(u, v) = origin + u·u_dir + v·v_dir`.
#[derive(Debug, Clone)]
pub struct PlanarFace {
    /// Owning-geometry face id.
    pub id: usize,
    /// A point on the plane.
    pub origin: Point3<f64>,
    /// Unit u direction.
    pub u_dir: Vector3<f64>,
    /// Unit v direction.
    pub v_dir: Vector3<f64>,
    /// Whether the surface normal is reversed relative to `u_dir × v_dir`.
    pub reversed: bool,
}

impl PlanarFace {
    /// A plane of constant x at `offset`, with `(u, v)` aligned to `(y, z)`.
    #[must_use]
    pub fn x_plane(id: usize, offset: f64) -> Self {
        Self {
            id,
            origin: Point3::new(offset, 0.0, 0.0),
            u_dir: Vector3::y(),
            v_dir: Vector3::z(),
            reversed: false,
        }
    }

    /// A plane of constant y at `offset`, with `(u, v)` aligned to `(z, x)`.
    #[must_use]
    pub fn y_plane(id: usize, offset: f64) -> Self {
        Self {
            id,
            origin: Point3::new(0.0, offset, 0.0),
            u_dir: Vector3::z(),
            v_dir: Vector3::x(),
            reversed: false,
        }
    }

    /// A plane of constant z at `offset`, with `(u, v)` aligned to `(x, y)`.
    #[must_use]
    pub fn z_plane(id: usize, offset: f64) -> Self {
        Self {
            id,
            origin: Point3::new(0.0, 0.0, offset),
            u_dir: Vector3::x(),
            v_dir: Vector3::y(),
            reversed: false,
        }
    }

    /// Flip the parametric-area sign convention.
    #[must_use]
    pub fn with_reversed_normal(mut self) -> Self {
        self.reversed = true;
        self
    }

    fn normal(&self) -> Vector3<f64> {
        let n = self.u_dir.cross(&self.v_dir);
        if self.reversed {
            -n
        } else {
            n
        }
    }
}

/// A straight parametric edge: `xyz(t) = origin + t·direction`.
#[derive(Debug, Clone)]
pub struct PlanarEdge {
    /// Owning-geometry edge id.
    pub id: usize,
    /// Curve start point (t = 0).
    pub origin: Point3<f64>,
    /// Curve direction; need not be unit length.
    pub direction: Vector3<f64>,
}

/// A geometry backend made of [`PlanarFace`]s and [`PlanarEdge`]s.
///
/// An optional rigid translation models a non-identity local/global frame.
#[derive(Debug, Clone, Default)]
pub struct PlanarGeometry {
    faces: Vec<PlanarFace>,
    edges: Vec<PlanarEdge>,
    displacement: Option<Vector3<f64>>,
}

impl PlanarGeometry {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a face.
    pub fn add_face(&mut self, face: PlanarFace) {
        self.faces.push(face);
    }

    /// Add an edge.
    pub fn add_edge(&mut self, edge: PlanarEdge) {
        self.edges.push(edge);
    }

    /// Install a rigid local-to-global translation.
    pub fn set_displacement(&mut self, displacement: Vector3<f64>) {
        self.displacement = Some(displacement);
    }

    fn face(&self, id: usize) -> GeomResult<&PlanarFace> {
        self.faces
            .iter()
            .find(|f| f.id == id)
            .ok_or(GeomError::UnknownFace(id))
    }

    fn edge(&self, id: usize) -> GeomResult<&PlanarEdge> {
        self.edges
            .iter()
            .find(|e| e.id == id)
            .ok_or(GeomError::UnknownEdge(id))
    }
}

impl GeometryBackend for PlanarGeometry {
    fn nearest_on_edge(
        &self,
        edge_id: usize,
        xyz: &Point3<f64>,
        _t_seed: Option<f64>,
    ) -> GeomResult<(f64, Point3<f64>)> {
        // lines have a closed-form projection, so the seed is unused
        let edge = self.edge(edge_id)?;
        let local = self.unmap_point(xyz)?;
        let len2 = edge.direction.norm_squared();
        if len2 < 1e-300 {
            return Err(GeomError::ProjectionFailed {
                entity: "edge",
                id: edge_id,
            });
        }
        let t = (local - edge.origin).dot(&edge.direction) / len2;
        let pt = edge.origin + edge.direction * t;
        Ok((t, self.map_point(&pt)?))
    }

    fn nearest_on_face(
        &self,
        face_id: usize,
        xyz: &Point3<f64>,
        _uv_seed: Option<Vector2<f64>>,
    ) -> GeomResult<(Vector2<f64>, Point3<f64>)> {
        let face = self.face(face_id)?;
        let local = self.unmap_point(xyz)?;
        let d = local - face.origin;
        let uv = Vector2::new(d.dot(&face.u_dir), d.dot(&face.v_dir));
        let pt = face.origin + face.u_dir * uv.x + face.v_dir * uv.y;
        Ok((uv, self.map_point(&pt)?))
    }

    fn eval_on_edge(
        &self,
        edge_id: usize,
        t: f64,
        order: DerivativeOrder,
    ) -> GeomResult<EdgeEval> {
        let edge = self.edge(edge_id)?;
        let xyz = self.map_point(&(edge.origin + edge.direction * t))?;
        let dt = (order >= DerivativeOrder::First).then_some(edge.direction);
        let dtt = (order >= DerivativeOrder::Second).then_some(Vector3::zeros());
        Ok(EdgeEval { xyz, dt, dtt })
    }

    fn eval_on_face(
        &self,
        face_id: usize,
        uv: &Vector2<f64>,
        order: DerivativeOrder,
    ) -> GeomResult<FaceEval> {
        let face = self.face(face_id)?;
        let xyz = self.map_point(&(face.origin + face.u_dir * uv.x + face.v_dir * uv.y))?;
        let first = order >= DerivativeOrder::First;
        let second = order >= DerivativeOrder::Second;
        Ok(FaceEval {
            xyz,
            du: first.then_some(face.u_dir),
            dv: first.then_some(face.v_dir),
            duu: second.then_some(Vector3::zeros()),
            duv: second.then_some(Vector3::zeros()),
            dvv: second.then_some(Vector3::zeros()),
        })
    }

    fn face_normal(
        &self,
        face_id: usize,
        uv: &Vector2<f64>,
    ) -> GeomResult<(Point3<f64>, Vector3<f64>)> {
        let face = self.face(face_id)?;
        let xyz = self.map_point(&(face.origin + face.u_dir * uv.x + face.v_dir * uv.y))?;
        Ok((xyz, face.normal()))
    }

    fn resolve_on_edge(&self, edge_id: usize, xyz: &Point3<f64>, _t_guess: f64) -> GeomResult<f64> {
        // straight edges have a single branch; resolution is projection
        let (t, _) = self.nearest_on_edge(edge_id, xyz, None)?;
        Ok(t)
    }

    fn resolve_on_face(
        &self,
        face_id: usize,
        xyz: &Point3<f64>,
        _uv_guess: &Vector2<f64>,
    ) -> GeomResult<Vector2<f64>> {
        let (uv, _) = self.nearest_on_face(face_id, xyz, None)?;
        Ok(uv)
    }

    fn reversed_face_normal(&self, face_id: usize) -> bool {
        self.face(face_id).map(|f| f.reversed).unwrap_or(false)
    }

    fn displacement_is_identity(&self) -> bool {
        self.displacement.is_none()
    }

    fn map_point(&self, local: &Point3<f64>) -> GeomResult<Point3<f64>> {
        match self.displacement {
            Some(d) => Ok(local + d),
            None => Ok(*local),
        }
    }

    fn unmap_point(&self, global: &Point3<f64>) -> GeomResult<Point3<f64>> {
        match self.displacement {
            Some(d) => Ok(global - d),
            None => Ok(*global),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x_offset_backend() -> PlanarGeometry {
        let mut geom = PlanarGeometry::new();
        geom.add_face(PlanarFace::x_plane(1, 5.0));
        geom
    }

    #[test]
    fn test_x_plane_evaluation() {
        let geom = x_offset_backend();
        let at_origin = geom
            .eval_on_face(1, &Vector2::new(0.0, 0.0), DerivativeOrder::None)
            .unwrap();
        assert_relative_eq!(at_origin.xyz, Point3::new(5.0, 0.0, 0.0));

        let at_v1 = geom
            .eval_on_face(1, &Vector2::new(0.0, 1.0), DerivativeOrder::None)
            .unwrap();
        assert_relative_eq!(at_v1.xyz, Point3::new(5.0, 0.0, 1.0));
    }

    #[test]
    fn test_face_first_derivatives() {
        let geom = x_offset_backend();
        let eval = geom
            .eval_on_face(1, &Vector2::new(0.3, -0.2), DerivativeOrder::First)
            .unwrap();
        assert_relative_eq!(eval.du.unwrap(), Vector3::y());
        assert_relative_eq!(eval.dv.unwrap(), Vector3::z());
        assert!(eval.duu.is_none());
    }

    #[test]
    fn test_nearest_on_face_drops_normal_component() {
        let geom = x_offset_backend();
        let (uv, pt) = geom
            .nearest_on_face(1, &Point3::new(7.0, 2.0, 3.0), None)
            .unwrap();
        assert_relative_eq!(uv, Vector2::new(2.0, 3.0));
        assert_relative_eq!(pt, Point3::new(5.0, 2.0, 3.0));
    }

    #[test]
    fn test_edge_projection_and_eval_round_trip() {
        let mut geom = PlanarGeometry::new();
        geom.add_edge(PlanarEdge {
            id: 7,
            origin: Point3::new(0.0, 0.0, 0.0),
            direction: Vector3::new(2.0, 0.0, 0.0),
        });
        let (t, pt) = geom
            .nearest_on_edge(7, &Point3::new(1.0, 5.0, 0.0), Some(0.0))
            .unwrap();
        assert_relative_eq!(t, 0.5);
        assert_relative_eq!(pt, Point3::new(1.0, 0.0, 0.0));

        let eval = geom.eval_on_edge(7, t, DerivativeOrder::None).unwrap();
        assert_relative_eq!(eval.xyz, pt);
    }

    #[test]
    fn test_unknown_ids_fail() {
        let geom = x_offset_backend();
        assert!(matches!(
            geom.nearest_on_face(9, &Point3::origin(), None),
            Err(GeomError::UnknownFace(9))
        ));
        assert!(matches!(
            geom.eval_on_edge(3, 0.0, DerivativeOrder::None),
            Err(GeomError::UnknownEdge(3))
        ));
    }

    #[test]
    fn test_displaced_frame_round_trip() {
        let mut geom = x_offset_backend();
        geom.set_displacement(Vector3::new(0.0, 10.0, 0.0));
        assert!(!geom.displacement_is_identity());

        // global query point is un-mapped before projecting, result re-mapped
        let (uv, pt) = geom
            .nearest_on_face(1, &Point3::new(6.0, 12.0, 1.0), None)
            .unwrap();
        assert_relative_eq!(uv, Vector2::new(2.0, 1.0));
        assert_relative_eq!(pt, Point3::new(5.0, 12.0, 1.0));
    }
}
