//! Keeping classified nodes on their geometry.
//!
//! Every operation here either commits a complete position/parameter
//! update or aborts before touching the mesh; a geometry failure never
//! leaves the pair out of sync.

use tracing::{debug, warn};

use tet_geom::{DerivativeOrder, GeometryBackend};
use tet_types::{Class, Vector2, Vector3};

use crate::engine::SmoothEngine;
use crate::error::{SmoothError, SmoothResult};

impl<G: GeometryBackend> SmoothEngine<'_, G> {
    /// Forward-evaluate an edge node at parameter `t` and commit position,
    /// parameter, and the re-resolved uv of every incident face.
    ///
    /// # Errors
    ///
    /// Fails when the node is not edge-classified or evaluation fails.
    pub fn evaluate_edge_at_t(&mut self, node: usize, t: f64) -> SmoothResult<()> {
        let Class::OnEdge(edge_id) = self.classification(node)? else {
            return Err(SmoothError::NotOnSingleEdge(node));
        };
        let eval = self
            .geometry
            .eval_on_edge(edge_id, t, DerivativeOrder::None)?;
        self.mesh.set_node_t(node, edge_id, t)?;
        self.mesh.set_xyz(node, eval.xyz)?;
        self.update_face_parameters(node)
    }

    /// Forward-evaluate a face node at parameter `(u, v)` and commit
    /// position and parameter.
    ///
    /// # Errors
    ///
    /// Fails when the node is not face-classified or evaluation fails.
    pub fn evaluate_face_at_uv(&mut self, node: usize, uv: &Vector2<f64>) -> SmoothResult<()> {
        let Class::OnFace(face_id) = self.classification(node)? else {
            return Err(SmoothError::NotOnSingleFace(node));
        };
        let eval = self
            .geometry
            .eval_on_face(face_id, uv, DerivativeOrder::None)?;
        self.mesh.set_node_uv(node, face_id, *uv)?;
        self.mesh.set_xyz(node, eval.xyz)?;
        Ok(())
    }

    /// Project an edge node to the nearest point of its curve, seeding the
    /// search with the stored parameter.
    ///
    /// # Errors
    ///
    /// Fails when the node is off the named edge or the search fails.
    pub fn project_node_to_edge(&mut self, node: usize, edge_id: usize) -> SmoothResult<()> {
        let xyz = self.mesh.xyz(node)?;
        let seed = self.mesh.node_t(node, edge_id)?;
        let (t, projected) = self.geometry.nearest_on_edge(edge_id, &xyz, Some(seed))?;
        self.mesh.set_xyz(node, projected)?;
        self.mesh.set_node_t(node, edge_id, t)?;
        self.update_face_parameters(node)
    }

    /// Project a face node to the nearest point of its surface, seeding
    /// the search with the stored parameter.
    ///
    /// # Errors
    ///
    /// Fails when the node is off the named face or the search fails.
    pub fn project_node_to_face(&mut self, node: usize, face_id: usize) -> SmoothResult<()> {
        let xyz = self.mesh.xyz(node)?;
        let seed = self.mesh.node_uv(node, face_id)?;
        let (uv, projected) = self.geometry.nearest_on_face(face_id, &xyz, Some(seed))?;
        self.mesh.set_xyz(node, projected)?;
        self.mesh.set_node_uv(node, face_id, uv)?;
        self.update_face_parameters(node)
    }

    /// Snap the stored edge parameter to the branch consistent with the
    /// node's current position, without moving the node.
    ///
    /// # Errors
    ///
    /// Fails when the node is off the named edge or resolution fails.
    pub fn resolve_edge_t(&mut self, node: usize, edge_id: usize) -> SmoothResult<()> {
        let xyz = self.mesh.xyz(node)?;
        let guess = self.mesh.node_t(node, edge_id)?;
        let t = self.geometry.resolve_on_edge(edge_id, &xyz, guess)?;
        self.mesh.set_node_t(node, edge_id, t)?;
        Ok(())
    }

    /// Snap the stored face parameter to the branch consistent with the
    /// node's current position, without moving the node.
    ///
    /// # Errors
    ///
    /// Fails when the node is off the named face or resolution fails.
    pub fn resolve_face_uv(&mut self, node: usize, face_id: usize) -> SmoothResult<()> {
        let xyz = self.mesh.xyz(node)?;
        let guess = self.mesh.node_uv(node, face_id)?;
        let uv = self.geometry.resolve_on_face(face_id, &xyz, &guess)?;
        self.mesh.set_node_uv(node, face_id, uv)?;
        Ok(())
    }

    /// Re-resolve the curve parameter on every edge incident to the node,
    /// then every face parameter.
    ///
    /// # Errors
    ///
    /// Fails when any resolution fails.
    pub fn update_parameters(&mut self, node: usize) -> SmoothResult<()> {
        for i in 0..self.mesh.edge_degree(node) {
            let edge = self.mesh.node_edges(node)[i];
            let edge_id = self.mesh.edge(edge)?.edge_id;
            self.resolve_edge_t(node, edge_id)?;
        }
        self.update_face_parameters(node)
    }

    /// Re-resolve the surface parameter on every face incident to the node.
    ///
    /// # Errors
    ///
    /// Fails when any resolution fails.
    pub fn update_face_parameters(&mut self, node: usize) -> SmoothResult<()> {
        for i in 0..self.mesh.face_degree(node) {
            let face = self.mesh.node_faces(node)[i];
            let face_id = self.mesh.face(face)?.face_id;
            self.resolve_face_uv(node, face_id)?;
        }
        Ok(())
    }

    /// Put a node back on its geometry, dispatching on classification.
    ///
    /// Corners only re-resolve their parameters; edge and face nodes
    /// project to their single owning entity; interior nodes are left
    /// alone.
    ///
    /// # Errors
    ///
    /// Fails when projection or resolution fails.
    pub fn project_node(&mut self, node: usize) -> SmoothResult<()> {
        match self.classification(node)? {
            Class::Corner => self.update_parameters(node),
            Class::OnEdge(edge_id) => self.project_node_to_edge(node, edge_id),
            Class::OnFace(face_id) => self.project_node_to_face(node, face_id),
            Class::Interior => Ok(()),
        }
    }

    /// Project every valid, unfrozen node, tallying failures instead of
    /// aborting. Returns the failure count; the caller decides severity.
    pub fn project_all(&mut self) -> usize {
        let mut failures = 0;
        for node in 0..self.mesh.node_count() {
            if self.mesh.is_frozen(node) {
                continue;
            }
            if let Err(err) = self.project_node(node) {
                debug!(node, %err, "projection failed");
                failures += 1;
            }
        }
        if failures > 0 {
            warn!(
                failures,
                nodes = self.mesh.node_count(),
                "some nodes were not projected"
            );
        }
        failures
    }

    /// The additive correction that would put a boundary node back on its
    /// geometry, without committing it.
    ///
    /// Evaluating at the stored parameter and differencing (instead of
    /// overwriting with the absolute evaluation) keeps repeated refreshes
    /// from compounding re-parameterization error. Interior and frozen
    /// nodes report a zero displacement.
    ///
    /// # Errors
    ///
    /// Fails when evaluation at the stored parameter fails.
    pub fn projection_displacement(&mut self, node: usize) -> SmoothResult<Vector3<f64>> {
        if self.mesh.is_frozen(node) {
            return Ok(Vector3::zeros());
        }
        let original = self.mesh.xyz(node)?;
        match self.classification(node)? {
            Class::Interior => return Ok(Vector3::zeros()),
            Class::Corner => {}
            Class::OnEdge(edge_id) => {
                let t = self.mesh.node_t(node, edge_id)?;
                self.evaluate_edge_at_t(node, t)?;
            }
            Class::OnFace(face_id) => {
                let uv = self.mesh.node_uv(node, face_id)?;
                self.evaluate_face_at_uv(node, &uv)?;
            }
        }
        let displacement = self.mesh.xyz(node)? - original;
        self.mesh.set_xyz(node, original)?;
        Ok(displacement)
    }

    /// Apply [`Self::projection_displacement`] to every valid, unfrozen
    /// boundary node.
    ///
    /// # Errors
    ///
    /// Fails when any displacement evaluation fails.
    pub fn evaluate_all_displacements(&mut self) -> SmoothResult<()> {
        for node in 0..self.mesh.node_count() {
            if self.mesh.is_frozen(node) || self.mesh.is_interior(node) {
                continue;
            }
            let displacement = self.projection_displacement(node)?;
            let xyz = self.mesh.xyz(node)? + displacement;
            self.mesh.set_xyz(node, xyz)?;
        }
        Ok(())
    }
}
