//! Golden-section search along a geometry edge.

use tet_geom::GeometryBackend;
use tet_metric::{edge_ratio, node_aspect_ratio};
use tet_types::Class;

use crate::engine::{SmoothEngine, SmoothOutcome};
use crate::error::{SmoothError, SmoothResult};

const MAX_EXPANSIONS: usize = 100;

impl<G: GeometryBackend> SmoothEngine<'_, G> {
    /// Slide an edge node along its curve to equalize the metric length
    /// ratio toward its two curve neighbors.
    ///
    /// Walks toward the longer neighbor, expanding the step by the golden
    /// ratio while the equality ratio improves (staying below 1) and every
    /// adjacent cell keeps an aspect ratio above
    /// `params.min_surface_cost`; the last feasible step is committed.
    ///
    /// # Errors
    ///
    /// [`SmoothError::GhostNode`] for a ghost node,
    /// [`SmoothError::NotOnSingleEdge`] when the node's first two curve
    /// segments do not share one geometry edge.
    pub fn line_search_t(&mut self, node: usize) -> SmoothResult<SmoothOutcome> {
        let gold = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let cost_limit = self.params.min_surface_cost;

        if matches!(self.classification(node)?, Class::Corner) {
            return Ok(SmoothOutcome::Unchanged);
        }
        if self.mesh.is_ghost(node) {
            return Err(SmoothError::GhostNode(node));
        }

        let segments = self.mesh.node_edges(node);
        if segments.len() < 2 {
            return Err(SmoothError::NotOnSingleEdge(node));
        }
        let first = *self.mesh.edge(segments[0])?;
        let second = *self.mesh.edge(segments[1])?;
        if first.edge_id != second.edge_id {
            return Err(SmoothError::NotOnSingleEdge(node));
        }
        let edge_id = first.edge_id;
        let mut node1 = first
            .other_node(node)
            .ok_or(SmoothError::InvalidNode(node))?;
        let mut node2 = second
            .other_node(node)
            .ok_or(SmoothError::InvalidNode(node))?;

        // walk toward the neighbor with the longer metric length
        let ratio1 = edge_ratio(self.mesh, node, node1)?;
        let ratio2 = edge_ratio(self.mesh, node, node2)?;
        if ratio2 > ratio1 {
            std::mem::swap(&mut node1, &mut node2);
        }

        let t_start = self.mesh.node_t(node, edge_id)?;
        let t_end = self.mesh.node_t(node1, edge_id)?;
        let dt = t_end - t_start;

        let probe = |engine: &mut Self, alpha: f64| -> SmoothResult<(f64, f64)> {
            engine.evaluate_edge_at_t(node, t_start + alpha * dt)?;
            let ar = node_aspect_ratio(engine.mesh, node)?;
            let r1 = edge_ratio(engine.mesh, node, node1)?;
            let r2 = edge_ratio(engine.mesh, node, node2)?;
            Ok((ar, r2 / r1))
        };

        let mut alpha = [0.0, 1.0e-10];
        let (_, mut equality_low) = probe(self, alpha[0])?;
        let (mut ar_high, mut equality_high) = probe(self, alpha[1])?;

        let mut iter = 0;
        while equality_high > equality_low
            && equality_high < 1.0
            && ar_high > cost_limit
            && iter < MAX_EXPANSIONS
        {
            iter += 1;
            alpha[0] = alpha[1];
            equality_low = equality_high;
            alpha[1] *= gold;
            let (ar, equality) = probe(self, alpha[1])?;
            ar_high = ar;
            equality_high = equality;
        }

        // commit the last feasible point
        self.evaluate_edge_at_t(node, t_start + alpha[0] * dt)?;
        if alpha[0] > 0.0 {
            Ok(SmoothOutcome::Moved)
        } else {
            Ok(SmoothOutcome::Unchanged)
        }
    }
}
