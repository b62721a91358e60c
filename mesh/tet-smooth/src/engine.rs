//! The smoothing engine context and driver-level operations.

use tracing::debug;

use tet_geom::GeometryBackend;
use tet_metric::tet_volume;
use tet_types::{Class, TetMesh};

use crate::error::{SmoothError, SmoothResult};
use crate::params::SmoothParams;

/// What a smoothing operation did to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothOutcome {
    /// The node was committed to a new position.
    Moved,
    /// No improving feasible step was found; the node is untouched.
    Unchanged,
}

/// Result of one linear-program smoothing step.
#[derive(Debug, Clone, Copy)]
pub struct LpStep {
    /// Whether the node moved.
    pub outcome: SmoothOutcome,
    /// Whether another iteration is likely productive.
    pub call_again: bool,
}

impl LpStep {
    pub(crate) fn unchanged() -> Self {
        Self {
            outcome: SmoothOutcome::Unchanged,
            call_again: false,
        }
    }
}

/// Maximum linear-program iterations per node in [`SmoothEngine::smooth_node`].
const MAX_LP_RETRIES: usize = 40;

/// Rounds of depth-0 untangling in [`SmoothEngine::smooth_near_node`].
const NEAR_NODE_ROUNDS: usize = 10;

/// Node smoothing and untangling over a mesh and a geometry backend.
///
/// The engine borrows the mesh exclusively for its lifetime; every operator
/// either commits a complete position/parameter update or leaves the mesh
/// exactly as it found it (the untanglers, which commit unconditionally,
/// are the documented exception).
#[derive(Debug)]
pub struct SmoothEngine<'a, G> {
    pub(crate) mesh: &'a mut TetMesh,
    pub(crate) geometry: &'a G,
    pub(crate) params: SmoothParams,
}

impl<'a, G: GeometryBackend> SmoothEngine<'a, G> {
    /// An engine with default parameters.
    pub fn new(mesh: &'a mut TetMesh, geometry: &'a G) -> Self {
        Self {
            mesh,
            geometry,
            params: SmoothParams::default(),
        }
    }

    /// An engine with explicit parameters.
    pub fn with_params(mesh: &'a mut TetMesh, geometry: &'a G, params: SmoothParams) -> Self {
        Self {
            mesh,
            geometry,
            params,
        }
    }

    /// The mesh being smoothed.
    #[must_use]
    pub fn mesh(&self) -> &TetMesh {
        self.mesh
    }

    /// The engine parameters.
    #[must_use]
    pub fn params(&self) -> &SmoothParams {
        &self.params
    }

    pub(crate) fn classification(&self, node: usize) -> SmoothResult<Class> {
        Ok(self.mesh.classification(node)?)
    }

    /// Minimum orientation-corrected parametric area over the node's
    /// incident faces.
    pub(crate) fn min_face_area_uv(&self, node: usize) -> SmoothResult<f64> {
        let geometry = self.geometry;
        Ok(tet_metric::min_face_area_uv(self.mesh, node, |id| {
            geometry.reversed_face_normal(id)
        })?)
    }

    /// Smooth one node, dispatching on its geometric classification.
    ///
    /// Corners never move. Edge nodes run the golden-section curve search,
    /// face nodes the parametric linear-program smoother, interior nodes
    /// the Cartesian one; the two LP smoothers retry while their step
    /// reports `call_again`, up to 40 times.
    ///
    /// # Errors
    ///
    /// Propagates geometry, mesh, and solver failures; finding no
    /// improving step is not an error.
    pub fn smooth_node(&mut self, node: usize) -> SmoothResult<SmoothOutcome> {
        match self.classification(node)? {
            Class::Corner => Ok(SmoothOutcome::Unchanged),
            Class::OnEdge(_) => self.line_search_t(node),
            Class::OnFace(_) => {
                if !self.params.smooth_on_surface {
                    return Ok(SmoothOutcome::Unchanged);
                }
                let mut outcome = SmoothOutcome::Unchanged;
                for _ in 0..MAX_LP_RETRIES {
                    let step = self.smooth_uv(node)?;
                    if step.outcome == SmoothOutcome::Moved {
                        outcome = SmoothOutcome::Moved;
                    }
                    if !step.call_again {
                        break;
                    }
                }
                Ok(outcome)
            }
            Class::Interior => {
                let mut outcome = SmoothOutcome::Unchanged;
                for _ in 0..MAX_LP_RETRIES {
                    let step = self.smooth_xyz(node)?;
                    if step.outcome == SmoothOutcome::Moved {
                        outcome = SmoothOutcome::Moved;
                    }
                    if !step.call_again {
                        break;
                    }
                }
                Ok(outcome)
            }
        }
    }

    /// Untangle the whole neighborhood around a node.
    ///
    /// Collects the two-ring of cell-adjacent nodes (boundary nodes are
    /// excluded unless `smooth_on_surface`) and runs 10 rounds of depth-0
    /// volume untangling over the list. Individual untangle failures are
    /// skipped; this is the repair pass for a neighborhood that inverted.
    ///
    /// # Errors
    ///
    /// Fails when the node index is out of range.
    pub fn smooth_near_node(
        &mut self,
        node: usize,
        smooth_on_surface: bool,
    ) -> SmoothResult<()> {
        if !self.mesh.valid_node(node) {
            return Err(SmoothError::InvalidNode(node));
        }

        let mut list: Vec<usize> = Vec::new();
        for ci in 0..self.mesh.cell_degree(node) {
            let ring_cell = self.mesh.node_cells(node)[ci];
            let ring_nodes = self.mesh.cell(ring_cell)?.nodes;
            for &mid in &ring_nodes {
                for cj in 0..self.mesh.cell_degree(mid) {
                    let far_cell = self.mesh.node_cells(mid)[cj];
                    for &far in &self.mesh.cell(far_cell)?.nodes {
                        if !smooth_on_surface && !self.mesh.is_interior(far) {
                            continue;
                        }
                        if !list.contains(&far) {
                            list.push(far);
                        }
                    }
                }
            }
        }

        for _ in 0..NEAR_NODE_ROUNDS {
            for &n in &list {
                if let Err(err) = self.untangle_volume(n, 0, true) {
                    debug!(node = n, %err, "near-node untangle skipped");
                }
            }
        }
        Ok(())
    }

    /// Scan every cell and repair the neighborhood of each non-positive
    /// one, returning how many cells triggered a repair.
    ///
    /// # Errors
    ///
    /// Fails when a cell references an invalid node.
    pub fn relax_negative_cells(&mut self) -> SmoothResult<usize> {
        let mut repaired = 0;
        for cell in 0..self.mesh.cell_count() {
            let nodes = self.mesh.cell(cell)?.nodes;
            let xyz = [
                self.mesh.xyz(nodes[0])?,
                self.mesh.xyz(nodes[1])?,
                self.mesh.xyz(nodes[2])?,
                self.mesh.xyz(nodes[3])?,
            ];
            if tet_volume(&xyz) <= 0.0 {
                repaired += 1;
                debug!(cell, "relaxing neighborhood of non-positive cell");
                for &corner in &nodes {
                    self.smooth_near_node(corner, false)?;
                }
            }
        }
        Ok(repaired)
    }
}

/// Bring `nodes` into an even permutation with `node` in position 0.
///
/// Double transpositions preserve the cell's orientation, so the signed
/// volume of the returned ordering equals the original.
pub(crate) fn orient_cell(nodes: [usize; 4], node: usize) -> [usize; 4] {
    match nodes.iter().position(|&n| n == node) {
        Some(1) => [nodes[1], nodes[0], nodes[3], nodes[2]],
        Some(2) => [nodes[2], nodes[3], nodes[0], nodes[1]],
        Some(3) => [nodes[3], nodes[2], nodes[1], nodes[0]],
        _ => nodes,
    }
}

/// Rotate `nodes` so `node` is in position 0, preserving winding.
pub(crate) fn orient_face(nodes: [usize; 3], node: usize) -> [usize; 3] {
    match nodes.iter().position(|&n| n == node) {
        Some(1) => [nodes[1], nodes[2], nodes[0]],
        Some(2) => [nodes[2], nodes[0], nodes[1]],
        _ => nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient_cell_is_even() {
        let nodes = [10, 11, 12, 13];
        for &target in &nodes {
            let oriented = orient_cell(nodes, target);
            assert_eq!(oriented[0], target);
            let mut sorted = oriented;
            sorted.sort_unstable();
            assert_eq!(sorted, nodes);
            // count inversions relative to the original ordering
            let index = |n: usize| nodes.iter().position(|&x| x == n).unwrap();
            let perm: Vec<usize> = oriented.iter().map(|&n| index(n)).collect();
            let mut inversions = 0;
            for i in 0..4 {
                for j in (i + 1)..4 {
                    if perm[i] > perm[j] {
                        inversions += 1;
                    }
                }
            }
            assert_eq!(inversions % 2, 0, "orientation parity flipped");
        }
    }

    #[test]
    fn test_orient_face_rotates() {
        assert_eq!(orient_face([7, 8, 9], 8), [8, 9, 7]);
        assert_eq!(orient_face([7, 8, 9], 9), [9, 7, 8]);
        assert_eq!(orient_face([7, 8, 9], 7), [7, 8, 9]);
    }
}
