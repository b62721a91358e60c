//! Centroid smoothing with a quality guard.

use nalgebra::Vector3;

use tet_geom::GeometryBackend;
use tet_metric::node_aspect_ratio;

use crate::engine::{SmoothEngine, SmoothOutcome};
use crate::error::SmoothResult;

impl<G: GeometryBackend> SmoothEngine<'_, G> {
    /// Move an interior node to the centroid of its cell-adjacent
    /// neighbors, keeping the move only if the worst incident aspect ratio
    /// does not degrade.
    ///
    /// Cheaper than the linear-program smoother and good enough for
    /// near-uniform neighborhoods; a node with no incident cells is left
    /// alone.
    ///
    /// # Errors
    ///
    /// Fails when the node or an incident cell is invalid.
    pub fn smart_laplacian(&mut self, node: usize) -> SmoothResult<SmoothOutcome> {
        let cell_count = self.mesh.cell_degree(node);
        if cell_count == 0 {
            return Ok(SmoothOutcome::Unchanged);
        }
        let orig_xyz = self.mesh.xyz(node)?;
        let orig_ar = node_aspect_ratio(self.mesh, node)?;

        // each incident cell contributes its three other corners plus the
        // node itself; subtract the node's share afterward
        let mut sum = Vector3::zeros();
        for ci in 0..cell_count {
            let cell = self.mesh.node_cells(node)[ci];
            for &corner in &self.mesh.cell(cell)?.nodes {
                sum += self.mesh.xyz(corner)?.coords;
            }
        }
        let n = cell_count as f64;
        let centroid = (sum - n * orig_xyz.coords) / (3.0 * n);
        self.mesh.set_xyz(node, centroid.into())?;

        let new_ar = node_aspect_ratio(self.mesh, node)?;
        if orig_ar > new_ar {
            self.mesh.set_xyz(node, orig_xyz)?;
            return Ok(SmoothOutcome::Unchanged);
        }
        Ok(SmoothOutcome::Moved)
    }
}
