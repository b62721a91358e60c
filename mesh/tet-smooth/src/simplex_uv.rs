//! Derivative-free parametric area maximization.
//!
//! A Nelder-Mead simplex over `(u, v)` that maximizes the minimum
//! orientation-corrected parametric area of a face node's incident faces.
//! Used where gradients are useless, i.e. when some incident face is
//! already folded in the parameter plane.

use nalgebra::Vector2;

use tet_geom::GeometryBackend;
use tet_metric::average_edge_length;
use tet_types::Class;

use crate::engine::{SmoothEngine, SmoothOutcome};
use crate::error::{SmoothError, SmoothResult};

const MAX_EVALUATIONS: usize = 1000;

impl<G: GeometryBackend> SmoothEngine<'_, G> {
    /// Maximize the minimum parametric face area around a face node with
    /// three successive simplex restarts.
    ///
    /// Restarting rebuilds the simplex at the current optimum with a fresh
    /// length scale, which recovers from a degenerate final simplex. Nodes
    /// pinned to corners or geometry edges are left alone.
    ///
    /// # Errors
    ///
    /// [`SmoothError::NotOnSingleFace`] for interior nodes; propagates
    /// geometry and mesh failures.
    pub fn smooth_face_area_uv(&mut self, node: usize) -> SmoothResult<SmoothOutcome> {
        match self.classification(node)? {
            Class::OnFace(_) => {}
            Class::OnEdge(_) | Class::Corner => return Ok(SmoothOutcome::Unchanged),
            Class::Interior => return Err(SmoothError::NotOnSingleFace(node)),
        }
        let mut outcome = SmoothOutcome::Unchanged;
        for _ in 0..3 {
            if self.face_area_uv_simplex(node)? == SmoothOutcome::Moved {
                outcome = SmoothOutcome::Moved;
            }
        }
        Ok(outcome)
    }

    /// One simplex pass. The initial simplex is the stored `(u, v)` plus
    /// two axis steps of a tenth of the average incident edge length.
    fn face_area_uv_simplex(&mut self, node: usize) -> SmoothResult<SmoothOutcome> {
        let Class::OnFace(face_id) = self.classification(node)? else {
            return Err(SmoothError::NotOnSingleFace(node));
        };
        let orig_uv = self.mesh.node_uv(node, face_id)?;
        let length_scale = 0.1 * average_edge_length(self.mesh, node)?;

        let mut simplex = [
            orig_uv,
            orig_uv + Vector2::new(length_scale, 0.0),
            orig_uv + Vector2::new(0.0, length_scale),
        ];
        let mut area = [0.0; 3];
        for s in 0..3 {
            self.mesh.set_node_uv(node, face_id, simplex[s])?;
            area[s] = self.min_face_area_uv(node)?;
        }

        // running vertex sum, updated incrementally by the reflections
        let mut avg_uv = simplex[0] + simplex[1] + simplex[2];

        let mut evaluations = 3;
        while evaluations < MAX_EVALUATIONS {
            let mut best = 0;
            let (mut middle, mut worst) = if area[0] > area[1] { (0, 1) } else { (1, 0) };
            for s in 0..3 {
                if area[s] >= area[best] {
                    best = s;
                }
                if area[s] < area[worst] {
                    middle = worst;
                    worst = s;
                } else if s != worst && area[s] < area[middle] {
                    middle = s;
                }
            }

            if area[best] - area[worst] < (1.0e-8 * area[best]).abs() {
                break;
            }

            evaluations += 1;
            let new_area =
                self.reflect_face_area_uv(node, face_id, &mut simplex, &mut area, &mut avg_uv, worst, -1.0)?;
            if new_area >= area[best] {
                evaluations += 1;
                self.reflect_face_area_uv(node, face_id, &mut simplex, &mut area, &mut avg_uv, worst, 2.0)?;
            } else if new_area <= area[middle] {
                let saved_area = area[worst];
                evaluations += 1;
                let new_area =
                    self.reflect_face_area_uv(node, face_id, &mut simplex, &mut area, &mut avg_uv, worst, 0.5)?;
                if new_area <= saved_area {
                    // contraction failed too; shrink everything toward best
                    for s in 0..3 {
                        if s != best {
                            simplex[s] = 0.5 * (simplex[s] + simplex[best]);
                            self.mesh.set_node_uv(node, face_id, simplex[s])?;
                            area[s] = self.min_face_area_uv(node)?;
                        }
                    }
                }
            }
        }

        let mut best = 0;
        for s in 1..3 {
            if area[s] >= area[best] {
                best = s;
            }
        }
        self.evaluate_face_at_uv(node, &simplex[best])?;
        if simplex[best] == orig_uv {
            Ok(SmoothOutcome::Unchanged)
        } else {
            Ok(SmoothOutcome::Moved)
        }
    }

    /// Reflect the worst vertex through the opposite edge midpoint by
    /// `factor`, keeping the trial only when it improves the worst area.
    /// Returns the trial area either way.
    #[allow(clippy::too_many_arguments)]
    fn reflect_face_area_uv(
        &mut self,
        node: usize,
        face_id: usize,
        simplex: &mut [Vector2<f64>; 3],
        area: &mut [f64; 3],
        avg_uv: &mut Vector2<f64>,
        worst: usize,
        factor: f64,
    ) -> SmoothResult<f64> {
        let factor1 = (1.0 - factor) / 2.0;
        let factor2 = factor1 - factor;
        let reflected = factor1 * *avg_uv - factor2 * simplex[worst];

        self.mesh.set_node_uv(node, face_id, reflected)?;
        let reflected_area = self.min_face_area_uv(node)?;

        if reflected_area > area[worst] {
            area[worst] = reflected_area;
            *avg_uv += reflected - simplex[worst];
            simplex[worst] = reflected;
        }
        Ok(reflected_area)
    }
}
