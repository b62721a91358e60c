//! Worst-element linear-program smoothing.
//!
//! Both smoothers linearize a per-element quality cost around the node,
//! pick the worst element's gradient (blending with the nearest competitor
//! when the two are nearly tied), cap the step where a better-off
//! element's linear model would cross the worst cost, and backtrack with a
//! sufficient-decrease test.

use nalgebra::Vector3;

use tet_geom::{DerivativeOrder, GeomError, GeometryBackend};
use tet_metric::{
    node_aspect_ratio, node_face_mean_ratio, tet_aspect_ratio_derivative,
    tri_mean_ratio_derivative,
};
use tet_types::Class;

use crate::engine::{orient_cell, orient_face, LpStep, SmoothEngine, SmoothOutcome};
use crate::error::{SmoothError, SmoothResult};
use crate::params::CostFunction;

const MAX_BACKTRACKS: usize = 30;

/// A linearized element cost: value and gradient with respect to the
/// node's position (Cartesian, or tangent-restricted for surfaces).
#[derive(Debug, Clone, Copy)]
pub(crate) struct StoredCost {
    pub cost: f64,
    pub gradient: Vector3<f64>,
}

/// Worst element, its cost, the unit search direction, and the gradient
/// magnitude along it. `None` when there are no elements or the direction
/// degenerates.
fn search_direction(costs: &[StoredCost]) -> Option<(usize, f64, Vector3<f64>, f64)> {
    let mut min_cost = 2.1;
    let mut min_index = None;
    for (i, c) in costs.iter().enumerate() {
        if c.cost < min_cost {
            min_cost = c.cost;
            min_index = Some(i);
        }
    }
    let min_index = min_index?;
    let min_direction = costs[min_index].gradient;

    let mut nearest_index = None;
    let mut nearest_difference = 2.1;
    for (i, c) in costs.iter().enumerate() {
        if i != min_index {
            let difference = (c.cost - min_cost).abs();
            if difference < nearest_difference {
                nearest_index = Some(i);
                nearest_difference = difference;
            }
        }
    }

    let mut direction = min_direction;
    if let Some(nearest) = nearest_index {
        if nearest_difference <= 0.001 {
            // closed-form minimizer of the quadratic over the 2-simplex of
            // the two gradients
            let nearest_direction = costs[nearest].gradient;
            let g00 = min_direction.dot(&min_direction);
            let g11 = nearest_direction.dot(&nearest_direction);
            let g01 = min_direction.dot(&nearest_direction);
            let denom = g00 + g11 - 2.0 * g01;
            let nearest_ratio = if denom.abs() < 1.0e-12 {
                0.0
            } else {
                (g00 - g01) / denom
            };
            if nearest_ratio > 0.0 && nearest_ratio < 1.0 {
                let blended =
                    (1.0 - nearest_ratio) * min_direction + nearest_ratio * nearest_direction;
                let length = blended.norm();
                if length > 1.0e-12 {
                    let unit = blended / length;
                    direction = unit.dot(&min_direction) * unit;
                }
            }
        }
    }

    let length = direction.norm();
    if length < 1.0e-12 {
        return None;
    }
    Some((min_index, min_cost, direction / length, length))
}

/// Largest step before any better-off element's linear model crosses the
/// worst element's current cost.
fn cap_step(
    costs: &[StoredCost],
    min_index: usize,
    min_cost: f64,
    direction: &Vector3<f64>,
    projection_zero: f64,
) -> f64 {
    let mut alpha = 1.0;
    for (i, c) in costs.iter().enumerate() {
        if i != min_index {
            let projection = direction.dot(&c.gradient);
            let delta = c.cost - min_cost;
            let current = if projection.abs() < projection_zero {
                1.0 // no intersection
            } else {
                delta / projection
            };
            if current > 0.0 && current < alpha {
                alpha = current;
            }
        }
    }
    alpha
}

impl<G: GeometryBackend> SmoothEngine<'_, G> {
    /// Aspect ratio and Cartesian gradient of every cell incident to the
    /// node, each cell oriented with the node first.
    pub(crate) fn store_volume_cost_derivatives(
        &self,
        node: usize,
    ) -> SmoothResult<Vec<StoredCost>> {
        if !self.mesh.valid_node(node) {
            return Err(SmoothError::InvalidNode(node));
        }
        let mut costs = Vec::with_capacity(self.mesh.cell_degree(node));
        for &cell in self.mesh.node_cells(node) {
            let oriented = orient_cell(self.mesh.cell(cell)?.nodes, node);
            let xyz = [
                self.mesh.xyz(oriented[0])?,
                self.mesh.xyz(oriented[1])?,
                self.mesh.xyz(oriented[2])?,
                self.mesh.xyz(oriented[3])?,
            ];
            let (cost, gradient) = tet_aspect_ratio_derivative(&xyz);
            costs.push(StoredCost { cost, gradient });
        }
        Ok(costs)
    }

    /// Mean ratio and Cartesian gradient of every boundary face incident
    /// to the node, each face rotated with the node first.
    pub(crate) fn store_face_cost_derivatives(&self, node: usize) -> SmoothResult<Vec<StoredCost>> {
        if !self.mesh.valid_node(node) {
            return Err(SmoothError::InvalidNode(node));
        }
        let mut costs = Vec::with_capacity(self.mesh.face_degree(node));
        for &face in self.mesh.node_faces(node) {
            let oriented = orient_face(self.mesh.face(face)?.nodes, node);
            let xyz = [
                self.mesh.xyz(oriented[0])?,
                self.mesh.xyz(oriented[1])?,
                self.mesh.xyz(oriented[2])?,
            ];
            let (cost, gradient) = tri_mean_ratio_derivative(&xyz);
            costs.push(StoredCost { cost, gradient });
        }
        Ok(costs)
    }

    /// Chain-rule the stored Cartesian gradients into the face's `(u, v)`
    /// tangent basis.
    pub(crate) fn restrict_cost_to_uv(
        &self,
        node: usize,
        costs: &mut [StoredCost],
    ) -> SmoothResult<()> {
        let Class::OnFace(face_id) = self.classification(node)? else {
            return Err(SmoothError::NotOnSingleFace(node));
        };
        let uv = self.mesh.node_uv(node, face_id)?;
        let eval = self
            .geometry
            .eval_on_face(face_id, &uv, DerivativeOrder::First)?;
        let missing = GeomError::EvaluationFailed {
            entity: "face",
            id: face_id,
        };
        let du = eval.du.ok_or(missing.clone())?;
        let dv = eval.dv.ok_or(missing)?;
        for c in costs.iter_mut() {
            c.gradient = Vector3::new(c.gradient.dot(&du), c.gradient.dot(&dv), 0.0);
        }
        Ok(())
    }

    /// One linear-program step of a face node over `(u, v)`.
    ///
    /// The step is feasible only while the minimum parametric area of the
    /// incident faces stays positive and the adjacent cells keep an aspect
    /// ratio above `params.min_surface_cost`; with no improving feasible
    /// step the original parameter is restored.
    ///
    /// # Errors
    ///
    /// Propagates geometry and mesh failures mid-step; the node is left at
    /// a committed, synchronized state.
    pub fn smooth_uv(&mut self, node: usize) -> SmoothResult<LpStep> {
        if !self.mesh.valid_node(node) {
            return Err(SmoothError::InvalidNode(node));
        }
        let Class::OnFace(face_id) = self.classification(node)? else {
            return Ok(LpStep::unchanged());
        };
        let conformity = self.params.cost_function == CostFunction::MetricConformity;
        let orig_uv = self.mesh.node_uv(node, face_id)?;

        let mut costs = if conformity {
            self.store_volume_cost_derivatives(node)?
        } else {
            self.store_face_cost_derivatives(node)?
        };
        self.restrict_cost_to_uv(node, &mut costs)?;

        let Some((min_index, min_cost, direction, length)) = search_direction(&costs) else {
            return Ok(LpStep::unchanged());
        };
        let mut alpha = cap_step(&costs, min_index, min_cost, &direction, 1.0e-8);

        let mut good_step = false;
        let mut actual = 0.0;
        let mut last_improvement = -10.0;
        let mut constraint = 1.0;
        let mut last_alpha = alpha;
        let mut parameter_area = self.min_face_area_uv(node)?;
        let mut iteration = 0;
        while alpha > 0.1e-9 && !good_step && iteration < MAX_BACKTRACKS {
            iteration += 1;
            let predicted = length * alpha;

            let uv = orig_uv + alpha * direction.xy();
            self.mesh.set_node_uv(node, face_id, uv)?;
            parameter_area = self.min_face_area_uv(node)?;
            if parameter_area < 1.0e-14 {
                alpha *= 0.6;
                continue;
            }
            self.evaluate_face_at_uv(node, &uv)?;
            let mut new_cost = node_face_mean_ratio(self.mesh, node)?;
            constraint = node_aspect_ratio(self.mesh, node)?;
            if conformity {
                new_cost = constraint;
            }
            actual = new_cost - min_cost;

            // past the best alpha of this search direction; fall back
            if actual < last_improvement && constraint > self.params.min_surface_cost {
                let uv = orig_uv + last_alpha * direction.xy();
                self.mesh.set_node_uv(node, face_id, uv)?;
                parameter_area = self.min_face_area_uv(node)?;
                if parameter_area < 1.0e-14 {
                    alpha *= 0.6;
                    continue;
                }
                self.evaluate_face_at_uv(node, &uv)?;
                let mut new_cost = node_face_mean_ratio(self.mesh, node)?;
                constraint = node_aspect_ratio(self.mesh, node)?;
                if conformity {
                    new_cost = constraint;
                }
                actual = new_cost - min_cost;
                break;
            }

            if actual > 0.9 * predicted && constraint > self.params.min_surface_cost {
                good_step = true;
            } else {
                last_improvement = actual;
                last_alpha = alpha;
                alpha *= 0.6;
            }
        }

        if actual <= 0.0
            || constraint < self.params.min_surface_cost
            || parameter_area < 1.0e-14
        {
            self.evaluate_face_at_uv(node, &orig_uv)?;
            return Ok(LpStep::unchanged());
        }

        Ok(LpStep {
            outcome: SmoothOutcome::Moved,
            call_again: actual > 1.0e-10 || good_step,
        })
    }

    /// One linear-program step of an interior node over `(x, y, z)`.
    ///
    /// Any position is geometrically admissible, so there is no area
    /// guard; the retry flag clears once the worst aspect ratio is within
    /// 1e-3 of its maximum.
    ///
    /// # Errors
    ///
    /// Propagates mesh failures; with no improving step the original
    /// position is restored.
    pub fn smooth_xyz(&mut self, node: usize) -> SmoothResult<LpStep> {
        let orig_xyz = self.mesh.xyz(node)?;
        let costs = self.store_volume_cost_derivatives(node)?;

        let Some((min_index, min_ar, direction, length)) = search_direction(&costs) else {
            return Ok(LpStep::unchanged());
        };
        let mut alpha = cap_step(&costs, min_index, min_ar, &direction, 1.0e-12);

        let mut good_step = false;
        let mut actual = 0.0;
        let mut last_improvement = -10.0;
        let mut last_alpha = alpha;
        let mut new_ar = min_ar;
        let mut iteration = 0;
        while alpha > 1.0e-12 && !good_step && iteration < MAX_BACKTRACKS {
            iteration += 1;
            let predicted = length * alpha;

            self.mesh.set_xyz(node, orig_xyz + alpha * direction)?;
            new_ar = node_aspect_ratio(self.mesh, node)?;
            actual = new_ar - min_ar;

            // overshot the best alpha; fall back and accept
            if actual > 0.0 && actual < last_improvement {
                self.mesh.set_xyz(node, orig_xyz + last_alpha * direction)?;
                new_ar = node_aspect_ratio(self.mesh, node)?;
                actual = new_ar - min_ar;
                good_step = true;
            }

            if actual > 0.9 * predicted {
                good_step = true;
            } else {
                last_improvement = actual;
                last_alpha = alpha;
                alpha *= 0.5;
            }
        }

        if actual <= 0.0 {
            self.mesh.set_xyz(node, orig_xyz)?;
            return Ok(LpStep::unchanged());
        }

        Ok(LpStep {
            outcome: SmoothOutcome::Moved,
            call_again: (actual > 1.0e-12 || good_step) && new_ar < 0.999,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_element_direction_is_its_gradient() {
        let costs = [StoredCost {
            cost: 0.2,
            gradient: Vector3::new(3.0, 0.0, 0.0),
        }];
        let (index, cost, direction, length) = search_direction(&costs).unwrap();
        assert_eq!(index, 0);
        assert_relative_eq!(cost, 0.2);
        assert_relative_eq!(direction, Vector3::x());
        assert_relative_eq!(length, 3.0);
    }

    #[test]
    fn test_tied_elements_blend_gradients() {
        // two tied worst elements with opposing gradients blend to the
        // symmetric direction between them
        let costs = [
            StoredCost {
                cost: 0.2,
                gradient: Vector3::new(1.0, 1.0, 0.0),
            },
            StoredCost {
                cost: 0.2001,
                gradient: Vector3::new(-1.0, 1.0, 0.0),
            },
        ];
        let (_, _, direction, _) = search_direction(&costs).unwrap();
        assert_relative_eq!(direction, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_gradient_yields_no_direction() {
        let costs = [StoredCost {
            cost: 0.5,
            gradient: Vector3::zeros(),
        }];
        assert!(search_direction(&costs).is_none());
    }

    #[test]
    fn test_step_capped_at_first_crossing() {
        let costs = [
            StoredCost {
                cost: 0.2,
                gradient: Vector3::x(),
            },
            StoredCost {
                cost: 0.3,
                gradient: Vector3::x(),
            },
        ];
        // competitor's model crosses at (0.3 - 0.2) / 1.0
        let alpha = cap_step(&costs, 0, 0.2, &Vector3::x(), 1.0e-12);
        assert_relative_eq!(alpha, 0.1);
    }
}
