//! Linear-programming untanglers.
//!
//! Each incident element contributes one linear constraint: its signed
//! measure (parametric area on surfaces, volume in the interior) as an
//! affine function of the center node's position. Solving the primal
//! program picks the set of elements whose measures can be equalized, and
//! inverting that basis places the node where those measures meet. The new
//! position is committed unconditionally; the caller iterates.

use nalgebra::Vector2;
use tracing::debug;

use tet_geom::GeometryBackend;
use tet_math::{det3, gaussian_backsolve, gaussian_elimination};
use tet_tableau::Tableau;
use tet_types::Class;

use crate::engine::{orient_cell, orient_face, SmoothEngine};
use crate::error::{SmoothError, SmoothResult};

/// Elements whose constraint row is degenerate are dropped before the
/// solve; the squared length of the measure gradient must exceed this.
const DEGENERATE_ELEMENT: f64 = 1.0e-20;

/// Solve the primal program and invert the returned basis.
///
/// `a` is the column-major `m x n` constraint matrix, `c` the per-column
/// cost, `b` the right-hand side. The inverted basis yields the position
/// (first `m - 1` entries of the solution) where the basic elements'
/// measures are equal; the basis itself is returned for recursion.
fn solve_for_position(
    m: usize,
    a: &[f64],
    c: &[f64],
    b: &[f64],
) -> SmoothResult<(Vec<f64>, Vec<usize>)> {
    let n = c.len();
    let mut tableau = Tableau::new(m, n);
    tableau.set_constraint_matrix(a)?;
    tableau.set_constraint(b)?;
    tableau.set_cost(c)?;
    tableau.solve()?;
    let basis = tableau.basis().to_vec();

    // the dual system: transposed basis columns against their costs
    let cols = m + 1;
    let mut at = vec![0.0; m * cols];
    for (j, &column) in basis.iter().enumerate() {
        for i in 0..m {
            at[j * cols + i] = a[i + m * column];
        }
        at[j * cols + m] = c[column];
    }
    gaussian_elimination(m, cols, &mut at)?;
    gaussian_backsolve(m, cols, &mut at)?;

    let solution = (0..m).map(|i| at[i * cols + m]).collect();
    Ok((solution, basis))
}

impl<G: GeometryBackend> SmoothEngine<'_, G> {
    /// Untangle a face node in the parameter plane.
    ///
    /// Each incident boundary triangle's signed parametric area is affine
    /// in the node's `(u, v)`; the solve places the node where the worst
    /// areas are equalized, which is the point maximizing the minimum
    /// area. With `depth > 0` the opposite nodes of the basic triangles
    /// are untangled recursively (their failures are skipped), then the
    /// node itself once more.
    ///
    /// # Errors
    ///
    /// [`SmoothError::NotOnSingleFace`] unless the node is face-classified,
    /// [`SmoothError::GhostNode`] for ghosts (and near-ghosts unless
    /// `allow_near_ghost`), [`SmoothError::Infeasible`] with fewer than
    /// three usable triangles; solver failures propagate.
    pub fn untangle_area_uv(
        &mut self,
        node: usize,
        depth: usize,
        allow_near_ghost: bool,
    ) -> SmoothResult<()> {
        const M: usize = 3;

        if !matches!(self.classification(node)?, Class::OnFace(_)) {
            return Err(SmoothError::NotOnSingleFace(node));
        }
        if self.mesh.is_ghost(node) {
            return Err(SmoothError::GhostNode(node));
        }
        if !allow_near_ghost && self.mesh.near_ghost(node) {
            return Err(SmoothError::GhostNode(node));
        }

        let original_area = self.min_face_area_uv(node)?;

        let degree = self.mesh.face_degree(node);
        let mut a = Vec::with_capacity(M * degree);
        let mut c = Vec::with_capacity(degree);
        let mut opposite: Vec<[usize; 2]> = Vec::with_capacity(degree);

        for fi in 0..degree {
            let face_index = self.mesh.node_faces(node)[fi];
            let face = *self.mesh.face(face_index)?;
            let oriented = orient_face(face.nodes, node);
            let corner1 = face
                .corner_of(oriented[1])
                .ok_or(SmoothError::InvalidNode(oriented[1]))?;
            let corner2 = face
                .corner_of(oriented[2])
                .ok_or(SmoothError::InvalidNode(oriented[2]))?;
            let [u1, v1] = face.uv[corner1];
            let [u2, v2] = face.uv[corner2];

            // signed area = a0 u + a1 v + c, sign fixed by the surface
            // normal convention
            let (a0, a1, constant) = if self.geometry.reversed_face_normal(face.face_id) {
                (
                    -0.5 * (v1 - v2),
                    -0.5 * (u2 - u1),
                    0.5 * (u1 * v2 - u2 * v1),
                )
            } else {
                (
                    0.5 * (v1 - v2),
                    0.5 * (u2 - u1),
                    0.5 * (u2 * v1 - u1 * v2),
                )
            };

            if a0 * a0 + a1 * a1 < DEGENERATE_ELEMENT {
                continue;
            }
            a.extend_from_slice(&[a0, a1, 1.0]);
            c.push(constant);
            opposite.push([oriented[1], oriented[2]]);
        }

        if c.len() < M {
            return Err(SmoothError::Infeasible {
                needed: M,
                usable: c.len(),
            });
        }

        let b = [0.0, 0.0, 1.0];
        let (solution, basis) = solve_for_position(M, &a, &c, &b)?;
        let new_uv = Vector2::new(solution[0], solution[1]);
        self.evaluate_face_at_uv(node, &new_uv)?;

        let new_area = self.min_face_area_uv(node)?;
        if new_area < original_area {
            debug!(node, original_area, new_area, "untangle did not improve");
        }

        if depth > 0 {
            for &column in &basis {
                for &neighbor in &opposite[column] {
                    if let Err(err) = self.untangle_area_uv(neighbor, depth - 1, allow_near_ghost)
                    {
                        debug!(node = neighbor, %err, "recursive untangle skipped");
                    }
                }
            }
            self.untangle_area_uv(node, 0, allow_near_ghost)?;
        }
        Ok(())
    }

    /// Untangle an interior node in Cartesian space.
    ///
    /// Each incident cell's signed volume is affine in the node's
    /// position; the solve equalizes the worst volumes, maximizing the
    /// minimum. Recursion with `depth > 0` works the opposite faces'
    /// nodes first, then the node itself.
    ///
    /// # Errors
    ///
    /// [`SmoothError::NotInterior`] unless the node is interior,
    /// [`SmoothError::GhostNode`] for ghosts (and near-ghosts unless
    /// `allow_near_ghost`), [`SmoothError::Infeasible`] with fewer than
    /// four usable cells; solver failures propagate.
    pub fn untangle_volume(
        &mut self,
        node: usize,
        depth: usize,
        allow_near_ghost: bool,
    ) -> SmoothResult<()> {
        const M: usize = 4;

        if !matches!(self.classification(node)?, Class::Interior) {
            return Err(SmoothError::NotInterior(node));
        }
        if self.mesh.is_ghost(node) {
            return Err(SmoothError::GhostNode(node));
        }
        if !allow_near_ghost && self.mesh.near_ghost(node) {
            return Err(SmoothError::GhostNode(node));
        }

        let degree = self.mesh.cell_degree(node);
        let mut a = Vec::with_capacity(M * degree);
        let mut c = Vec::with_capacity(degree);
        let mut opposite: Vec<[usize; 3]> = Vec::with_capacity(degree);

        for ci in 0..degree {
            let cell = self.mesh.node_cells(node)[ci];
            let mut oriented = orient_cell(self.mesh.cell(cell)?.nodes, node);
            // outward-facing normal for the opposite face
            oriented.swap(1, 2);

            let p1 = self.mesh.xyz(oriented[1])?;
            let p2 = self.mesh.xyz(oriented[2])?;
            let p3 = self.mesh.xyz(oriented[3])?;

            // signed volume = a0 x + a1 y + a2 z + c, by cofactor
            // expansion of the 4x4 volume determinant about the node row
            let xs = [p1.x, p2.x, p3.x];
            let ys = [p1.y, p2.y, p3.y];
            let zs = [p1.z, p2.z, p3.z];
            let ones = [1.0; 3];
            let rows = |r0: [f64; 3], r1: [f64; 3], r2: [f64; 3]| -> [f64; 9] {
                [
                    r0[0], r0[1], r0[2], r1[0], r1[1], r1[2], r2[0], r2[1], r2[2],
                ]
            };
            let a0 = -det3(&rows(ones, ys, zs)) / 6.0;
            let a1 = -det3(&rows(xs, ones, zs)) / 6.0;
            let a2 = -det3(&rows(xs, ys, ones)) / 6.0;
            let constant = -det3(&rows(xs, ys, zs)) / 6.0;

            if a0 * a0 + a1 * a1 + a2 * a2 < DEGENERATE_ELEMENT {
                continue;
            }
            a.extend_from_slice(&[a0, a1, a2, 1.0]);
            c.push(constant);
            opposite.push([oriented[1], oriented[2], oriented[3]]);
        }

        if c.len() < M {
            return Err(SmoothError::Infeasible {
                needed: M,
                usable: c.len(),
            });
        }

        let b = [0.0, 0.0, 0.0, 1.0];
        let (solution, basis) = solve_for_position(M, &a, &c, &b)?;
        let new_xyz = tet_types::Point3::new(solution[0], solution[1], solution[2]);
        self.mesh.set_xyz(node, new_xyz)?;

        if depth > 0 {
            for &column in &basis {
                for &neighbor in &opposite[column] {
                    if let Err(err) = self.untangle_volume(neighbor, depth - 1, allow_near_ghost) {
                        debug!(node = neighbor, %err, "recursive untangle skipped");
                    }
                }
            }
            self.untangle_volume(node, 0, allow_near_ghost)?;
        }
        Ok(())
    }
}
