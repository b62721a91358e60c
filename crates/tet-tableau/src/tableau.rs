//! Dense simplex tableau.

#![allow(clippy::many_single_char_names)]

use tracing::debug;

use crate::error::{TableauError, TableauResult};

const ZERO: f64 = 1.0e-14;

/// A dense simplex tableau for `minimize c·x subject to A x = b, x ≥ 0`.
///
/// The constraint matrix is column-major with `constraints` rows and
/// `dimension` columns. Internally the tableau carries one extra header row
/// (reduced costs) and one extra column (the current solution), plus a slack
/// identity block that seeds the initial basis.
#[derive(Debug, Clone)]
pub struct Tableau {
    constraints: usize,
    dimension: usize,
    constraint_matrix: Vec<f64>,
    constraint: Vec<f64>,
    cost: Vec<f64>,
    /// (1+constraints) x (1+dimension+constraints), column-major.
    t: Vec<f64>,
    basis: Vec<usize>,
    in_basis: Vec<Option<usize>>,
}

impl Tableau {
    /// Create a tableau for `constraints` rows and `dimension` columns.
    #[must_use]
    pub fn new(constraints: usize, dimension: usize) -> Self {
        let width = 1 + dimension + constraints;
        Self {
            constraints,
            dimension,
            constraint_matrix: vec![0.0; constraints * dimension],
            constraint: vec![0.0; constraints],
            cost: vec![0.0; dimension],
            t: vec![0.0; (1 + constraints) * width],
            basis: (0..constraints).map(|i| dimension + i).collect(),
            in_basis: vec![None; width],
        }
    }

    /// Number of constraint rows.
    #[must_use]
    pub fn constraints(&self) -> usize {
        self.constraints
    }

    /// Number of problem columns (excluding slacks).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Load the column-major constraint matrix `A`.
    ///
    /// # Errors
    ///
    /// [`TableauError::DimensionMismatch`] if `a` is not
    /// `constraints * dimension` long.
    pub fn set_constraint_matrix(&mut self, a: &[f64]) -> TableauResult<()> {
        let expected = self.constraints * self.dimension;
        if a.len() != expected {
            return Err(TableauError::DimensionMismatch {
                expected,
                got: a.len(),
            });
        }
        self.constraint_matrix.copy_from_slice(a);
        Ok(())
    }

    /// Load the right-hand side `b`.
    ///
    /// # Errors
    ///
    /// [`TableauError::DimensionMismatch`] if `b` is not `constraints` long.
    pub fn set_constraint(&mut self, b: &[f64]) -> TableauResult<()> {
        if b.len() != self.constraints {
            return Err(TableauError::DimensionMismatch {
                expected: self.constraints,
                got: b.len(),
            });
        }
        self.constraint.copy_from_slice(b);
        Ok(())
    }

    /// Load the cost vector `c`.
    ///
    /// # Errors
    ///
    /// [`TableauError::DimensionMismatch`] if `c` is not `dimension` long.
    pub fn set_cost(&mut self, c: &[f64]) -> TableauResult<()> {
        if c.len() != self.dimension {
            return Err(TableauError::DimensionMismatch {
                expected: self.dimension,
                got: c.len(),
            });
        }
        self.cost.copy_from_slice(c);
        Ok(())
    }

    /// The current basis: one column index per constraint row.
    #[must_use]
    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    /// The current objective bound.
    #[must_use]
    pub fn bound(&self) -> f64 {
        -self.t[0]
    }

    fn rows(&self) -> usize {
        1 + self.constraints
    }

    fn width(&self) -> usize {
        1 + self.dimension + self.constraints
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.t[row + self.rows() * col]
    }

    fn at_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        let m = self.rows();
        &mut self.t[row + m * col]
    }

    /// Rebuild the working tableau from A, b, c and reset the basis to the
    /// slack identity.
    fn init(&mut self) {
        let m = self.rows();

        for v in &mut self.t {
            *v = 0.0;
        }

        for i in 0..self.constraints {
            for j in 0..self.dimension {
                self.t[(1 + i) + (1 + j) * m] = self.constraint_matrix[i + j * self.constraints];
            }
        }

        // slack identity block
        for i in 0..self.constraints {
            let j = i + self.dimension;
            self.t[(1 + i) + (1 + j) * m] = 1.0;
        }

        // initial basic feasible solution
        for (i, b) in self.basis.iter_mut().enumerate() {
            *b = self.dimension + i;
        }
        for b in &mut self.in_basis {
            *b = None;
        }
        for i in 0..self.constraints {
            self.in_basis[self.basis[i] + 1] = Some(i);
        }

        for i in 0..self.constraints {
            self.t[1 + i] = self.constraint[i];
        }

        self.t[0] = 0.0;
        for j in 0..self.dimension {
            self.t[m * (1 + j)] = self.cost[j];
        }
    }

    /// Find a pivot that drives a slack column out of the basis.
    ///
    /// Negative pivots are accepted when the row's solution entry is zero,
    /// because the step length is then zero and feasibility is preserved.
    fn auxiliary_pivot(&self) -> Option<(usize, usize)> {
        for row in 0..self.constraints {
            if self.basis[row] >= self.dimension {
                let x = self.at(1 + row, 0);
                let mut best_column = None;
                let mut best_divisor = 0.0;
                for column in 0..self.dimension {
                    let mut pivot = self.at(1 + row, 1 + column);
                    if x < ZERO {
                        pivot = pivot.abs();
                    }
                    if pivot > best_divisor {
                        best_divisor = pivot;
                        best_column = Some(column);
                    }
                }
                if let Some(column) = best_column {
                    return Some((row + 1, column + 1));
                }
            }
        }
        None
    }

    /// Standard ratio-test pivot selection, preferring the column with the
    /// largest usable divisor among those with negative reduced cost.
    fn largest_pivot(&self) -> Option<(usize, usize)> {
        let m = self.rows();
        let mut pivot_row = None;
        let mut pivot_col = None;
        let mut best_divisor = 0.0_f64;

        for j in 1..(1 + self.dimension) {
            if self.in_basis[j].is_some() {
                continue;
            }
            let reduced_cost = self.at(0, j);
            if reduced_cost >= 0.0 {
                continue;
            }
            let mut best_row = None;
            let mut divisor = 0.0;
            let mut feasible_step = f64::MAX;
            for i in 1..m {
                let pivot = self.at(i, j);
                let x = self.at(i, 0);
                if pivot > ZERO {
                    let step = x / pivot;
                    if step < feasible_step {
                        best_row = Some(i);
                        feasible_step = step;
                        divisor = pivot;
                    }
                }
            }
            if let Some(row) = best_row {
                if divisor.abs() > best_divisor.abs() {
                    pivot_row = Some(row);
                    pivot_col = Some(j);
                    best_divisor = divisor;
                }
            }
        }

        match (pivot_row, pivot_col) {
            (Some(r), Some(c)) => Some((r, c)),
            _ => None,
        }
    }

    /// Pivot about tableau entry (`row`, `column`), 1-based over the working
    /// tableau (row 0 is the reduced-cost header, column 0 the solution).
    ///
    /// # Errors
    ///
    /// [`TableauError::PivotOutOfRange`] or [`TableauError::ColumnActive`]
    /// when the request is not a legal pivot.
    pub fn pivot_about(&mut self, row: usize, column: usize) -> TableauResult<()> {
        let m = self.rows();
        let n = self.width();

        if row < 1 || row >= m || column < 1 || column >= n {
            return Err(TableauError::PivotOutOfRange { row, column });
        }
        if self.in_basis[column].is_some() {
            return Err(TableauError::ColumnActive(column));
        }

        self.in_basis[self.basis[row - 1] + 1] = None;
        self.basis[row - 1] = column - 1;
        self.in_basis[column] = Some(row - 1);

        let pivot = self.at(row, column);
        for j in 0..n {
            *self.at_mut(row, j) /= pivot;
        }

        for i in 0..m {
            if i != row {
                let factor = self.at(i, column);
                for j in 0..n {
                    let elim = self.at(row, j) * factor;
                    *self.at_mut(i, j) -= elim;
                }
            }
        }

        Ok(())
    }

    /// Solve the linear program.
    ///
    /// Runs auxiliary pivots until every slack column that can leave the
    /// basis has left, then iterates the largest-pivot rule with a
    /// `dimension²` cap, and finally verifies that no slack column survives
    /// in the basis.
    ///
    /// # Errors
    ///
    /// [`TableauError::MaxIterations`] if the pivot budget runs out, or
    /// [`TableauError::SlackNotEliminated`] when the final basis still
    /// contains a slack column.
    pub fn solve(&mut self) -> TableauResult<()> {
        self.init();

        while let Some((row, column)) = self.auxiliary_pivot() {
            self.pivot_about(row, column)?;
        }

        let max_iterations = self.dimension * self.dimension;
        let mut iteration = 0;
        while let Some((row, column)) = self.largest_pivot() {
            iteration += 1;
            if iteration > max_iterations {
                debug!(max_iterations, "simplex pivot budget exhausted");
                return Err(TableauError::MaxIterations(max_iterations));
            }
            self.pivot_about(row, column)?;
        }

        for (i, &column) in self.basis.iter().enumerate() {
            if column > self.dimension {
                return Err(TableauError::SlackNotEliminated { row: i, column });
            }
        }

        Ok(())
    }
}
