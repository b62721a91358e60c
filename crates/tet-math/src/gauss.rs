//! General Gaussian elimination with implicit pivoting.
//!
//! Operates on an m×n augmented system stored row-major in a flat slice,
//! with n = m + 1 in the usual case. Used by the untangler to invert the
//! basis submatrix returned by the simplex solve.

use crate::error::{MathError, MathResult};

/// Forward-eliminate an `rows`×`cols` augmented system in place.
///
/// Pivot rows are chosen by implicit (row-scaled) partial pivoting.
///
/// # Errors
///
/// [`MathError::BadDimensions`] if the slice length does not match, or
/// [`MathError::SingularSystem`] when no usable pivot remains in a column.
pub fn gaussian_elimination(rows: usize, cols: usize, a: &mut [f64]) -> MathResult<()> {
    if a.len() != rows * cols {
        return Err(MathError::BadDimensions {
            rows,
            cols,
            len: a.len(),
        });
    }

    // largest magnitude in each row, for scaled pivot comparison
    let mut scale = vec![0.0_f64; rows];
    for (i, s) in scale.iter_mut().enumerate() {
        for j in 0..rows.min(cols) {
            *s = s.max(a[i * cols + j].abs());
        }
        if *s <= 0.0 {
            return Err(MathError::SingularSystem(i));
        }
    }

    for col in 0..rows {
        // choose the pivot row by scaled magnitude
        let mut pivot_row = col;
        let mut best = a[col * cols + col].abs() / scale[col];
        for row in (col + 1)..rows {
            let candidate = a[row * cols + col].abs() / scale[row];
            if candidate > best {
                best = candidate;
                pivot_row = row;
            }
        }
        if a[pivot_row * cols + col].abs() < 1.0e-300 {
            return Err(MathError::SingularSystem(col));
        }
        if pivot_row != col {
            for j in 0..cols {
                a.swap(col * cols + j, pivot_row * cols + j);
            }
            scale.swap(col, pivot_row);
        }

        let pivot = a[col * cols + col];
        for row in (col + 1)..rows {
            let factor = a[row * cols + col] / pivot;
            a[row * cols + col] = 0.0;
            for j in (col + 1)..cols {
                a[row * cols + j] -= factor * a[col * cols + j];
            }
        }
    }

    Ok(())
}

/// Back-substitute an eliminated system, leaving the solution in the last
/// column of each row.
///
/// # Errors
///
/// [`MathError::BadDimensions`] on a size mismatch, or
/// [`MathError::SingularSystem`] if a diagonal entry vanished.
pub fn gaussian_backsolve(rows: usize, cols: usize, a: &mut [f64]) -> MathResult<()> {
    if a.len() != rows * cols {
        return Err(MathError::BadDimensions {
            rows,
            cols,
            len: a.len(),
        });
    }

    let rhs = cols - 1;
    for row in (0..rows).rev() {
        let mut sum = a[row * cols + rhs];
        for j in (row + 1)..rows {
            sum -= a[row * cols + j] * a[j * cols + rhs];
        }
        let diag = a[row * cols + row];
        if diag.abs() < 1.0e-300 {
            return Err(MathError::SingularSystem(row));
        }
        a[row * cols + rhs] = sum / diag;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solve(rows: usize, a: &mut [f64]) -> Vec<f64> {
        let cols = rows + 1;
        gaussian_elimination(rows, cols, a).unwrap();
        gaussian_backsolve(rows, cols, a).unwrap();
        (0..rows).map(|i| a[i * cols + rows]).collect()
    }

    #[test]
    fn test_solve_2x2() {
        // x + y = 3, x - y = 1  ->  x = 2, y = 1
        let mut a = [1.0, 1.0, 3.0, 1.0, -1.0, 1.0];
        let x = solve(2, &mut a);
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_3x3_needs_pivoting() {
        // first diagonal entry is zero; implicit pivoting must reorder
        let mut a = [
            0.0, 2.0, 1.0, 7.0, //
            1.0, 1.0, 1.0, 6.0, //
            2.0, 1.0, 1.0, 7.0, //
        ];
        let x = solve(3, &mut a);
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_system_detected() {
        let mut a = [
            1.0, 2.0, 3.0, //
            2.0, 4.0, 6.0, //
        ];
        let err = gaussian_elimination(2, 3, &mut a).unwrap_err();
        assert!(matches!(err, MathError::SingularSystem(_)));
    }

    #[test]
    fn test_bad_dimensions() {
        let mut a = [1.0; 5];
        let err = gaussian_elimination(2, 3, &mut a).unwrap_err();
        assert!(matches!(err, MathError::BadDimensions { .. }));
    }
}
