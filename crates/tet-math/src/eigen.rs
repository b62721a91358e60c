//! Symmetric 3×3 eigendecomposition.
//!
//! Tridiagonalize with a single Givens-style similarity transform, then run
//! implicit-shift QL iteration on the tridiagonal form. Each eigenvalue is
//! given at most 30 sweeps; running out is reported as an error rather than
//! returning a partial decomposition.

#![allow(clippy::many_single_char_names)]

use nalgebra::Vector3;

use crate::error::{MathError, MathResult};
use crate::tensor::SymTensor3;

/// Result of a symmetric 3×3 eigendecomposition.
#[derive(Debug, Clone, Copy)]
pub struct Eigen3 {
    /// Eigenvalues in descending order.
    pub values: [f64; 3],
    /// Eigenvectors matching `values`, unit length.
    pub vectors: [Vector3<f64>; 3],
}

impl Eigen3 {
    /// Decompose a symmetric tensor.
    ///
    /// # Errors
    ///
    /// [`MathError::EigenNoConvergence`] when the QL iteration exceeds its
    /// 30-sweep budget for some eigenvalue.
    pub fn decompose(tensor: &SymTensor3) -> MathResult<Self> {
        let (mut d, mut e, mut q) = tridiagonalize(&tensor.m);
        ql_implicit_shift(&mut d, &mut e, &mut q)?;
        let mut eig = Self {
            values: d,
            vectors: [
                Vector3::new(q[0][0], q[0][1], q[0][2]),
                Vector3::new(q[1][0], q[1][1], q[1][2]),
                Vector3::new(q[2][0], q[2][1], q[2][2]),
            ],
        };
        eig.sort_descending();
        Ok(eig)
    }

    /// Sort eigenpairs into descending eigenvalue order.
    ///
    /// Swapped eigenvectors are mirrored so the triad keeps a consistent
    /// handedness.
    fn sort_descending(&mut self) {
        let v = &mut self.values;
        let q = &mut self.vectors;

        if v[1] > v[0] {
            v.swap(0, 1);
            let t = q[0];
            q[0] = q[1];
            q[1] = -t;
        }
        if v[2] > v[0] {
            v.swap(0, 2);
            let t = q[0];
            q[0] = q[2];
            q[2] = -t;
        }
        if v[2] > v[1] {
            v.swap(1, 2);
            let t = q[1];
            q[1] = q[2];
            q[2] = -t;
        }
    }

    /// Gram-Schmidt re-orthogonalization of the eigenvector triad.
    ///
    /// Normalizes the first vector, projects it out of the second, and
    /// rebuilds the third as their cross product.
    pub fn re_orthogonalize(&mut self) {
        let q = &mut self.vectors;
        q[0] = q[0].normalize();
        let dot = q[0].dot(&q[1]);
        q[1] -= q[0] * dot;
        q[1] = q[1].normalize();
        q[2] = q[0].cross(&q[1]).normalize();
    }
}

/// Reduce the symmetric tensor `[m00,m01,m02,m11,m12,m22]` to tridiagonal
/// form. Returns the diagonal `d`, off-diagonal `e`, and the accumulated
/// rotation as three row vectors.
fn tridiagonalize(m: &[f64; 6]) -> ([f64; 3], [f64; 3], [[f64; 3]; 3]) {
    let mut d = [0.0; 3];
    let mut e = [0.0; 3];
    let mut q = [[0.0; 3]; 3];

    d[0] = m[0];
    q[0][0] = 1.0;

    if m[2].abs() > 1.0e-12 {
        let l = (m[1] * m[1] + m[2] * m[2]).sqrt();
        let u = m[1] / l;
        let v = m[2] / l;
        let s = 2.0 * u * m[4] + v * (m[5] - m[3]);
        d[1] = m[3] + v * s;
        d[2] = m[5] - v * s;
        e[0] = l;
        e[1] = m[4] - u * s;
        q[1][1] = u;
        q[2][1] = v;
        q[1][2] = v;
        q[2][2] = -u;
    } else {
        d[1] = m[3];
        d[2] = m[5];
        e[0] = m[1];
        e[1] = m[4];
        q[1][1] = 1.0;
        q[2][2] = 1.0;
    }

    (d, e, q)
}

fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Implicit-shift QL iteration on a 3×3 tridiagonal system, accumulating the
/// rotations into `q`. At most 30 sweeps per eigenvalue.
fn ql_implicit_shift(d: &mut [f64; 3], e: &mut [f64; 3], q: &mut [[f64; 3]; 3]) -> MathResult<()> {
    let mut f = 0.0;
    let mut tst1: f64 = 0.0;
    e[2] = 0.0;

    for l in 0..3 {
        let mut sweeps = 0;
        let h = d[l].abs() + e[l].abs();
        tst1 = tst1.max(h);

        // look for a small sub-diagonal element; e[2] is always zero so the
        // scan cannot run off the end
        let mut m = l;
        while m < 3 {
            let tst2 = tst1 + e[m].abs();
            if (tst2 - tst1).abs() < 1.0e-14 {
                break;
            }
            m += 1;
        }

        if m != l {
            loop {
                sweeps += 1;
                if sweeps > 30 {
                    return Err(MathError::EigenNoConvergence(l));
                }

                // form shift
                let l1 = l + 1;
                let g = d[l];
                let mut p = (d[l1] - g) / (2.0 * e[l]);
                let r = (p * p + 1.0).sqrt();
                d[l] = e[l] / (p + sign(r, p));
                d[l1] = e[l] * (p + sign(r, p));
                let dl1 = d[l1];
                let mut h = g - d[l];
                for di in d.iter_mut().skip(l1 + 1) {
                    *di -= h;
                }
                f += h;

                // QL transformation
                p = d[m];
                let mut c = 1.0;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l1];
                let mut s = 0.0;
                let mut s2 = 0.0;
                for ii in 0..(m - l) {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    let i = m - ii - 1;
                    let g = c * e[i];
                    h = c * p;
                    let r = (p * p + e[i] * e[i]).sqrt();
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);
                    // accumulate the rotation
                    for k in 0..3 {
                        if i == 0 {
                            let h = q[1][k];
                            q[1][k] = s * q[0][k] + c * h;
                            q[0][k] = c * q[0][k] - s * h;
                        } else {
                            let h = q[2][k];
                            q[2][k] = s * q[1][k] + c * h;
                            q[1][k] = c * q[1][k] - s * h;
                        }
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;
                let tst2 = tst1 + e[l].abs();
                if (tst2 - tst1).abs() < 1.0e-14 {
                    break;
                }
            }
        }
        d[l] += f;
    }

    Ok(())
}
