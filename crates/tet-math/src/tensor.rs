//! Symmetric 3×3 tensor storage.

use nalgebra::Vector3;

use crate::eigen::Eigen3;
use crate::MathResult;

/// A symmetric 3×3 tensor stored as six doubles.
///
/// Component order is `[m00, m01, m02, m11, m12, m22]` (upper triangle by
/// rows). This is the layout used for per-node metric tensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymTensor3 {
    /// Upper-triangle components `[m00, m01, m02, m11, m12, m22]`.
    pub m: [f64; 6],
}

impl Default for SymTensor3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl SymTensor3 {
    /// Build a tensor from its six upper-triangle components.
    #[must_use]
    pub const fn new(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// The identity tensor (Euclidean metric).
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 1.0],
        }
    }

    /// A diagonal tensor.
    #[must_use]
    pub const fn diagonal(d0: f64, d1: f64, d2: f64) -> Self {
        Self {
            m: [d0, 0.0, 0.0, d1, 0.0, d2],
        }
    }

    /// Apply the tensor to a vector: `M v`.
    #[must_use]
    pub fn apply(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let m = &self.m;
        Vector3::new(
            m[0] * v.x + m[1] * v.y + m[2] * v.z,
            m[1] * v.x + m[3] * v.y + m[4] * v.z,
            m[2] * v.x + m[4] * v.y + m[5] * v.z,
        )
    }

    /// The quadratic form `vᵀ M v`.
    #[must_use]
    pub fn quadratic_form(&self, v: &Vector3<f64>) -> f64 {
        v.dot(&self.apply(v))
    }

    /// Component-wise average of two tensors.
    #[must_use]
    pub fn average(&self, other: &Self) -> Self {
        let mut m = [0.0; 6];
        for (i, out) in m.iter_mut().enumerate() {
            *out = 0.5 * (self.m[i] + other.m[i]);
        }
        Self { m }
    }

    /// Eigendecomposition via tridiagonalization and implicit-shift QL.
    ///
    /// Eigenvalues are returned in descending order with sign-consistent,
    /// re-orthogonalized eigenvectors.
    ///
    /// # Errors
    ///
    /// [`crate::MathError::EigenNoConvergence`] if any eigenvalue needs more
    /// than 30 QL sweeps.
    pub fn eigen_decomposition(&self) -> MathResult<Eigen3> {
        Eigen3::decompose(self)
    }

    /// Whether the tensor is positive definite (all eigenvalues > 0).
    ///
    /// A tensor whose eigendecomposition does not converge is reported as
    /// not positive definite.
    #[must_use]
    pub fn is_positive_definite(&self) -> bool {
        self.eigen_decomposition()
            .map(|e| e.values[2] > 0.0)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_apply() {
        let t = SymTensor3::identity();
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(t.apply(&v), v);
        assert_relative_eq!(t.quadratic_form(&v), 14.0);
    }

    #[test]
    fn test_average() {
        let a = SymTensor3::diagonal(2.0, 2.0, 2.0);
        let b = SymTensor3::identity();
        let avg = a.average(&b);
        assert_relative_eq!(avg.m[0], 1.5);
        assert_relative_eq!(avg.m[3], 1.5);
        assert_relative_eq!(avg.m[1], 0.0);
    }

    #[test]
    fn test_positive_definite() {
        assert!(SymTensor3::identity().is_positive_definite());
        assert!(!SymTensor3::diagonal(1.0, 1.0, -1.0).is_positive_definite());
    }
}
