//! Vector helpers on top of nalgebra.

use nalgebra::Vector3;

/// Remove the component of `v` along the unit vector `axle` and renormalize.
///
/// If `v` is (numerically) parallel to `axle` it is returned unchanged; the
/// caller is expected to handle the degenerate frame.
#[must_use]
pub fn orthogonalize(v: Vector3<f64>, axle: &Vector3<f64>) -> Vector3<f64> {
    let dot = v.dot(axle);
    let out = v - axle * dot;
    let norm = out.norm();
    if norm > 1e-15 {
        out / norm
    } else {
        v
    }
}

/// Determinant of a 3×3 matrix stored row-major in a 9-array.
#[must_use]
pub fn det3(m: &[f64; 9]) -> f64 {
    m[0] * m[4] * m[8] + m[1] * m[5] * m[6] + m[2] * m[3] * m[7]
        - m[0] * m[5] * m[7]
        - m[1] * m[3] * m[8]
        - m[2] * m[4] * m[6]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orthogonalize_removes_component() {
        let axle = Vector3::new(0.0, 0.0, 1.0);
        let v = Vector3::new(1.0, 0.0, 1.0);
        let out = orthogonalize(v, &axle);
        assert_relative_eq!(out.dot(&axle), 0.0, epsilon = 1e-14);
        assert_relative_eq!(out.norm(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_orthogonalize_parallel_is_unchanged() {
        let axle = Vector3::new(1.0, 0.0, 0.0);
        let v = Vector3::new(2.0, 0.0, 0.0);
        let out = orthogonalize(v, &axle);
        assert_relative_eq!(out, v);
    }

    #[test]
    fn test_det3_identity() {
        let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert_relative_eq!(det3(&m), 1.0);
    }

    #[test]
    fn test_det3_singular() {
        let m = [1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 1.0, 0.0];
        assert_relative_eq!(det3(&m), 0.0, epsilon = 1e-14);
    }
}
