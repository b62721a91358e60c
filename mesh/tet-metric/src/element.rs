//! Pure element-quality functions.

use nalgebra::{Matrix3, Point3, Vector2, Vector3};

/// Signed volume of a tetrahedron, positive when the corners are
/// right-hand oriented.
#[must_use]
pub fn tet_volume(xyz: &[Point3<f64>; 4]) -> f64 {
    let e1 = xyz[1] - xyz[0];
    let e2 = xyz[2] - xyz[0];
    let e3 = xyz[3] - xyz[0];
    e1.cross(&e2).dot(&e3) / 6.0
}

fn tri_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Normalized aspect ratio of a tetrahedron.
///
/// Three times the insphere/circumsphere radius ratio: 1 for a regular
/// tetrahedron, below 1 for anything else, and negative when the signed
/// volume is negative. Degenerate elements evaluate to 0.
#[must_use]
pub fn tet_aspect_ratio(xyz: &[Point3<f64>; 4]) -> f64 {
    let volume = tet_volume(xyz);

    let surface = tri_area(&xyz[0], &xyz[1], &xyz[2])
        + tri_area(&xyz[0], &xyz[3], &xyz[1])
        + tri_area(&xyz[0], &xyz[2], &xyz[3])
        + tri_area(&xyz[1], &xyz[3], &xyz[2]);
    if surface < 1e-300 {
        return 0.0;
    }
    let insphere = 3.0 * volume / surface;

    // circumcenter relative to corner 0: 2 E c = |e_i|^2
    let e1 = xyz[1] - xyz[0];
    let e2 = xyz[2] - xyz[0];
    let e3 = xyz[3] - xyz[0];
    let system = Matrix3::from_rows(&[e1.transpose(), e2.transpose(), e3.transpose()]);
    let rhs = 0.5 * Vector3::new(e1.norm_squared(), e2.norm_squared(), e3.norm_squared());
    let Some(center) = system.lu().solve(&rhs) else {
        return 0.0;
    };
    let circumsphere = center.norm();
    if circumsphere < 1e-300 {
        return 0.0;
    }

    3.0 * insphere / circumsphere
}

fn fd_step(scale: f64) -> f64 {
    (1.0e-7 * scale).max(1.0e-12)
}

/// [`tet_aspect_ratio`] plus its gradient with respect to corner 0, by
/// central finite differences.
#[must_use]
pub fn tet_aspect_ratio_derivative(xyz: &[Point3<f64>; 4]) -> (f64, Vector3<f64>) {
    let value = tet_aspect_ratio(xyz);
    let scale = (xyz[1] - xyz[0])
        .norm()
        .max((xyz[2] - xyz[0]).norm())
        .max((xyz[3] - xyz[0]).norm());
    let h = fd_step(scale);

    let mut gradient = Vector3::zeros();
    for axis in 0..3 {
        let mut plus = *xyz;
        let mut minus = *xyz;
        plus[0][axis] += h;
        minus[0][axis] -= h;
        gradient[axis] = (tet_aspect_ratio(&plus) - tet_aspect_ratio(&minus)) / (2.0 * h);
    }
    (value, gradient)
}

/// Mean ratio of a triangle: `4√3·A / Σl²`, 1 for equilateral, below 1
/// otherwise. Degenerate triangles evaluate to 0.
#[must_use]
pub fn tri_mean_ratio(xyz: &[Point3<f64>; 3]) -> f64 {
    let area = tri_area(&xyz[0], &xyz[1], &xyz[2]);
    let perimeter2 = (xyz[1] - xyz[0]).norm_squared()
        + (xyz[2] - xyz[1]).norm_squared()
        + (xyz[0] - xyz[2]).norm_squared();
    if perimeter2 < 1e-300 {
        return 0.0;
    }
    4.0 * 3.0_f64.sqrt() * area / perimeter2
}

/// [`tri_mean_ratio`] plus its gradient with respect to corner 0, by
/// central finite differences.
#[must_use]
pub fn tri_mean_ratio_derivative(xyz: &[Point3<f64>; 3]) -> (f64, Vector3<f64>) {
    let value = tri_mean_ratio(xyz);
    let scale = (xyz[1] - xyz[0]).norm().max((xyz[2] - xyz[0]).norm());
    let h = fd_step(scale);

    let mut gradient = Vector3::zeros();
    for axis in 0..3 {
        let mut plus = *xyz;
        let mut minus = *xyz;
        plus[0][axis] += h;
        minus[0][axis] -= h;
        gradient[axis] = (tri_mean_ratio(&plus) - tri_mean_ratio(&minus)) / (2.0 * h);
    }
    (value, gradient)
}

/// Signed area of a triangle in a surface's parameter plane.
///
/// Positive for counter-clockwise corners; the caller applies the owning
/// face's orientation flag.
#[must_use]
pub fn uv_area(uv0: &Vector2<f64>, uv1: &Vector2<f64>, uv2: &Vector2<f64>) -> f64 {
    0.5 * ((uv1.x - uv0.x) * (uv2.y - uv0.y) - (uv2.x - uv0.x) * (uv1.y - uv0.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn regular_tet() -> [Point3<f64>; 4] {
        // vertices of a regular tetrahedron inscribed in a cube
        [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ]
    }

    fn unit_right_tet() -> [Point3<f64>; 4] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn test_tet_volume_signed() {
        let xyz = unit_right_tet();
        assert_relative_eq!(tet_volume(&xyz), 1.0 / 6.0);

        let flipped = [xyz[1], xyz[0], xyz[2], xyz[3]];
        assert_relative_eq!(tet_volume(&flipped), -1.0 / 6.0);
    }

    #[test]
    fn test_regular_tet_aspect_ratio_is_one() {
        assert_relative_eq!(tet_aspect_ratio(&regular_tet()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aspect_ratio_below_one_and_sign() {
        let xyz = unit_right_tet();
        let ar = tet_aspect_ratio(&xyz);
        assert!(ar > 0.0 && ar < 1.0);

        let flipped = [xyz[1], xyz[0], xyz[2], xyz[3]];
        assert!(tet_aspect_ratio(&flipped) < 0.0);
    }

    #[test]
    fn test_degenerate_tet_aspect_ratio_zero() {
        let flat = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert_relative_eq!(tet_aspect_ratio(&flat), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_aspect_ratio_gradient_points_uphill() {
        // corner 0 pulled away from the regular position
        let mut xyz = regular_tet();
        xyz[0] += Vector3::new(0.5, 0.5, 0.5);
        let (value, gradient) = tet_aspect_ratio_derivative(&xyz);
        assert!(value < 1.0);

        let step = 1e-4 * gradient / gradient.norm();
        let mut moved = xyz;
        moved[0] += step;
        assert!(tet_aspect_ratio(&moved) > value);
    }

    #[test]
    fn test_equilateral_mean_ratio_is_one() {
        let xyz = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3.0_f64.sqrt() / 2.0, 0.0),
        ];
        assert_relative_eq!(tri_mean_ratio(&xyz), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sliver_mean_ratio_small() {
        let xyz = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1e-3, 0.0),
        ];
        assert!(tri_mean_ratio(&xyz) < 0.01);
    }

    #[test]
    fn test_mean_ratio_gradient_points_uphill() {
        let xyz = [
            Point3::new(0.3, 0.1, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3.0_f64.sqrt() / 2.0, 0.0),
        ];
        let (value, gradient) = tri_mean_ratio_derivative(&xyz);
        let step = 1e-4 * gradient / gradient.norm();
        let mut moved = xyz;
        moved[0] += step;
        assert!(tri_mean_ratio(&moved) > value);
    }

    #[test]
    fn test_uv_area_sign() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(1.0, 0.0);
        let c = Vector2::new(0.0, 1.0);
        assert_relative_eq!(uv_area(&a, &b, &c), 0.5);
        assert_relative_eq!(uv_area(&a, &c, &b), -0.5);
    }
}
