use nalgebra::{Matrix3, Matrix4, Point3, SymmetricEigen, Vector3};

/// `8 * pi^2`, the factor relating isotropic displacement and B-factor.
pub const EIGHT_PI_SQUARED: f64 = 8.0 * std::f64::consts::PI * std::f64::consts::PI;

pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    nalgebra::center(a, b)
}

/// Axis-aligned bounds of a point set, or `None` when the set is empty.
pub fn bounding_box<'a, I>(points: I) -> Option<(Point3<f64>, Point3<f64>)>
where
    I: IntoIterator<Item = &'a Point3<f64>>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let (mut min, mut max) = (*first, *first);
    for p in iter {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    Some((min, max))
}

/// Centroid of a point set and the largest extent of its bounding box.
pub fn center_and_size<'a, I>(points: I) -> Option<(Point3<f64>, f64)>
where
    I: IntoIterator<Item = &'a Point3<f64>>,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    let mut bounds: Option<(Point3<f64>, Point3<f64>)> = None;
    for p in points {
        sum += p.coords;
        count += 1;
        bounds = Some(match bounds {
            None => (*p, *p),
            Some((min, max)) => (min.inf(p), max.sup(p)),
        });
    }
    let (min, max) = bounds?;
    let extent = max - min;
    Some((Point3::from(sum / count as f64), extent.max()))
}

/// Eigen-decomposition of an anisotropic displacement tensor.
///
/// `uij` is ordered `[U11, U22, U33, U12, U13, U23]`. Eigenvalues come back
/// sorted from largest to smallest with their eigenvectors as matching columns.
pub fn uij_eigensystem(uij: &[f64; 6]) -> (Vector3<f64>, Matrix3<f64>) {
    let [u11, u22, u33, u12, u13, u23] = *uij;
    #[rustfmt::skip]
    let tensor = Matrix3::new(
        u11, u12, u13,
        u12, u22, u23,
        u13, u23, u33,
    );
    let eigen = SymmetricEigen::new(tensor);

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let values = Vector3::new(
        eigen.eigenvalues[order[0]],
        eigen.eigenvalues[order[1]],
        eigen.eigenvalues[order[2]],
    );
    let vectors = Matrix3::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ]);
    (values, vectors)
}

/// Affine transform mapping the unit sphere onto the thermal ellipsoid at `center`.
///
/// The principal axes are scaled by the square roots of the eigenvalues. Returns
/// `None` for a tensor that is not positive semi-definite.
pub fn ellipsoid_to_sphere_transform(uij: &[f64; 6], center: &Point3<f64>) -> Option<Matrix4<f64>> {
    let (values, vectors) = uij_eigensystem(uij);
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }

    let e0 = vectors.column(0).normalize();
    let e1 = vectors.column(1).normalize();
    let e2 = e0.cross(&e1);

    let mut transform = Matrix4::identity();
    for (col, (axis, value)) in [e0, e1, e2].iter().zip(values.iter()).enumerate() {
        let scaled = axis * value.sqrt();
        for row in 0..3 {
            transform[(row, col)] = scaled[row];
        }
    }
    for row in 0..3 {
        transform[(row, 3)] = center[row];
    }
    Some(transform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_and_size_uses_true_bounds() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 1.0, -2.0),
            Point3::new(2.0, 9.0, 0.0),
        ];
        let (center, size) = center_and_size(&points).unwrap();
        assert!((center - Point3::new(2.0, 10.0 / 3.0, -2.0 / 3.0)).norm() < 1e-12);
        assert_eq!(size, 9.0);
        assert!(center_and_size(std::iter::empty()).is_none());
    }

    #[test]
    fn bounding_box_of_single_point_is_degenerate() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(bounding_box([&p]), Some((p, p)));
    }

    #[test]
    fn eigensystem_of_diagonal_tensor_is_sorted() {
        let (values, vectors) = uij_eigensystem(&[0.01, 0.04, 0.02, 0.0, 0.0, 0.0]);
        assert!((values - Vector3::new(0.04, 0.02, 0.01)).norm() < 1e-12);
        assert!((vectors.column(0).abs() - Vector3::y()).norm() < 1e-9);
        assert!((vectors.column(2).abs() - Vector3::x()).norm() < 1e-9);
    }

    #[test]
    fn sphere_transform_scales_principal_axes() {
        let center = Point3::new(1.0, 2.0, 3.0);
        let m = ellipsoid_to_sphere_transform(&[0.04, 0.04, 0.04, 0.0, 0.0, 0.0], &center).unwrap();
        let upper = m.fixed_view::<3, 3>(0, 0);
        let gram = upper.transpose() * upper;
        assert!((gram - Matrix3::identity() * 0.04).abs().max() < 1e-12);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(2, 3)], 3.0);
        assert_eq!(m[(3, 3)], 1.0);
    }

    #[test]
    fn indefinite_tensor_has_no_transform() {
        let m = ellipsoid_to_sphere_transform(&[0.02, -0.01, 0.02, 0.0, 0.0, 0.0], &Point3::origin());
        assert!(m.is_none());
    }
}
