use super::MapError;
use nalgebra::Point3;

/// A periodic 3D grid of density values.
///
/// `n_real` is the extent of the stored region, `n_grid` the number of grid
/// intervals along each edge of the whole unit cell, and `origin` the grid
/// coordinate of the first stored point. Logical grid coordinates are
/// absolute (unit-cell grid units) and wrap into the stored region, so any
/// integer triple is a valid address.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArray {
    n_real: [usize; 3],
    n_grid: [usize; 3],
    origin: [i64; 3],
    values: Vec<f32>,
}

impl GridArray {
    pub fn new(n_real: [usize; 3], n_grid: [usize; 3], origin: [i64; 3]) -> Result<Self, MapError> {
        if n_real.contains(&0) || n_grid.contains(&0) {
            return Err(MapError::InvalidDimensions(format!(
                "extent {:?} and cell grid {:?} must be positive",
                n_real, n_grid
            )));
        }
        let size = n_real
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| MapError::InvalidDimensions(format!("extent {:?} is too large", n_real)))?;
        Ok(Self {
            n_real,
            n_grid,
            origin,
            values: vec![0.0; size],
        })
    }

    pub fn n_real(&self) -> [usize; 3] {
        self.n_real
    }

    pub fn n_grid(&self) -> [usize; 3] {
        self.n_grid
    }

    pub fn origin(&self) -> [i64; 3] {
        self.origin
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Values in storage order: the last axis varies fastest.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Flat storage offset of a logical grid point.
    pub fn grid2index(&self, i: i64, j: i64, k: i64) -> usize {
        let wrap = |g: i64, axis: usize| (g - self.origin[axis]).rem_euclid(self.n_real[axis] as i64) as usize;
        (wrap(i, 0) * self.n_real[1] + wrap(j, 1)) * self.n_real[2] + wrap(k, 2)
    }

    pub fn grid2frac(&self, i: i64, j: i64, k: i64) -> Point3<f64> {
        Point3::new(
            i as f64 / self.n_grid[0] as f64,
            j as f64 / self.n_grid[1] as f64,
            k as f64 / self.n_grid[2] as f64,
        )
    }

    /// Grid point at or below a fractional coordinate.
    pub fn frac2grid(&self, frac: &Point3<f64>) -> [i64; 3] {
        [0, 1, 2].map(|axis| (frac[axis] * self.n_grid[axis] as f64).floor() as i64)
    }

    fn checked_index(&self, i: i64, j: i64, k: i64) -> Result<usize, MapError> {
        let index = self.grid2index(i, j, k);
        if index >= self.values.len() {
            return Err(MapError::ArrayOverflow {
                i,
                j,
                k,
                size: self.values.len(),
            });
        }
        Ok(index)
    }

    pub fn set_grid_value(&mut self, i: i64, j: i64, k: i64, value: f32) -> Result<(), MapError> {
        let index = self.checked_index(i, j, k)?;
        self.values[index] = value;
        Ok(())
    }

    pub fn get_grid_value(&self, i: i64, j: i64, k: i64) -> Result<f32, MapError> {
        Ok(self.values[self.checked_index(i, j, k)?])
    }

    /// Mean and population standard deviation of all values.
    pub fn mean_and_deviation(&self) -> (f64, f64) {
        let n = self.values.len() as f64;
        let mean = self.values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = self
            .values
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        (mean, variance.sqrt())
    }

    /// Rescales the grid in place to zero mean and unit standard deviation.
    ///
    /// A flat grid is only shifted to zero mean.
    pub fn sigma_scale(&mut self) {
        let (mean, deviation) = self.mean_and_deviation();
        let scale = if deviation > 0.0 && deviation.is_finite() {
            deviation
        } else {
            1.0
        };
        for value in &mut self.values {
            *value = ((f64::from(*value) - mean) / scale) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridArray {
        GridArray::new([4, 5, 6], [8, 10, 12], [-2, 3, 1]).unwrap()
    }

    #[test]
    fn origin_maps_to_first_value() {
        let g = grid();
        assert_eq!(g.grid2index(-2, 3, 1), 0);
        assert_eq!(g.grid2index(-2, 3, 2), 1);
        assert_eq!(g.grid2index(-1, 3, 1), 30);
    }

    #[test]
    fn indices_wrap_by_one_period() {
        let g = grid();
        for (i, j, k) in [(0, 0, 0), (-7, 2, 13), (5, -4, -9)] {
            let base = g.grid2index(i, j, k);
            assert_eq!(g.grid2index(i + 4, j, k), base);
            assert_eq!(g.grid2index(i, j + 5, k), base);
            assert_eq!(g.grid2index(i, j, k - 6), base);
            assert!(base < g.size());
        }
    }

    #[test]
    fn frac_and_grid_conversions() {
        let g = grid();
        assert_eq!(g.grid2frac(4, 5, 6), Point3::new(0.5, 0.5, 0.5));
        assert_eq!(g.frac2grid(&Point3::new(0.49, -0.01, 1.0)), [3, -1, 12]);
    }

    #[test]
    fn set_and_get_round_trip_through_wrapping() {
        let mut g = grid();
        g.set_grid_value(100, -50, 7, 3.5).unwrap();
        assert_eq!(g.get_grid_value(100 - 4, -50 + 5, 7 + 6).unwrap(), 3.5);
    }

    #[test]
    fn sigma_scaling_normalizes() {
        let mut g = GridArray::new([2, 2, 2], [2, 2, 2], [0, 0, 0]).unwrap();
        for (n, value) in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0].into_iter().enumerate() {
            let n = n as i64;
            g.set_grid_value(n / 4, (n / 2) % 2, n % 2, value).unwrap();
        }
        g.sigma_scale();
        let (mean, deviation) = g.mean_and_deviation();
        assert!(mean.abs() < 1e-6);
        assert!((deviation - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flat_grid_is_only_centered() {
        let mut g = GridArray::new([1, 1, 2], [1, 1, 2], [0, 0, 0]).unwrap();
        g.set_grid_value(0, 0, 0, 2.0).unwrap();
        g.set_grid_value(0, 0, 1, 2.0).unwrap();
        g.sigma_scale();
        assert_eq!(g.values(), &[0.0, 0.0]);
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(
            GridArray::new([0, 1, 1], [1, 1, 1], [0, 0, 0]),
            Err(MapError::InvalidDimensions(_))
        ));
    }
}
