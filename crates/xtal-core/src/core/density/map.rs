use super::MapError;
use super::grid::GridArray;
use crate::core::cell::unit_cell::UnitCell;
use nalgebra::{Point3, Vector3};
use std::fmt;

/// Default half-width of an extracted box, in Angstroms.
pub const DEFAULT_RADIUS: f64 = 5.0;

/// Largest number of grid points one extraction may return.
pub const MAX_REGION_POINTS: usize = 1 << 27;

/// Scaled fractional coordinates beyond this are rejected instead of saturating.
const MAX_GRID_COORDINATE: f64 = 1.0e15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapFormat {
    Ccp4,
    Dsn6,
}

impl fmt::Display for MapFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapFormat::Ccp4 => f.write_str("CCP4"),
            MapFormat::Dsn6 => f.write_str("DSN6"),
        }
    }
}

/// Statistics recorded in a CCP4 header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapHeader {
    pub mode: i32,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub space_group_number: i32,
}

/// Grid points and density values inside a Cartesian box.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRegion {
    pub points: Vec<Point3<f64>>,
    pub values: Vec<f32>,
    /// Number of grid points along each axis; x varies fastest.
    pub size: [usize; 3],
}

impl MapRegion {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_range(&self) -> Option<(f32, f32)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// A decoded electron-density map.
#[derive(Debug, Clone)]
pub struct DensityMap {
    format: MapFormat,
    unit_cell: UnitCell,
    grid: GridArray,
    header: Option<MapHeader>,
}

impl DensityMap {
    pub(crate) fn new(format: MapFormat, unit_cell: UnitCell, grid: GridArray, header: Option<MapHeader>) -> Self {
        Self {
            format,
            unit_cell,
            grid,
            header,
        }
    }

    pub fn format(&self) -> MapFormat {
        self.format
    }

    pub fn unit_cell(&self) -> &UnitCell {
        &self.unit_cell
    }

    pub fn grid(&self) -> &GridArray {
        &self.grid
    }

    /// CCP4 header statistics; `None` for DSN6 maps.
    pub fn header(&self) -> Option<&MapHeader> {
        self.header.as_ref()
    }

    pub fn n_real(&self) -> [usize; 3] {
        self.grid.n_real()
    }

    pub fn n_grid(&self) -> [usize; 3] {
        self.grid.n_grid()
    }

    pub fn origin(&self) -> [i64; 3] {
        self.grid.origin()
    }

    /// Every grid point in the box `center +- radius` with its value.
    ///
    /// All eight corners of the Cartesian box are fractionalized so that
    /// oblique cells are fully covered. Both grid bounds are inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidRegion`] for a non-finite center, a negative
    /// or non-finite radius, or a box of more than [`MAX_REGION_POINTS`] points.
    pub fn points_and_values(&self, center: &Point3<f64>, radius: f64) -> Result<MapRegion, MapError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(MapError::InvalidRegion(format!(
                "radius {} must be finite and non-negative",
                radius
            )));
        }
        if !center.iter().all(|c| c.is_finite()) {
            return Err(MapError::InvalidRegion(format!(
                "center ({}, {}, {}) must be finite",
                center.x, center.y, center.z
            )));
        }

        let n_grid = self.grid.n_grid();
        let mut lo = [i64::MAX; 3];
        let mut hi = [i64::MIN; 3];
        for corner in 0..8 {
            let sign = |bit: usize| if corner & bit == 0 { -1.0 } else { 1.0 };
            let offset = Vector3::new(sign(1), sign(2), sign(4)) * radius;
            let frac = self.unit_cell.fractionalize(&(center + offset));
            let representable = (0..3).all(|axis| (frac[axis] * n_grid[axis] as f64).abs() <= MAX_GRID_COORDINATE);
            if !representable {
                return Err(MapError::InvalidRegion(format!(
                    "box of radius {} around ({}, {}, {}) is out of range",
                    radius, center.x, center.y, center.z
                )));
            }
            let grid = self.grid.frac2grid(&frac);
            for axis in 0..3 {
                lo[axis] = lo[axis].min(grid[axis]);
                hi[axis] = hi[axis].max(grid[axis]);
            }
        }

        let too_large = || MapError::InvalidRegion(format!("box of radius {} exceeds {} grid points", radius, MAX_REGION_POINTS));
        let mut size = [0usize; 3];
        for axis in 0..3 {
            size[axis] = hi[axis]
                .checked_sub(lo[axis])
                .and_then(|d| d.checked_add(1))
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(too_large)?;
        }
        let capacity = size
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .filter(|&n| n <= MAX_REGION_POINTS)
            .ok_or_else(too_large)?;

        let mut region = MapRegion {
            points: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            size,
        };
        for k in lo[2]..=hi[2] {
            for j in lo[1]..=hi[1] {
                for i in lo[0]..=hi[0] {
                    let frac = self.grid.grid2frac(i, j, k);
                    region.points.push(self.unit_cell.orthogonalize(&frac));
                    region.values.push(self.grid.values()[self.grid.grid2index(i, j, k)]);
                }
            }
        }
        Ok(region)
    }

    /// Multi-line human-readable description of the map.
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} map\n  cell: {}\n  grid: {:?} of {:?}, origin {:?}",
            self.format,
            self.unit_cell,
            self.n_real(),
            self.n_grid(),
            self.origin()
        );
        let (mean, deviation) = self.grid.mean_and_deviation();
        text.push_str(&format!("\n  values: mean {:.4}, sigma {:.4}", mean, deviation));
        if let Some(header) = &self.header {
            text.push_str(&format!(
                "\n  header: mode {}, min {:.4}, max {:.4}, mean {:.4}, space group {}",
                header.mode, header.min, header.max, header.mean, header.space_group_number
            ));
        }
        text
    }
}
