use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Padding added to the bounding box so that atoms on its faces fall
/// strictly inside the grid.
const PADDING: f64 = 0.001;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    #[error("Box length must be a positive finite number (got {0})")]
    InvalidBoxLength(f64),
    #[error("Atom {0} has a non-finite coordinate")]
    NonFiniteCoordinate(usize),
    #[error("Bucket {id:?} lies outside the {dims:?} bucket grid")]
    BucketRange { id: [i64; 3], dims: [usize; 3] },
    #[error("Atom {0} is not present in its own bucket")]
    AtomNotFound(usize),
    #[error("Coordinates spanning {extent:?} need too many buckets of length {box_length}")]
    GridTooLarge { extent: [f64; 3], box_length: f64 },
}

/// Uniform spatial hash over a fixed set of points.
///
/// The padded bounding box of the points is divided into cubic buckets of
/// edge `box_length`. Buckets are addressed by a flat id
/// `z * nx * ny + y * nx + x`; only occupied buckets are stored.
#[derive(Debug, Clone)]
pub struct Cubicles {
    box_length: f64,
    origin: Point3<f64>,
    dims: [usize; 3],
    buckets: HashMap<usize, Vec<usize>>,
    atom_buckets: Vec<usize>,
}

impl Cubicles {
    pub fn new(points: &[Point3<f64>], box_length: f64) -> Result<Self, SpatialError> {
        if !(box_length.is_finite() && box_length > 0.0) {
            return Err(SpatialError::InvalidBoxLength(box_length));
        }
        if let Some(i) = points.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(SpatialError::NonFiniteCoordinate(i));
        }

        let (min, max) = geometry::bounding_box(points).unwrap_or((Point3::origin(), Point3::origin()));
        let origin = min - Vector3::repeat(PADDING);
        let extent = (max + Vector3::repeat(PADDING)) - origin;
        let dims = grid_dims(&extent, box_length)?;

        let mut cubicles = Self {
            box_length,
            origin,
            dims,
            buckets: HashMap::new(),
            atom_buckets: Vec::with_capacity(points.len()),
        };
        for (i, point) in points.iter().enumerate() {
            let id = cubicles.bucket_id(point)?;
            cubicles.buckets.entry(id).or_default().push(i);
            cubicles.atom_buckets.push(id);
        }

        debug!(
            atoms = points.len(),
            min = ?[min.x, min.y, min.z],
            max = ?[max.x, max.y, max.z],
            dims = ?dims,
            occupied = cubicles.buckets.len(),
            "Built cubicle grid"
        );
        Ok(cubicles)
    }

    pub fn box_length(&self) -> f64 {
        self.box_length
    }

    /// Number of buckets along x, y and z.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn n_atoms(&self) -> usize {
        self.atom_buckets.len()
    }

    /// Flat id of the bucket containing `point`.
    pub fn bucket_id(&self, point: &Point3<f64>) -> Result<usize, SpatialError> {
        let grid = [0, 1, 2].map(|k| ((point[k] - self.origin[k]) / self.box_length).floor() as i64);
        let out_of_range = grid
            .iter()
            .zip(self.dims)
            .any(|(&g, n)| g < 0 || g as u64 >= n as u64);
        if out_of_range {
            return Err(SpatialError::BucketRange { id: grid, dims: self.dims });
        }
        let [x, y, z] = grid.map(|g| g as usize);
        let [nx, ny, _] = self.dims;
        Ok(z * nx * ny + y * nx + x)
    }

    /// Inverts a flat bucket id into `[x, y, z]` grid coordinates.
    pub fn get_box_grid_coords(&self, id: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dims;
        [id % nx, (id / nx) % ny, id / (nx * ny)]
    }

    /// Atom indices stored in one bucket.
    pub fn bucket_atoms(&self, id: usize) -> &[usize] {
        self.buckets.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every other atom in the 3x3x3 block of buckets around atom `index`.
    ///
    /// Any atom closer than the box length is guaranteed to be included.
    pub fn nearby_atoms(&self, index: usize) -> Result<Vec<usize>, SpatialError> {
        let id = *self
            .atom_buckets
            .get(index)
            .ok_or(SpatialError::AtomNotFound(index))?;
        if !self.bucket_atoms(id).contains(&index) {
            return Err(SpatialError::AtomNotFound(index));
        }

        let [u, v, w] = self.get_box_grid_coords(id);
        let [nx, ny, nz] = self.dims;
        let mut nearby = Vec::new();
        for z in w.saturating_sub(1)..=(w + 1).min(nz - 1) {
            for y in v.saturating_sub(1)..=(v + 1).min(ny - 1) {
                for x in u.saturating_sub(1)..=(u + 1).min(nx - 1) {
                    let neighbor = z * nx * ny + y * nx + x;
                    nearby.extend(self.bucket_atoms(neighbor).iter().copied().filter(|&j| j != index));
                }
            }
        }
        Ok(nearby)
    }
}

/// Bucket counts per axis. Their product must be addressable as a flat id.
fn grid_dims(extent: &Vector3<f64>, box_length: f64) -> Result<[usize; 3], SpatialError> {
    let too_large = || SpatialError::GridTooLarge {
        extent: [extent.x, extent.y, extent.z],
        box_length,
    };
    let mut dims = [1usize; 3];
    for (k, dim) in dims.iter_mut().enumerate() {
        let count = (extent[k] / box_length).ceil().max(1.0);
        if !count.is_finite() || count > f64::from(u32::MAX) {
            return Err(too_large());
        }
        *dim = count as usize;
    }
    dims.iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or_else(too_large)?;
    Ok(dims)
}
