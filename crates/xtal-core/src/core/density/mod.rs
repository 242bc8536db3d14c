//! Electron-density maps.
//!
//! A map is a [`grid::GridArray`] of density values covering a region of the
//! unit cell, plus the cell itself. The CCP4 and DSN6 decoders fill the grid
//! from a complete file image; [`map::DensityMap::points_and_values`] then
//! cuts Cartesian boxes out of it for downstream consumers.

pub mod ccp4;
pub mod dsn6;
pub mod grid;
pub mod map;

use crate::core::cell::unit_cell::CellError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Map file is too short: need at least {expected} bytes, found {found}")]
    TooShort { expected: usize, found: usize },
    #[error("Map payload does not match the header: expected {expected} bytes, found {found}")]
    MapSizeMismatch { expected: usize, found: usize },
    #[error("Could not determine byte order: header sentinel {found} (expected {expected}) in both orders")]
    EndianDetection { expected: i16, found: i16 },
    #[error("Grid index ({i}, {j}, {k}) overflows a map of {size} values")]
    ArrayOverflow { i: i64, j: i64, k: i64, size: usize },
    #[error("Invalid axis order {0:?} (must be a permutation of 1, 2, 3)")]
    InvalidAxisOrder([i32; 3]),
    #[error("Unsupported CCP4 data mode {0} (supported: 0, 1, 2)")]
    UnsupportedMode(i32),
    #[error("Invalid map region: {0}")]
    InvalidRegion(String),
    #[error("Invalid map dimensions: {0}")]
    InvalidDimensions(String),
    #[error("Invalid map cell: {0}")]
    Cell(#[from] CellError),
}
