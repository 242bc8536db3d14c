use thiserror::Error;

use super::config::ConfigError;
use crate::core::cell::symmetry::SymmetryError;
use crate::core::cell::unit_cell::CellError;
use crate::core::density::MapError;
use crate::core::io::cif::CifError;
use crate::core::io::pdb::PdbError;
use crate::core::models::model::ModelError;
use crate::core::models::selection::SelectionError;
use crate::core::spatial::cubicles::SpatialError;

#[derive(Debug, Error)]
pub enum XtalError {
    #[error("CIF parsing failed: {0}")]
    Cif(#[from] CifError),

    #[error("PDB parsing failed: {0}")]
    Pdb(#[from] PdbError),

    #[error("Model construction failed: {0}")]
    Model(#[from] ModelError),

    #[error("Density map decoding failed: {0}")]
    Map(#[from] MapError),

    #[error("Invalid unit cell: {0}")]
    Cell(#[from] CellError),

    #[error("Spatial index failure: {0}")]
    Spatial(#[from] SpatialError),

    #[error("Invalid atom selection: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invalid symmetry operator: {0}")]
    Symmetry(#[from] SymmetryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}
