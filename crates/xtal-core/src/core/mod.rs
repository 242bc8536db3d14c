//! # Core Module
//!
//! Fundamental data structures and readers for crystallographic data.
//!
//! ## Architecture
//!
//! - **Lattice Geometry** ([`cell`]) - Unit cells and symmetry operators
//! - **Molecular Representation** ([`models`]) - Atoms, models, hierarchy views and selections
//! - **File I/O** ([`io`]) - CIF tokenizer plus PDB, mmCIF, small-molecule and monomer readers
//! - **Density Maps** ([`density`]) - Periodic grids and the CCP4/DSN6 decoders
//! - **Spatial Indexing** ([`spatial`]) - The `Cubicles` bucket grid for neighbour queries
//! - **Utilities** ([`utils`]) - Shared geometric helpers

pub mod cell;
pub mod density;
pub mod io;
pub mod models;
pub mod spatial;
pub mod utils;
