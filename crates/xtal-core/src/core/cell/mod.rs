//! Crystal lattice geometry: unit cells and symmetry operators.

pub mod symmetry;
pub mod unit_cell;
