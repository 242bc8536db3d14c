//! Readers for crystallographic structure and map formats.
//!
//! Structure readers implement [`traits::StructureFile`] and produce
//! [`ModelParts`](crate::core::models::model::ModelParts): atoms, chain
//! segmentation, and the unit cell when the file has one. Bond perception
//! happens later, in the engine layer. Map readers implement
//! [`traits::MapFile`] and decode a whole file image into a
//! [`DensityMap`](crate::core::density::map::DensityMap).

pub mod cif;
mod fields;
pub mod mmcif;
pub mod monomer;
pub mod pdb;
pub mod small_molecule;
pub mod traits;

/// Trimmed fixed-column field; columns past the end of the line read as empty.
pub(crate) fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}
