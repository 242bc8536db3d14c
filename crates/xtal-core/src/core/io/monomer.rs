use super::cif::{CifBlock, CifReader};
use super::fields::{first_label, required_f64};
use super::traits::StructureFile;
use crate::core::models::atom::{Atom, element_from_label};
use crate::core::models::model::{ModelError, ModelParts, ModelSource};
use nalgebra::Point3;
use std::io::BufRead;

const CHEM_COMP_ATOM: &str = "_chem_comp_atom";

/// Reader for monomer library / restraint dictionary CIF files.
///
/// Atoms come from `_chem_comp_atom`. Ideal coordinates are read from
/// `x`/`y`/`z`, falling back to the chemical component dictionary's
/// `model_Cartn_*` and `pdbx_model_Cartn_*_ideal` items. There is no unit
/// cell; atoms are addressed by name once the model is built.
pub struct MonomerFile;

impl MonomerFile {
    pub fn from_reader(cif: &CifReader) -> Result<ModelParts, ModelError> {
        let block = cif
            .find_block_with(CHEM_COMP_ATOM)
            .ok_or_else(|| ModelError::MissingCategory(CHEM_COMP_ATOM.to_string()))?;
        Self::from_block(block)
    }

    pub fn from_block(block: &CifBlock) -> Result<ModelParts, ModelError> {
        let records = block.rows_as_records(CHEM_COMP_ATOM);
        if records.is_empty() {
            return Err(ModelError::MissingCategory(CHEM_COMP_ATOM.to_string()));
        }

        let mut parts = ModelParts::new(ModelSource::MonomerLibrary);
        for (row, record) in records.iter().enumerate() {
            let name = record
                .get_str("atom_id")
                .ok_or_else(|| ModelError::MissingColumn(format!("{}.atom_id", CHEM_COMP_ATOM)))?;
            let position = Point3::new(
                required_f64(record, CHEM_COMP_ATOM, &["x", "model_cartn_x", "pdbx_model_cartn_x_ideal"], row)?,
                required_f64(record, CHEM_COMP_ATOM, &["y", "model_cartn_y", "pdbx_model_cartn_y_ideal"], row)?,
                required_f64(record, CHEM_COMP_ATOM, &["z", "model_cartn_z", "pdbx_model_cartn_z_ideal"], row)?,
            );

            let mut atom = Atom::new(&name, position);
            atom.resname = first_label(record, &["comp_id"]).unwrap_or_default();
            atom.element = match record.get_str("type_symbol") {
                Some(symbol) => symbol.to_ascii_uppercase(),
                None => element_from_label(&name),
            };
            atom.partial_charge = record.get_f64("partial_charge").unwrap_or(0.0);
            atom.formal_charge = record.get_f64("charge").map_or(0, |c| c.round() as i32);
            atom.hetero = true;
            parts.push_atom(atom, 0);
        }
        Ok(parts)
    }
}

impl StructureFile for MonomerFile {
    type Error = ModelError;

    fn read_from(reader: &mut impl BufRead) -> Result<ModelParts, Self::Error> {
        let cif = CifReader::read_from(reader)?;
        Self::from_reader(&cif)
    }
}
