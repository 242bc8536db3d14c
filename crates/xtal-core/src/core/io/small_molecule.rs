use super::cif::{CifBlock, CifReader};
use super::fields::{cell_from_block, column_f64, column_label, first_scalar_label, symmetry_operators};
use super::traits::StructureFile;
use crate::core::models::atom::{Atom, element_from_label, u_to_b};
use crate::core::models::model::{ModelError, ModelParts, ModelSource};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::BufRead;

const LABEL: &str = "_atom_site_label";
const FRACT: [&str; 3] = ["_atom_site_fract_x", "_atom_site_fract_y", "_atom_site_fract_z"];
const ANISO_LABEL: &str = "_atom_site_aniso_label";
const ANISO_U: [&str; 6] = [
    "_atom_site_aniso_u_11",
    "_atom_site_aniso_u_22",
    "_atom_site_aniso_u_33",
    "_atom_site_aniso_u_12",
    "_atom_site_aniso_u_13",
    "_atom_site_aniso_u_23",
];

/// Reader for small-molecule (core dictionary) CIF files.
///
/// Sites are given in fractional coordinates and are orthogonalized with the
/// block's unit cell, so a cell is mandatory. All atoms share one chain.
pub struct SmallMoleculeFile;

impl SmallMoleculeFile {
    pub fn from_reader(cif: &CifReader) -> Result<ModelParts, ModelError> {
        let block = cif
            .blocks()
            .iter()
            .find(|b| b.contains(FRACT[0]))
            .or_else(|| cif.blocks().iter().find(|b| b.contains(LABEL)))
            .ok_or_else(|| ModelError::MissingCategory("_atom_site".to_string()))?;
        Self::from_block(block)
    }

    pub fn from_block(block: &CifBlock) -> Result<ModelParts, ModelError> {
        let cell = cell_from_block(block, "_cell_")?.ok_or(ModelError::MissingCell("small-molecule CIF"))?;
        let labels = block
            .get_column(LABEL)
            .ok_or_else(|| ModelError::MissingColumn(LABEL.to_string()))?;
        let anisotropic = anisotropic_tensors(block)?;

        let mut parts = ModelParts::new(ModelSource::SmallMoleculeCif);
        for (row, label) in labels.iter().enumerate() {
            let label = label.to_label();
            let frac = Point3::new(
                column_f64(block, FRACT[0], row)?,
                column_f64(block, FRACT[1], row)?,
                column_f64(block, FRACT[2], row)?,
            );

            let mut atom = Atom::new(&label, cell.orthogonalize(&frac));
            atom.element = element_from_label(
                &column_label(block, "_atom_site_type_symbol", row).unwrap_or_else(|| label.clone()),
            );
            if let Some(u_iso) = block
                .get_column("_atom_site_u_iso_or_equiv")
                .and_then(|c| c.get(row))
                .and_then(|v| v.as_f64())
            {
                atom.b_factor = u_to_b(u_iso);
            }
            if let Some(occupancy) = block
                .get_column("_atom_site_occupancy")
                .and_then(|c| c.get(row))
                .and_then(|v| v.as_f64())
            {
                atom.occupancy = occupancy;
            }
            atom.hetero = true;
            if let Some(uij) = anisotropic.get(&label) {
                atom.set_uij(Some(*uij));
            }
            parts.push_atom(atom, 0);
        }

        parts.unit_cell = Some(cell);
        parts.space_group = first_scalar_label(
            block,
            &["_symmetry_space_group_name_h-m", "_space_group_name_h-m_alt"],
        );
        parts.symmetry_operators = symmetry_operators(
            block,
            &["_symmetry_equiv_pos_as_xyz", "_space_group_symop_operation_xyz"],
        )?;
        Ok(parts)
    }
}

impl StructureFile for SmallMoleculeFile {
    type Error = ModelError;

    fn read_from(reader: &mut impl BufRead) -> Result<ModelParts, Self::Error> {
        let cif = CifReader::read_from(reader)?;
        Self::from_reader(&cif)
    }
}

fn anisotropic_tensors(block: &CifBlock) -> Result<HashMap<String, [f64; 6]>, ModelError> {
    let mut tensors = HashMap::new();
    let Some(labels) = block.get_column(ANISO_LABEL) else {
        return Ok(tensors);
    };
    for (row, label) in labels.iter().enumerate() {
        let mut uij = [0.0; 6];
        for (value, tag) in uij.iter_mut().zip(ANISO_U) {
            *value = column_f64(block, tag, row)?;
        }
        tensors.insert(label.to_label(), uij);
    }
    Ok(tensors)
}
