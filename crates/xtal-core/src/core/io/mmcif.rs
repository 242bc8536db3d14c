use super::cif::{CifBlock, CifReader};
use super::fields::{cell_from_block, first_label, first_scalar_label, required_f64, symmetry_operators};
use super::traits::StructureFile;
use crate::core::models::atom::{Atom, infer_element};
use crate::core::models::chain::ChainSegmenter;
use crate::core::models::model::{ModelError, ModelParts, ModelSource};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::BufRead;

const ATOM_SITE: &str = "_atom_site";
const ANISOTROP: &str = "_atom_site_anisotrop";
const UIJ_ITEMS: [&str; 6] = ["u[1][1]", "u[2][2]", "u[3][3]", "u[1][2]", "u[1][3]", "u[2][3]"];

/// Reader for macromolecular CIF coordinate files.
///
/// Atoms come from the `_atom_site` category of the first block that has
/// one. Author chain and residue numbering is preferred over the label
/// scheme. Only the first `pdbx_PDB_model_num` is kept.
pub struct MmcifFile;

impl MmcifFile {
    pub fn from_reader(cif: &CifReader) -> Result<ModelParts, ModelError> {
        let block = cif
            .find_block_with(ATOM_SITE)
            .ok_or_else(|| ModelError::MissingCategory(ATOM_SITE.to_string()))?;
        Self::from_block(block)
    }

    pub fn from_block(block: &CifBlock) -> Result<ModelParts, ModelError> {
        let records = block.rows_as_records(ATOM_SITE);
        if records.is_empty() {
            return Err(ModelError::MissingCategory(ATOM_SITE.to_string()));
        }
        let anisotropic = anisotropic_tensors(block)?;

        let mut parts = ModelParts::new(ModelSource::Mmcif);
        let mut segmenter = ChainSegmenter::new();
        let mut first_model: Option<String> = None;

        for (row, record) in records.iter().enumerate() {
            if let Some(model) = record.get_str("pdbx_pdb_model_num") {
                match &first_model {
                    None => first_model = Some(model),
                    Some(first) if *first != model => continue,
                    Some(_) => {}
                }
            }

            let position = Point3::new(
                required_f64(record, ATOM_SITE, &["cartn_x"], row)?,
                required_f64(record, ATOM_SITE, &["cartn_y"], row)?,
                required_f64(record, ATOM_SITE, &["cartn_z"], row)?,
            );
            let name = first_label(record, &["label_atom_id", "auth_atom_id"])
                .ok_or_else(|| ModelError::MissingColumn(format!("{}.label_atom_id", ATOM_SITE)))?;

            let mut atom = Atom::new(&name, position);
            atom.altloc = record.get_str("label_alt_id").unwrap_or_default();
            atom.resname = first_label(record, &["label_comp_id", "auth_comp_id"]).unwrap_or_default();
            atom.chain = first_label(record, &["auth_asym_id", "label_asym_id"]).unwrap_or_default();
            atom.resseq = first_label(record, &["auth_seq_id", "label_seq_id"]).unwrap_or_default();
            atom.icode = record.get_str("pdbx_pdb_ins_code").unwrap_or_default();
            atom.occupancy = record.get_f64("occupancy").unwrap_or(1.0);
            atom.b_factor = record.get_f64("b_iso_or_equiv").unwrap_or(0.0);
            atom.element = match record.get_str("type_symbol") {
                Some(symbol) => symbol.to_ascii_uppercase(),
                None => infer_element(&name),
            };
            atom.formal_charge = record
                .get_f64("pdbx_formal_charge")
                .map_or(0, |c| c.round() as i32);
            atom.hetero = record.get_str("group_pdb").as_deref() == Some("HETATM");
            if let Some(uij) = record.get_str("id").and_then(|id| anisotropic.get(&id)) {
                atom.set_uij(Some(*uij));
            }

            let chain_index = segmenter.next_index(&atom.chain);
            parts.push_atom(atom, chain_index);
        }

        parts.unit_cell = cell_from_block(block, "_cell.")?;
        parts.space_group = first_scalar_label(
            block,
            &["_symmetry.space_group_name_h-m", "_space_group.name_h-m_alt"],
        );
        parts.symmetry_operators = symmetry_operators(
            block,
            &["_symmetry_equiv.pos_as_xyz", "_space_group_symop.operation_xyz"],
        )?;
        Ok(parts)
    }
}

impl StructureFile for MmcifFile {
    type Error = ModelError;

    fn read_from(reader: &mut impl BufRead) -> Result<ModelParts, Self::Error> {
        let cif = CifReader::read_from(reader)?;
        Self::from_reader(&cif)
    }
}

fn anisotropic_tensors(block: &CifBlock) -> Result<HashMap<String, [f64; 6]>, ModelError> {
    let mut tensors = HashMap::new();
    for (row, record) in block.rows_as_records(ANISOTROP).iter().enumerate() {
        let Some(id) = record.get_str("id") else {
            continue;
        };
        if record.get("u[1][1]").is_none() {
            continue;
        }
        let mut uij = [0.0; 6];
        for (value, item) in uij.iter_mut().zip(UIJ_ITEMS) {
            *value = required_f64(record, ANISOTROP, &[item], row)?;
        }
        tensors.insert(id, uij);
    }
    Ok(tensors)
}
