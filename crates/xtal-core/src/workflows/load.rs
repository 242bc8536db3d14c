use crate::core::density::ccp4::Ccp4File;
use crate::core::density::dsn6::Dsn6File;
use crate::core::density::map::{DensityMap, MapFormat};
use crate::core::io::cif::CifReader;
use crate::core::io::mmcif::MmcifFile;
use crate::core::io::monomer::MonomerFile;
use crate::core::io::pdb::PdbFile;
use crate::core::io::small_molecule::SmallMoleculeFile;
use crate::core::io::traits::{MapFile, StructureFile};
use crate::core::models::model::{Model, ModelParts, ModelSource};
use crate::engine::assembly::assemble_model;
use crate::engine::config::{ConnectivityConfig, MapConfig};
use crate::engine::error::XtalError;
use std::path::Path;
use tracing::{info, instrument};

pub fn load_pdb_str(text: &str, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    load_structure_str(text, ModelSource::Pdb, config)
}

pub fn load_mmcif_str(text: &str, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    load_structure_str(text, ModelSource::Mmcif, config)
}

pub fn load_small_molecule_str(text: &str, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    load_structure_str(text, ModelSource::SmallMoleculeCif, config)
}

pub fn load_monomer_str(text: &str, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    load_structure_str(text, ModelSource::MonomerLibrary, config)
}

/// Parses `text` with the reader for `source` and builds a bonded model.
#[instrument(skip_all, name = "load_structure", fields(source = %source))]
pub fn load_structure_str(text: &str, source: ModelSource, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    let parts = match source {
        ModelSource::Pdb => PdbFile::read_from_str(text)?,
        ModelSource::Mmcif => MmcifFile::read_from_str(text)?,
        ModelSource::SmallMoleculeCif => SmallMoleculeFile::read_from_str(text)?,
        ModelSource::MonomerLibrary => MonomerFile::read_from_str(text)?,
    };
    finish_model(parts, config)
}

/// Builds a model from an already parsed CIF file, choosing the reader from
/// the categories it contains.
pub fn load_cif_model(cif: &CifReader, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    let source = detect_cif_flavor(cif)
        .ok_or_else(|| XtalError::UnsupportedFormat("CIF file has no atom_site or chem_comp_atom data".to_string()))?;
    let parts = match source {
        ModelSource::Mmcif => MmcifFile::from_reader(cif)?,
        ModelSource::SmallMoleculeCif => SmallMoleculeFile::from_reader(cif)?,
        ModelSource::MonomerLibrary => MonomerFile::from_reader(cif)?,
        ModelSource::Pdb => return Err(XtalError::UnsupportedFormat("PDB text is not CIF".to_string())),
    };
    finish_model(parts, config)
}

/// Which structure reader understands a CIF file.
///
/// Fractional `_atom_site_fract_*` sites mark a small-molecule file, an
/// `_atom_site` category an mmCIF file, and `_chem_comp_atom` a restraint
/// dictionary.
pub fn detect_cif_flavor(cif: &CifReader) -> Option<ModelSource> {
    let blocks = cif.blocks();
    if blocks.iter().any(|b| b.contains("_atom_site_fract_x")) {
        Some(ModelSource::SmallMoleculeCif)
    } else if cif.find_block_with("_atom_site").is_some() {
        Some(ModelSource::Mmcif)
    } else if cif.find_block_with("_chem_comp_atom").is_some() {
        Some(ModelSource::MonomerLibrary)
    } else {
        None
    }
}

/// Loads a structure file, picking the reader from the extension.
///
/// `.pdb`/`.ent` files are read as PDB; `.cif`/`.mmcif` files are sniffed
/// with [`detect_cif_flavor`].
#[instrument(skip_all, name = "load_structure_path", fields(path = %path.display()))]
pub fn load_structure_path(path: &Path, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    match extension(path).as_deref() {
        Some("pdb" | "ent") => {
            let parts = PdbFile::read_from_path(path)?;
            finish_model(parts, config)
        }
        Some("cif" | "mmcif") => {
            let cif = CifReader::read_from_path(path)?;
            load_cif_model(&cif, config)
        }
        _ => Err(unsupported(path)),
    }
}

pub fn load_ccp4_bytes(bytes: &[u8]) -> Result<DensityMap, XtalError> {
    let map = Ccp4File::decode(bytes)?;
    info!("Loaded map: {}", map.summary());
    Ok(map)
}

pub fn load_dsn6_bytes(bytes: &[u8], config: &MapConfig) -> Result<DensityMap, XtalError> {
    let map = Dsn6File::decode_with_options(bytes, config.sigma_scale)?;
    info!("Loaded map: {}", map.summary());
    Ok(map)
}

/// Loads a density map, picking the decoder from the extension.
#[instrument(skip_all, name = "load_map_path", fields(path = %path.display()))]
pub fn load_map_path(path: &Path, config: &MapConfig) -> Result<DensityMap, XtalError> {
    let format = map_format_for(path).ok_or_else(|| unsupported(path))?;
    let bytes = std::fs::read(path)?;
    match format {
        MapFormat::Ccp4 => load_ccp4_bytes(&bytes),
        MapFormat::Dsn6 => load_dsn6_bytes(&bytes, config),
    }
}

/// Map format implied by a file extension.
pub fn map_format_for(path: &Path) -> Option<MapFormat> {
    match extension(path)?.as_str() {
        "ccp4" | "map" | "mrc" => Some(MapFormat::Ccp4),
        "dsn6" | "omap" | "brix" => Some(MapFormat::Dsn6),
        _ => None,
    }
}

pub fn read_cif_str(text: &str) -> Result<CifReader, XtalError> {
    Ok(CifReader::parse(text)?)
}

pub fn read_cif_path(path: &Path) -> Result<CifReader, XtalError> {
    Ok(CifReader::read_from_path(path)?)
}

fn finish_model(parts: ModelParts, config: &ConnectivityConfig) -> Result<Model, XtalError> {
    let model = assemble_model(parts, config)?;
    info!(
        "Loaded {} model: {} atoms, {} chains, {} bonds",
        model.source(),
        model.n_atoms(),
        model.chains().len(),
        model.connectivity().bond_count()
    );
    Ok(model)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn unsupported(path: &Path) -> XtalError {
    XtalError::UnsupportedFormat(path.display().to_string())
}
