use super::atom::Atom;
use super::bonds::Connectivity;
use super::chain::{Chain, build_chains};
use super::residues;
use super::selection::{AtomSelector, SelectionError};
use crate::core::cell::symmetry::{SymmetryError, SymmetryOperator};
use crate::core::cell::unit_cell::{CellError, UnitCell};
use crate::core::io::cif::CifError;
use crate::core::spatial::cubicles::SpatialError;
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::OnceLock;
use thiserror::Error;

const MAX_CA_GAP: f64 = 5.5;
const MAX_P_GAP: f64 = 7.5;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CIF error: {0}")]
    Cif(#[from] CifError),
    #[error("No atom records found")]
    EmptyStructure,
    #[error("Unit cell is required for {0} input but could not be extracted")]
    MissingCell(&'static str),
    #[error("No data block contains the '{0}' category")]
    MissingCategory(String),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Invalid value '{value}' for '{tag}' in row {row}")]
    InvalidValue {
        tag: String,
        row: usize,
        value: String,
    },
    #[error("Duplicate atom name '{0}'")]
    DuplicateAtomName(String),
    #[error("Atom name '{0}' not found")]
    UnknownAtomName(String),
    #[error("Model has no atom-name lookup (only restraint dictionaries provide one)")]
    NoNameLookup,
    #[error("Invalid unit cell: {0}")]
    Cell(#[from] CellError),
    #[error("Invalid symmetry operator: {0}")]
    Symmetry(#[from] SymmetryError),
    #[error("Connectivity perception failed: {0}")]
    Connectivity(#[from] SpatialError),
    #[error("Connectivity covers {found} atoms but the model has {expected}")]
    ConnectivityLength { expected: usize, found: usize },
}

/// The file format a model was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSource {
    Pdb,
    Mmcif,
    SmallMoleculeCif,
    MonomerLibrary,
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelSource::Pdb => "pdb",
            ModelSource::Mmcif => "mmcif",
            ModelSource::SmallMoleculeCif => "cif",
            ModelSource::MonomerLibrary => "monlib",
        };
        f.write_str(name)
    }
}

/// Everything a reader extracts from a file, before bonds are perceived.
#[derive(Debug, Clone)]
pub struct ModelParts {
    pub atoms: Vec<Atom>,
    pub chain_indices: Vec<usize>,
    pub unit_cell: Option<UnitCell>,
    pub space_group: Option<String>,
    pub symmetry_operators: Vec<SymmetryOperator>,
    pub source: ModelSource,
}

impl ModelParts {
    pub fn new(source: ModelSource) -> Self {
        Self {
            atoms: Vec::new(),
            chain_indices: Vec::new(),
            unit_cell: None,
            space_group: None,
            symmetry_operators: Vec::new(),
            source,
        }
    }

    pub fn push_atom(&mut self, atom: Atom, chain_index: usize) {
        self.atoms.push(atom);
        self.chain_indices.push(chain_index);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Ligand,
    Ion,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Ligand => f.write_str("ligand"),
            FeatureKind::Ion => f.write_str("ion"),
        }
    }
}

/// A non-polymer, non-water residue worth pointing a viewer at.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    /// Fixed-width `RES CH NNNNI` label.
    pub label: String,
    pub center: Point3<f64>,
    pub atom_indices: Vec<usize>,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.label)
    }
}

/// A single structural model with perceived connectivity.
///
/// Built only through the ingestion workflows; there is no public constructor
/// and no mutation once built. Chains, ligand flags and the name lookup are
/// derived views.
#[derive(Debug)]
pub struct Model {
    atoms: Vec<Atom>,
    chain_indices: Vec<usize>,
    connectivity: Connectivity,
    unit_cell: Option<UnitCell>,
    space_group: Option<String>,
    symmetry_operators: Vec<SymmetryOperator>,
    source: ModelSource,
    has_hydrogens: bool,
    atom_lookup: Option<HashMap<String, usize>>,
    chains: OnceLock<Vec<Chain>>,
    ligand_flags: OnceLock<Vec<bool>>,
}

impl Model {
    pub(crate) fn new(parts: ModelParts, connectivity: Connectivity) -> Result<Self, ModelError> {
        let ModelParts {
            mut atoms,
            chain_indices,
            unit_cell,
            space_group,
            symmetry_operators,
            source,
        } = parts;

        if atoms.is_empty() {
            return Err(ModelError::EmptyStructure);
        }
        if connectivity.len() != atoms.len() {
            return Err(ModelError::ConnectivityLength {
                expected: atoms.len(),
                found: connectivity.len(),
            });
        }
        for (i, atom) in atoms.iter_mut().enumerate() {
            atom.i_seq = i;
        }

        let atom_lookup = match source {
            ModelSource::MonomerLibrary => Some(build_atom_name_lookup(&atoms)?),
            _ => None,
        };
        let has_hydrogens = atoms.iter().any(Atom::is_hydrogen);

        Ok(Self {
            atoms,
            chain_indices,
            connectivity,
            unit_cell,
            space_group,
            symmetry_operators,
            source,
            has_hydrogens,
            atom_lookup,
            chains: OnceLock::new(),
            ligand_flags: OnceLock::new(),
        })
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn chain_indices(&self) -> &[usize] {
        &self.chain_indices
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn unit_cell(&self) -> Option<&UnitCell> {
        self.unit_cell.as_ref()
    }

    pub fn space_group(&self) -> Option<&str> {
        self.space_group.as_deref()
    }

    /// Symmetry operators listed by the file; empty when none were given.
    pub fn symmetry_operators(&self) -> &[SymmetryOperator] {
        &self.symmetry_operators
    }

    pub fn source(&self) -> ModelSource {
        self.source
    }

    pub fn has_hydrogens(&self) -> bool {
        self.has_hydrogens
    }

    pub fn chains(&self) -> &[Chain] {
        self.chains
            .get_or_init(|| build_chains(&self.atoms, &self.chain_indices))
    }

    /// Per-atom flag: true for atoms outside water, amino acids and nucleic acids.
    pub fn ligand_flags(&self) -> &[bool] {
        self.ligand_flags.get_or_init(|| {
            self.atoms
                .iter()
                .map(|a| residues::is_ligand_residue(&a.resname))
                .collect()
        })
    }

    /// Centroid of all atoms and the largest extent of their bounding box.
    pub fn center_and_size(&self) -> (Point3<f64>, f64) {
        geometry::center_and_size(self.atoms.iter().map(Atom::position))
            .unwrap_or((Point3::origin(), 0.0))
    }

    /// Atom indices matching a selection expression.
    pub fn selection(&self, expression: &str) -> Result<Vec<usize>, SelectionError> {
        let selector = AtomSelector::parse(expression)?;
        Ok(self.select(&selector))
    }

    pub fn select(&self, selector: &AtomSelector) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| selector.is_in_selection(atom))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn atom_index_by_name(&self, name: &str) -> Option<usize> {
        self.atom_lookup.as_ref()?.get(name).copied()
    }

    /// Resolves atom names through the restraint-dictionary name lookup.
    pub fn select_atom_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>, ModelError> {
        let lookup = self.atom_lookup.as_ref().ok_or(ModelError::NoNameLookup)?;
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                lookup
                    .get(name)
                    .copied()
                    .ok_or_else(|| ModelError::UnknownAtomName(name.to_string()))
            })
            .collect()
    }

    /// Backbone trace segments of CA (protein) or P (nucleic acid) atoms.
    ///
    /// Only main-conformer atoms are considered. A segment breaks on a chain
    /// change or a gap longer than 5.5 A (CA) or 7.5 A (P); segments of two
    /// atoms or fewer are dropped.
    pub fn extract_trace(&self) -> Vec<Vec<usize>> {
        let mut segments: Vec<Vec<usize>> = Vec::new();
        let mut last: Option<(usize, usize)> = None;

        for (i, atom) in self.atoms.iter().enumerate() {
            if !atom.is_main_conformer() {
                continue;
            }
            let is_ca = atom.name == "CA" && atom.element == "C";
            let is_p = atom.name == "P";
            if !is_ca && !is_p {
                continue;
            }
            let chain_index = self.chain_indices[i];

            let continues = last.is_some_and(|(last_i, last_chain)| {
                if last_chain != chain_index {
                    return false;
                }
                let gap = atom.distance(&self.atoms[last_i]);
                (is_ca && gap <= MAX_CA_GAP) || (is_p && gap < MAX_P_GAP)
            });
            match segments.last_mut() {
                Some(segment) if continues => segment.push(i),
                _ => segments.push(vec![i]),
            }
            last = Some((i, chain_index));
        }

        segments.retain(|s| s.len() > 2);
        segments
    }

    /// Ligands and ions, one feature per residue with its centroid.
    pub fn extract_interesting_residues(&self) -> Vec<Feature> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut last: Option<usize> = None;
        for (i, atom) in self.atoms.iter().enumerate() {
            if !residues::is_ligand_residue(&atom.resname) {
                continue;
            }
            let same = last.is_some_and(|j| atom.is_same_residue(&self.atoms[j], true));
            match groups.last_mut() {
                Some(group) if same => group.push(i),
                _ => groups.push(vec![i]),
            }
            last = Some(i);
        }

        groups
            .into_iter()
            .filter_map(|indices| {
                let first = &self.atoms[*indices.first()?];
                let kind = if indices.len() == 1 && residues::is_ion_residue(&first.resname) {
                    FeatureKind::Ion
                } else {
                    FeatureKind::Ligand
                };
                let resseq = first
                    .resseq_as_int()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| first.resseq.clone());
                let label = format!(
                    "{:>3} {:>2} {:>4}{:>1}",
                    first.resname, first.chain, resseq, first.icode
                );
                let sum: Vector3<f64> = indices.iter().map(|&i| self.atoms[i].position().coords).sum();
                let center = Point3::from(sum / indices.len() as f64);
                Some(Feature {
                    kind,
                    label,
                    center,
                    atom_indices: indices,
                })
            })
            .collect()
    }
}

fn build_atom_name_lookup(atoms: &[Atom]) -> Result<HashMap<String, usize>, ModelError> {
    let mut lookup = HashMap::with_capacity(atoms.len());
    for (i, atom) in atoms.iter().enumerate() {
        if lookup.insert(atom.name.clone(), i).is_some() {
            return Err(ModelError::DuplicateAtomName(atom.name.clone()));
        }
    }
    Ok(lookup)
}
