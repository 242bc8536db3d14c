use super::residues;
use crate::core::utils::geometry::{self, EIGHT_PI_SQUARED};
use nalgebra::{Matrix4, Point3};
use std::sync::OnceLock;

/// A single atom site with its crystallographic labels.
///
/// The identity fields mirror the PDB/mmCIF `atom_site` labels. `resseq` is
/// kept as the (trimmed) text from the file so that non-numeric or hybrid-36
/// sequence numbers survive unchanged; [`Atom::resseq_as_int`] parses it on
/// demand.
#[derive(Debug, Clone)]
pub struct Atom {
    /// Atom name, e.g. `"CA"`.
    pub name: String,
    /// Alternate location indicator, empty for a single conformer.
    pub altloc: String,
    pub resname: String,
    pub chain: String,
    pub resseq: String,
    /// Insertion code, empty when absent.
    pub icode: String,
    position: Point3<f64>,
    pub occupancy: f64,
    /// Isotropic B-factor in square Angstroms.
    pub b_factor: f64,
    /// Upper-case element symbol.
    pub element: String,
    pub formal_charge: i32,
    /// Partial charge, only populated by restraint dictionaries.
    pub partial_charge: f64,
    uij: Option<[f64; 6]>,
    /// True for `HETATM` records.
    pub hetero: bool,
    /// Position of the atom in its model.
    pub i_seq: usize,
    sphere_transform: OnceLock<Option<Matrix4<f64>>>,
}

impl Atom {
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            altloc: String::new(),
            resname: String::new(),
            chain: String::new(),
            resseq: String::new(),
            icode: String::new(),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
            element: String::new(),
            formal_charge: 0,
            partial_charge: 0.0,
            uij: None,
            hetero: false,
            i_seq: 0,
            sphere_transform: OnceLock::new(),
        }
    }

    /// Cartesian position in Angstroms.
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    pub fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
        self.sphere_transform = OnceLock::new();
    }

    /// Anisotropic displacement tensor `[U11, U22, U33, U12, U13, U23]`.
    pub fn uij(&self) -> Option<&[f64; 6]> {
        self.uij.as_ref()
    }

    pub fn set_uij(&mut self, uij: Option<[f64; 6]>) {
        self.uij = uij;
        self.sphere_transform = OnceLock::new();
    }

    pub fn resseq_as_int(&self) -> Option<i32> {
        self.resseq.trim().parse().ok()
    }

    /// Residue identifier: sequence number followed by insertion code.
    pub fn resid(&self) -> String {
        format!("{}{}", self.resseq, self.icode)
    }

    /// Isotropic displacement `U` corresponding to the B-factor.
    pub fn b_as_u(&self) -> f64 {
        b_to_u(self.b_factor)
    }

    pub fn distance(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }

    pub fn midpoint(&self, other: &Atom) -> Point3<f64> {
        geometry::midpoint(&self.position, &other.position)
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == "H" || self.element == "D"
    }

    pub fn is_s_or_p(&self) -> bool {
        self.element == "S" || self.element == "P"
    }

    pub fn is_ion(&self) -> bool {
        self.element == self.resname
    }

    pub fn is_water(&self) -> bool {
        residues::is_water(&self.resname)
    }

    pub fn is_same_residue(&self, other: &Atom, ignore_altloc: bool) -> bool {
        self.resseq == other.resseq
            && self.icode == other.icode
            && self.chain == other.chain
            && self.resname == other.resname
            && (ignore_altloc || self.altloc == other.altloc)
    }

    /// Two atoms can coexist unless they carry different, non-blank altlocs.
    pub fn is_same_conformer(&self, other: &Atom) -> bool {
        self.altloc.is_empty() || other.altloc.is_empty() || self.altloc == other.altloc
    }

    pub fn is_main_conformer(&self) -> bool {
        self.altloc.is_empty() || self.altloc == "A"
    }

    /// Unit-sphere to thermal-ellipsoid transform, computed on first use.
    ///
    /// `None` when the atom has no anisotropic tensor or the tensor is not
    /// positive semi-definite.
    pub fn ellipsoid_to_sphere_transform(&self) -> Option<&Matrix4<f64>> {
        self.sphere_transform
            .get_or_init(|| {
                self.uij
                    .as_ref()
                    .and_then(|uij| geometry::ellipsoid_to_sphere_transform(uij, &self.position))
            })
            .as_ref()
    }
}

/// `B = 8 pi^2 U^2`.
pub fn u_to_b(u: f64) -> f64 {
    u * u * EIGHT_PI_SQUARED
}

pub fn b_to_u(b: f64) -> f64 {
    (b / EIGHT_PI_SQUARED).sqrt()
}

/// Guesses an element symbol from an atom name when the file carries none.
///
/// PDB names right-justify single-letter elements in a four-column field, so
/// the first alphabetic character is the best available guess.
pub(crate) fn infer_element(name: &str) -> String {
    name.chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

/// Leading alphabetic run of a small-molecule site label (`C12A` -> `C`, `Cl3` -> `CL`).
pub(crate) fn element_from_label(label: &str) -> String {
    let letters: String = label
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_ascii_uppercase();
    if residues::ELEMENTS.contains(letters.as_str()) {
        letters
    } else {
        letters.chars().take(1).collect()
    }
}
