use super::config::ConnectivityConfig;
use crate::core::models::atom::Atom;
use crate::core::models::bonds::Connectivity;
use crate::core::spatial::cubicles::{Cubicles, SpatialError};
use nalgebra::Point3;
use tracing::debug;

/// Distance rule for a covalent bond between two atoms.
///
/// Atoms in distinct named conformers never bond, nor do two hydrogens. A
/// pair involving one hydrogen uses the hydrogen threshold; otherwise the
/// heavy-atom threshold applies, relaxed for sulfur and phosphorus.
pub fn is_bonded(a: &Atom, b: &Atom, config: &ConnectivityConfig) -> bool {
    if !a.is_same_conformer(b) {
        return false;
    }
    let (a_h, b_h) = (a.is_hydrogen(), b.is_hydrogen());
    if a_h && b_h {
        return false;
    }
    let d = a.distance(b);
    if a_h || b_h {
        return d <= config.max_bond_length_h();
    }
    d <= config.max_bond_length() || (d <= config.max_bond_length_sp() && (a.is_s_or_p() || b.is_s_or_p()))
}

/// Perceives bonds by testing each atom against its 27-bucket neighbourhood.
pub fn build_fast(atoms: &[Atom], config: &ConnectivityConfig) -> Result<Connectivity, SpatialError> {
    if atoms.is_empty() {
        return Ok(Connectivity::default());
    }
    let positions: Vec<Point3<f64>> = atoms.iter().map(|a| *a.position()).collect();
    let cubicles = Cubicles::new(&positions, config.box_length())?;

    let mut bonds = Vec::new();
    for (i, atom) in atoms.iter().enumerate() {
        for j in cubicles.nearby_atoms(i)? {
            if j > i && is_bonded(atom, &atoms[j], config) {
                bonds.push((i, j));
            }
        }
    }
    debug!(atoms = atoms.len(), bonds = bonds.len(), dims = ?cubicles.dims(), "Perceived connectivity");
    Ok(Connectivity::from_bonds(atoms.len(), bonds))
}

/// All-pairs bond perception. Quadratic; used to cross-check [`build_fast`].
pub fn build_reference(atoms: &[Atom], config: &ConnectivityConfig) -> Connectivity {
    let bonds = (0..atoms.len()).flat_map(|i| {
        (i + 1..atoms.len())
            .filter(move |&j| is_bonded(&atoms[i], &atoms[j], config))
            .map(move |j| (i, j))
    });
    Connectivity::from_bonds(atoms.len(), bonds)
}
