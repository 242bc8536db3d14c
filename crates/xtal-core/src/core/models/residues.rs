use phf::{Set, phf_set};

#[rustfmt::skip]
pub static AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU",
    "LYS", "MET", "MSE", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL", "UNK",
};

// Both DNA and the several RNA spellings seen in deposited files.
#[rustfmt::skip]
pub static NUCLEIC_ACIDS: Set<&'static str> = phf_set! {
    "DA", "DC", "DG", "DT", "A", "C", "G", "U",
    "rA", "rC", "rG", "rU", "Ar", "Cr", "Gr", "Ur",
};

pub static WATER_NAMES: Set<&'static str> = phf_set! { "HOH" };

#[rustfmt::skip]
pub static ELEMENTS: Set<&'static str> = phf_set! {
    "H", "HE", "LI", "BE", "B", "C", "N", "O", "F", "NE", "NA", "MG",
    "AL", "SI", "P", "S", "CL", "AR", "K", "CA", "SC", "TI", "V", "CR",
    "MN", "FE", "CO", "NI", "CU", "ZN", "GA", "GE", "AS", "SE", "BR",
    "KR", "RB", "SR", "Y", "ZR", "NB", "MO", "TC", "RU", "RH", "PD",
    "AG", "CD", "IN", "SN", "SB", "TE", "I", "XE", "CS", "BA", "LA",
    "CE", "PR", "ND", "PM", "SM", "EU", "GD", "TB", "DY", "HO", "ER",
    "TM", "YB", "LU", "HF", "TA", "W", "RE", "OS", "IR", "PT", "AU",
    "HG", "TL", "PB", "BI", "PO", "AT", "RN", "FR", "RA", "AC", "TH",
    "PA", "U", "NP", "PU", "AM", "CM", "BK", "CF", "ES", "FM", "MD",
    "NO", "LR", "RF", "DB", "SG", "BH", "HS", "MT", "DS", "RG",
};

/// Elements that never appear as free ions in a deposited structure.
pub static NON_IONIC: Set<&'static str> = phf_set! {
    "H", "B", "C", "N", "O", "SI", "S", "P", "SE",
};

pub fn is_amino_acid(resname: &str) -> bool {
    AMINO_ACIDS.contains(resname)
}

pub fn is_nucleic_acid(resname: &str) -> bool {
    NUCLEIC_ACIDS.contains(resname)
}

pub fn is_water(resname: &str) -> bool {
    WATER_NAMES.contains(resname)
}

/// True for residues that are neither polymer building blocks nor solvent.
pub fn is_ligand_residue(resname: &str) -> bool {
    !is_water(resname) && !is_amino_acid(resname) && !is_nucleic_acid(resname)
}

/// True when `resname` names a single element that can exist as an ion.
pub fn is_ion_residue(resname: &str) -> bool {
    ELEMENTS.contains(resname) && !NON_IONIC.contains(resname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_residues() {
        assert!(is_amino_acid("MSE"));
        assert!(is_nucleic_acid("DG"));
        assert!(is_nucleic_acid("rU"));
        assert!(!is_nucleic_acid("RU"));
        assert!(is_water("HOH"));
        assert!(is_ligand_residue("ATP"));
        assert!(!is_ligand_residue("GLY"));
    }

    #[test]
    fn ions_exclude_organic_elements() {
        assert!(is_ion_residue("ZN"));
        assert!(is_ion_residue("CL"));
        assert!(!is_ion_residue("C"));
        assert!(!is_ion_residue("ATP"));
    }
}
