use super::atom::Atom;

/// Assigns chain indices while atoms are read in file order.
///
/// A new index starts whenever the chain label changes or a chain terminator
/// (`TER`) was seen since the previous atom. Indices are contiguous from zero.
#[derive(Debug, Default)]
pub struct ChainSegmenter {
    current: Option<usize>,
    last_chain: Option<String>,
    pending_break: bool,
}

impl ChainSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chain index for the next atom, whose chain label is `chain`.
    pub fn next_index(&mut self, chain: &str) -> usize {
        let starts_new = self.pending_break || self.last_chain.as_deref() != Some(chain);
        let index = match (self.current, starts_new) {
            (None, _) => 0,
            (Some(i), true) => i + 1,
            (Some(i), false) => i,
        };
        self.current = Some(index);
        self.pending_break = false;
        if starts_new {
            self.last_chain = Some(chain.to_string());
        }
        index
    }

    /// Forces the next atom into a new chain segment.
    pub fn terminate(&mut self) {
        if self.current.is_some() {
            self.pending_break = true;
        }
    }
}

/// Atoms of one residue, referenced by index into the owning model.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub resname: String,
    pub resseq: String,
    pub icode: String,
    atom_indices: Vec<usize>,
}

impl Residue {
    pub fn atom_indices(&self) -> &[usize] {
        &self.atom_indices
    }

    pub fn n_atoms(&self) -> usize {
        self.atom_indices.len()
    }

    pub fn resid(&self) -> String {
        format!("{}{}", self.resseq, self.icode)
    }

    /// Finds an atom by name.
    ///
    /// With `altloc` set the altloc must match exactly; without it the first
    /// main-conformer atom of that name is returned.
    pub fn get_atom<'a>(&self, atoms: &'a [Atom], name: &str, altloc: Option<&str>) -> Option<&'a Atom> {
        self.atom_indices
            .iter()
            .filter_map(|&i| atoms.get(i))
            .find(|atom| {
                atom.name == name
                    && match altloc {
                        Some(code) => atom.altloc == code,
                        None => atom.is_main_conformer(),
                    }
            })
    }
}

/// A run of atoms sharing one chain index, split into residues.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    pub chain_index: usize,
    residues: Vec<Residue>,
}

impl Chain {
    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn atom_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.residues
            .iter()
            .flat_map(|r| r.atom_indices.iter().copied())
    }

    pub fn n_atoms(&self) -> usize {
        self.residues.iter().map(Residue::n_atoms).sum()
    }
}

/// Groups atoms into chains by contiguous chain index, then into residues by
/// contiguous residue identifier.
pub fn build_chains(atoms: &[Atom], chain_indices: &[usize]) -> Vec<Chain> {
    let mut chains: Vec<Chain> = Vec::new();
    let mut last_resid: Option<String> = None;

    for (i, (atom, &chain_index)) in atoms.iter().zip(chain_indices).enumerate() {
        let new_chain = chains.last().is_none_or(|c| c.chain_index != chain_index);
        if new_chain {
            chains.push(Chain {
                id: atom.chain.clone(),
                chain_index,
                residues: Vec::new(),
            });
            last_resid = None;
        }
        let Some(chain) = chains.last_mut() else {
            continue;
        };

        let resid = atom.resid();
        if last_resid.as_deref() != Some(resid.as_str()) || chain.residues.is_empty() {
            chain.residues.push(Residue {
                resname: atom.resname.clone(),
                resseq: atom.resseq.clone(),
                icode: atom.icode.clone(),
                atom_indices: Vec::new(),
            });
            last_resid = Some(resid);
        }
        if let Some(residue) = chain.residues.last_mut() {
            residue.atom_indices.push(i);
        }
    }
    chains
}
