/// Symmetric bond graph over atom indices.
///
/// Neighbour lists are kept sorted and free of duplicates, so two graphs
/// built by different strategies compare equal with `==`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Connectivity {
    adjacency: Vec<Vec<usize>>,
}

impl Connectivity {
    pub fn from_adjacency(mut adjacency: Vec<Vec<usize>>) -> Self {
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        Self { adjacency }
    }

    /// Builds the graph from undirected bonds; self-bonds are dropped.
    pub fn from_bonds<I>(n_atoms: usize, bonds: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut adjacency = vec![Vec::new(); n_atoms];
        for (i, j) in bonds {
            if i == j || i >= n_atoms || j >= n_atoms {
                continue;
            }
            adjacency[i].push(j);
            adjacency[j].push(i);
        }
        Self::from_adjacency(adjacency)
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        self.adjacency.get(atom).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    pub fn bond_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Each bond once, as `(i, j)` with `i < j`.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, ns)| ns.iter().filter(move |&&j| j > i).map(move |&j| (i, j)))
    }

    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().enumerate().all(|(i, ns)| {
            ns.iter()
                .all(|&j| self.adjacency.get(j).is_some_and(|back| back.binary_search(&i).is_ok()))
        })
    }
}
