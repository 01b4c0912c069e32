//! Atom-index lookups over a parsed structure.

use std::collections::HashMap;

use crate::gro::Structure;
use crate::selection::Selection;

/// Multimaps from atom name, residue name, and residue id to the indices of
/// the matching atoms.
///
/// Index lists come out in file order, so they can be used directly against
/// the positions of a [`Frame`](crate::Frame).
#[derive(Debug, Default, Clone)]
pub struct Topology {
    natoms: usize,
    names: HashMap<String, Vec<u32>>,
    resnames: HashMap<String, Vec<u32>>,
    resids: HashMap<u32, Vec<u32>>,
}

impl Topology {
    pub fn new(structure: &Structure) -> Self {
        let mut topology = Topology {
            natoms: structure.natoms(),
            ..Default::default()
        };
        for (index, atom) in structure.atoms.iter().enumerate() {
            let index = index as u32;
            topology
                .names
                .entry(atom.name.clone())
                .or_default()
                .push(index);
            topology
                .resnames
                .entry(atom.resname.clone())
                .or_default()
                .push(index);
            topology.resids.entry(atom.resid).or_default().push(index);
        }
        topology
    }

    pub fn natoms(&self) -> usize {
        self.natoms
    }

    /// Indices of the atoms with this atom name (e.g. `"OW"`, `"CA"`).
    pub fn by_name(&self, name: &str) -> &[u32] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of the atoms in residues with this name (e.g. `"SOL"`).
    pub fn by_resname(&self, resname: &str) -> &[u32] {
        self.resnames.get(resname).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of the atoms in the residue with this id.
    pub fn by_resid(&self, resid: u32) -> &[u32] {
        self.resids.get(&resid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All atom indices as a [`Selection`].
    pub fn all(&self) -> Selection {
        Selection::until(self.natoms as u32)
    }
}

impl From<&Structure> for Topology {
    fn from(structure: &Structure) -> Self {
        Self::new(structure)
    }
}
