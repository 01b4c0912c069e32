// Invariant: the indices of a selection are _unique_ and _sorted_ in
// ascending order. Every constructor establishes this and every operation
// below relies on it, which is what keeps the set algebra to a single
// merge pass per call.

use std::cmp::Ordering;

/// A set of atom indices into the frames of a trajectory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<u32>,
}

impl Selection {
    /// Build a selection from arbitrary indices, deduplicating and sorting.
    pub fn new(indices: impl IntoIterator<Item = u32>) -> Self {
        let mut indices: Vec<u32> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    /// The first `until` atoms.
    pub fn until(until: u32) -> Self {
        Self {
            indices: (0..until).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    /// Indices in `self`, `other`, or both.
    pub fn union(&self, other: &Self) -> Self {
        let (a, b) = (&self.indices, &other.indices);
        let mut indices = Vec::with_capacity(a.len().max(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    indices.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    indices.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    indices.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        indices.extend_from_slice(&a[i..]);
        indices.extend_from_slice(&b[j..]);
        Self { indices }
    }

    /// Indices present in both `self` and `other`.
    pub fn intersection(&self, other: &Self) -> Self {
        let (a, b) = (&self.indices, &other.indices);
        let mut indices = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    indices.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        Self { indices }
    }

    /// Indices present in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let (a, b) = (&self.indices, &other.indices);
        let mut indices = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() {
            if j >= b.len() || a[i] < b[j] {
                indices.push(a[i]);
                i += 1;
            } else if a[i] == b[j] {
                i += 1;
                j += 1;
            } else {
                j += 1;
            }
        }
        Self { indices }
    }
}

impl FromIterator<u32> for Selection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<&[u32]> for Selection {
    fn from(indices: &[u32]) -> Self {
        Self::new(indices.iter().copied())
    }
}
