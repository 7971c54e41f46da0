//! The compatibility graph: an edge joins two items iff the pairwise rule
//! set finds them compatible.

use consort_catalog::Item;
use consort_foundation::Result;
use tracing::debug;

use super::bitset::BitSet;
use crate::pairwise::PairwiseEngine;

/// Adjacency bitsets over catalog indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompatibilityGraph {
    adjacency: Vec<BitSet>,
    edges: usize,
}

impl CompatibilityGraph {
    /// Evaluates every pair once and records the compatible ones.
    pub(crate) fn build(engine: &PairwiseEngine<'_>, items: &[Item]) -> Result<Self> {
        let n = items.len();
        let mut adjacency = vec![BitSet::new(n); n];
        let mut edges = 0;

        for (i, a) in items.iter().enumerate() {
            for (j, b) in items.iter().enumerate().skip(i + 1) {
                if engine.passes(a, b)? {
                    adjacency[i].insert(j);
                    adjacency[j].insert(i);
                    edges += 1;
                }
            }
        }

        debug!(items = n, edges, "built compatibility graph");
        Ok(Self { adjacency, edges })
    }

    /// Builds a graph from explicit edges.
    ///
    /// # Panics
    ///
    /// Panics if an endpoint is not below `n`.
    #[must_use]
    pub fn from_edges(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut adjacency = vec![BitSet::new(n); n];
        let mut count = 0;
        for (i, j) in edges {
            if i != j && !adjacency[i].contains(j) {
                adjacency[i].insert(j);
                adjacency[j].insert(i);
                count += 1;
            }
        }
        Self {
            adjacency,
            edges: count,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns true for an empty catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of compatible pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Returns true if items `i` and `j` are compatible.
    #[must_use]
    pub fn are_compatible(&self, i: usize, j: usize) -> bool {
        self.adjacency.get(i).is_some_and(|n| n.contains(j))
    }

    /// Items compatible with item `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[must_use]
    pub fn neighbors(&self, i: usize) -> &BitSet {
        &self.adjacency[i]
    }

    /// Number of items compatible with item `i`.
    #[must_use]
    pub fn degree(&self, i: usize) -> usize {
        self.adjacency.get(i).map_or(0, BitSet::len)
    }

    /// Items outside `set` that are compatible with every member.
    #[must_use]
    pub fn common_neighbors(&self, set: &BitSet) -> BitSet {
        let mut members = set.iter();
        let Some(first) = members.next() else {
            return BitSet::new(self.len());
        };
        let mut common = self.adjacency[first].clone();
        for i in members {
            common.intersect_with(&self.adjacency[i]);
        }
        common.difference_with(set);
        common
    }

    /// Returns true if every two members of `set` are compatible.
    #[must_use]
    pub fn is_clique(&self, set: &BitSet) -> bool {
        set.iter().all(|i| {
            let mut others = set.clone();
            others.remove(i);
            others.is_subset(&self.adjacency[i])
        })
    }
}
