//! Depth-first branch-and-bound clique enumeration.
//!
//! Each branch extends the current clique only with candidates that are
//! adjacent to every member and have a higher index than the last one added,
//! so every clique is reached along exactly one path.

use consort_foundation::Result;

use super::bitset::BitSet;
use super::graph::CompatibilityGraph;
use crate::config::Cancellation;

/// What a search produced.
pub(crate) struct SearchOutcome {
    /// Accepted cliques in discovery order.
    pub clusters: Vec<BitSet>,
    /// True if the search stopped early.
    pub cancelled: bool,
    /// Number of search-tree nodes visited.
    pub explored: usize,
}

/// Enumerates cliques of size `min..=max` that `accept` approves.
pub(crate) struct CliqueSearch<'s, F> {
    graph: &'s CompatibilityGraph,
    min: usize,
    max: usize,
    cancel: &'s dyn Cancellation,
    accept: F,
    found: Vec<BitSet>,
    cancelled: bool,
    explored: usize,
}

impl<'s, F> CliqueSearch<'s, F>
where
    F: FnMut(&BitSet) -> Result<bool>,
{
    pub(crate) fn new(
        graph: &'s CompatibilityGraph,
        min: usize,
        max: usize,
        cancel: &'s dyn Cancellation,
        accept: F,
    ) -> Self {
        Self {
            graph,
            min: min.max(1),
            max,
            cancel,
            accept,
            found: Vec::new(),
            cancelled: false,
            explored: 0,
        }
    }

    pub(crate) fn run(mut self) -> Result<SearchOutcome> {
        let n = self.graph.len();
        let mut current = BitSet::new(n);

        if self.max > 0 {
            for v in 0..n {
                let mut candidates = self.graph.neighbors(v).clone();
                candidates.retain_above(v);

                current.insert(v);
                let result = self.expand(&mut current, 1, &candidates);
                current.remove(v);
                result?;

                if self.cancelled {
                    break;
                }
            }
        }

        Ok(SearchOutcome {
            clusters: self.found,
            cancelled: self.cancelled,
            explored: self.explored,
        })
    }

    fn stopped(&mut self) -> bool {
        if !self.cancelled && self.cancel.should_stop() {
            self.cancelled = true;
        }
        self.cancelled
    }

    fn expand(&mut self, current: &mut BitSet, size: usize, candidates: &BitSet) -> Result<()> {
        if self.stopped() {
            return Ok(());
        }
        self.explored += 1;

        if size >= self.min && (self.accept)(&*current)? {
            self.found.push(current.clone());
        }

        if size >= self.max || size + candidates.len() < self.min {
            return Ok(());
        }

        for w in candidates {
            let mut next = candidates.intersection(self.graph.neighbors(w));
            next.retain_above(w);

            current.insert(w);
            let result = self.expand(current, size + 1, &next);
            current.remove(w);
            result?;

            if self.cancelled {
                break;
            }
        }
        Ok(())
    }
}
