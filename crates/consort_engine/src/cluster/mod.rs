//! Cluster analysis: sets of items that are pairwise compatible and
//! satisfy the cluster rules.
//!
//! The search works on catalog indices. The compatibility graph is built
//! once from the pairwise rules, cliques are enumerated by
//! [`CliqueSearch`](search::CliqueSearch), and clusters are identified by
//! their [`BitSet`].

mod bitset;
mod graph;
mod relationship;
mod search;

use std::cmp::Reverse;

use consort_catalog::{Catalog, Item, ItemId};
use consort_foundation::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

pub use bitset::{BitSet, Ones};
pub use graph::CompatibilityGraph;
pub use relationship::{ClusterRelationship, RelationshipType};

use crate::config::{Cancellation, DEFAULT_MIN_CLUSTER_SIZE, NeverCancel, SearchConfig};
use crate::operator::ClusterBinding;
use crate::pairwise::PairwiseEngine;
use crate::rule::{ClusterRuleSet, RuleEvaluation, RuleSet, check_bounds};
use search::CliqueSearch;

// =============================================================================
// Results
// =============================================================================

/// A set of items evaluated as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Member ids, sorted. This is the cluster's identity.
    pub item_ids: Vec<ItemId>,
    /// Number of members.
    pub size: usize,
    /// Cluster rule results, in rule order.
    pub rule_evaluations: Vec<RuleEvaluation>,
    /// True iff every pair is compatible, the size is within bounds, and
    /// every cluster rule passes.
    pub is_valid: bool,
    /// True iff no single catalog item can be added while staying valid.
    pub is_maximum: bool,
}

impl Cluster {
    /// Returns true if the item is a member.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.item_ids
            .binary_search_by(|probe| probe.as_str().cmp(id))
            .is_ok()
    }
}

/// The result of a cluster search over a catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    /// Catalog name.
    pub catalog: String,
    /// Pairwise rule set name.
    pub ruleset: String,
    /// Cluster rule set name.
    pub cluster_ruleset: String,
    /// Clusters, largest first, ties broken by sorted id tuple.
    pub clusters: Vec<Cluster>,
    /// Relationships between clusters, by position in `clusters`.
    pub relationships: Vec<ClusterRelationship>,
    /// `clusters.len()`.
    pub total_clusters: usize,
    /// Largest cluster size, 0 with no clusters.
    pub max_cluster_size: usize,
    /// Mean cluster size, 0 with no clusters.
    pub avg_cluster_size: f64,
    /// Size of the union of all clusters.
    pub total_items_covered: usize,
    /// True if `max_clusters` dropped some clusters.
    pub truncated: bool,
    /// True if the search was cancelled before it finished.
    pub cancelled: bool,
}

impl ClusterAnalysis {
    /// Clusters that cannot be extended.
    pub fn maximal_clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.is_maximum)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Finds clusters in a catalog.
#[derive(Debug)]
pub struct ClusterEngine<'a> {
    catalog: &'a Catalog,
    pairwise: PairwiseEngine<'a>,
    rules: &'a ClusterRuleSet,
    config: SearchConfig,
}

impl<'a> ClusterEngine<'a> {
    /// Binds both rule sets to the catalog's schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from either rule set, including
    /// inverted size bounds.
    pub fn new(catalog: &'a Catalog, ruleset: &'a RuleSet, rules: &'a ClusterRuleSet) -> Result<Self> {
        let pairwise = PairwiseEngine::new(ruleset, catalog.schema())?;
        rules.bind(catalog.schema())?;
        Ok(Self {
            catalog,
            pairwise,
            rules,
            config: SearchConfig::default(),
        })
    }

    /// Replaces the search configuration.
    #[must_use]
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Effective `(min, max)` cluster sizes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the explicit bounds are inverted.
    pub fn size_bounds(&self) -> Result<(usize, usize)> {
        let min = self.config.min_cluster_size.or(self.rules.min_cluster_size());
        let max = self.config.max_cluster_size.or(self.rules.max_cluster_size());
        check_bounds(min, max)?;
        Ok((
            min.unwrap_or(DEFAULT_MIN_CLUSTER_SIZE).max(1),
            max.unwrap_or(self.catalog.len()),
        ))
    }

    /// Builds the compatibility graph of the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first pairwise evaluation error.
    pub fn compatibility_graph(&self) -> Result<CompatibilityGraph> {
        CompatibilityGraph::build(&self.pairwise, self.catalog.items())
    }

    /// Runs the search to completion.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for inverted bounds (before any
    /// evaluation), or the first evaluation error.
    pub fn analyze(&self) -> Result<ClusterAnalysis> {
        self.analyze_with(&NeverCancel)
    }

    /// Runs the search, polling `cancel` at every branch.
    ///
    /// A cancelled search returns what it found so far, flagged
    /// `cancelled`.
    ///
    /// # Errors
    ///
    /// Same as [`analyze`](Self::analyze).
    #[instrument(skip_all, fields(
        catalog = self.catalog.name(),
        cluster_ruleset = self.rules.name(),
    ))]
    pub fn analyze_with(&self, cancel: &dyn Cancellation) -> Result<ClusterAnalysis> {
        let (min, max) = self.size_bounds()?;
        let graph = self.compatibility_graph()?;

        let accept = |set: &BitSet| self.passes(set);
        let outcome = CliqueSearch::new(&graph, min, max, cancel, accept).run()?;
        debug!(
            explored = outcome.explored,
            found = outcome.clusters.len(),
            "clique search finished"
        );

        let mut sets = outcome.clusters;
        sets.sort_by_cached_key(|set| (Reverse(set.len()), self.sorted_ids(set)));
        let truncated = self.config.max_clusters.is_some_and(|cap| sets.len() > cap);
        if let Some(cap) = self.config.max_clusters {
            sets.truncate(cap);
        }

        let clusters = sets
            .iter()
            .map(|set| {
                let rule_evaluations = self.evaluate_rules(set)?;
                let candidates = graph.common_neighbors(set);
                Ok(Cluster {
                    item_ids: self.sorted_ids(set),
                    size: set.len(),
                    rule_evaluations,
                    is_valid: true,
                    is_maximum: self.is_maximal(set, max, &candidates)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let stats = relationship::aggregates(&sets, self.catalog.len());
        let analysis = ClusterAnalysis {
            catalog: self.catalog.name().to_string(),
            ruleset: self.pairwise.ruleset().name().to_string(),
            cluster_ruleset: self.rules.name().to_string(),
            relationships: relationship::relationships(&sets),
            clusters,
            total_clusters: stats.total,
            max_cluster_size: stats.max_size,
            avg_cluster_size: stats.avg_size,
            total_items_covered: stats.items_covered,
            truncated,
            cancelled: outcome.cancelled,
        };

        info!(
            clusters = analysis.total_clusters,
            truncated = analysis.truncated,
            cancelled = analysis.cancelled,
            "cluster analysis complete"
        );
        Ok(analysis)
    }

    /// Evaluates one explicit item set.
    ///
    /// The returned evaluations start with two synthetic entries,
    /// `pairwise_compatibility` and `cluster_size`, followed by the cluster
    /// rules. Duplicate ids are counted once.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown id or inverted bounds,
    /// or the first evaluation error (aggregate operators reject an empty
    /// set).
    pub fn evaluate_set(&self, ids: &[ItemId]) -> Result<Cluster> {
        let (min, max) = self.size_bounds()?;
        let items = self.catalog.items();
        let mut set = BitSet::new(items.len());
        for id in ids {
            let index = self
                .catalog
                .index_of(id.as_str())
                .ok_or_else(|| Error::new(ErrorKind::UnknownItem(id.to_string())))?;
            set.insert(index);
        }
        let size = set.len();

        let mut conflicts = Vec::new();
        for i in &set {
            let mut later = set.clone();
            later.retain_above(i);
            for j in &later {
                if !self.pairwise.passes(&items[i], &items[j])? {
                    conflicts.push(format!("{} and {}", items[i].id, items[j].id));
                }
            }
        }
        let pairwise = RuleEvaluation {
            rule_name: "pairwise_compatibility".to_string(),
            passed: conflicts.is_empty(),
            reason: if conflicts.is_empty() {
                format!("all {} pairs compatible", size * size.saturating_sub(1) / 2)
            } else {
                format!("incompatible: {}", conflicts.join("; "))
            },
        };
        let bounds = RuleEvaluation {
            rule_name: "cluster_size".to_string(),
            passed: (min..=max).contains(&size),
            reason: format!("size {size}, allowed {min}..={max}"),
        };

        let mut rule_evaluations = vec![pairwise, bounds];
        rule_evaluations.extend(self.evaluate_rules(&set)?);
        let is_valid = rule_evaluations.iter().all(|e| e.passed);

        let is_maximum = is_valid && {
            let mut candidates = BitSet::new(items.len());
            for x in (0..items.len()).filter(|x| !set.contains(*x)) {
                if self.compatible_with_all(x, &set)? {
                    candidates.insert(x);
                }
            }
            self.is_maximal(&set, max, &candidates)?
        };

        Ok(Cluster {
            item_ids: self.sorted_ids(&set),
            size,
            rule_evaluations,
            is_valid,
            is_maximum,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn members(&self, set: &BitSet) -> Vec<&'a Item> {
        let items = self.catalog.items();
        set.iter().map(|i| &items[i]).collect()
    }

    fn sorted_ids(&self, set: &BitSet) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.members(set).into_iter().map(|item| item.id.clone()).collect();
        ids.sort();
        ids
    }

    fn describe(&self, set: &BitSet) -> String {
        let ids: Vec<String> = self.sorted_ids(set).iter().map(ToString::to_string).collect();
        format!("cluster [{}]", ids.join(", "))
    }

    fn passes(&self, set: &BitSet) -> Result<bool> {
        let members = self.members(set);
        self.rules
            .passes(&ClusterBinding::new(&members))
            .map_err(|e| e.in_frame(self.describe(set)))
    }

    fn evaluate_rules(&self, set: &BitSet) -> Result<Vec<RuleEvaluation>> {
        let members = self.members(set);
        self.rules
            .evaluate(&ClusterBinding::new(&members))
            .map_err(|e| e.in_frame(self.describe(set)))
    }

    fn compatible_with_all(&self, x: usize, set: &BitSet) -> Result<bool> {
        let items = self.catalog.items();
        for i in set {
            if !self.pairwise.passes(&items[x], &items[i])? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True unless some candidate (compatible with every member) can be
    /// added within `max` while the cluster rules still pass.
    fn is_maximal(&self, set: &BitSet, max: usize, candidates: &BitSet) -> Result<bool> {
        if set.len() >= max {
            return Ok(true);
        }
        for x in candidates {
            let mut grown = set.clone();
            grown.insert(x);
            if self.passes(&grown)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
