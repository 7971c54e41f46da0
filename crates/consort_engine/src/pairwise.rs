//! Pairwise evaluation: one pair, or every pair of a catalog.

use std::fmt;
use std::sync::Arc;

use consort_catalog::{Catalog, Item, ItemId, Schema};
use consort_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::{Clock, SystemClock};
use crate::operator::PairBinding;
use crate::rule::{RuleEvaluation, RuleSet};

// =============================================================================
// Results
// =============================================================================

/// The verdict for one pair of items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// First item.
    pub item1_id: ItemId,
    /// Second item.
    pub item2_id: ItemId,
    /// True iff every rule passed.
    pub compatible: bool,
    /// One entry per rule, in rule order.
    pub rule_evaluations: Vec<RuleEvaluation>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ComparisonResult {
    /// Rules that failed.
    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleEvaluation> {
        self.rule_evaluations.iter().filter(|e| !e.passed)
    }

    /// Returns true if this result is about `a` and `b`, in either order.
    #[must_use]
    pub fn involves(&self, a: &str, b: &str) -> bool {
        let (x, y) = (self.item1_id.as_str(), self.item2_id.as_str());
        (x == a && y == b) || (x == b && y == a)
    }
}

/// Verdicts for every unordered pair of a catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMatrix {
    /// Catalog name.
    pub catalog: String,
    /// Rule set name.
    pub ruleset: String,
    /// One result per evaluated pair.
    pub results: Vec<ComparisonResult>,
    /// Number of evaluated pairs.
    pub total_comparisons: usize,
    /// Number of compatible pairs.
    pub compatible_count: usize,
    /// `compatible_count / total_comparisons`, or 0 with no comparisons.
    pub compatibility_rate: f64,
}

impl EvaluationMatrix {
    fn from_results(catalog: &str, ruleset: &str, results: Vec<ComparisonResult>) -> Self {
        let total_comparisons = results.len();
        let compatible_count = results.iter().filter(|r| r.compatible).count();
        #[allow(clippy::cast_precision_loss)]
        let compatibility_rate = if total_comparisons == 0 {
            0.0
        } else {
            compatible_count as f64 / total_comparisons as f64
        };

        Self {
            catalog: catalog.to_string(),
            ruleset: ruleset.to_string(),
            results,
            total_comparisons,
            compatible_count,
            compatibility_rate,
        }
    }

    /// Looks up the result for a pair, in either order.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<&ComparisonResult> {
        self.results.iter().find(|r| r.involves(a, b))
    }

    /// Compatible pairs.
    pub fn compatible_pairs(&self) -> impl Iterator<Item = (&ItemId, &ItemId)> {
        self.results
            .iter()
            .filter(|r| r.compatible)
            .map(|r| (&r.item1_id, &r.item2_id))
    }
}

/// A pair that could not be evaluated.
#[derive(Clone, Debug)]
pub struct PairFailure {
    /// First item.
    pub item1_id: ItemId,
    /// Second item.
    pub item2_id: ItemId,
    /// What went wrong.
    pub error: Error,
}

/// A matrix built with per-pair error reporting.
#[derive(Clone, Debug)]
pub struct PartialMatrix {
    /// Results for the pairs that evaluated.
    pub matrix: EvaluationMatrix,
    /// Pairs that failed, with their errors.
    pub failures: Vec<PairFailure>,
}

impl PartialMatrix {
    /// Returns true if every pair evaluated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Evaluates a rule set over pairs of items.
///
/// Rules are bound to the schema on construction, so every field and
/// operator/kind mismatch is reported before anything is evaluated.
#[derive(Clone)]
pub struct PairwiseEngine<'a> {
    ruleset: &'a RuleSet,
    schema: &'a Schema,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for PairwiseEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairwiseEngine")
            .field("ruleset", &self.ruleset.name())
            .field("schema", &self.schema.name())
            .field("clock", &self.clock)
            .finish()
    }
}

impl<'a> PairwiseEngine<'a> {
    /// Binds a rule set to a schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a rule reads an undeclared field or
    /// a field of the wrong kind.
    pub fn new(ruleset: &'a RuleSet, schema: &'a Schema) -> Result<Self> {
        ruleset.bind(schema)?;
        Ok(Self {
            ruleset,
            schema,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the rule set.
    #[must_use]
    pub fn ruleset(&self) -> &'a RuleSet {
        self.ruleset
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Validates both items and evaluates every rule on them.
    ///
    /// # Errors
    ///
    /// Returns a schema validation error for an invalid item, or the first
    /// evaluation error, tagged with the pair and rule.
    pub fn evaluate_pair(&self, a: &Item, b: &Item) -> Result<ComparisonResult> {
        self.schema.validate(a)?;
        self.schema.validate(b)?;
        self.compare(a, b)
    }

    /// Validates both items and checks compatibility, stopping at the first
    /// failing rule.
    ///
    /// # Errors
    ///
    /// Same as [`evaluate_pair`](Self::evaluate_pair).
    pub fn is_compatible(&self, a: &Item, b: &Item) -> Result<bool> {
        self.schema.validate(a)?;
        self.schema.validate(b)?;
        self.passes(a, b)
    }

    /// Evaluates already validated items.
    pub(crate) fn compare(&self, a: &Item, b: &Item) -> Result<ComparisonResult> {
        let rule_evaluations = self
            .ruleset
            .evaluate(&PairBinding::new(a, b))
            .map_err(|e| e.with_pair(a.id.as_str(), b.id.as_str()))?;

        Ok(ComparisonResult {
            item1_id: a.id.clone(),
            item2_id: b.id.clone(),
            compatible: rule_evaluations.iter().all(|e| e.passed),
            rule_evaluations,
            timestamp: self.clock.now_millis(),
        })
    }

    /// Short-circuiting compatibility of already validated items.
    pub(crate) fn passes(&self, a: &Item, b: &Item) -> Result<bool> {
        self.ruleset
            .passes(&PairBinding::new(a, b))
            .map_err(|e| e.with_pair(a.id.as_str(), b.id.as_str()))
    }

    /// Validates catalog items against this engine's schema, unless the
    /// catalog was built with an equal schema already.
    ///
    /// Returns one entry per item: `None` when valid.
    pub(crate) fn validate_catalog(&self, catalog: &Catalog) -> Vec<Option<Error>> {
        if catalog.schema() == self.schema {
            return vec![None; catalog.len()];
        }
        catalog
            .items()
            .iter()
            .map(|item| self.schema.validate(item).err())
            .collect()
    }

    /// Evaluates every unordered pair of a catalog, in index order.
    ///
    /// # Errors
    ///
    /// Fails fast on the first invalid item or evaluation error.
    #[instrument(skip_all, fields(catalog = catalog.name(), ruleset = self.ruleset.name()))]
    pub fn evaluate_matrix(&self, catalog: &Catalog) -> Result<EvaluationMatrix> {
        if let Some(error) = self.validate_catalog(catalog).into_iter().flatten().next() {
            return Err(error);
        }

        let items = catalog.items();
        let mut results = Vec::with_capacity(items.len() * items.len().saturating_sub(1) / 2);
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                results.push(self.compare(a, b)?);
            }
        }

        let matrix = EvaluationMatrix::from_results(catalog.name(), self.ruleset.name(), results);
        debug!(
            comparisons = matrix.total_comparisons,
            compatible = matrix.compatible_count,
            "evaluated matrix"
        );
        Ok(matrix)
    }

    /// Evaluates every unordered pair, recording failures instead of
    /// stopping at them.
    ///
    /// A pair involving an item that fails validation is reported with that
    /// item's validation error.
    #[instrument(skip_all, fields(catalog = catalog.name(), ruleset = self.ruleset.name()))]
    pub fn evaluate_matrix_partial(&self, catalog: &Catalog) -> PartialMatrix {
        let invalid = self.validate_catalog(catalog);
        let items = catalog.items();
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for (i, a) in items.iter().enumerate() {
            for (j, b) in items.iter().enumerate().skip(i + 1) {
                let outcome = match (&invalid[i], &invalid[j]) {
                    (Some(error), _) | (None, Some(error)) => Err(error.clone()),
                    (None, None) => self.compare(a, b),
                };
                match outcome {
                    Ok(result) => results.push(result),
                    Err(error) => {
                        warn!(item1 = %a.id, item2 = %b.id, %error, "pair evaluation failed");
                        failures.push(PairFailure {
                            item1_id: a.id.clone(),
                            item2_id: b.id.clone(),
                            error,
                        });
                    }
                }
            }
        }

        let matrix = EvaluationMatrix::from_results(catalog.name(), self.ruleset.name(), results);
        debug!(
            comparisons = matrix.total_comparisons,
            compatible = matrix.compatible_count,
            failures = failures.len(),
            "evaluated partial matrix"
        );
        PartialMatrix { matrix, failures }
    }
}
