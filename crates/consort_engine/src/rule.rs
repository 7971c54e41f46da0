//! Rules and rule sets, and their compilation from documents.
//!
//! A [`RuleSet`] holds pairwise rules; two items are compatible when every
//! rule passes. A [`ClusterRuleSet`] holds set-level rules plus optional
//! size bounds for the cluster search.

use std::collections::HashSet;

use consort_catalog::Schema;
use consort_foundation::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::condition::Condition;
use crate::operator::{ClusterBinding, ClusterOperator, Operator, OperatorRegistry, PairBinding, PairwiseOperator};

// =============================================================================
// Rules
// =============================================================================

/// A named condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule<Op> {
    /// Unique name within its rule set.
    pub name: String,
    /// Optional human description.
    pub description: Option<String>,
    /// The condition that must hold.
    pub condition: Condition<Op>,
}

/// A rule over two items.
pub type PairwiseRule = Rule<PairwiseOperator>;

/// A rule over an item set.
pub type ClusterRule = Rule<ClusterOperator>;

impl<Op: Operator> Rule<Op> {
    /// Creates a rule.
    #[must_use]
    pub fn new(name: impl Into<String>, condition: Condition<Op>) -> Self {
        Self {
            name: name.into(),
            description: None,
            condition,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Evaluates the rule.
    ///
    /// # Errors
    ///
    /// Returns the condition's evaluation error, tagged with the rule name.
    pub fn evaluate(&self, binding: &Op::Binding<'_>) -> Result<RuleEvaluation> {
        let outcome = self
            .condition
            .evaluate(binding)
            .map_err(|e| e.with_rule(&self.name))?;
        Ok(RuleEvaluation {
            rule_name: self.name.clone(),
            passed: outcome.passed,
            reason: outcome.reason,
        })
    }

    fn check_schema(&self, schema: &Schema) -> Result<()> {
        self.condition
            .check_schema(schema)
            .map_err(|e| e.with_rule(&self.name))
    }
}

/// The result of evaluating one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    /// Rule that was evaluated.
    pub rule_name: String,
    /// Whether it passed.
    pub passed: bool,
    /// Why.
    pub reason: String,
}

fn push_unique<Op>(rules: &mut Vec<Rule<Op>>, rule: Rule<Op>) -> Result<()> {
    if rules.iter().any(|r| r.name == rule.name) {
        return Err(Error::new(ErrorKind::DuplicateRule(rule.name)));
    }
    rules.push(rule);
    Ok(())
}

fn evaluate_all<Op: Operator>(rules: &[Rule<Op>], binding: &Op::Binding<'_>) -> Result<Vec<RuleEvaluation>> {
    rules.iter().map(|rule| rule.evaluate(binding)).collect()
}

fn passes_all<Op: Operator>(rules: &[Rule<Op>], binding: &Op::Binding<'_>) -> Result<bool> {
    for rule in rules {
        if !rule.evaluate(binding)?.passed {
            return Ok(false);
        }
    }
    Ok(true)
}

// =============================================================================
// Pairwise Rule Set
// =============================================================================

/// Named pairwise rules; compatibility is their conjunction.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSet {
    name: String,
    rules: Vec<PairwiseRule>,
}

impl RuleSet {
    /// Creates an empty rule set. With no rules, every pair is compatible.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Adds a rule.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is already taken.
    pub fn with_rule(mut self, rule: PairwiseRule) -> Result<Self> {
        push_unique(&mut self.rules, rule)?;
        Ok(self)
    }

    /// Compiles a rule set document with the standard operators.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn compile(decl: &RuleSetDecl) -> Result<Self> {
        RuleCompiler::compile_set(decl, &OperatorRegistry::standard())
    }

    /// Deserializes and compiles a rule set document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a document that does not match
    /// [`RuleSetDecl`] or does not compile.
    pub fn from_json(doc: &JsonValue) -> Result<Self> {
        let decl = RuleSetDecl::deserialize(doc)
            .map_err(|e| Error::malformed_condition(format!("invalid rule set document: {e}")))?;
        Self::compile(&decl)
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[PairwiseRule] {
        &self.rules
    }

    /// Checks every rule against a schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an undeclared field or a field
    /// whose kind the operator cannot read.
    pub fn bind(&self, schema: &Schema) -> Result<()> {
        self.rules.iter().try_for_each(|rule| rule.check_schema(schema))
    }

    /// Evaluates every rule, without stopping at failures.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn evaluate(&self, binding: &PairBinding<'_>) -> Result<Vec<RuleEvaluation>> {
        evaluate_all(&self.rules, binding)
    }

    /// Returns true if every rule passes, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn passes(&self, binding: &PairBinding<'_>) -> Result<bool> {
        passes_all(&self.rules, binding)
    }
}

// =============================================================================
// Cluster Rule Set
// =============================================================================

/// Named cluster rules plus optional size bounds for the search.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterRuleSet {
    name: String,
    rules: Vec<ClusterRule>,
    min_cluster_size: Option<usize>,
    max_cluster_size: Option<usize>,
}

impl ClusterRuleSet {
    /// Creates an empty, unbounded cluster rule set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            min_cluster_size: None,
            max_cluster_size: None,
        }
    }

    /// Adds a rule.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is already taken.
    pub fn with_rule(mut self, rule: ClusterRule) -> Result<Self> {
        push_unique(&mut self.rules, rule)?;
        Ok(self)
    }

    /// Sets the minimum cluster size.
    #[must_use]
    pub fn with_min_cluster_size(mut self, min: usize) -> Self {
        self.min_cluster_size = Some(min);
        self
    }

    /// Sets the maximum cluster size.
    #[must_use]
    pub fn with_max_cluster_size(mut self, max: usize) -> Self {
        self.max_cluster_size = Some(max);
        self
    }

    /// Compiles a cluster rule set document with the standard operators.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error, including `min > max`.
    pub fn compile(decl: &ClusterRuleSetDecl) -> Result<Self> {
        RuleCompiler::compile_cluster_set(decl, &OperatorRegistry::standard())
    }

    /// Deserializes and compiles a cluster rule set document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a document that does not match
    /// [`ClusterRuleSetDecl`] or does not compile.
    pub fn from_json(doc: &JsonValue) -> Result<Self> {
        let decl = ClusterRuleSetDecl::deserialize(doc).map_err(|e| {
            Error::malformed_condition(format!("invalid cluster rule set document: {e}"))
        })?;
        Self::compile(&decl)
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[ClusterRule] {
        &self.rules
    }

    /// Returns the declared minimum cluster size.
    #[must_use]
    pub fn min_cluster_size(&self) -> Option<usize> {
        self.min_cluster_size
    }

    /// Returns the declared maximum cluster size.
    #[must_use]
    pub fn max_cluster_size(&self) -> Option<usize> {
        self.max_cluster_size
    }

    /// Checks that the declared bounds are ordered.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `min > max`.
    pub fn check_bounds(&self) -> Result<()> {
        check_bounds(self.min_cluster_size, self.max_cluster_size)
    }

    /// Checks the bounds and every rule against a schema.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn bind(&self, schema: &Schema) -> Result<()> {
        self.check_bounds()?;
        self.rules.iter().try_for_each(|rule| rule.check_schema(schema))
    }

    /// Evaluates every rule, without stopping at failures.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn evaluate(&self, binding: &ClusterBinding<'_>) -> Result<Vec<RuleEvaluation>> {
        evaluate_all(&self.rules, binding)
    }

    /// Returns true if every rule passes, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    pub fn passes(&self, binding: &ClusterBinding<'_>) -> Result<bool> {
        passes_all(&self.rules, binding)
    }
}

/// Fails if both bounds are set and out of order.
pub(crate) fn check_bounds(min: Option<usize>, max: Option<usize>) -> Result<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(Error::invalid_cluster_bounds(min, max)),
        _ => Ok(()),
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// A rule as written in a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDecl {
    /// Rule name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Condition document.
    pub condition: JsonValue,
}

/// A pairwise rule set document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetDecl {
    /// Rule set name.
    pub name: String,
    /// Rules.
    #[serde(default)]
    pub rules: Vec<RuleDecl>,
}

/// A cluster rule set document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterRuleSetDecl {
    /// Rule set name.
    pub name: String,
    /// Minimum cluster size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cluster_size: Option<usize>,
    /// Maximum cluster size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cluster_size: Option<usize>,
    /// Rules.
    #[serde(default)]
    pub rules: Vec<RuleDecl>,
}

// =============================================================================
// Compiler
// =============================================================================

/// Compiles rule documents, resolving every operator up front.
pub struct RuleCompiler;

impl RuleCompiler {
    /// Compiles one rule.
    ///
    /// # Errors
    ///
    /// Returns the condition's configuration error, tagged with the rule
    /// name.
    pub fn compile<Op: Operator>(decl: &RuleDecl, registry: &OperatorRegistry) -> Result<Rule<Op>> {
        let condition = Condition::parse(&decl.condition, registry).map_err(|e| e.with_rule(&decl.name))?;
        Ok(Rule {
            name: decl.name.clone(),
            description: decl.description.clone(),
            condition,
        })
    }

    fn compile_rules<Op: Operator>(decls: &[RuleDecl], registry: &OperatorRegistry) -> Result<Vec<Rule<Op>>> {
        let mut names = HashSet::with_capacity(decls.len());
        decls
            .iter()
            .map(|decl| {
                if !names.insert(decl.name.as_str()) {
                    return Err(Error::new(ErrorKind::DuplicateRule(decl.name.clone())));
                }
                Self::compile(decl, registry)
            })
            .collect()
    }

    /// Compiles a pairwise rule set.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn compile_set(decl: &RuleSetDecl, registry: &OperatorRegistry) -> Result<RuleSet> {
        let rules = Self::compile_rules(&decl.rules, registry)?;
        tracing::debug!(ruleset = %decl.name, rules = rules.len(), "compiled rule set");
        Ok(RuleSet {
            name: decl.name.clone(),
            rules,
        })
    }

    /// Compiles a cluster rule set.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error, including `min > max`.
    pub fn compile_cluster_set(decl: &ClusterRuleSetDecl, registry: &OperatorRegistry) -> Result<ClusterRuleSet> {
        check_bounds(decl.min_cluster_size, decl.max_cluster_size)?;
        let rules = Self::compile_rules(&decl.rules, registry)?;
        tracing::debug!(
            ruleset = %decl.name,
            rules = rules.len(),
            min = ?decl.min_cluster_size,
            max = ?decl.max_cluster_size,
            "compiled cluster rule set"
        );
        Ok(ClusterRuleSet {
            name: decl.name.clone(),
            rules,
            min_cluster_size: decl.min_cluster_size,
            max_cluster_size: decl.max_cluster_size,
        })
    }
}
