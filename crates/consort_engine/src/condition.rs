//! Boolean condition trees.
//!
//! A condition is either an operator leaf or a logical combinator over child
//! conditions. The operator type fixes the family, so a pairwise condition
//! can never contain a cluster operator.
//!
//! Document grammar:
//! - logical: `{"all": [C, ...]}`, `{"any": [C, ...]}`, `{"not": C}`
//! - leaf: `{"<operator>": {"field": "<name>", ...params}}`

use std::collections::BTreeSet;
use std::fmt;

use consort_catalog::Schema;
use consort_foundation::{Error, Result};
use serde_json::Value as JsonValue;

use crate::operator::{ClusterOperator, Operator, OperatorRegistry, Outcome, PairwiseOperator, Params};

/// A condition over two items.
pub type PairwiseCondition = Condition<PairwiseOperator>;

/// A condition over an item set.
pub type ClusterCondition = Condition<ClusterOperator>;

/// A condition tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<Op> {
    /// Operator invocation.
    Leaf(Op),
    /// All children hold. Empty is true.
    AllOf(Vec<Condition<Op>>),
    /// Some child holds. Empty is false.
    AnyOf(Vec<Condition<Op>>),
    /// The child does not hold.
    Not(Box<Condition<Op>>),
}

impl<Op: Operator> Condition<Op> {
    /// Wraps an operator.
    #[must_use]
    pub fn leaf(op: Op) -> Self {
        Self::Leaf(op)
    }

    /// Conjunction.
    #[must_use]
    pub fn all(children: impl IntoIterator<Item = Self>) -> Self {
        Self::AllOf(children.into_iter().collect())
    }

    /// Disjunction.
    #[must_use]
    pub fn any(children: impl IntoIterator<Item = Self>) -> Self {
        Self::AnyOf(children.into_iter().collect())
    }

    /// Negation.
    #[must_use]
    pub fn negate(child: Self) -> Self {
        Self::Not(Box::new(child))
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parses a condition document, resolving every operator eagerly.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a node that is not a single-key
    /// object, an `all`/`any` body that is not an array, an unknown or
    /// wrong-family operator, or bad operator parameters. The error's frame
    /// stack locates the node.
    pub fn parse(doc: &JsonValue, registry: &OperatorRegistry) -> Result<Self> {
        let node = doc.as_object().ok_or_else(|| {
            Error::malformed_condition(format!("a condition must be an object, got {doc}"))
        })?;
        let mut entries = node.iter();
        let (key, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(Error::malformed_condition(format!(
                    "a condition must have exactly one key, got {}",
                    node.len()
                )));
            }
        };

        match key.as_str() {
            "all" => Ok(Self::AllOf(Self::parse_children(key, body, registry)?)),
            "any" => Ok(Self::AnyOf(Self::parse_children(key, body, registry)?)),
            "not" => Self::parse(body, registry)
                .map(Self::negate)
                .map_err(|e| e.in_frame("not")),
            name => {
                let params = Params::from_json(name, body).map_err(|e| e.with_operator(name))?;
                registry
                    .resolve(name, &params)
                    .map(Self::Leaf)
                    .map_err(|e| e.with_operator(name))
            }
        }
    }

    fn parse_children(key: &str, body: &JsonValue, registry: &OperatorRegistry) -> Result<Vec<Self>> {
        let children = body.as_array().ok_or_else(|| {
            Error::malformed_condition(format!("`{key}` takes an array of conditions, got {body}"))
        })?;
        children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                Self::parse(child, registry).map_err(|e| e.in_frame(format!("{key}[{i}]")))
            })
            .collect()
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluates the condition.
    ///
    /// `all` stops at the first failing child and reports its reason; `any`
    /// stops at the first passing child and otherwise reports every child's
    /// reason joined with `"; "`. Children after the deciding one are never
    /// evaluated, so their errors are not raised either.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error of an evaluated leaf, tagged with
    /// the operator name.
    pub fn evaluate(&self, binding: &Op::Binding<'_>) -> Result<Outcome> {
        match self {
            Self::Leaf(op) => op.evaluate(binding).map_err(|e| e.with_operator(op.name())),
            Self::AllOf(children) => {
                let mut reasons = Vec::with_capacity(children.len());
                for child in children {
                    let outcome = child.evaluate(binding)?;
                    if !outcome.passed {
                        return Ok(outcome);
                    }
                    reasons.push(outcome.reason);
                }
                Ok(if reasons.is_empty() {
                    Outcome::pass("no conditions")
                } else {
                    Outcome::pass(reasons.join("; "))
                })
            }
            Self::AnyOf(children) => {
                let mut reasons = Vec::with_capacity(children.len());
                for child in children {
                    let outcome = child.evaluate(binding)?;
                    if outcome.passed {
                        return Ok(outcome);
                    }
                    reasons.push(outcome.reason);
                }
                Ok(if reasons.is_empty() {
                    Outcome::fail("no alternatives")
                } else {
                    Outcome::fail(reasons.join("; "))
                })
            }
            Self::Not(child) => {
                let outcome = child.evaluate(binding)?;
                Ok(Outcome::when(!outcome.passed, format!("not ({})", outcome.reason)))
            }
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Checks every leaf against a schema.
    ///
    /// # Errors
    ///
    /// Returns the first leaf's configuration error.
    pub fn check_schema(&self, schema: &Schema) -> Result<()> {
        self.operators()
            .into_iter()
            .try_for_each(|op| op.check_schema(schema))
    }

    /// Leaves in document order.
    #[must_use]
    pub fn operators(&self) -> Vec<&Op> {
        let mut out = Vec::new();
        self.collect_operators(&mut out);
        out
    }

    fn collect_operators<'s>(&'s self, out: &mut Vec<&'s Op>) {
        match self {
            Self::Leaf(op) => out.push(op),
            Self::AllOf(children) | Self::AnyOf(children) => {
                for child in children {
                    child.collect_operators(out);
                }
            }
            Self::Not(child) => child.collect_operators(out),
        }
    }

    /// Attribute names read by any leaf.
    #[must_use]
    pub fn fields(&self) -> BTreeSet<&str> {
        self.operators().into_iter().filter_map(Operator::field).collect()
    }

    /// Number of operator leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::AllOf(children) | Self::AnyOf(children) => {
                children.iter().map(Self::leaf_count).sum()
            }
            Self::Not(child) => child.leaf_count(),
        }
    }

    /// Nesting depth; a single leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::AllOf(children) | Self::AnyOf(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::Not(child) => 1 + child.depth(),
        }
    }
}

impl<Op: fmt::Display> fmt::Display for Condition<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(op) => write!(f, "{op}"),
            Self::AllOf(children) => write_list(f, "all", children),
            Self::AnyOf(children) => write_list(f, "any", children),
            Self::Not(child) => write!(f, "not({child})"),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, name: &str, children: &[T]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
