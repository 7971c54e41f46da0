//! The operator catalog.
//!
//! Operators are the leaves of a condition. Each one is resolved by name to a
//! tagged variant when a rule is loaded, with its parameters parsed and
//! checked up front, so evaluation never looks anything up by string.
//!
//! There are two families:
//! - [`PairwiseOperator`] binds two items
//! - [`ClusterOperator`] binds a set of items

mod cluster;
mod layering;
mod pairwise;
mod params;

use std::fmt;
use std::str::FromStr;

use consort_catalog::{Dimension, Item, Schema};
use consort_foundation::{Error, ErrorKind, Result, Type, Value};
use serde::{Deserialize, Serialize};

pub use cluster::ClusterOperator;
pub use layering::{LayerVerdict, layer_verdict};
pub use pairwise::PairwiseOperator;
pub use params::Params;

// =============================================================================
// Outcome
// =============================================================================

/// Result of evaluating an operator or condition: pass/fail plus a
/// human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the condition held.
    pub passed: bool,
    /// Why.
    pub reason: String,
}

impl Outcome {
    /// A passing outcome.
    #[must_use]
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
        }
    }

    /// A failing outcome.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }

    /// A passing or failing outcome sharing one reason.
    #[must_use]
    pub fn when(passed: bool, reason: impl Into<String>) -> Self {
        Self {
            passed,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// Two items bound to a pairwise condition.
#[derive(Clone, Copy, Debug)]
pub struct PairBinding<'a> {
    /// First item.
    pub a: &'a Item,
    /// Second item.
    pub b: &'a Item,
}

impl<'a> PairBinding<'a> {
    /// Binds two items.
    #[must_use]
    pub fn new(a: &'a Item, b: &'a Item) -> Self {
        Self { a, b }
    }
}

/// An item set bound to a cluster condition.
#[derive(Clone, Copy, Debug)]
pub struct ClusterBinding<'a> {
    /// Members of the set.
    pub items: &'a [&'a Item],
}

impl<'a> ClusterBinding<'a> {
    /// Binds an item set.
    #[must_use]
    pub fn new(items: &'a [&'a Item]) -> Self {
        Self { items }
    }
}

// =============================================================================
// Operator Trait
// =============================================================================

/// Operator family, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    /// Binds two items.
    Pairwise,
    /// Binds an item set.
    Cluster,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pairwise => f.write_str("pairwise"),
            Self::Cluster => f.write_str("cluster"),
        }
    }
}

/// A resolved operator of one family.
pub trait Operator: Clone + fmt::Debug + fmt::Display + Send + Sync + Sized {
    /// What the operator binds to.
    type Binding<'a>;

    /// The family this operator belongs to.
    const FAMILY: Family;

    /// Names of all operators of this family.
    const NAMES: &'static [&'static str];

    /// Resolves an operator by name, parsing its parameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown name or bad parameters.
    fn resolve(name: &str, params: &Params<'_>) -> Result<Self>;

    /// Registered name of this operator.
    fn name(&self) -> &'static str;

    /// The attribute this operator reads, if any.
    fn field(&self) -> Option<&str>;

    /// Checks the operator against a schema.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the field is undeclared or has a
    /// kind this operator cannot read.
    fn check_schema(&self, schema: &Schema) -> Result<()>;

    /// Evaluates the operator.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if a present value has the wrong type or
    /// an aggregate has nothing to aggregate.
    fn evaluate(&self, binding: &Self::Binding<'_>) -> Result<Outcome>;
}

// =============================================================================
// Registry
// =============================================================================

/// Name → operator lookup for both families.
///
/// The tables are static; the registry is a cheap handle that resolves names
/// and produces cross-family diagnostics.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperatorRegistry {
    _private: (),
}

impl OperatorRegistry {
    /// The standard operator set.
    #[must_use]
    pub fn standard() -> Self {
        Self { _private: () }
    }

    /// Returns every registered operator name, pairwise first.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        PairwiseOperator::NAMES
            .iter()
            .chain(ClusterOperator::NAMES)
            .copied()
    }

    /// Returns the family of a registered name.
    #[must_use]
    pub fn family_of(&self, name: &str) -> Option<Family> {
        if PairwiseOperator::NAMES.contains(&name) {
            Some(Family::Pairwise)
        } else if ClusterOperator::NAMES.contains(&name) {
            Some(Family::Cluster)
        } else {
            None
        }
    }

    /// Resolves an operator of family `Op`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is unknown, belongs to the
    /// other family, or its parameters do not parse.
    pub fn resolve<Op: Operator>(&self, name: &str, params: &Params<'_>) -> Result<Op> {
        match self.family_of(name) {
            Some(family) if family == Op::FAMILY => Op::resolve(name, params),
            Some(family) => Err(Error::malformed_condition(format!(
                "`{name}` is a {family} operator and cannot appear in a {} condition",
                Op::FAMILY
            ))),
            None => Err(Error::unknown_operator(name)),
        }
    }
}

// =============================================================================
// Comparison
// =============================================================================

/// Numeric comparison used by `abs_diff` and `count_by_field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl Comparison {
    /// Applies the comparison.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }

    /// Returns the symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "<" | "lt" => Ok(Self::Lt),
            "<=" | "lte" | "le" => Ok(Self::Le),
            ">" | "gt" => Ok(Self::Gt),
            ">=" | "gte" | "ge" => Ok(Self::Ge),
            "==" | "=" | "eq" => Ok(Self::Eq),
            "!=" | "ne" => Ok(Self::Ne),
            other => Err(format!(
                "unknown comparison `{other}`, expected one of <, <=, >, >=, ==, !="
            )),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// =============================================================================
// Attribute Access
// =============================================================================

/// Reads a numeric attribute. `Ok(None)` when absent.
fn numeric(item: &Item, field: &str) -> Result<Option<f64>> {
    item.attribute(field)
        .map(|value| {
            value
                .as_number()
                .ok_or_else(|| mismatch(item, field, Type::Float, value))
        })
        .transpose()
}

fn mismatch(item: &Item, field: &str, expected: Type, actual: &Value) -> Error {
    Error::type_mismatch(field, expected, actual.value_type()).with_item(item.id.as_str())
}

/// Looks up the dimension an operator reads.
fn dimension<'s, Op: Operator>(op: &Op, schema: &'s Schema, field: &str) -> Result<&'s Dimension> {
    schema
        .dimension(field)
        .ok_or_else(|| Error::unknown_field(field).with_operator(op.name()))
}

/// Rejects a `value` parameter that no item of a scalar dimension could hold.
fn check_reachable<Op: Operator>(op: &Op, dim: &Dimension, value: &Value) -> Result<()> {
    if matches!(
        dim.kind,
        consort_catalog::DimensionKind::List { .. } | consort_catalog::DimensionKind::CoverageLayers { .. }
    ) {
        return Ok(());
    }
    dim.check(value).map_err(|violation| {
        incompatible_field(
            op,
            &dim.name,
            format!("value {} can never match: {violation}", show(value)),
        )
    })
}

/// True if an attribute equals `wanted`, or is a list holding it.
fn holds(attribute: &Value, wanted: &Value) -> bool {
    attribute.same_as(wanted)
        || attribute
            .as_list()
            .is_some_and(|list| list.iter().any(|v| v.same_as(wanted)))
}

fn incompatible_field<Op: Operator>(op: &Op, field: &str, message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IncompatibleField {
        operator: op.name().to_string(),
        field: field.to_string(),
        message: message.into(),
    })
}

/// Renders a value for reasons: strings bare, everything else via Display.
fn show(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
