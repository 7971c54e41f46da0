//! Operators over two items.
//!
//! Every operator here is symmetric in its two items. An optional field
//! that is absent from either item is a non-match, except for `has_value`
//! (the other item may still carry the value) and `layer_compatible` (no
//! coverage means nothing to conflict with).

use std::fmt;
use std::sync::Arc;

use consort_catalog::{CoverageLayer, DimensionKind, Item, Schema};
use consort_foundation::{Error, Result, Type, Value, Violation};

use super::{
    Comparison, Family, Operator, Outcome, PairBinding, Params, check_reachable, dimension, holds,
    incompatible_field, mismatch, numeric, show,
};
use super::layering::layer_verdict;

/// A pairwise operator with its parameters resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum PairwiseOperator {
    /// Both items carry the same value.
    Equals {
        /// Attribute to compare.
        field: Arc<str>,
    },
    /// The items carry different values.
    HasDifferent {
        /// Attribute to compare.
        field: Arc<str>,
    },
    /// The absolute numeric difference satisfies a comparison.
    AbsDiff {
        /// Numeric attribute.
        field: Arc<str>,
        /// Comparison applied as `|a - b| <op> value`.
        comparison: Comparison,
        /// Right-hand side.
        value: f64,
    },
    /// At least one item carries the value (or a list holding it).
    HasValue {
        /// Attribute to inspect.
        field: Arc<str>,
        /// Wanted value.
        value: Value,
    },
    /// Two list attributes share at least one element.
    SameListItem {
        /// List attribute.
        field: Arc<str>,
    },
    /// Numeric values are at most `threshold` apart.
    FormalityCompatible {
        /// Numeric attribute.
        field: Arc<str>,
        /// Largest allowed difference.
        threshold: f64,
    },
    /// Coverage layers do not conflict.
    LayerCompatible {
        /// Coverage-layer attribute.
        field: Arc<str>,
    },
}

impl PairwiseOperator {
    fn field_name(&self) -> &str {
        match self {
            Self::Equals { field }
            | Self::HasDifferent { field }
            | Self::AbsDiff { field, .. }
            | Self::HasValue { field, .. }
            | Self::SameListItem { field }
            | Self::FormalityCompatible { field, .. }
            | Self::LayerCompatible { field } => field,
        }
    }
}

impl Operator for PairwiseOperator {
    type Binding<'a> = PairBinding<'a>;

    const FAMILY: Family = Family::Pairwise;

    const NAMES: &'static [&'static str] = &[
        "equals",
        "has_different",
        "abs_diff",
        "has_value",
        "same_list_item",
        "formality_compatible",
        "layer_compatible",
    ];

    fn resolve(name: &str, params: &Params<'_>) -> Result<Self> {
        match name {
            "equals" => {
                params.expect_only(&["field"])?;
                Ok(Self::Equals {
                    field: params.field()?,
                })
            }
            "has_different" => {
                params.expect_only(&["field"])?;
                Ok(Self::HasDifferent {
                    field: params.field()?,
                })
            }
            "abs_diff" => {
                params.expect_only(&["field", "operator", "value"])?;
                Ok(Self::AbsDiff {
                    field: params.field()?,
                    comparison: params.comparison("operator")?,
                    value: params.number("value")?,
                })
            }
            "has_value" => {
                params.expect_only(&["field", "value"])?;
                Ok(Self::HasValue {
                    field: params.field()?,
                    value: params.value("value")?,
                })
            }
            "same_list_item" => {
                params.expect_only(&["field"])?;
                Ok(Self::SameListItem {
                    field: params.field()?,
                })
            }
            "formality_compatible" => {
                params.expect_only(&["field", "threshold"])?;
                let threshold = params.number_or("threshold", 1.0)?;
                if threshold < 0.0 {
                    return Err(Error::invalid_parameter(
                        name,
                        "threshold",
                        format!("must be >= 0, got {threshold}"),
                    ));
                }
                Ok(Self::FormalityCompatible {
                    field: params.field()?,
                    threshold,
                })
            }
            "layer_compatible" => {
                params.expect_only(&["field"])?;
                Ok(Self::LayerCompatible {
                    field: params.field()?,
                })
            }
            _ => Err(Error::unknown_operator(name)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Equals { .. } => "equals",
            Self::HasDifferent { .. } => "has_different",
            Self::AbsDiff { .. } => "abs_diff",
            Self::HasValue { .. } => "has_value",
            Self::SameListItem { .. } => "same_list_item",
            Self::FormalityCompatible { .. } => "formality_compatible",
            Self::LayerCompatible { .. } => "layer_compatible",
        }
    }

    fn field(&self) -> Option<&str> {
        Some(self.field_name())
    }

    fn check_schema(&self, schema: &Schema) -> Result<()> {
        let field = self.field_name();
        let dim = dimension(self, schema, field)?;

        match self {
            Self::AbsDiff { .. } | Self::FormalityCompatible { .. } if !dim.kind.is_numeric() => {
                Err(incompatible_field(
                    self,
                    field,
                    format!("needs a numeric dimension, `{field}` is {}", dim.kind.tag()),
                ))
            }
            Self::SameListItem { .. } if !matches!(dim.kind, DimensionKind::List { .. }) => {
                Err(incompatible_field(
                    self,
                    field,
                    format!("needs a list dimension, `{field}` is {}", dim.kind.tag()),
                ))
            }
            Self::LayerCompatible { .. }
                if !matches!(dim.kind, DimensionKind::CoverageLayers { .. }) =>
            {
                Err(incompatible_field(
                    self,
                    field,
                    format!("needs a coverage_layers dimension, `{field}` is {}", dim.kind.tag()),
                ))
            }
            Self::HasValue { value, .. } => check_reachable(self, dim, value),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, binding: &PairBinding<'_>) -> Result<Outcome> {
        let PairBinding { a, b } = *binding;

        match self {
            Self::Equals { field } => Ok(match both(a, b, field) {
                Ok((x, y)) if x.same_as(y) => Outcome::pass(format!("{field}: both {}", show(x))),
                Ok((x, y)) => Outcome::fail(format!("{field}: {} vs {}", show(x), show(y))),
                Err(missing) => missing,
            }),
            Self::HasDifferent { field } => Ok(match both(a, b, field) {
                Ok((x, y)) if x.same_as(y) => Outcome::fail(format!("{field}: both {}", show(x))),
                Ok((x, y)) => Outcome::pass(format!("{field}: {} vs {}", show(x), show(y))),
                Err(missing) => missing,
            }),
            Self::AbsDiff {
                field,
                comparison,
                value,
            } => Ok(match (numeric(a, field)?, numeric(b, field)?) {
                (Some(x), Some(y)) => {
                    let diff = (x - y).abs();
                    Outcome::when(
                        comparison.apply(diff, *value),
                        format!("{field}: difference {diff}, required {comparison} {value}"),
                    )
                }
                _ => missing(a, b, field),
            }),
            Self::HasValue { field, value } => {
                let holder = [a, b]
                    .into_iter()
                    .find(|item| item.attribute(field).is_some_and(|v| holds(v, value)));
                Ok(match holder {
                    Some(item) => Outcome::pass(format!("{field}: {} has {}", item.id, show(value))),
                    None => Outcome::fail(format!("{field}: neither item has {}", show(value))),
                })
            }
            Self::SameListItem { field } => {
                let (Some(x), Some(y)) = (list(a, field)?, list(b, field)?) else {
                    return Ok(missing(a, b, field));
                };
                let mut shared: Vec<&Value> = Vec::new();
                for v in x.iter().filter(|v| y.iter().any(|w| w.same_as(v))) {
                    if !shared.iter().any(|s| s.same_as(v)) {
                        shared.push(v);
                    }
                }
                Ok(if shared.is_empty() {
                    Outcome::fail(format!("{field}: no shared items"))
                } else {
                    let shared: Vec<String> = shared.into_iter().map(show).collect();
                    Outcome::pass(format!("{field}: shared {}", shared.join(", ")))
                })
            }
            Self::FormalityCompatible { field, threshold } => {
                Ok(match (numeric(a, field)?, numeric(b, field)?) {
                    (Some(x), Some(y)) => {
                        let diff = (x - y).abs();
                        Outcome::when(
                            diff <= *threshold,
                            format!("{field}: {x} vs {y}, difference {diff}, threshold {threshold}"),
                        )
                    }
                    _ => missing(a, b, field),
                })
            }
            Self::LayerCompatible { field } => {
                let x = CoverageLayer::flatten(&coverage(a, field)?);
                let y = CoverageLayer::flatten(&coverage(b, field)?);
                let verdict = layer_verdict(&x, &y);
                Ok(Outcome::when(verdict.is_compatible(), format!("{field}: {}", verdict.reason())))
            }
        }
    }
}

impl fmt::Display for PairwiseOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::AbsDiff {
                field,
                comparison,
                value,
            } => write!(f, "{name}({field} {comparison} {value})"),
            Self::HasValue { field, value } => write!(f, "{name}({field} = {value})"),
            Self::FormalityCompatible { field, threshold } => {
                write!(f, "{name}({field}, threshold {threshold})")
            }
            _ => write!(f, "{name}({})", self.field_name()),
        }
    }
}

/// Both values of a field, or the non-match naming who lacks it.
fn both<'i>(a: &'i Item, b: &'i Item, field: &str) -> std::result::Result<(&'i Value, &'i Value), Outcome> {
    match (a.attribute(field), b.attribute(field)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(missing(a, b, field)),
    }
}

fn missing(a: &Item, b: &Item, field: &str) -> Outcome {
    let lacking: Vec<&str> = [a, b]
        .into_iter()
        .filter(|item| item.attribute(field).is_none())
        .map(|item| item.id.as_str())
        .collect();
    Outcome::fail(format!("{field}: missing on {}", lacking.join(", ")))
}

fn list<'i>(item: &'i Item, field: &str) -> Result<Option<&'i consort_foundation::SharedVec<Value>>> {
    item.attribute(field)
        .map(|value| value.as_list().ok_or_else(|| mismatch(item, field, Type::List, value)))
        .transpose()
}

fn coverage(item: &Item, field: &str) -> Result<Vec<CoverageLayer>> {
    let Some(value) = item.attribute(field) else {
        return Ok(Vec::new());
    };
    CoverageLayer::parse_all(value).map_err(|violation| {
        let error = match violation {
            Violation::WrongType { expected, actual } => Error::type_mismatch(field, expected, actual),
            other => Error::schema_violation(field, other),
        };
        error.with_item(item.id.as_str())
    })
}
