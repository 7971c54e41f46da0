//! Operators over an item set.
//!
//! Field-reading operators skip members that lack the field, and refuse an
//! empty set outright since there is nothing to aggregate.

use std::fmt;
use std::sync::Arc;

use consort_catalog::{Item, Schema};
use consort_foundation::{Error, ErrorKind, Result, Value};

use super::{
    ClusterBinding, Comparison, Family, Operator, Outcome, Params, check_reachable, dimension,
    holds, incompatible_field, numeric, show,
};

/// A cluster operator with its parameters resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum ClusterOperator {
    /// `|S| >= value`.
    MinClusterSize {
        /// Smallest allowed size.
        value: usize,
    },
    /// `|S| <= value`.
    MaxClusterSize {
        /// Largest allowed size.
        value: usize,
    },
    /// No two members share a value of the field.
    UniqueValues {
        /// Attribute that must not repeat.
        field: Arc<str>,
    },
    /// Some member carries the value (or a list holding it).
    HasItemWith {
        /// Attribute to inspect.
        field: Arc<str>,
        /// Wanted value.
        value: Value,
    },
    /// The number of distinct values satisfies a comparison.
    CountByField {
        /// Attribute to count.
        field: Arc<str>,
        /// Comparison applied as `distinct <op> value`.
        comparison: Comparison,
        /// Right-hand side.
        value: f64,
    },
    /// `max - min <= max_range` over the numeric field.
    FormalityRange {
        /// Numeric attribute.
        field: Arc<str>,
        /// Largest allowed spread.
        max_range: f64,
    },
}

impl ClusterOperator {
    fn require_members<'i>(&self, items: &'i [&'i Item]) -> Result<&'i [&'i Item]> {
        if items.is_empty() {
            Err(Error::empty_item_set(self.name()))
        } else {
            Ok(items)
        }
    }
}

impl Operator for ClusterOperator {
    type Binding<'a> = ClusterBinding<'a>;

    const FAMILY: Family = Family::Cluster;

    const NAMES: &'static [&'static str] = &[
        "min_cluster_size",
        "max_cluster_size",
        "unique_values",
        "has_item_with",
        "count_by_field",
        "formality_range",
    ];

    fn resolve(name: &str, params: &Params<'_>) -> Result<Self> {
        match name {
            "min_cluster_size" => {
                params.expect_only(&["value"])?;
                Ok(Self::MinClusterSize {
                    value: params.count("value")?,
                })
            }
            "max_cluster_size" => {
                params.expect_only(&["value"])?;
                Ok(Self::MaxClusterSize {
                    value: params.count("value")?,
                })
            }
            "unique_values" => {
                params.expect_only(&["field"])?;
                Ok(Self::UniqueValues {
                    field: params.field()?,
                })
            }
            "has_item_with" => {
                params.expect_only(&["field", "value"])?;
                Ok(Self::HasItemWith {
                    field: params.field()?,
                    value: params.value("value")?,
                })
            }
            "count_by_field" => {
                params.expect_only(&["field", "operator", "value"])?;
                Ok(Self::CountByField {
                    field: params.field()?,
                    comparison: params.comparison("operator")?,
                    value: params.non_negative("value")?,
                })
            }
            "formality_range" => {
                params.expect_only(&["field", "max_range"])?;
                Ok(Self::FormalityRange {
                    field: params.field()?,
                    max_range: params.non_negative("max_range")?,
                })
            }
            _ => Err(Error::unknown_operator(name)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::MinClusterSize { .. } => "min_cluster_size",
            Self::MaxClusterSize { .. } => "max_cluster_size",
            Self::UniqueValues { .. } => "unique_values",
            Self::HasItemWith { .. } => "has_item_with",
            Self::CountByField { .. } => "count_by_field",
            Self::FormalityRange { .. } => "formality_range",
        }
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::MinClusterSize { .. } | Self::MaxClusterSize { .. } => None,
            Self::UniqueValues { field }
            | Self::HasItemWith { field, .. }
            | Self::CountByField { field, .. }
            | Self::FormalityRange { field, .. } => Some(field),
        }
    }

    fn check_schema(&self, schema: &Schema) -> Result<()> {
        let Some(field) = self.field() else {
            return Ok(());
        };
        let dim = dimension(self, schema, field)?;

        match self {
            Self::FormalityRange { .. } if !dim.kind.is_numeric() => Err(incompatible_field(
                self,
                field,
                format!("needs a numeric dimension, `{field}` is {}", dim.kind.tag()),
            )),
            Self::HasItemWith { value, .. } => check_reachable(self, dim, value),
            _ => Ok(()),
        }
    }

    fn evaluate(&self, binding: &ClusterBinding<'_>) -> Result<Outcome> {
        let size = binding.items.len();

        match self {
            Self::MinClusterSize { value } => Ok(Outcome::when(
                size >= *value,
                format!("size {size}, minimum {value}"),
            )),
            Self::MaxClusterSize { value } => Ok(Outcome::when(
                size <= *value,
                format!("size {size}, maximum {value}"),
            )),
            Self::UniqueValues { field } => {
                let items = self.require_members(binding.items)?;
                let mut seen: Vec<(&Value, &Item)> = Vec::new();
                for &item in items {
                    let Some(v) = item.attribute(field) else {
                        continue;
                    };
                    if let Some((_, first)) = seen.iter().find(|(s, _)| s.same_as(v)) {
                        return Ok(Outcome::fail(format!(
                            "{field}: {} repeated on {} and {}",
                            show(v),
                            first.id,
                            item.id
                        )));
                    }
                    seen.push((v, item));
                }
                Ok(Outcome::pass(format!("{field}: {} distinct values", seen.len())))
            }
            Self::HasItemWith { field, value } => {
                let items = self.require_members(binding.items)?;
                Ok(
                    match items
                        .iter()
                        .find(|item| item.attribute(field).is_some_and(|v| holds(v, value)))
                    {
                        Some(item) => Outcome::pass(format!("{field}: {} has {}", item.id, show(value))),
                        None => Outcome::fail(format!("{field}: no member has {}", show(value))),
                    },
                )
            }
            Self::CountByField {
                field,
                comparison,
                value,
            } => {
                let items = self.require_members(binding.items)?;
                let mut distinct: Vec<&Value> = Vec::new();
                for v in items.iter().filter_map(|item| item.attribute(field)) {
                    if !distinct.iter().any(|d| d.same_as(v)) {
                        distinct.push(v);
                    }
                }
                #[allow(clippy::cast_precision_loss)]
                let count = distinct.len() as f64;
                Ok(Outcome::when(
                    comparison.apply(count, *value),
                    format!("{field}: {count} distinct values, required {comparison} {value}"),
                ))
            }
            Self::FormalityRange { field, max_range } => {
                let items = self.require_members(binding.items)?;
                let mut values = Vec::with_capacity(items.len());
                for &item in items {
                    if let Some(n) = numeric(item, field)? {
                        values.push(n);
                    }
                }
                let (Some(lo), Some(hi)) = (
                    values.iter().copied().reduce(f64::min),
                    values.iter().copied().reduce(f64::max),
                ) else {
                    return Err(Error::new(ErrorKind::MissingField {
                        field: field.to_string(),
                    })
                    .with_operator(self.name()));
                };
                let range = hi - lo;
                Ok(Outcome::when(
                    range <= *max_range,
                    format!("{field}: range {lo}..{hi} spans {range}, maximum {max_range}"),
                ))
            }
        }
    }
}

impl fmt::Display for ClusterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::MinClusterSize { value } | Self::MaxClusterSize { value } => {
                write!(f, "{name}({value})")
            }
            Self::UniqueValues { field } => write!(f, "{name}({field})"),
            Self::HasItemWith { field, value } => write!(f, "{name}({field} = {value})"),
            Self::CountByField {
                field,
                comparison,
                value,
            } => write!(f, "{name}({field} {comparison} {value})"),
            Self::FormalityRange { field, max_range } => write!(f, "{name}({field}, {max_range})"),
        }
    }
}
