//! Coverage-layer values.
//!
//! A coverage-layer attribute is a list of `{parts, layer}` maps: the item
//! covers every named part at the given layer height. One item may declare
//! several entries, e.g. a jacket body at layer 3 and its sleeves at layer 2.

use std::collections::BTreeMap;
use std::sync::Arc;

use consort_foundation::{Type, Value, Violation};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One `{parts, layer}` entry of a coverage-layer value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoverageLayer {
    /// Covered parts (never empty).
    pub parts: Vec<Arc<str>>,
    /// Layer height (finite, >= 0).
    pub layer: f64,
}

impl CoverageLayer {
    /// Creates a coverage entry.
    #[must_use]
    pub fn new<I, S>(parts: I, layer: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            layer,
        }
    }

    /// Converts this entry back into its attribute form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let parts: Value = Value::List(self.parts.iter().cloned().map(Value::String).collect());
        Value::Map(
            [
                (Arc::from("parts"), parts),
                (Arc::from("layer"), Value::Float(self.layer)),
            ]
            .into_iter()
            .collect(),
        )
    }

    /// Parses a coverage-layer attribute value.
    ///
    /// # Errors
    ///
    /// Returns the first shape violation: the value is not a list, an entry
    /// is not a map, `parts` is missing, empty, or holds a non-string, or
    /// `layer` is missing, non-numeric, negative, or not finite.
    pub fn parse_all(value: &Value) -> Result<Vec<Self>, Violation> {
        let entries = value.as_list().ok_or(Violation::WrongType {
            expected: Type::List,
            actual: value.value_type(),
        })?;

        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Self::parse_entry(index, entry))
            .collect()
    }

    fn parse_entry(index: usize, entry: &Value) -> Result<Self, Violation> {
        let shape = |message: String| Violation::CoverageShape { index, message };

        let map = entry
            .as_map()
            .ok_or_else(|| shape(format!("expected a map, got {}", entry.value_type())))?;

        let parts = map
            .get("parts")
            .ok_or_else(|| shape("missing `parts`".to_string()))?
            .as_list()
            .ok_or_else(|| shape("`parts` must be a list of strings".to_string()))?;
        if parts.is_empty() {
            return Err(shape("`parts` must not be empty".to_string()));
        }
        let parts = parts
            .iter()
            .map(|p| match p {
                Value::String(s) => Ok(Arc::clone(s)),
                other => Err(shape(format!(
                    "`parts` must hold strings, got {}",
                    other.value_type()
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let layer = map
            .get("layer")
            .ok_or_else(|| shape("missing `layer`".to_string()))?;
        let layer = layer
            .as_number()
            .ok_or_else(|| shape(format!("`layer` must be a number, got {}", layer.value_type())))?;
        if !layer.is_finite() || layer < 0.0 {
            return Err(shape(format!("`layer` must be a finite number >= 0, got {layer}")));
        }

        // Adding 0.0 folds -0.0 into 0.0.
        Ok(Self {
            parts,
            layer: layer + 0.0,
        })
    }

    /// Flattens entries into a part → layer map.
    ///
    /// When a part appears in more than one entry the highest layer is kept.
    #[must_use]
    pub fn flatten(layers: &[Self]) -> BTreeMap<Arc<str>, f64> {
        let mut map: BTreeMap<Arc<str>, f64> = BTreeMap::new();
        for entry in layers {
            for part in &entry.parts {
                map.entry(Arc::clone(part))
                    .and_modify(|l| *l = l.max(entry.layer))
                    .or_insert(entry.layer);
            }
        }
        map
    }
}
