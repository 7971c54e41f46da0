//! Operator parameters, read from the leaf body of a condition document.

use std::sync::Arc;

use consort_foundation::{Error, Result, Value};
use serde_json::{Map, Value as JsonValue};

use super::Comparison;

/// The parameter object of one condition leaf.
///
/// Every accessor reports failures as configuration errors naming the
/// operator and the parameter.
#[derive(Clone, Copy, Debug)]
pub struct Params<'a> {
    operator: &'a str,
    raw: &'a Map<String, JsonValue>,
}

impl<'a> Params<'a> {
    /// Wraps a parameter object.
    #[must_use]
    pub fn new(operator: &'a str, raw: &'a Map<String, JsonValue>) -> Self {
        Self { operator, raw }
    }

    /// Wraps a parameter document, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `raw` is not an object.
    pub fn from_json(operator: &'a str, raw: &'a JsonValue) -> Result<Self> {
        raw.as_object()
            .map(|raw| Self::new(operator, raw))
            .ok_or_else(|| {
                Error::malformed_condition(format!(
                    "parameters of `{operator}` must be an object, got {raw}"
                ))
            })
    }

    /// The operator these parameters belong to.
    #[must_use]
    pub fn operator(&self) -> &'a str {
        self.operator
    }

    fn invalid(&self, param: &str, message: impl Into<String>) -> Error {
        Error::invalid_parameter(self.operator, param, message)
    }

    fn required(&self, key: &str) -> Result<&'a JsonValue> {
        match self.raw.get(key) {
            None | Some(JsonValue::Null) => Err(self.invalid(key, "is required")),
            Some(value) => Ok(value),
        }
    }

    /// Rejects parameters outside `allowed`, catching typos at load time.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first unexpected key.
    pub fn expect_only(&self, allowed: &[&str]) -> Result<()> {
        match self.raw.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(self.invalid(
                key,
                format!("is not a parameter of this operator (expected {})", allowed.join(", ")),
            )),
            None => Ok(()),
        }
    }

    /// The `field` parameter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if it is missing or not a non-empty
    /// string.
    pub fn field(&self) -> Result<Arc<str>> {
        match self.required("field")? {
            JsonValue::String(s) if !s.is_empty() => Ok(Arc::from(s.as_str())),
            other => Err(self.invalid("field", format!("must be a non-empty string, got {other}"))),
        }
    }

    /// A required parameter of any type.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if it is missing or null.
    pub fn value(&self, key: &str) -> Result<Value> {
        self.required(key).map(Value::from)
    }

    /// A required finite number.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if it is missing or not a finite number.
    pub fn number(&self, key: &str) -> Result<f64> {
        let raw = self.required(key)?;
        raw.as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid(key, format!("must be a number, got {raw}")))
    }

    /// An optional finite number with a default.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if present but not a finite number.
    pub fn number_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.raw.get(key) {
            None | Some(JsonValue::Null) => Ok(default),
            Some(_) => self.number(key),
        }
    }

    /// A required non-negative number.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if it is missing, not a number, or
    /// negative.
    pub fn non_negative(&self, key: &str) -> Result<f64> {
        let n = self.number(key)?;
        if n < 0.0 {
            return Err(self.invalid(key, format!("must be >= 0, got {n}")));
        }
        Ok(n)
    }

    /// A required count (non-negative integer).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if it is missing or not a non-negative
    /// integer.
    pub fn count(&self, key: &str) -> Result<usize> {
        let raw = self.required(key)?;
        raw.as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| self.invalid(key, format!("must be a non-negative integer, got {raw}")))
    }

    /// A required comparison symbol.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if it is missing or not a known symbol.
    pub fn comparison(&self, key: &str) -> Result<Comparison> {
        match self.required(key)? {
            JsonValue::String(s) => s.parse().map_err(|message: String| self.invalid(key, message)),
            other => Err(self.invalid(key, format!("must be a comparison symbol, got {other}"))),
        }
    }
}
