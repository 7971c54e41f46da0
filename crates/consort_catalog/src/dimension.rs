//! Dimension definitions.
//!
//! A dimension is a named, typed attribute slot. Its kind carries the
//! type-specific constraints (numeric bounds, enum values, list item type,
//! coverage vocabulary) that [`Dimension::check`] enforces.

use std::collections::BTreeSet;
#[cfg(feature = "serde")]
use std::fmt;
use std::sync::Arc;

use consort_foundation::{Type, Value, Violation};
#[cfg(feature = "serde")]
use consort_foundation::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageLayer;

/// Schema definition for one item attribute.
///
/// Documents go through [`DimensionDecl`], which rejects unknown keys and
/// constraints that do not apply to the declared type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "DimensionDecl", into = "DimensionDecl")
)]
pub struct Dimension {
    /// Attribute name.
    pub name: Arc<str>,
    /// Type tag and type-specific constraints.
    pub kind: DimensionKind,
    /// Whether every item must carry this attribute.
    pub required: bool,
}

impl Dimension {
    /// Creates a required dimension.
    #[must_use]
    pub fn required(name: impl Into<Arc<str>>, kind: DimensionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// Creates an optional dimension.
    #[must_use]
    pub fn optional(name: impl Into<Arc<str>>, kind: DimensionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    /// Checks a present (non-nil) value against this dimension.
    ///
    /// Values are never coerced: an integer dimension rejects floats, and
    /// only float dimensions accept integers.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn check(&self, value: &Value) -> Result<(), Violation> {
        match &self.kind {
            DimensionKind::String => expect_type(Type::String, value),
            DimensionKind::Boolean => expect_type(Type::Bool, value),
            DimensionKind::Integer { min, max } => {
                let n = value.as_int().ok_or(Violation::WrongType {
                    expected: Type::Int,
                    actual: value.value_type(),
                })?;
                #[allow(clippy::cast_precision_loss)]
                let (n, min, max) = (n as f64, min.map(|m| m as f64), max.map(|m| m as f64));
                check_range(n, min, max)
            }
            DimensionKind::Float { min, max } => {
                let n = value.as_number().ok_or(Violation::WrongType {
                    expected: Type::Float,
                    actual: value.value_type(),
                })?;
                check_range(n, *min, *max)
            }
            DimensionKind::Enum { allowed } => {
                let s = value.as_str().ok_or(Violation::WrongType {
                    expected: Type::String,
                    actual: value.value_type(),
                })?;
                if allowed.iter().any(|a| a == s) {
                    Ok(())
                } else {
                    Err(Violation::NotAllowed {
                        value: s.to_string(),
                        allowed: allowed.clone(),
                    })
                }
            }
            DimensionKind::List { item } => {
                let list = value.as_list().ok_or(Violation::WrongType {
                    expected: Type::List,
                    actual: value.value_type(),
                })?;
                let expected = item.value_type();
                for (index, element) in list.iter().enumerate() {
                    if !expected.accepts(element.value_type()) {
                        return Err(Violation::ListItem {
                            index,
                            expected,
                            actual: element.value_type(),
                        });
                    }
                }
                Ok(())
            }
            DimensionKind::CoverageLayers { vocabulary } => {
                let layers = CoverageLayer::parse_all(value)?;
                if let Some(vocab) = vocabulary.as_ref().filter(|v| v.is_enforced()) {
                    if let Some(part) = vocab.unknown_parts(&layers).into_iter().next() {
                        return Err(Violation::UnknownPart { part });
                    }
                }
                Ok(())
            }
        }
    }

    /// Returns coverage parts outside an advisory vocabulary.
    ///
    /// Always empty for other kinds, for enforced vocabularies (those are
    /// violations instead), and for values that fail [`Dimension::check`].
    #[must_use]
    pub fn advisory_misses(&self, value: &Value) -> Vec<String> {
        match &self.kind {
            DimensionKind::CoverageLayers {
                vocabulary: Some(vocab),
            } if !vocab.is_enforced() => CoverageLayer::parse_all(value)
                .map(|layers| vocab.unknown_parts(&layers))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

fn expect_type(expected: Type, value: &Value) -> Result<(), Violation> {
    let actual = value.value_type();
    if expected.accepts(actual) {
        Ok(())
    } else {
        Err(Violation::WrongType { expected, actual })
    }
}

fn check_range(n: f64, min: Option<f64>, max: Option<f64>) -> Result<(), Violation> {
    if let Some(min) = min {
        if n < min {
            return Err(Violation::BelowMinimum { value: n, min });
        }
    }
    if let Some(max) = max {
        if n > max {
            return Err(Violation::AboveMaximum { value: n, max });
        }
    }
    Ok(())
}

/// Type tag of a dimension, with its constraints.
#[derive(Clone, Debug, PartialEq)]
pub enum DimensionKind {
    /// Free-form string.
    String,
    /// 64-bit integer with optional inclusive bounds.
    Integer {
        /// Inclusive minimum.
        min: Option<i64>,
        /// Inclusive maximum.
        max: Option<i64>,
    },
    /// Floating point number (integers accepted) with optional inclusive bounds.
    Float {
        /// Inclusive minimum.
        min: Option<f64>,
        /// Inclusive maximum.
        max: Option<f64>,
    },
    /// Boolean flag.
    Boolean,
    /// String from a fixed set of values.
    Enum {
        /// Allowed values.
        allowed: Vec<String>,
    },
    /// Homogeneous list of scalars.
    List {
        /// Element kind.
        item: ScalarKind,
    },
    /// Coverage-layer list (see [`CoverageLayer`]).
    CoverageLayers {
        /// Optional part vocabulary.
        vocabulary: Option<Vocabulary>,
    },
}

impl DimensionKind {
    /// Unbounded integer kind.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Integer {
            min: None,
            max: None,
        }
    }

    /// Integer kind with inclusive bounds.
    #[must_use]
    pub const fn integer_range(min: i64, max: i64) -> Self {
        Self::Integer {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Unbounded float kind.
    #[must_use]
    pub const fn float() -> Self {
        Self::Float {
            min: None,
            max: None,
        }
    }

    /// Float kind with inclusive bounds.
    #[must_use]
    pub const fn float_range(min: f64, max: f64) -> Self {
        Self::Float {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Enum kind over the given values.
    #[must_use]
    pub fn enumeration<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// List kind with the given element kind.
    #[must_use]
    pub const fn list(item: ScalarKind) -> Self {
        Self::List { item }
    }

    /// Coverage-layer kind without a vocabulary.
    #[must_use]
    pub const fn coverage() -> Self {
        Self::CoverageLayers { vocabulary: None }
    }

    /// Coverage-layer kind with a part vocabulary.
    #[must_use]
    pub fn coverage_with(vocabulary: Vocabulary) -> Self {
        Self::CoverageLayers {
            vocabulary: Some(vocabulary),
        }
    }

    /// Returns true for integer and float kinds.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer { .. } | Self::Float { .. })
    }

    /// Returns the lowercase tag name of this kind.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer { .. } => "integer",
            Self::Float { .. } => "float",
            Self::Boolean => "boolean",
            Self::Enum { .. } => "enum",
            Self::List { .. } => "list",
            Self::CoverageLayers { .. } => "coverage_layers",
        }
    }
}

/// Element kind of a list dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScalarKind {
    /// String elements.
    String,
    /// Integer elements.
    Integer,
    /// Float elements (integers accepted).
    Float,
    /// Boolean elements.
    Boolean,
}

impl ScalarKind {
    /// Returns the value type elements must have.
    #[must_use]
    pub const fn value_type(self) -> Type {
        match self {
            Self::String => Type::String,
            Self::Integer => Type::Int,
            Self::Float => Type::Float,
            Self::Boolean => Type::Bool,
        }
    }
}

/// Known coverage parts and how strictly to apply them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(deny_unknown_fields))]
pub struct Vocabulary {
    /// Known part names.
    pub parts: BTreeSet<String>,
    /// Whether unknown parts are violations or only reported.
    #[cfg_attr(feature = "serde", serde(default))]
    pub policy: VocabularyPolicy,
}

impl Vocabulary {
    /// Creates a vocabulary with the given policy.
    #[must_use]
    pub fn new<I, S>(parts: I, policy: VocabularyPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
            policy,
        }
    }

    /// Returns true if unknown parts are violations.
    #[must_use]
    pub const fn is_enforced(&self) -> bool {
        matches!(self.policy, VocabularyPolicy::Enforced)
    }

    /// Returns parts not in the vocabulary, in first-seen order without repeats.
    #[must_use]
    pub fn unknown_parts(&self, layers: &[CoverageLayer]) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for part in layers.iter().flat_map(|l| l.parts.iter()) {
            if !self.parts.contains(part.as_ref()) && !unknown.iter().any(|u| u == part.as_ref()) {
                unknown.push(part.to_string());
            }
        }
        unknown
    }
}

/// How a coverage vocabulary is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VocabularyPolicy {
    /// Unknown parts are logged and reported but accepted.
    #[default]
    Advisory,
    /// Unknown parts fail validation.
    Enforced,
}

// =============================================================================
// Document form
// =============================================================================

/// Type tag as written in a dimension document.
#[cfg(feature = "serde")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    /// `"string"`
    String,
    /// `"integer"`
    Integer,
    /// `"float"`
    Float,
    /// `"boolean"`
    Boolean,
    /// `"enum"`
    Enum,
    /// `"list"`
    List,
    /// `"coverage_layers"`
    CoverageLayers,
}

#[cfg(feature = "serde")]
impl KindTag {
    const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::List => "list",
            Self::CoverageLayers => "coverage_layers",
        }
    }
}

/// A numeric bound as written in a document: whole or real.
#[cfg(feature = "serde")]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericBound {
    /// A whole number.
    Int(i64),
    /// A real number.
    Float(f64),
}

#[cfg(feature = "serde")]
impl NumericBound {
    #[allow(clippy::cast_precision_loss)]
    const fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(x) => x,
        }
    }
}

/// Document form of a [`Dimension`].
///
/// Every constraint key is optional here; [`Dimension::try_from`] checks
/// that the ones present fit the declared `type` and that the ones the type
/// needs are there.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionDecl {
    /// Attribute name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub kind: KindTag,
    /// Whether every item must carry this attribute.
    #[serde(default)]
    pub required: bool,
    /// Inclusive minimum (`integer`, `float`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<NumericBound>,
    /// Inclusive maximum (`integer`, `float`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<NumericBound>,
    /// Allowed values (`enum`, required there).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Element kind (`list`, required there).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ScalarKind>,
    /// Part vocabulary (`coverage_layers`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<Vocabulary>,
}

#[cfg(feature = "serde")]
impl DimensionDecl {
    fn malformed(&self, message: impl fmt::Display) -> Error {
        Error::malformed_schema(format!("dimension {}: {message}", self.name))
    }

    fn integer_bound(
        &self,
        key: &str,
        bound: Option<NumericBound>,
    ) -> consort_foundation::Result<Option<i64>> {
        match bound {
            None => Ok(None),
            Some(NumericBound::Int(n)) => Ok(Some(n)),
            Some(NumericBound::Float(x)) => {
                Err(self.malformed(format!("`{key}` of an integer dimension must be whole, got {x}")))
            }
        }
    }

    /// Keys set in the document, besides `name`, `type`, and `required`.
    fn present_keys(&self) -> Vec<&'static str> {
        [
            ("min", self.min.is_some()),
            ("max", self.max.is_some()),
            ("allowed", self.allowed.is_some()),
            ("item", self.item.is_some()),
            ("vocabulary", self.vocabulary.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, set)| set.then_some(key))
        .collect()
    }
}

#[cfg(feature = "serde")]
impl TryFrom<DimensionDecl> for Dimension {
    type Error = Error;

    fn try_from(decl: DimensionDecl) -> consort_foundation::Result<Self> {
        let applicable: &[&str] = match decl.kind {
            KindTag::String | KindTag::Boolean => &[],
            KindTag::Integer | KindTag::Float => &["min", "max"],
            KindTag::Enum => &["allowed"],
            KindTag::List => &["item"],
            KindTag::CoverageLayers => &["vocabulary"],
        };
        if let Some(key) = decl.present_keys().into_iter().find(|k| !applicable.contains(k)) {
            return Err(decl.malformed(format!("`{key}` does not apply to type {}", decl.kind.name())));
        }

        let kind = match decl.kind {
            KindTag::String => DimensionKind::String,
            KindTag::Boolean => DimensionKind::Boolean,
            KindTag::Integer => DimensionKind::Integer {
                min: decl.integer_bound("min", decl.min)?,
                max: decl.integer_bound("max", decl.max)?,
            },
            KindTag::Float => DimensionKind::Float {
                min: decl.min.map(NumericBound::as_f64),
                max: decl.max.map(NumericBound::as_f64),
            },
            KindTag::Enum => DimensionKind::Enum {
                allowed: decl
                    .allowed
                    .clone()
                    .ok_or_else(|| decl.malformed("type enum needs `allowed`"))?,
            },
            KindTag::List => DimensionKind::List {
                item: decl.item.ok_or_else(|| decl.malformed("type list needs `item`"))?,
            },
            KindTag::CoverageLayers => DimensionKind::CoverageLayers {
                vocabulary: decl.vocabulary.clone(),
            },
        };

        Ok(Self {
            name: decl.name.into(),
            kind,
            required: decl.required,
        })
    }
}

#[cfg(feature = "serde")]
impl From<Dimension> for DimensionDecl {
    fn from(dim: Dimension) -> Self {
        let mut decl = Self {
            name: dim.name.to_string(),
            kind: KindTag::String,
            required: dim.required,
            min: None,
            max: None,
            allowed: None,
            item: None,
            vocabulary: None,
        };
        match dim.kind {
            DimensionKind::String => {}
            DimensionKind::Boolean => decl.kind = KindTag::Boolean,
            DimensionKind::Integer { min, max } => {
                decl.kind = KindTag::Integer;
                decl.min = min.map(NumericBound::Int);
                decl.max = max.map(NumericBound::Int);
            }
            DimensionKind::Float { min, max } => {
                decl.kind = KindTag::Float;
                decl.min = min.map(NumericBound::Float);
                decl.max = max.map(NumericBound::Float);
            }
            DimensionKind::Enum { allowed } => {
                decl.kind = KindTag::Enum;
                decl.allowed = Some(allowed);
            }
            DimensionKind::List { item } => {
                decl.kind = KindTag::List;
                decl.item = Some(item);
            }
            DimensionKind::CoverageLayers { vocabulary } => {
                decl.kind = KindTag::CoverageLayers;
                decl.vocabulary = vocabulary;
            }
        }
        decl
    }
}
