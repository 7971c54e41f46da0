//! Attribute and parameter values.
//!
//! A [`Value`] is what an item stores under a dimension name and what a rule
//! passes to an operator. Values are immutable; lists and maps share
//! structure, so cloning an item never deep-copies its attributes.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collections::{SharedMap, SharedVec};
use crate::types::Type;

/// A dynamically typed attribute value.
///
/// Serialization is untagged, so a JSON attribute object maps straight onto
/// it: whole numbers become [`Value::Int`], other numbers [`Value::Float`],
/// objects [`Value::Map`], and `null` becomes [`Value::Nil`].
///
/// `==` is strict: `Int(2)` and `Float(2.0)` differ, and floats compare by
/// bit pattern so `Eq` and `Hash` agree. Rule evaluation uses
/// [`Value::same_as`], which treats the two numeric kinds as one.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Value {
    /// No value.
    Nil,
    /// A flag.
    Bool(bool),
    /// A whole number.
    Int(i64),
    /// A real number.
    Float(f64),
    /// Text.
    String(Arc<str>),
    /// An ordered list of values.
    List(SharedVec<Value>),
    /// String-keyed values, ordered by key.
    Map(SharedMap<Arc<str>, Value>),
}

// =============================================================================
// Inspection
// =============================================================================

impl Value {
    /// The runtime type tag.
    #[must_use]
    pub const fn value_type(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::List(_) => Type::List,
            Self::Map(_) => Type::Map,
        }
    }

    /// Whether this is [`Value::Nil`].
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// The flag, if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(flag) = self { Some(*flag) } else { None }
    }

    /// The number, if this is an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(n) = self { Some(*n) } else { None }
    }

    /// The number, if this is a `Float`. Integers are not widened here; use
    /// [`Value::as_number`] for that.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        if let Self::Float(x) = self { Some(*x) } else { None }
    }

    /// Either numeric kind as `f64`. Integers beyond 2^53 lose precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Self::Int(n) => Some(n as f64),
            Self::Float(x) => Some(x),
            _ => None,
        }
    }

    /// The text, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(text) = self { Some(text) } else { None }
    }

    /// The elements, if this is a `List`.
    #[must_use]
    pub const fn as_list(&self) -> Option<&SharedVec<Value>> {
        if let Self::List(items) = self { Some(items) } else { None }
    }

    /// The entries, if this is a `Map`.
    #[must_use]
    pub const fn as_map(&self) -> Option<&SharedMap<Arc<str>, Value>> {
        if let Self::Map(entries) = self { Some(entries) } else { None }
    }

    /// Attribute equality: strict `==`, except that an `Int` and a `Float`
    /// of equal magnitude match.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) if self.value_type() != other.value_type() => a == b,
            _ => self == other,
        }
    }
}

// =============================================================================
// Equality, hashing, ordering
// =============================================================================

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::{Bool, Float, Int, List, Map, Nil, String};
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type().hash(state);
        match self {
            Self::Nil => {}
            Self::Bool(flag) => flag.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::String(text) => text.hash(state),
            Self::List(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
        }
    }
}

/// Numbers order across kinds; strings and flags order among themselves.
/// Anything else is unordered.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Nil, Self::Nil) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => self.as_number()?.partial_cmp(&other.as_number()?),
        }
    }
}

// =============================================================================
// Formatting
// =============================================================================

fn write_joined<I, T>(f: &mut fmt::Formatter<'_>, parts: I) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{part}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(text) => f.write_str(text),
            Self::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                write_joined(f, entries.iter().map(|(k, v)| format!("{k}: {v}")))?;
                f.write_str("}")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(text) => write!(f, "{text:?}"),
            Self::List(items) => fmt::Debug::fmt(items, f),
            Self::Map(entries) => fmt::Debug::fmt(entries, f),
            scalar => write!(f, "{scalar}"),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! value_from {
    ($($source:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from($v: $source) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    bool => |b| Self::Bool(b),
    i32 => |n| Self::Int(i64::from(n)),
    i64 => |n| Self::Int(n),
    f64 => |x| Self::Float(x),
    &str => |s| Self::String(Arc::from(s)),
    String => |s| Self::String(Arc::from(s)),
    Arc<str> => |s| Self::String(s),
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(feature = "serde")]
impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Nil,
            Json::Bool(flag) => Self::Bool(*flag),
            Json::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            Json::String(text) => Self::from(text.as_str()),
            Json::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Json::Object(fields) => Self::Map(
                fields
                    .iter()
                    .map(|(key, field)| (Arc::from(key.as_str()), Self::from(field)))
                    .collect(),
            ),
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Self::from(&json)
    }
}
