//! Catalog items.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use consort_foundation::{SharedMap, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Attribute mapping of an item: dimension name → value.
pub type Attributes = SharedMap<Arc<str>, Value>;

/// Identifier of an item, unique within its catalog.
///
/// Ordered by string value; sorted id tuples are the canonical identity of
/// a cluster.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ItemId(Arc<str>);

impl ItemId {
    /// Creates an item id.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An item of a catalog.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    /// Unique id within the catalog.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Attribute values, checked against the catalog schema.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Attributes,
    /// Opaque metadata, never validated or evaluated.
    #[cfg_attr(feature = "serde", serde(default))]
    pub metadata: SharedMap<Arc<str>, Value>,
}

impl Item {
    /// Creates an item with no attributes.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Attributes::new(),
            metadata: SharedMap::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.attributes = self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.metadata = self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns an attribute value, treating nil as absent.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_nil())
    }
}
