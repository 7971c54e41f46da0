//! Catalogs: a schema plus the items validated against it.
//!
//! Items keep their insertion order, and that order is the index the engine
//! uses for its arena-style search structures.

use std::collections::HashMap;
use std::sync::Arc;

use consort_foundation::{Error, ErrorKind, Result};

use crate::item::{Item, ItemId};
use crate::schema::Schema;

/// An item that could not be added to a catalog.
#[derive(Clone, Debug)]
pub struct ItemRejection {
    /// The rejected item's id.
    pub item_id: ItemId,
    /// Why it was rejected.
    pub error: Error,
}

/// A named set of items sharing one schema.
///
/// Every item in a catalog has passed schema validation.
#[derive(Clone, Debug)]
pub struct Catalog {
    name: String,
    schema: Arc<Schema>,
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Creates a catalog from items, failing on the first bad item.
    ///
    /// # Errors
    ///
    /// Returns the first schema validation or duplicate-id error.
    pub fn from_items(
        name: impl Into<String>,
        schema: impl Into<Arc<Schema>>,
        items: impl IntoIterator<Item = Item>,
    ) -> Result<Self> {
        items
            .into_iter()
            .try_fold(Self::new(name, schema), Self::with_item)
    }

    /// Creates a catalog from items, skipping bad ones.
    ///
    /// Returns the catalog of accepted items and one rejection per skipped
    /// item, so the caller can decide whether to continue or abort.
    pub fn from_items_partial(
        name: impl Into<String>,
        schema: impl Into<Arc<Schema>>,
        items: impl IntoIterator<Item = Item>,
    ) -> (Self, Vec<ItemRejection>) {
        let mut catalog = Self::new(name, schema);
        let mut rejections = Vec::new();

        for item in items {
            if let Err(error) = catalog.check(&item) {
                rejections.push(ItemRejection {
                    item_id: item.id.clone(),
                    error,
                });
                continue;
            }
            catalog.insert_unchecked(item);
        }

        if !rejections.is_empty() {
            tracing::debug!(
                catalog = %catalog.name,
                accepted = catalog.len(),
                rejected = rejections.len(),
                "catalog built with rejections"
            );
        }

        (catalog, rejections)
    }

    /// Validates and appends an item.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the id is already present, or a
    /// schema validation error if the item does not satisfy the schema.
    pub fn with_item(mut self, item: Item) -> Result<Self> {
        self.check(&item)?;
        self.insert_unchecked(item);
        Ok(self)
    }

    fn check(&self, item: &Item) -> Result<()> {
        if self.index.contains_key(&item.id) {
            return Err(Error::new(ErrorKind::DuplicateItem(item.id.to_string())));
        }
        self.schema.validate(item)
    }

    fn insert_unchecked(&mut self, item: Item) {
        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
    }

    /// Returns the catalog name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns a shared handle to the schema.
    #[must_use]
    pub fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Returns the items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the catalog has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index_of(id).map(|i| &self.items[i])
    }

    /// Returns the insertion index of an item.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Looks up an item by id, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the unknown id.
    pub fn require(&self, id: &str) -> Result<&Item> {
        self.get(id)
            .ok_or_else(|| Error::new(ErrorKind::UnknownItem(id.to_string())))
    }
}
