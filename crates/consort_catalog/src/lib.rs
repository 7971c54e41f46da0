//! Schemas, dimensions, items, and catalogs for Consort.
//!
//! This crate provides:
//! - [`Dimension`] - Typed attribute slots with constraints
//! - [`Schema`] - Ordered dimensions and item validation
//! - [`Item`] - Catalog entries with attribute maps
//! - [`Catalog`] - Validated items sharing one schema
//! - [`CoverageLayer`] - Parsed coverage-layer values

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod coverage;
pub mod dimension;
pub mod item;
pub mod schema;

pub use catalog::{Catalog, ItemRejection};
pub use coverage::CoverageLayer;
pub use dimension::{Dimension, DimensionKind, ScalarKind, Vocabulary, VocabularyPolicy};
#[cfg(feature = "serde")]
pub use dimension::{DimensionDecl, KindTag, NumericBound};
pub use item::{Attributes, Item, ItemId};
#[cfg(feature = "serde")]
pub use schema::SchemaDecl;
pub use schema::{Advisory, Schema, UnknownAttributes};
