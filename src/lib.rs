//! Consort - Compatibility rules over item catalogs
//!
//! This crate re-exports all layers of the Consort system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: consort_engine     - Operators, rule sets, pairwise and cluster engines
//! Layer 1: consort_catalog    - Schemas, dimensions, items, catalogs
//! Layer 0: consort_foundation - Core types (Value, Error)
//! ```

pub use consort_catalog as catalog;
pub use consort_engine as engine;
pub use consort_foundation as foundation;
