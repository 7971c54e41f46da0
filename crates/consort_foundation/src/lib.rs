//! Core values, persistent collections, and errors for Consort.
//!
//! This crate provides:
//! - [`Value`] - The value type for item attributes and operator parameters
//! - [`Type`] - Runtime type tags used in diagnostics
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`SharedVec`], [`SharedMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{SharedMap, SharedVec};
pub use error::{Error, ErrorCategory, ErrorContext, ErrorKind, Violation};
pub use types::Type;
pub use value::Value;

/// Result type alias using Consort's Error type.
pub type Result<T> = std::result::Result<T, Error>;
