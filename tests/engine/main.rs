//! Integration tests for Layer 2: Engine
//!
//! Tests for operators, conditions, rule sets, and the pairwise and
//! cluster engines.

mod conditions;
mod fixtures;
mod pairwise;
mod rules;
