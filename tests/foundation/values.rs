//! Integration tests for Value
//!
//! Tests attribute equality, numeric promotion, display, and JSON conversion.

use consort_foundation::{SharedVec, Type, Value};
use serde_json::json;
use std::collections::HashSet;

// =============================================================================
// Equality and Hashing
// =============================================================================

#[test]
fn strict_equality_separates_int_and_float() {
    assert_ne!(Value::Int(2), Value::Float(2.0));
    assert_eq!(Value::Float(2.0), Value::Float(2.0));
}

#[test]
fn attribute_equality_promotes_numbers() {
    assert!(Value::Int(2).same_as(&Value::Float(2.0)));
    assert!(Value::Float(2.0).same_as(&Value::Int(2)));
    assert!(!Value::Int(2).same_as(&Value::Float(2.5)));
    assert!(!Value::Int(2).same_as(&Value::from("2")));
}

#[test]
fn floats_hash_by_bit_pattern() {
    let mut set = HashSet::new();
    set.insert(Value::Float(1.5));
    set.insert(Value::Float(1.5));
    set.insert(Value::Float(f64::NAN));
    assert_eq!(set.len(), 2);
}

#[test]
fn lists_compare_structurally() {
    let a = Value::from(vec!["navy", "white"]);
    let b = Value::List(["navy", "white"].into_iter().map(Value::from).collect());
    assert_eq!(a, b);
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn as_number_promotes_int() {
    assert_eq!(Value::Int(3).as_number(), Some(3.0));
    assert_eq!(Value::Float(0.5).as_number(), Some(0.5));
    assert_eq!(Value::from("3").as_number(), None);
}

#[test]
fn value_types() {
    assert_eq!(Value::Nil.value_type(), Type::Nil);
    assert_eq!(Value::Bool(true).value_type(), Type::Bool);
    assert_eq!(Value::from(vec![1i64]).value_type(), Type::List);
    assert!(Type::Float.accepts(Type::Int));
    assert!(!Type::Int.accepts(Type::Float));
}

#[test]
fn display_is_plain() {
    assert_eq!(Value::from("navy").to_string(), "navy");
    assert_eq!(Value::from(vec![1i64, 2]).to_string(), "[1, 2]");
    assert_eq!(Value::Nil.to_string(), "nil");
}

// =============================================================================
// JSON
// =============================================================================

#[test]
fn json_integers_and_floats() {
    assert_eq!(Value::from(&json!(3)), Value::Int(3));
    assert_eq!(Value::from(&json!(3.5)), Value::Float(3.5));
    assert_eq!(Value::from(&json!(null)), Value::Nil);
}

#[test]
fn json_object_becomes_map() {
    let value = Value::from(json!({"parts": ["chest"], "layer": 2}));
    let map = value.as_map().unwrap();
    assert_eq!(map.get("layer"), Some(&Value::Int(2)));
    assert_eq!(map.get("parts"), Some(&Value::from(vec!["chest"])));
}

#[test]
fn serde_untagged_round_trip() {
    let value = Value::from(json!({"colors": ["navy", "grey"], "formality": 3, "warm": true}));
    let text = serde_json::to_string(&value).unwrap();
    let back: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(back, value);
}

#[test]
fn lists_are_persistent() {
    let base: SharedVec<Value> = SharedVec::new();
    let one = base.push_back(Value::Int(1));
    assert!(base.is_empty());
    assert_eq!(one.len(), 1);
}
