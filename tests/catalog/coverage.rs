//! Integration tests for coverage-layer values

use std::sync::Arc;

use consort_catalog::CoverageLayer;
use consort_foundation::{Value, Violation};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn parse_from_json_document() {
    let value = Value::from(json!([
        {"parts": ["chest", "back"], "layer": 3},
        {"parts": ["upper_arm", "lower_arm"], "layer": 2.5}
    ]));
    let layers = CoverageLayer::parse_all(&value).unwrap();

    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0], CoverageLayer::new(["chest", "back"], 3.0));
    assert_eq!(layers[1], CoverageLayer::new(["upper_arm", "lower_arm"], 2.5));
}

#[test]
fn missing_layer_is_shape_error() {
    let value = Value::from(json!([{"parts": ["chest"]}]));
    assert!(matches!(
        CoverageLayer::parse_all(&value),
        Err(Violation::CoverageShape { index: 0, .. })
    ));
}

#[test]
fn entry_must_be_map() {
    let value = Value::from(json!([["chest"]]));
    assert!(matches!(
        CoverageLayer::parse_all(&value),
        Err(Violation::CoverageShape { index: 0, .. })
    ));
}

#[test]
fn empty_list_means_no_coverage() {
    let layers = CoverageLayer::parse_all(&Value::from(json!([]))).unwrap();
    assert!(CoverageLayer::flatten(&layers).is_empty());
}

fn entry() -> impl Strategy<Value = CoverageLayer> {
    (
        prop::collection::vec(prop::sample::select(vec!["chest", "back", "feet", "head"]), 1..4),
        0u8..6,
    )
        .prop_map(|(parts, layer)| CoverageLayer::new(parts, f64::from(layer)))
}

proptest! {
    #[test]
    fn to_value_parses_back(entries in prop::collection::vec(entry(), 0..5)) {
        let value = Value::List(entries.iter().map(CoverageLayer::to_value).collect());
        prop_assert_eq!(CoverageLayer::parse_all(&value).unwrap(), entries);
    }

    #[test]
    fn flatten_keeps_the_max(entries in prop::collection::vec(entry(), 0..5)) {
        let flat = CoverageLayer::flatten(&entries);
        for e in &entries {
            for part in &e.parts {
                let layer = flat[&Arc::clone(part)];
                prop_assert!(layer >= e.layer);
            }
        }
        for (part, layer) in &flat {
            prop_assert!(entries.iter().any(|e| e.parts.contains(part) && (e.layer - layer).abs() < f64::EPSILON));
        }
    }
}
