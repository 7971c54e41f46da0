//! Integration tests for the pairwise engine

use std::sync::Arc;

use consort_catalog::{Catalog, CoverageLayer};
use consort_engine::{FixedClock, PairwiseEngine};
use consort_foundation::{ErrorKind, Value};
use serde_json::json;

use crate::fixtures::{catalog, garment, layers, rules, wardrobe};

fn everyday() -> consort_engine::RuleSet {
    rules(json!({"name": "everyday", "rules": [
        {"name": "formality", "condition": {"formality_compatible": {"field": "formality"}}},
        {"name": "categories", "condition": {"has_different": {"field": "category"}}}
    ]}))
}

#[test]
fn evaluate_pair_reports_every_rule() {
    let schema = wardrobe();
    let rules = everyday();
    let engine = PairwiseEngine::new(&rules, &schema).unwrap().with_clock(FixedClock(1_700_000_000_000));

    let result = engine
        .evaluate_pair(&garment("a", "top", 1), &garment("b", "top", 5))
        .unwrap();

    assert!(!result.compatible);
    assert_eq!(result.rule_evaluations.len(), 2);
    assert_eq!(result.failed_rules().count(), 2);
    assert_eq!(result.timestamp, 1_700_000_000_000);
    assert_eq!(result.item1_id.as_str(), "a");
}

#[test]
fn empty_rule_set_is_always_compatible() {
    let schema = wardrobe();
    let rules = rules(json!({"name": "none", "rules": []}));
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();
    assert!(engine.is_compatible(&garment("a", "top", 1), &garment("b", "top", 5)).unwrap());
}

#[test]
fn invalid_items_are_rejected_before_evaluation() {
    let schema = wardrobe();
    let rules = everyday();
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();

    let err = engine
        .evaluate_pair(&garment("a", "top", 1), &garment("b", "cape", 1))
        .unwrap_err();
    assert!(err.is_schema_validation());
    assert_eq!(err.context.unwrap().item.as_deref(), Some("b"));
}

#[test]
fn engine_construction_binds_rules() {
    let schema = wardrobe();
    let rules = rules(json!({"name": "x", "rules": [
        {"name": "layers", "condition": {"layer_compatible": {"field": "formality"}}}
    ]}));
    let err = PairwiseEngine::new(&rules, &schema).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IncompatibleField { .. }));
}

#[test]
fn matrix_counts() {
    let catalog = catalog([
        garment("shirt", "top", 3),
        garment("chinos", "bottom", 3),
        garment("sneakers", "shoes", 1),
        garment("tee", "top", 2),
    ]);
    let rules = everyday();
    let engine = PairwiseEngine::new(&rules, catalog.schema()).unwrap();
    let matrix = engine.evaluate_matrix(&catalog).unwrap();

    // shirt-chinos, chinos-tee, sneakers-tee
    assert_eq!(matrix.total_comparisons, 6);
    assert_eq!(matrix.compatible_count, 3);
    assert!((matrix.compatibility_rate - 0.5).abs() < f64::EPSILON);
    assert!(matrix.get("tee", "sneakers").unwrap().compatible);
    assert!(!matrix.get("shirt", "tee").unwrap().compatible);
    assert_eq!(matrix.catalog, "closet");
    assert_eq!(matrix.ruleset, "everyday");
}

#[test]
fn matrix_pairs_in_index_order() {
    let catalog = catalog([
        garment("c", "top", 3),
        garment("a", "bottom", 3),
        garment("b", "shoes", 3),
    ]);
    let rules = everyday();
    let engine = PairwiseEngine::new(&rules, catalog.schema()).unwrap();
    let matrix = engine.evaluate_matrix(&catalog).unwrap();

    let pairs: Vec<(&str, &str)> = matrix
        .results
        .iter()
        .map(|r| (r.item1_id.as_str(), r.item2_id.as_str()))
        .collect();
    assert_eq!(pairs, vec![("c", "a"), ("c", "b"), ("a", "b")]);
}

#[test]
fn missing_optional_field_fails_the_rule() {
    let schema = Arc::new(wardrobe());
    let rules = rules(json!({"name": "x", "rules": [
        {"name": "warm", "condition": {"abs_diff": {"field": "warmth", "operator": "<", "value": 3}}}
    ]}));
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();
    let a = garment("a", "top", 3).with_attribute("warmth", 2);
    let b = garment("b", "top", 3).with_attribute("warmth", 9.5);
    let result = engine.evaluate_pair(&a, &b).unwrap();
    assert!(!result.compatible);

    let c = garment("c", "top", 3);
    let result = engine.evaluate_pair(&a, &c).unwrap();
    assert_eq!(result.rule_evaluations[0].reason, "warmth: missing on c");
}

#[test]
fn partial_matrix_keeps_going() {
    let loose = wardrobe().with_unknown_attributes(consort_catalog::UnknownAttributes::Allow);
    let catalog = Catalog::from_items(
        "loose",
        loose,
        [
            garment("a", "top", 3),
            garment("b", "bottom", 3).with_attribute("fabric", "wool"),
            garment("c", "shoes", 3),
        ],
    )
    .unwrap();

    let strict = wardrobe();
    let rules = everyday();
    let engine = PairwiseEngine::new(&rules, &strict).unwrap();

    assert!(engine.evaluate_matrix(&catalog).unwrap_err().is_schema_validation());

    let partial = engine.evaluate_matrix_partial(&catalog);
    assert!(!partial.is_complete());
    assert_eq!(partial.matrix.total_comparisons, 1);
    assert_eq!(partial.failures.len(), 2);
    assert!(partial.failures.iter().all(|f| f.error.is_schema_validation()));
}

#[test]
fn layering_scenarios() {
    let schema = wardrobe();
    let rules = rules(json!({"name": "layers", "rules": [
        {"name": "layers", "condition": {"layer_compatible": {"field": "coverage"}}}
    ]}));
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();
    let dressed = |id: &str, entries: Vec<CoverageLayer>| -> consort_catalog::Item {
        garment(id, "top", 3).with_attribute("coverage", layers(entries))
    };

    // consistent ordering on every shared part
    let a = dressed("a", vec![CoverageLayer::new(["chest", "upper_leg"], 2.0)]);
    let b = dressed("b", vec![CoverageLayer::new(["chest", "upper_leg"], 1.0)]);
    assert!(engine.is_compatible(&a, &b).unwrap());

    // phasing
    let a = dressed(
        "a",
        vec![CoverageLayer::new(["chest"], 2.0), CoverageLayer::new(["upper_leg"], 1.0)],
    );
    let b = dressed(
        "b",
        vec![CoverageLayer::new(["chest"], 1.0), CoverageLayer::new(["upper_leg"], 2.0)],
    );
    let result = engine.evaluate_pair(&a, &b).unwrap();
    assert!(!result.compatible);
    assert!(result.rule_evaluations[0].reason.contains("phasing violation"));

    // same layer
    let a = dressed("a", vec![CoverageLayer::new(["chest"], 2.0)]);
    let b = dressed("b", vec![CoverageLayer::new(["chest"], 2.0)]);
    let result = engine.evaluate_pair(&a, &b).unwrap();
    assert!(!result.compatible);
    assert!(result.rule_evaluations[0].reason.contains("same-layer stacking"));

    // malformed coverage never reaches the operator
    let bad = garment("bad", "top", 3).with_attribute("coverage", Value::from("chest"));
    assert!(engine.evaluate_pair(&a, &bad).unwrap_err().is_schema_validation());
}
