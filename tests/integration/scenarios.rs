//! End-to-end scenarios, driven by documents.

use consort::catalog::{Catalog, CoverageLayer, Item, Schema};
use consort::engine::{ClusterEngine, ClusterRuleSet, PairwiseEngine, RuleSet, SearchConfig};
use consort::foundation::{ErrorKind, Value};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn schema() -> Schema {
    Schema::from_json(&json!({
        "name": "wardrobe",
        "version": "3",
        "dimensions": [
            {"name": "category", "type": "enum",
             "allowed": ["top", "bottom", "shoes", "outer"], "required": true},
            {"name": "formality", "type": "integer", "min": 1, "max": 5, "required": true},
            {"name": "coverage", "type": "coverage_layers",
             "vocabulary": {"parts": ["chest", "back", "upper_leg", "lower_leg", "feet"]}}
        ]
    }))
    .unwrap()
}

fn item(doc: serde_json::Value) -> Item {
    serde_json::from_value(doc).unwrap()
}

fn layering_rules() -> RuleSet {
    RuleSet::from_json(&json!({"name": "layering", "rules": [
        {"name": "layers", "condition": {"layer_compatible": {"field": "coverage"}}}
    ]}))
    .unwrap()
}

fn covered(id: &str, entries: &[(&str, f64)]) -> Item {
    let layers: Vec<CoverageLayer> = entries
        .iter()
        .map(|&(part, layer)| CoverageLayer::new([part], layer))
        .collect();
    Item::new(id, id)
        .with_attribute("category", "top")
        .with_attribute("formality", 3)
        .with_attribute(
            "coverage",
            Value::List(layers.iter().map(CoverageLayer::to_value).collect()),
        )
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn outer_layer_over_inner_layer_is_compatible() {
    let schema = schema();
    let rules = layering_rules();
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();

    let a = covered("a", &[("chest", 2.0), ("upper_leg", 2.0)]);
    let b = covered("b", &[("chest", 1.0), ("upper_leg", 1.0)]);
    assert!(engine.evaluate_pair(&a, &b).unwrap().compatible);
}

#[test]
fn crossed_layers_are_a_phasing_conflict() {
    let schema = schema();
    let rules = layering_rules();
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();

    let a = covered("a", &[("chest", 2.0), ("upper_leg", 1.0)]);
    let b = covered("b", &[("chest", 1.0), ("upper_leg", 2.0)]);
    let result = engine.evaluate_pair(&a, &b).unwrap();
    assert!(!result.compatible);
    let reason = &result.rule_evaluations[0].reason;
    assert!(reason.contains("phasing violation"));
    assert!(reason.contains("chest"));
    assert!(reason.contains("upper_leg"));
}

#[test]
fn equal_layers_conflict() {
    let schema = schema();
    let rules = layering_rules();
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();

    let a = covered("a", &[("chest", 2.0)]);
    let b = covered("b", &[("chest", 2.0)]);
    assert!(!engine.evaluate_pair(&a, &b).unwrap().compatible);
}

#[test]
fn advisory_vocabulary_does_not_block_evaluation() {
    let schema = schema();
    let rules = layering_rules();
    let engine = PairwiseEngine::new(&rules, &schema).unwrap();

    let a = covered("a", &[("tail", 1.0)]);
    let b = covered("b", &[("chest", 1.0)]);
    assert!(engine.evaluate_pair(&a, &b).unwrap().compatible);
}

// =============================================================================
// Clusters
// =============================================================================

#[test]
fn outfit_search_never_pairs_incompatible_items() {
    let catalog = Catalog::from_items(
        "closet",
        schema(),
        [
            item(json!({"id": "1", "name": "Shirt", "attributes": {"category": "top", "formality": 3}})),
            item(json!({"id": "2", "name": "Trousers", "attributes": {"category": "bottom", "formality": 3}})),
            item(json!({"id": "3", "name": "Loafers", "attributes": {"category": "shoes", "formality": 3}})),
            item(json!({"id": "4", "name": "Chino shorts", "attributes": {"category": "bottom", "formality": 2}})),
        ],
    )
    .unwrap();
    let pairs = RuleSet::from_json(&json!({"name": "pairs", "rules": [
        {"name": "formality", "condition": {"abs_diff": {"field": "formality", "operator": "<=", "value": 1}}},
        {"name": "one per slot", "condition": {"has_different": {"field": "category"}}}
    ]}))
    .unwrap();
    let outfits = ClusterRuleSet::from_json(&json!({"name": "outfits", "rules": [
        {"name": "variety", "condition":
            {"count_by_field": {"field": "category", "operator": ">=", "value": 3}}}
    ]}))
    .unwrap();

    let engine = ClusterEngine::new(&catalog, &pairs, &outfits).unwrap();
    let graph = engine.compatibility_graph().unwrap();
    assert_eq!(graph.edge_count(), 5);

    let analysis = engine.analyze().unwrap();
    let ids = |c: &consort::engine::Cluster| -> Vec<String> {
        c.item_ids.iter().map(ToString::to_string).collect()
    };

    let maximal: Vec<Vec<String>> = analysis
        .clusters
        .iter()
        .filter(|c| c.is_maximum && c.is_valid)
        .map(ids)
        .collect();
    assert!(maximal.contains(&vec!["1".into(), "2".into(), "3".into()]));
    assert!(maximal.contains(&vec!["1".into(), "3".into(), "4".into()]));
    assert!(
        analysis
            .clusters
            .iter()
            .all(|c| !(c.contains("2") && c.contains("4")))
    );
}

#[test]
fn empty_catalog_matrix_is_zero() {
    let catalog = Catalog::new("empty", schema());
    let rules = layering_rules();
    let engine = PairwiseEngine::new(&rules, catalog.schema()).unwrap();
    let matrix = engine.evaluate_matrix(&catalog).unwrap();

    assert_eq!(matrix.total_comparisons, 0);
    assert_eq!(matrix.compatible_count, 0);
    assert!(matrix.compatibility_rate.abs() < f64::EPSILON);
    assert!(!matrix.compatibility_rate.is_nan());
}

#[test]
fn inverted_bounds_are_configuration_errors() {
    let err = ClusterRuleSet::from_json(&json!({
        "name": "broken", "min_cluster_size": 3, "max_cluster_size": 2, "rules": []
    }))
    .unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err.kind, ErrorKind::InvalidClusterBounds { min: 3, max: 2 }));

    let catalog = Catalog::new("empty", schema());
    let pairs = layering_rules();
    let rules = ClusterRuleSet::new("ok");
    let engine = ClusterEngine::new(&catalog, &pairs, &rules)
        .unwrap()
        .with_config(SearchConfig::new().with_min_cluster_size(3).with_max_cluster_size(2));
    assert!(engine.analyze().unwrap_err().is_configuration());
}
