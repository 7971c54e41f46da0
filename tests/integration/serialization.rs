//! Serialization of analysis results.

use consort::catalog::{Catalog, Dimension, DimensionKind, Item, Schema};
use consort::engine::{
    ClusterAnalysis, ClusterEngine, ClusterRuleSet, EvaluationMatrix, FixedClock, PairwiseEngine,
    RuleSet,
};
use serde_json::json;

fn closet() -> Catalog {
    let schema = Schema::from_dimensions(
        "wardrobe",
        "1",
        [
            Dimension::required("category", DimensionKind::String),
            Dimension::required("formality", DimensionKind::integer_range(1, 5)),
        ],
    )
    .unwrap();
    let items = [("shirt", "top", 3), ("chinos", "bottom", 3), ("loafers", "shoes", 4), ("tee", "top", 2)]
        .into_iter()
        .map(|(id, category, formality)| {
            Item::new(id, id)
                .with_attribute("category", category)
                .with_attribute("formality", formality)
        });
    Catalog::from_items("closet", schema, items).unwrap()
}

fn pairs() -> RuleSet {
    RuleSet::from_json(&json!({"name": "pairs", "rules": [
        {"name": "formality", "condition": {"formality_compatible": {"field": "formality"}}},
        {"name": "categories", "condition": {"has_different": {"field": "category"}}}
    ]}))
    .unwrap()
}

#[test]
fn cluster_analysis_messagepack_round_trip() {
    let catalog = closet();
    let pairs = pairs();
    let rules = ClusterRuleSet::new("any");
    let analysis = ClusterEngine::new(&catalog, &pairs, &rules)
        .unwrap()
        .analyze()
        .unwrap();
    assert!(analysis.total_clusters > 0);

    let bytes = rmp_serde::to_vec_named(&analysis).unwrap();
    let back: ClusterAnalysis = rmp_serde::from_slice(&bytes).unwrap();
    assert_eq!(back, analysis);
}

#[test]
fn matrix_json_shape() {
    let catalog = closet();
    let pairs = pairs();
    let engine = PairwiseEngine::new(&pairs, catalog.schema())
        .unwrap()
        .with_clock(FixedClock(1_000));
    let matrix = engine.evaluate_matrix(&catalog).unwrap();

    let doc = serde_json::to_value(&matrix).unwrap();
    assert_eq!(doc["catalog"], "closet");
    assert_eq!(doc["total_comparisons"], 6);
    assert_eq!(doc["results"][0]["item1_id"], "shirt");
    assert_eq!(doc["results"][0]["item2_id"], "chinos");
    assert_eq!(doc["results"][0]["timestamp"], 1_000);
    assert_eq!(doc["results"][0]["rule_evaluations"][1]["rule_name"], "categories");

    let back: EvaluationMatrix = serde_json::from_value(doc).unwrap();
    assert_eq!(back, matrix);
}

#[test]
fn relationship_types_are_snake_case() {
    let catalog = closet();
    let pairs = pairs();
    let rules = ClusterRuleSet::new("any");
    let analysis = ClusterEngine::new(&catalog, &pairs, &rules)
        .unwrap()
        .analyze()
        .unwrap();

    let doc = serde_json::to_value(&analysis).unwrap();
    let types: Vec<&str> = doc["relationships"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["relationship_type"].as_str())
        .collect();
    assert!(!types.is_empty());
    assert!(types.iter().all(|t| ["subset", "superset", "overlap"].contains(t)));
}
