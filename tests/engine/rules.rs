//! Integration tests for rule sets and their documents

use consort_engine::{ClusterRuleSet, ClusterRuleSetDecl, RuleSet, RuleSetDecl};
use consort_foundation::ErrorKind;
use serde_json::json;

use crate::fixtures::{cluster_rules, rules, wardrobe};

#[test]
fn pairwise_document() {
    let set = rules(json!({"name": "everyday", "rules": [
        {"name": "formality", "description": "no black tie with flip-flops",
         "condition": {"formality_compatible": {"field": "formality", "threshold": 1}}},
        {"name": "categories", "condition": {"has_different": {"field": "category"}}}
    ]}));

    assert_eq!(set.name(), "everyday");
    assert_eq!(set.rules().len(), 2);
    assert_eq!(
        set.rules()[0].description.as_deref(),
        Some("no black tie with flip-flops")
    );
    assert!(set.bind(&wardrobe()).is_ok());
}

#[test]
fn decl_round_trip() {
    let doc = json!({"name": "everyday", "rules": [
        {"name": "categories", "condition": {"has_different": {"field": "category"}}}
    ]});
    let decl: RuleSetDecl = serde_json::from_value(doc.clone()).unwrap();
    assert_eq!(serde_json::to_value(&decl).unwrap(), doc);
    assert_eq!(RuleSet::compile(&decl).unwrap().rules().len(), 1);
}

#[test]
fn unknown_document_keys_are_rejected() {
    let err = RuleSet::from_json(&json!({"name": "x", "rules": [], "priority": 1})).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn duplicate_rule_names() {
    let err = RuleSet::from_json(&json!({"name": "x", "rules": [
        {"name": "r", "condition": {"equals": {"field": "category"}}},
        {"name": "r", "condition": {"equals": {"field": "style"}}}
    ]}))
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateRule(ref n) if n == "r"));
}

#[test]
fn compile_errors_name_the_rule() {
    let err = RuleSet::from_json(&json!({"name": "x", "rules": [
        {"name": "broken", "condition": {"abs_diff": {"field": "formality"}}}
    ]}))
    .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.context.unwrap().rule.as_deref(), Some("broken"));
}

#[test]
fn bind_rejects_undeclared_field() {
    let set = rules(json!({"name": "x", "rules": [
        {"name": "fabric", "condition": {"equals": {"field": "fabric"}}}
    ]}));
    let err = set.bind(&wardrobe()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownField { .. }));
}

#[test]
fn cluster_document_with_bounds() {
    let set = cluster_rules(json!({
        "name": "outfits",
        "min_cluster_size": 3,
        "max_cluster_size": 5,
        "rules": [{"name": "distinct", "condition": {"unique_values": {"field": "category"}}}]
    }));
    assert_eq!(set.min_cluster_size(), Some(3));
    assert_eq!(set.max_cluster_size(), Some(5));
    assert!(set.bind(&wardrobe()).is_ok());
}

#[test]
fn inverted_bounds_fail_to_compile() {
    let decl: ClusterRuleSetDecl = serde_json::from_value(json!({
        "name": "outfits", "min_cluster_size": 3, "max_cluster_size": 2
    }))
    .unwrap();
    let err = ClusterRuleSet::compile(&decl).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidClusterBounds { min: 3, max: 2 }));

    let built = ClusterRuleSet::new("outfits")
        .with_min_cluster_size(3)
        .with_max_cluster_size(2);
    assert!(built.check_bounds().unwrap_err().is_configuration());
}
