//! Integration tests for condition trees

use consort_engine::{Condition, OperatorRegistry, PairBinding, PairwiseCondition, PairwiseOperator};
use consort_foundation::ErrorKind;
use serde_json::{Value as JsonValue, json};

use crate::fixtures::{garment, wardrobe};

fn parse(doc: JsonValue) -> consort_foundation::Result<PairwiseCondition> {
    PairwiseCondition::parse(&doc, &OperatorRegistry::standard())
}

#[test]
fn nested_document() {
    let condition = parse(json!({"all": [
        {"has_different": {"field": "category"}},
        {"any": [
            {"formality_compatible": {"field": "formality"}},
            {"not": {"equals": {"field": "style"}}}
        ]}
    ]}))
    .unwrap();

    assert_eq!(condition.leaf_count(), 3);
    assert_eq!(condition.depth(), 4);
    assert_eq!(
        condition.fields().into_iter().collect::<Vec<_>>(),
        vec!["category", "formality", "style"]
    );
    assert!(condition.check_schema(&wardrobe()).is_ok());
}

#[test]
fn display_reads_like_the_document() {
    let condition = parse(json!({"all": [
        {"equals": {"field": "category"}},
        {"not": {"has_value": {"field": "style", "value": "grunge"}}}
    ]}))
    .unwrap();
    assert_eq!(
        condition.to_string(),
        "all(equals(category), not(has_value(style = grunge)))"
    );
}

#[test]
fn malformed_documents() {
    for doc in [
        json!("equals"),
        json!({}),
        json!({"all": [], "any": []}),
        json!({"all": {"equals": {"field": "category"}}}),
        json!({"any": "nope"}),
    ] {
        let err = parse(doc.clone()).unwrap_err();
        assert!(err.is_configuration(), "{doc}");
        assert!(matches!(err.kind, ErrorKind::MalformedCondition(_)), "{doc}");
    }
}

#[test]
fn errors_locate_the_node() {
    let err = parse(json!({"all": [
        {"equals": {"field": "category"}},
        {"not": {"any": [{"teleport": {}}]}}
    ]}))
    .unwrap_err();
    let ctx = err.context.unwrap();
    assert_eq!(ctx.stack, vec!["all[1]", "not", "any[0]"]);
    assert_eq!(ctx.operator.as_deref(), Some("teleport"));
}

#[test]
fn cluster_operator_in_pairwise_rule() {
    let err = parse(json!({"unique_values": {"field": "category"}})).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("cluster"));
}

#[test]
fn short_circuit_reasons() {
    let a = garment("a", "top", 1);
    let b = garment("b", "top", 5);
    let binding = PairBinding::new(&a, &b);

    let all = parse(json!({"all": [
        {"formality_compatible": {"field": "formality"}},
        {"equals": {"field": "category"}}
    ]}))
    .unwrap();
    let outcome = all.evaluate(&binding).unwrap();
    assert!(!outcome.passed);
    assert!(outcome.reason.starts_with("formality:"));

    let any = parse(json!({"any": [
        {"has_different": {"field": "category"}},
        {"formality_compatible": {"field": "formality"}}
    ]}))
    .unwrap();
    let outcome = any.evaluate(&binding).unwrap();
    assert!(!outcome.passed);
    assert_eq!(outcome.reason.matches("; ").count(), 1);
}

#[test]
fn not_wraps_reason() {
    let a = garment("a", "top", 3);
    let b = garment("b", "top", 3);
    let outcome = parse(json!({"not": {"equals": {"field": "category"}}}))
        .unwrap()
        .evaluate(&PairBinding::new(&a, &b))
        .unwrap();
    assert!(!outcome.passed);
    assert_eq!(outcome.reason, "not (category: both top)");
}

#[test]
fn empty_groups() {
    let a = garment("a", "top", 3);
    let b = garment("b", "top", 3);
    let binding = PairBinding::new(&a, &b);

    let all: Condition<PairwiseOperator> = Condition::all([]);
    let any: Condition<PairwiseOperator> = Condition::any([]);
    assert!(all.evaluate(&binding).unwrap().passed);
    assert!(!any.evaluate(&binding).unwrap().passed);
}
