//! Integration tests for Error
//!
//! Tests categories, context rendering, and frame ordering.

use consort_foundation::{Error, ErrorCategory, ErrorContext, ErrorKind, Type, Violation};

#[test]
fn categories() {
    assert_eq!(Error::unknown_operator("x").category(), ErrorCategory::Configuration);
    assert_eq!(Error::malformed_condition("x").category(), ErrorCategory::Configuration);
    assert_eq!(Error::invalid_cluster_bounds(3, 2).category(), ErrorCategory::Configuration);
    assert_eq!(
        Error::schema_violation("color", Violation::Missing).category(),
        ErrorCategory::SchemaValidation
    );
    assert_eq!(Error::empty_item_set("unique_values").category(), ErrorCategory::Evaluation);
    assert_eq!(
        Error::new(ErrorKind::MissingField { field: "formality".into() }).category(),
        ErrorCategory::Evaluation
    );
}

#[test]
fn type_mismatch_message() {
    let err = Error::type_mismatch("formality", Type::Int, Type::String);
    assert_eq!(
        err.to_string(),
        "type mismatch on field formality: expected int, got string"
    );
}

#[test]
fn pair_context_keeps_innermost() {
    let err = Error::empty_item_set("count_by_field")
        .with_pair("a", "b")
        .with_pair("c", "d");
    let ctx = err.context.unwrap();
    assert_eq!(ctx.item.as_deref(), Some("a"));
    assert_eq!(ctx.other_item.as_deref(), Some("b"));
}

#[test]
fn explicit_context() {
    let ctx = ErrorContext::new()
        .with_item("coat")
        .with_rule("layers")
        .with_frame("all[1]")
        .with_frame("not");
    let err = Error::unknown_field("coverage").with_context(ctx);
    let msg = err.to_string();
    assert!(msg.contains("item coat"));
    assert!(msg.contains("rule layers"));
    assert!(msg.contains("at all[1] > not"));
}

#[test]
fn violation_messages() {
    let not_allowed = Violation::NotAllowed {
        value: "cape".into(),
        allowed: vec!["top".into(), "bottom".into()],
    };
    assert_eq!(not_allowed.to_string(), "\"cape\" is not one of [top, bottom]");
    assert_eq!(
        Violation::UnknownPart { part: "tail".into() }.to_string(),
        "unknown coverage part \"tail\""
    );
}
