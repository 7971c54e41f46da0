//! Integration tests for catalogs

use std::sync::Arc;

use consort_catalog::{Catalog, Dimension, DimensionKind, Item, ItemId, Schema};
use consort_foundation::ErrorKind;
use serde_json::json;

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::from_dimensions(
            "wardrobe",
            "1",
            [
                Dimension::required("category", DimensionKind::String),
                Dimension::required("formality", DimensionKind::integer_range(1, 5)),
            ],
        )
        .unwrap(),
    )
}

fn item(id: &str, formality: i64) -> Item {
    Item::new(id, id.to_uppercase())
        .with_attribute("category", "top")
        .with_attribute("formality", formality)
}

#[test]
fn catalogs_share_a_schema() {
    let schema = schema();
    let a = Catalog::new("a", Arc::clone(&schema));
    let b = Catalog::from_items("b", Arc::clone(&schema), [item("x", 1)]).unwrap();
    assert!(Arc::ptr_eq(&a.schema_arc(), &b.schema_arc()));
    assert!(a.is_empty());
    assert_eq!(b.name(), "b");
}

#[test]
fn with_item_fails_fast() {
    let catalog = Catalog::new("c", schema()).with_item(item("a", 2)).unwrap();
    let err = catalog.clone().with_item(item("b", 0)).unwrap_err();
    assert!(err.is_schema_validation());

    let err = catalog.with_item(item("a", 3)).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err.kind, ErrorKind::DuplicateItem(_)));
}

#[test]
fn partial_build_skips_and_continues() {
    let (catalog, rejections) =
        Catalog::from_items_partial("c", schema(), [item("a", 1), item("b", 9), item("c", 5)]);

    let ids: Vec<&str> = catalog.items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(catalog.index_of("c"), Some(1));
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].item_id, ItemId::from("b"));
}

#[test]
fn require_reports_unknown_id() {
    let catalog = Catalog::from_items("c", schema(), [item("a", 1)]).unwrap();
    assert_eq!(catalog.require("a").unwrap().name, "A");
    assert!(matches!(
        catalog.require("b").unwrap_err().kind,
        ErrorKind::UnknownItem(ref id) if id == "b"
    ));
}

#[test]
fn items_deserialize_from_documents() {
    let item: Item = serde_json::from_value(json!({
        "id": "loafer",
        "name": "Penny loafer",
        "attributes": {"category": "shoes", "formality": 4},
        "metadata": {"sku": "PL-9"}
    }))
    .unwrap();

    assert_eq!(item.id.as_str(), "loafer");
    assert!(schema().validate(&item).is_ok());
    assert!(item.metadata.contains_key("sku"));
}

#[test]
fn metadata_is_never_validated() {
    let tagged = item("a", 2).with_metadata("anything", vec![1i64, 2, 3]);
    assert!(schema().validate(&tagged).is_ok());
}
