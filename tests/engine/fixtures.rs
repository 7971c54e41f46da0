//! Shared wardrobe schema and item builders.

use consort_catalog::{
    Catalog, CoverageLayer, Dimension, DimensionKind, Item, ScalarKind, Schema,
};
use consort_engine::{ClusterRuleSet, RuleSet};
use consort_foundation::Value;
use serde_json::Value as JsonValue;

pub fn wardrobe() -> Schema {
    Schema::from_dimensions(
        "wardrobe",
        "1",
        [
            Dimension::required(
                "category",
                DimensionKind::enumeration(["top", "bottom", "shoes", "outer", "accessory"]),
            ),
            Dimension::required("formality", DimensionKind::integer_range(1, 5)),
            Dimension::optional("colors", DimensionKind::list(ScalarKind::String)),
            Dimension::optional("style", DimensionKind::String),
            Dimension::optional("warmth", DimensionKind::float_range(0.0, 10.0)),
            Dimension::optional("coverage", DimensionKind::coverage()),
        ],
    )
    .unwrap()
}

pub fn garment(id: &str, category: &str, formality: i64) -> Item {
    Item::new(id, id)
        .with_attribute("category", category)
        .with_attribute("formality", formality)
}

pub fn layers(entries: Vec<CoverageLayer>) -> Value {
    Value::List(entries.iter().map(CoverageLayer::to_value).collect())
}

pub fn catalog(items: impl IntoIterator<Item = Item>) -> Catalog {
    Catalog::from_items("closet", wardrobe(), items).unwrap()
}

pub fn rules(doc: JsonValue) -> RuleSet {
    RuleSet::from_json(&doc).unwrap()
}

pub fn cluster_rules(doc: JsonValue) -> ClusterRuleSet {
    ClusterRuleSet::from_json(&doc).unwrap()
}
