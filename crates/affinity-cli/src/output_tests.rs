//! Tests for output rendering

use std::sync::Arc;

use affinity_core::{Item, RecommendedItem};

use crate::output::*;

fn items() -> Vec<RecommendedItem> {
    vec![
        RecommendedItem {
            item: Arc::new(Item::new("b")),
            value: 4.5,
        },
        RecommendedItem {
            item: Arc::new(Item::new("a")),
            value: 3.25,
        },
    ]
}

#[test]
fn test_item_rows_are_ranked_in_order() {
    let rows = item_rows(&items());

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].rank, rows[0].id.as_str()), (1, "b"));
    assert_eq!((rows[1].rank, rows[1].id.as_str()), (2, "a"));
}

#[test]
fn test_render_json() {
    // Arrange
    let rows = item_rows(&items());

    // Act
    let json = render(&rows, "item", "json").expect("render");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");

    // Assert
    assert_eq!(parsed[0]["id"], "b");
    assert_eq!(parsed[1]["score"], 3.25);
}

#[test]
fn test_render_table_contains_ids() {
    let rows = item_rows(&items());

    let table = render(&rows, "item", "table").expect("render");

    assert!(table.contains("item"));
    assert!(table.contains("4.500000"));
    assert!(table.contains('a'));
}

#[test]
fn test_render_empty_json_is_array() {
    let json = render(&[], "item", "json").expect("render");

    assert_eq!(json, "[]");
}

#[test]
fn test_render_nan_estimate() {
    colored::control::set_override(false);

    let text = render_estimate("u1", "i9", f64::NAN, "text").expect("render");

    assert_eq!(text, "u1 -> i9: no estimate");
}
