//! Result rendering for the CLI.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use affinity_core::{RecommendedItem, SimilarUser};

/// One ranked result, whatever was ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Rank, starting at 1.
    pub rank: usize,
    /// User or item id.
    pub id: String,
    /// Final score.
    pub score: f64,
}

pub fn item_rows(items: &[RecommendedItem]) -> Vec<Row> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| Row {
            rank: idx + 1,
            id: item.item_id().to_string(),
            score: item.value,
        })
        .collect()
}

pub fn user_rows(users: &[SimilarUser]) -> Vec<Row> {
    users
        .iter()
        .enumerate()
        .map(|(idx, user)| Row {
            rank: idx + 1,
            id: user.user.id().to_string(),
            score: user.similarity,
        })
        .collect()
}

/// Renders `rows` as a table, or as JSON when `format` is `json`.
pub fn render(rows: &[Row], id_header: &str, format: &str) -> anyhow::Result<String> {
    if format.eq_ignore_ascii_case("json") {
        return Ok(serde_json::to_string_pretty(rows)?);
    }
    if rows.is_empty() {
        return Ok("No results.".dimmed().to_string());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["#", id_header, "score"]
            .iter()
            .map(|c| Cell::new(c).fg(Color::Cyan)),
    );
    for row in rows {
        table.add_row(vec![
            Cell::new(row.rank),
            Cell::new(&row.id),
            Cell::new(format!("{:.6}", row.score)),
        ]);
    }
    Ok(table.to_string())
}

/// Renders a single estimate.
pub fn render_estimate(user: &str, item: &str, value: f64, format: &str) -> anyhow::Result<String> {
    if format.eq_ignore_ascii_case("json") {
        let json = serde_json::json!({ "user": user, "item": item, "estimate": value });
        return Ok(serde_json::to_string_pretty(&json)?);
    }
    if value.is_nan() {
        return Ok(format!("{user} -> {item}: {}", "no estimate".yellow()));
    }
    Ok(format!("{user} -> {item}: {value:.6}"))
}
