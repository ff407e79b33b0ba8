//! Rendering of report output into presentation formats.
//!
//! Everything here consumes the generic [`ReportOutput`] table; nothing in
//! the renderers knows which report produced it.

use crate::reports::{ReportOptions, ReportOutput};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// A generated report plus the identity needed to present it.
#[derive(Debug, Clone)]
pub struct ReportDocument<'a> {
    /// Registered report name.
    pub name: &'a str,
    /// One-line report description.
    pub description: &'a str,
    /// Options the report ran with.
    pub options: &'a ReportOptions,
    /// The generated output.
    pub output: &'a ReportOutput,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

/// Render a report as Markdown: heading, summary list, pipe table.
pub fn to_markdown(doc: &ReportDocument<'_>) -> String {
    let mut section = String::new();

    section.push_str(&format!("# Report: {}\n\n", doc.name));
    section.push_str(&format!("{}\n\n", doc.description));

    if let Some(organization) = &doc.options.organization {
        let suffix = if doc.options.include_sub_organizations {
            " (including sub-organizations)"
        } else {
            ""
        };
        section.push_str(&format!("- **Organization:** {}{}\n", organization, suffix));
    } else {
        section.push_str("- **Organization:** all\n");
    }
    section.push_str(&format!(
        "- **Generated:** {}\n\n",
        doc.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    section.push_str("## Summary\n\n");
    for (key, value) in &doc.output.summary {
        section.push_str(&format!("- **{}:** {}\n", key, display_cell(value)));
    }
    section.push('\n');

    section.push_str("## Table\n\n");
    let table = &doc.output.table;
    if table.rows.is_empty() {
        section.push_str("No rows.\n");
        return section;
    }

    let labels: Vec<&str> = table.columns.iter().map(|c| c.label).collect();
    section.push_str(&format!("| {} |\n", labels.join(" | ")));
    section.push_str(&format!("|{}\n", "---|".repeat(labels.len())));
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(display_cell).collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    section
}

/// Render a report as a JSON document.
///
/// The `order` array carries the column sequence; rows are objects keyed by
/// column so consumers do not depend on JSON object ordering.
pub fn to_json(doc: &ReportDocument<'_>) -> Result<String> {
    let table = &doc.output.table;
    let order: Vec<&str> = table.columns.iter().map(|c| c.key).collect();

    let rows: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            for (column, cell) in table.columns.iter().zip(row) {
                object.insert(column.key.to_string(), cell.clone());
            }
            Value::Object(object)
        })
        .collect();

    let mut summary = serde_json::Map::new();
    for (key, value) in &doc.output.summary {
        summary.insert(key.to_string(), value.clone());
    }

    let document = json!({
        "report": doc.name,
        "description": doc.description,
        "options": doc.options,
        "generated_at": doc.generated_at.to_rfc3339(),
        "summary": summary,
        "order": order,
        "table": rows,
    });

    serde_json::to_string_pretty(&document).map_err(Into::into)
}

/// Render the report table as CSV, header first.
pub fn to_csv(doc: &ReportDocument<'_>) -> String {
    let table = &doc.output.table;
    let mut lines = Vec::with_capacity(table.rows.len() + 1);

    let header: Vec<String> = table
        .columns
        .iter()
        .map(|c| csv_escape(c.key))
        .collect();
    lines.push(header.join(","));

    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|cell| csv_escape(&display_cell(cell))).collect();
        lines.push(cells.join(","));
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

/// Flatten a cell value into display text; absent values become empty.
fn display_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
