use dbprofile_core::Base;

use crate::metrics::ColumnMetrics;
use crate::summary::ProfileSummary;

/// Render a deterministic markdown report for a profiled schema.
pub fn render_report(base: &Base<ColumnMetrics>, summary: &ProfileSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("# Profile of `{}`", base.name));
    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(format!("- tables: {}", summary.tables));
    lines.push(format!("- columns: {}", summary.columns));
    lines.push(format!("- values: {}", summary.values));
    lines.push(format!(
        "- nulls: {} ({:.1}%)",
        summary.nulls,
        summary.null_ratio * 100.0
    ));
    lines.push(format!("- empties: {}", summary.empties));
    lines.push(String::new());

    for table in &base.tables {
        lines.push(format!("## {}", table.name));
        lines.push("| column | count | null | empty | distinct | length | samples |".to_string());
        lines.push("| --- | --- | --- | --- | --- | --- | --- |".to_string());
        for column in &table.columns {
            let metric = &column.metric;
            let distinct = metric
                .distinct
                .map(|value| value.to_string())
                .unwrap_or_else(|| "-".to_string());
            let length = match (metric.min_length, metric.max_length) {
                (Some(min), Some(max)) => format!("{min}..{max}"),
                _ => "-".to_string(),
            };
            lines.push(format!(
                "| {} | {} | {} ({:.1}%) | {} | {} | {} | {} |",
                column.name,
                metric.count,
                metric.null,
                metric.null_ratio() * 100.0,
                metric.empty,
                distinct,
                length,
                escape_cell(&metric.samples.join(", "))
            ));
        }
        lines.push(String::new());
    }

    if !summary.all_null_columns.is_empty() || !summary.valueless_columns.is_empty() {
        lines.push("## Findings".to_string());
        for path in &summary.all_null_columns {
            lines.push(format!("- {path}: every value is null."));
        }
        for path in &summary.valueless_columns {
            lines.push(format!("- {path}: no values."));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
