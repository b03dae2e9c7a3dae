use serde::{Deserialize, Serialize};

use dbprofile_core::{Base, REPORT_VERSION};

use crate::metrics::ColumnMetrics;

/// Roll-up of a profiling report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub report_version: String,
    pub schema: String,
    pub tables: usize,
    pub columns: usize,
    pub values: u64,
    pub nulls: u64,
    pub empties: u64,
    pub null_ratio: f64,
    /// `table.column` entries whose every value was null.
    pub all_null_columns: Vec<String>,
    /// `table.column` entries that yielded no values at all.
    pub valueless_columns: Vec<String>,
}

/// Collect summary figures for a finished report.
pub fn summarize_report(base: &Base<ColumnMetrics>) -> ProfileSummary {
    let mut summary = ProfileSummary {
        report_version: REPORT_VERSION.to_string(),
        schema: base.name.clone(),
        tables: base.tables.len(),
        columns: 0,
        values: 0,
        nulls: 0,
        empties: 0,
        null_ratio: 0.0,
        all_null_columns: Vec::new(),
        valueless_columns: Vec::new(),
    };

    for table in &base.tables {
        for column in &table.columns {
            let metric = &column.metric;
            summary.columns += 1;
            summary.values += metric.count;
            summary.nulls += metric.null;
            summary.empties += metric.empty;

            let path = format!("{}.{}", table.name, column.name);
            if metric.count == 0 {
                summary.valueless_columns.push(path);
            } else if metric.is_all_null() {
                summary.all_null_columns.push(path);
            }
        }
    }

    summary.null_ratio = if summary.values > 0 {
        summary.nulls as f64 / summary.values as f64
    } else {
        0.0
    };

    summary
}
