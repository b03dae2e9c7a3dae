use schemars::schema::RootSchema;
use schemars::schema_for;

use dbprofile_core::Base;

use crate::metrics::ColumnMetrics;

/// Emit the JSON Schema for `report.json`.
pub fn report_json_schema() -> RootSchema {
    schema_for!(Base<ColumnMetrics>)
}
