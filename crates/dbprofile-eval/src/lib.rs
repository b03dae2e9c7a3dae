//! Column statistics for dbprofile reports.

pub mod metrics;
pub mod report;
pub mod schema;
pub mod stats;
pub mod summary;

pub use metrics::ColumnMetrics;
pub use report::render_report;
pub use schema::report_json_schema;
pub use stats::{StatsAccumulator, StatsFold};
pub use summary::{ProfileSummary, summarize_report};
