use serde::{Deserialize, Serialize};

use crate::source::ExtractOptions;

/// Number of example values kept per column unless configured otherwise.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Settings for a profiling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Example values retained per column.
    pub sample_size: usize,
    /// Count distinct values and let sources deduplicate.
    pub distinct: bool,
    /// Row limit per column; zero or absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Row filter handed to the value source as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            distinct: false,
            limit: None,
            filter: None,
        }
    }
}

impl ProfileConfig {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            limit: self.limit,
            filter: self.filter.clone(),
            distinct: self.distinct,
        }
    }
}
