use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Statistics for one column's value stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMetrics {
    /// Every value observed, nulls included.
    pub count: u64,
    pub null: u64,
    /// Empty text or binary values.
    pub empty: u64,
    /// Distinct non-null values, only computed when distinct counting is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// First distinct non-null, non-empty values, rendered as text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
}

impl ColumnMetrics {
    /// Non-null values.
    pub fn present(&self) -> u64 {
        self.count - self.null
    }

    /// True when the column had values and all of them were null.
    pub fn is_all_null(&self) -> bool {
        self.count > 0 && self.present() == 0
    }

    /// Share of null values, `0.0` for a column without values.
    pub fn null_ratio(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.null as f64 / self.count as f64
        }
    }
}
