use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Finished profiling report for one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Base<M> {
    /// Schema identifier reported by the schema source.
    pub name: String,
    /// Tables with at least one column, in schema source order.
    pub tables: Vec<Table<M>>,
}

/// Per-table group of column metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table<M> {
    pub name: String,
    pub columns: Vec<Column<M>>,
}

/// Metric record for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Column<M> {
    pub name: String,
    pub metric: M,
}

impl<M> Base<M> {
    pub fn table(&self, name: &str) -> Option<&Table<M>> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Total number of column entries across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }

    pub fn metric(&self, table: &str, column: &str) -> Option<&M> {
        self.table(table)?.column(column).map(|column| &column.metric)
    }
}

impl<M> Table<M> {
    pub fn column(&self, name: &str) -> Option<&Column<M>> {
        self.columns.iter().find(|column| column.name == name)
    }
}
