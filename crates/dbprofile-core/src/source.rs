use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value::Value;

/// Extraction options passed through unchanged to a [`ColumnValueSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Maximum number of rows to stream. `None` and `Some(0)` mean unlimited.
    pub limit: Option<u64>,
    /// Opaque row predicate, interpreted only by the source.
    pub filter: Option<String>,
    /// Allow the source to deduplicate values before they are counted.
    pub distinct: bool,
}

impl ExtractOptions {
    /// Effective row limit, with zero normalized to unlimited.
    pub fn row_limit(&self) -> Option<u64> {
        self.limit.filter(|limit| *limit > 0)
    }
}

/// Lists the tables of a schema and the columns of each table.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Identifier used as the top-level report name.
    fn name(&self) -> &str;

    /// Tables in visitation order.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Columns of `table` in visitation order. An empty list marks an empty table.
    async fn list_columns(&self, table: &str) -> Result<Vec<String>>;
}

/// Opens value streams for individual columns.
#[async_trait]
pub trait ColumnValueSource: Send + Sync {
    type Stream: ValueStream;

    async fn open(&self, table: &str, column: &str, options: &ExtractOptions)
        -> Result<Self::Stream>;
}

/// Pull-based stream over the values of one column.
#[async_trait]
pub trait ValueStream: Send {
    /// Next value, or `Ok(None)` at the end of the stream. An error is terminal.
    async fn next(&mut self) -> Result<Option<Value>>;

    /// Releases whatever the stream holds. Called exactly once per opened stream.
    async fn close(&mut self) -> Result<()>;
}
