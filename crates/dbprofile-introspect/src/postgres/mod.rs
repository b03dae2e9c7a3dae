use std::collections::VecDeque;

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres, Row, Transaction};

use dbprofile_core::{
    ColumnValueSource, Error, ExtractOptions, Result, SchemaSource, Value, ValueStream,
};

mod queries;

pub use queries::{quote_ident, value_query};

use queries::db_error;

/// Rows pulled per `fetch` round trip unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Schema and value source for one PostgreSQL schema.
///
/// Each opened stream holds one pooled connection inside a transaction with a
/// server-side cursor, released when the stream is closed.
#[derive(Debug, Clone)]
pub struct PostgresSource {
    pool: PgPool,
    schema: String,
    batch_size: usize,
}

impl PostgresSource {
    /// Create a new source using a pre-configured pool.
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub async fn database_name(&self) -> Result<String> {
        queries::fetch_database_name(&self.pool).await
    }
}

#[async_trait]
impl SchemaSource for PostgresSource {
    fn name(&self) -> &str {
        &self.schema
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        queries::list_tables(&self.pool, &self.schema).await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        queries::list_columns(&self.pool, &self.schema, table).await
    }
}

#[async_trait]
impl ColumnValueSource for PostgresSource {
    type Stream = PostgresStream;

    async fn open(
        &self,
        table: &str,
        column: &str,
        options: &ExtractOptions,
    ) -> Result<Self::Stream> {
        let query = value_query(&self.schema, table, column, options);
        tracing::debug!(event = "cursor_opening", table = %table, column = %column, sql = %query);

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        // A failed declare drops `tx`, which rolls the transaction back.
        tx.run(&queries::declare_cursor(&query)).await?;

        Ok(PostgresStream::new(tx, self.batch_size))
    }
}

/// Transaction a cursor stream issues its statements on.
#[async_trait]
pub trait CursorTransaction: Send {
    /// Run a statement returning one nullable text column.
    async fn fetch_text(&mut self, sql: &str) -> Result<Vec<Option<String>>>;

    /// Run a statement for its side effect.
    async fn run(&mut self, sql: &str) -> Result<()>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

#[async_trait]
impl CursorTransaction for Transaction<'static, Postgres> {
    async fn fetch_text(&mut self, sql: &str) -> Result<Vec<Option<String>>> {
        let rows = (&mut **self)
            .fetch_all(sqlx::raw_sql(sql))
            .await
            .map_err(db_error)?;
        rows.iter()
            .map(|row| row.try_get::<Option<String>, _>(0).map_err(db_error))
            .collect()
    }

    async fn run(&mut self, sql: &str) -> Result<()> {
        (&mut **self)
            .execute(sqlx::raw_sql(sql))
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        Transaction::commit(self).await.map_err(db_error)
    }

    async fn rollback(self) -> Result<()> {
        Transaction::rollback(self).await.map_err(db_error)
    }
}

/// Server-side cursor over one column, read in batches.
///
/// A failed fetch marks the stream so that `close` rolls back instead of
/// closing the cursor and committing.
pub struct PostgresStream<T = Transaction<'static, Postgres>> {
    tx: Option<T>,
    fetch_sql: String,
    batch_size: usize,
    buffer: VecDeque<Option<String>>,
    drained: bool,
    failed: bool,
}

impl<T: CursorTransaction> PostgresStream<T> {
    pub fn new(tx: T, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            tx: Some(tx),
            fetch_sql: queries::fetch_batch(batch_size),
            batch_size,
            buffer: VecDeque::new(),
            drained: false,
            failed: false,
        }
    }

    async fn refill(&mut self) -> Result<()> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| Error::InvalidInput("value stream already closed".to_string()))?;

        match tx.fetch_text(&self.fetch_sql).await {
            Ok(values) => {
                // A short batch means the cursor has no rows left.
                self.drained = values.len() < self.batch_size;
                self.buffer.extend(values);
                Ok(())
            }
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }
}

#[async_trait]
impl<T: CursorTransaction> ValueStream for PostgresStream<T> {
    async fn next(&mut self) -> Result<Option<Value>> {
        if self.buffer.is_empty() && !self.drained {
            self.refill().await?;
        }
        if self.buffer.is_empty() && self.tx.is_none() {
            return Err(Error::InvalidInput("value stream already closed".to_string()));
        }
        Ok(self.buffer.pop_front().map(Value::from))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut tx) = self.tx.take() else {
            return Ok(());
        };
        self.buffer.clear();

        if self.failed {
            return tx.rollback().await;
        }

        if let Err(err) = tx.run(&queries::close_cursor()).await {
            tx.rollback().await?;
            return Err(err);
        }
        tx.commit().await
    }
}
