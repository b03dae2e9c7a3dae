use std::time::Instant;

use crate::accumulator::{ColumnFold, MetricAccumulator};
use crate::assembler::ReportAssembler;
use crate::cursor::TableColumnCursor;
use crate::error::{Error, ProfileError};
use crate::report::Base;
use crate::sink::ReportSink;
use crate::source::{ColumnValueSource, ExtractOptions, SchemaSource, ValueStream};

/// Drives a full profiling run: traversal, per-column accumulation and report assembly.
///
/// Columns are processed strictly one after another. Each value stream is
/// closed before the cursor moves on, so at most one stream is open at a time.
/// Any schema, extraction or accumulation failure aborts the run and the
/// partially assembled report is dropped.
pub struct Profiler<'a, S: ?Sized, V: ?Sized, A> {
    schema: &'a S,
    values: &'a V,
    accumulator: &'a A,
    options: ExtractOptions,
}

impl<'a, S, V, A> Profiler<'a, S, V, A>
where
    S: SchemaSource + ?Sized,
    V: ColumnValueSource + ?Sized,
    A: MetricAccumulator,
{
    pub fn new(schema: &'a S, values: &'a V, accumulator: &'a A, options: ExtractOptions) -> Self {
        Self {
            schema,
            values,
            accumulator,
            options,
        }
    }

    /// Profiles every column and returns the finished report.
    pub async fn run(&self) -> Result<Base<A::Metric>, ProfileError> {
        let started = Instant::now();
        let name = self.schema.name();
        tracing::info!(event = "profile_started", schema = %name);

        let mut cursor = TableColumnCursor::open(self.schema).await?;
        let mut assembler = ReportAssembler::new(name);

        while cursor.advance().await? {
            let (table, column) = cursor.current()?;
            let metric = self.profile_column(table, column).await?;
            assembler.push(table, column, metric);
            tracing::debug!(event = "column_profiled", table = %table, column = %column);
        }

        tracing::info!(
            event = "profile_finished",
            schema = %name,
            tables_listed = cursor.tables().len(),
            tables = assembler.table_count(),
            columns = assembler.column_count(),
            duration_ms = started.elapsed().as_millis() as u64
        );

        Ok(assembler.finish())
    }

    /// Profiles every column, then hands the report to `sink` exactly once.
    ///
    /// Nothing is written when the traversal fails.
    pub async fn run_to<K>(&self, sink: &K) -> Result<Base<A::Metric>, ProfileError>
    where
        K: ReportSink<A::Metric> + ?Sized,
    {
        let base = self.run().await?;
        sink.write(&base).map_err(|source| {
            tracing::error!(event = "report_write_failed", error = %source);
            ProfileError::Sink { source }
        })?;
        tracing::info!(event = "report_written", schema = %base.name);
        Ok(base)
    }

    async fn profile_column(&self, table: &str, column: &str) -> Result<A::Metric, ProfileError> {
        let mut stream = self
            .values
            .open(table, column, &self.options)
            .await
            .map_err(|source| extraction(table, column, source))?;

        let mut fold = self.accumulator.start(table, column);
        let drained = drain(&mut stream, &mut fold, table, column).await;
        let closed = stream.close().await;

        match (drained, closed) {
            (Ok(()), Ok(())) => {}
            (Ok(()), Err(source)) => return Err(extraction(table, column, source)),
            (Err(err), Ok(())) => return Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(
                    event = "stream_close_failed",
                    table = %table,
                    column = %column,
                    error = %close_err
                );
                return Err(err);
            }
        }

        fold.finish().map_err(|source| accumulation(table, column, source))
    }
}

async fn drain<T, F>(
    stream: &mut T,
    fold: &mut F,
    table: &str,
    column: &str,
) -> Result<(), ProfileError>
where
    T: ValueStream + ?Sized,
    F: ColumnFold,
{
    loop {
        match stream.next().await {
            Ok(Some(value)) => fold
                .push(value)
                .map_err(|source| accumulation(table, column, source))?,
            Ok(None) => return Ok(()),
            Err(source) => return Err(extraction(table, column, source)),
        }
    }
}

fn extraction(table: &str, column: &str, source: Error) -> ProfileError {
    ProfileError::Extraction {
        table: table.to_string(),
        column: column.to_string(),
        source,
    }
}

fn accumulation(table: &str, column: &str, source: Error) -> ProfileError {
    ProfileError::Accumulation {
        table: table.to_string(),
        column: column.to_string(),
        source,
    }
}
