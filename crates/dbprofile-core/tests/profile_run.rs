use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dbprofile_core::{
    Base, ColumnFold, ColumnValueSource, Error, ErrorKind, ExtractOptions, MemorySink,
    MemorySource, MemoryStream, MetricAccumulator, ProfileError, Profiler, ReportSink, Result,
    SchemaSource, Value, ValueStream,
};

#[derive(Default)]
struct Counters {
    list_tables: AtomicUsize,
    list_columns: AtomicUsize,
    open_now: AtomicUsize,
    max_open: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Wraps a [`MemorySource`] and records how it is used.
struct TrackedSource {
    inner: MemorySource,
    counters: Arc<Counters>,
    fail_read: Option<(&'static str, &'static str, usize)>,
    fail_close: bool,
}

impl TrackedSource {
    fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            counters: Arc::new(Counters::default()),
            fail_read: None,
            fail_close: false,
        }
    }
}

#[async_trait]
impl SchemaSource for TrackedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.counters.list_tables.fetch_add(1, Ordering::SeqCst);
        self.inner.list_tables().await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        self.counters.list_columns.fetch_add(1, Ordering::SeqCst);
        self.inner.list_columns(table).await
    }
}

#[async_trait]
impl ColumnValueSource for TrackedSource {
    type Stream = TrackedStream;

    async fn open(
        &self,
        table: &str,
        column: &str,
        options: &ExtractOptions,
    ) -> Result<Self::Stream> {
        let inner = self.inner.open(table, column, options).await?;
        let now = self.counters.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_open.fetch_max(now, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        let fail_at = self
            .fail_read
            .filter(|(t, c, _)| *t == table && *c == column)
            .map(|(_, _, index)| index);

        Ok(TrackedStream {
            inner,
            read: 0,
            fail_at,
            fail_close: self.fail_close,
            counters: Arc::clone(&self.counters),
        })
    }
}

struct TrackedStream {
    inner: MemoryStream,
    read: usize,
    fail_at: Option<usize>,
    fail_close: bool,
    counters: Arc<Counters>,
}

#[async_trait]
impl ValueStream for TrackedStream {
    async fn next(&mut self) -> Result<Option<Value>> {
        if self.fail_at == Some(self.read) {
            return Err(Error::Db("connection reset".to_string()));
        }
        self.read += 1;
        self.inner.next().await
    }

    async fn close(&mut self) -> Result<()> {
        self.counters.open_now.fetch_sub(1, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(Error::Db("close failed".to_string()));
        }
        self.inner.close().await
    }
}

/// Counts values and rejects the text value `"bad"`.
struct CountAccumulator;

struct CountFold(u64);

impl ColumnFold for CountFold {
    type Metric = u64;

    fn push(&mut self, value: Value) -> Result<()> {
        if value == Value::from("bad") {
            return Err(Error::InvalidInput("bad value".to_string()));
        }
        self.0 += 1;
        Ok(())
    }

    fn finish(self) -> Result<u64> {
        Ok(self.0)
    }
}

impl MetricAccumulator for CountAccumulator {
    type Metric = u64;
    type Fold = CountFold;

    fn start(&self, _table: &str, _column: &str) -> CountFold {
        CountFold(0)
    }
}

struct FailingSink;

impl ReportSink<u64> for FailingSink {
    fn write(&self, _base: &Base<u64>) -> Result<()> {
        Err(Error::Io("disk full".to_string()))
    }
}

fn shop_schema() -> MemorySource {
    MemorySource::new("shop")
        .with_table("empty_first", Vec::<String>::new())
        .with_values("users", "id", [Value::Int(1), Value::Int(2), Value::Int(3)])
        .with_values("users", "email", [Value::from("a@x"), Value::Null])
        .with_table("audit", Vec::<String>::new())
        .with_values("orders", "id", [Value::Int(10)])
        .with_table("orders", ["total", "note"])
}

#[tokio::test]
async fn profiles_every_column_of_non_empty_tables() {
    let source = TrackedSource::new(shop_schema());
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let base = profiler.run().await.expect("run");

    assert_eq!(base.name, "shop");
    let tables: Vec<&str> = base.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tables, ["users", "orders"]);
    assert_eq!(base.column_count(), 5);
    assert_eq!(base.metric("users", "id"), Some(&3));
    assert_eq!(base.metric("users", "email"), Some(&2));
    assert_eq!(base.metric("orders", "note"), Some(&0));

    let counters = &source.counters;
    assert_eq!(counters.list_tables.load(Ordering::SeqCst), 1);
    assert_eq!(counters.list_columns.load(Ordering::SeqCst), 4);
    assert_eq!(counters.opened.load(Ordering::SeqCst), 5);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 5);
    assert_eq!(counters.max_open.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn replaying_the_same_sources_gives_identical_reports() {
    let source = shop_schema();
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let first = profiler.run().await.expect("first run");
    let second = profiler.run().await.expect("second run");

    assert_eq!(first, second);
}

#[tokio::test]
async fn schema_with_only_an_empty_table_still_writes_once() {
    let source = MemorySource::new("bare").with_table("nothing", Vec::<String>::new());
    let sink = MemorySink::new();
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let base = profiler.run_to(&sink).await.expect("run");

    assert!(base.tables.is_empty());
    assert_eq!(sink.write_count(), 1);
    assert_eq!(sink.reports()[0], base);
}

#[tokio::test]
async fn read_error_aborts_without_writing() {
    let mut source = TrackedSource::new(shop_schema());
    source.fail_read = Some(("users", "id", 2));
    let sink = MemorySink::new();
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let err = profiler.run_to(&sink).await.expect_err("read fails");

    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert!(matches!(
        &err,
        ProfileError::Extraction { table, column, source: Error::Db(_) }
            if table == "users" && column == "id"
    ));
    assert_eq!(sink.write_count(), 0);
    assert_eq!(source.counters.opened.load(Ordering::SeqCst), 1);
    assert_eq!(source.counters.closed.load(Ordering::SeqCst), 1);
    assert_eq!(source.counters.open_now.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accumulation_error_closes_the_stream() {
    let source = TrackedSource::new(
        MemorySource::new("s").with_values("t", "c", [Value::from("ok"), Value::from("bad")]),
    );
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let err = profiler.run().await.expect_err("accumulation fails");

    assert_eq!(err.kind(), ErrorKind::Accumulation);
    assert_eq!(source.counters.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn close_failure_after_clean_read_is_an_extraction_error() {
    let mut source = TrackedSource::new(MemorySource::new("s").with_values("t", "c", []));
    source.fail_close = true;
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let err = profiler.run().await.expect_err("close fails");

    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert_eq!(err.source_error(), Some(&Error::Db("close failed".to_string())));
}

#[tokio::test]
async fn read_error_wins_over_close_error() {
    let mut source = TrackedSource::new(shop_schema());
    source.fail_read = Some(("users", "id", 0));
    source.fail_close = true;
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let err = profiler.run().await.expect_err("read fails");

    assert_eq!(
        err.source_error(),
        Some(&Error::Db("connection reset".to_string()))
    );
}

#[tokio::test]
async fn open_error_is_an_extraction_error() {
    let schema = MemorySource::new("s").with_table("t", ["ghost"]);
    let values = MemorySource::new("s");
    let profiler = Profiler::new(&schema, &values, &CountAccumulator, ExtractOptions::default());

    let err = profiler.run().await.expect_err("open fails");

    assert_eq!(err.kind(), ErrorKind::Extraction);
}

#[tokio::test]
async fn sink_failure_is_reported_as_sink_error() {
    let source = shop_schema();
    let profiler = Profiler::new(&source, &source, &CountAccumulator, ExtractOptions::default());

    let err = profiler.run_to(&FailingSink).await.expect_err("sink fails");

    assert_eq!(err.kind(), ErrorKind::Sink);
}

#[tokio::test]
async fn extraction_options_reach_the_value_source() {
    let source = MemorySource::new("s").with_values(
        "t",
        "c",
        [Value::Int(1), Value::Int(1), Value::Int(2), Value::Int(3)],
    );
    let options = ExtractOptions {
        limit: Some(2),
        filter: Some("c > 0".to_string()),
        distinct: true,
    };
    let profiler = Profiler::new(&source, &source, &CountAccumulator, options);

    let base = profiler.run().await.expect("run");

    assert_eq!(base.metric("t", "c"), Some(&2));
}
