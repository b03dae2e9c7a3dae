//! Core contracts and traversal engine for dbprofile.
//!
//! This crate defines the report model, the collaborator traits a profiling
//! run is built from (schema source, column value source, metric accumulator,
//! report sink), and the cursor/assembler pair that walks a schema and turns
//! per-column metrics into a single report.

pub mod accumulator;
pub mod assembler;
pub mod config;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod profiler;
pub mod report;
pub mod sink;
pub mod source;
pub mod value;

pub use accumulator::{ColumnFold, MetricAccumulator};
pub use assembler::ReportAssembler;
pub use config::{DEFAULT_SAMPLE_SIZE, ProfileConfig};
pub use cursor::{CursorState, TableColumnCursor};
pub use error::{Error, ErrorKind, ProfileError, Result};
pub use memory::{MemorySource, MemoryStream};
pub use profiler::Profiler;
pub use report::{Base, Column, Table};
pub use sink::{JsonFileSink, MemorySink, ReportSink, YamlFileSink};
pub use source::{ColumnValueSource, ExtractOptions, SchemaSource, ValueStream};
pub use value::Value;

/// Current contract version for report artifacts.
pub const REPORT_VERSION: &str = "0.1";
