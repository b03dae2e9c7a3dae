//! Schema and column value sources backed by real data stores.

pub mod csv_dir;
pub mod postgres;

pub use csv_dir::{CsvDirSource, CsvStream};
pub use postgres::{CursorTransaction, PostgresSource, PostgresStream};
