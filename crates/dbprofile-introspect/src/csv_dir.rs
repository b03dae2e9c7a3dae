use std::collections::HashSet;
use std::fs::File;
use std::path::PathBuf;

use async_trait::async_trait;
use csv::{Reader, ReaderBuilder, StringRecord};

use dbprofile_core::{
    ColumnValueSource, Error, ExtractOptions, Result, SchemaSource, Value, ValueStream,
};

const CSV_EXTENSION: &str = "csv";

/// Schema and value source over a directory of `<table>.csv` files.
///
/// Tables are the file stems in lexical order and columns come from the header
/// row. Fields are read as text; a configured null token maps to [`Value::Null`].
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
    name: String,
    null_token: Option<String>,
    delimiter: u8,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "csv".to_string());
        Self {
            dir,
            name,
            null_token: None,
            delimiter: b',',
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_null_token(mut self, token: impl Into<String>) -> Self {
        self.null_token = Some(token.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.{CSV_EXTENSION}"))
    }

    fn reader(&self, table: &str) -> Result<Reader<File>> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(self.table_path(table))
            .map_err(csv_error)
    }
}

#[async_trait]
impl SchemaSource for CsvDirSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION));
            if !is_csv || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                tables.push(stem.to_string_lossy().into_owned());
            }
        }
        tables.sort();
        Ok(tables)
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut reader = self.reader(table)?;
        let headers = unique_headers(&mut reader, table)?;
        Ok(headers.iter().map(str::to_string).collect())
    }
}

#[async_trait]
impl ColumnValueSource for CsvDirSource {
    type Stream = CsvStream;

    async fn open(
        &self,
        table: &str,
        column: &str,
        options: &ExtractOptions,
    ) -> Result<Self::Stream> {
        if options.filter.is_some() {
            return Err(Error::NotImplemented(
                "row filters are not supported for csv sources".to_string(),
            ));
        }

        let mut reader = self.reader(table)?;
        let index = unique_headers(&mut reader, table)?
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| Error::InvalidInput(format!("unknown column: {table}.{column}")))?;

        Ok(CsvStream {
            reader: Some(reader),
            record: StringRecord::new(),
            index,
            null_token: self.null_token.clone(),
            remaining: options.row_limit(),
            seen: options.distinct.then(HashSet::new),
        })
    }
}

/// Reads one column of a CSV file record by record.
#[derive(Debug)]
pub struct CsvStream {
    reader: Option<Reader<File>>,
    record: StringRecord,
    index: usize,
    null_token: Option<String>,
    remaining: Option<u64>,
    seen: Option<HashSet<Option<String>>>,
}

impl CsvStream {
    fn to_value(&self, field: Option<&str>) -> Option<String> {
        match field {
            Some(field) if self.null_token.as_deref() != Some(field) => Some(field.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl ValueStream for CsvStream {
    async fn next(&mut self) -> Result<Option<Value>> {
        if self.remaining == Some(0) {
            return Ok(None);
        }

        loop {
            let reader = self
                .reader
                .as_mut()
                .ok_or_else(|| Error::InvalidInput("value stream already closed".to_string()))?;
            if !reader.read_record(&mut self.record).map_err(csv_error)? {
                return Ok(None);
            }

            // Short rows are read as null for the missing fields.
            let value = self.to_value(self.record.get(self.index));
            if let Some(seen) = &mut self.seen {
                if !seen.insert(value.clone()) {
                    continue;
                }
            }
            if let Some(remaining) = &mut self.remaining {
                *remaining -= 1;
            }
            return Ok(Some(Value::from(value)));
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

/// Header row of `table`; a repeated name would make column lookups ambiguous.
fn unique_headers<'r>(reader: &'r mut Reader<File>, table: &str) -> Result<&'r StringRecord> {
    let headers = reader.headers().map_err(csv_error)?;
    let mut seen = HashSet::new();
    if let Some(duplicate) = headers.iter().find(|header| !seen.insert(*header)) {
        return Err(Error::InvalidInput(format!(
            "duplicate column {duplicate:?} in {table}.{CSV_EXTENSION}"
        )));
    }
    Ok(headers)
}

fn csv_error(err: csv::Error) -> Error {
    Error::Io(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("users.csv"),
            "id,email,nickname\n1,a@x,\n2,\\N,bob\n3,c@x,bob\n4,c@x\n",
        )
        .expect("write users");
        fs::write(dir.path().join("audit.csv"), "").expect("write audit");
        fs::write(dir.path().join("notes.txt"), "not a table").expect("write notes");
        dir
    }

    async fn read_all(source: &CsvDirSource, column: &str, options: &ExtractOptions) -> Vec<Value> {
        let mut stream = source.open("users", column, options).await.expect("open");
        let mut values = Vec::new();
        while let Some(value) = stream.next().await.expect("next") {
            values.push(value);
        }
        stream.close().await.expect("close");
        values
    }

    #[tokio::test]
    async fn lists_csv_files_as_sorted_tables() {
        let dir = fixture();
        let source = CsvDirSource::new(dir.path());

        assert_eq!(source.list_tables().await.expect("tables"), ["audit", "users"]);
        assert_eq!(
            source.list_columns("users").await.expect("columns"),
            ["id", "email", "nickname"]
        );
        assert!(source.list_columns("audit").await.expect("columns").is_empty());
    }

    #[tokio::test]
    async fn maps_null_token_and_short_rows_to_null() {
        let dir = fixture();
        let source = CsvDirSource::new(dir.path()).with_null_token("\\N");

        let emails = read_all(&source, "email", &ExtractOptions::default()).await;
        assert_eq!(
            emails,
            [
                Value::from("a@x"),
                Value::Null,
                Value::from("c@x"),
                Value::from("c@x")
            ]
        );

        let nicknames = read_all(&source, "nickname", &ExtractOptions::default()).await;
        assert_eq!(
            nicknames,
            [Value::from(""), Value::from("bob"), Value::from("bob"), Value::Null]
        );
    }

    #[tokio::test]
    async fn honours_distinct_and_limit() {
        let dir = fixture();
        let source = CsvDirSource::new(dir.path());
        let options = ExtractOptions {
            limit: Some(2),
            filter: None,
            distinct: true,
        };

        let values = read_all(&source, "email", &options).await;

        assert_eq!(values, [Value::from("a@x"), Value::from("\\N")]);
    }

    #[tokio::test]
    async fn duplicate_headers_are_rejected() {
        let dir = fixture();
        fs::write(dir.path().join("pairs.csv"), "a,b,a\n1,,x\n2,,y\n").expect("write pairs");
        let source = CsvDirSource::new(dir.path());

        let err = source
            .list_columns("pairs")
            .await
            .expect_err("duplicate header");
        assert!(matches!(&err, Error::InvalidInput(message) if message.contains("\"a\"")));

        let err = source
            .open("pairs", "b", &ExtractOptions::default())
            .await
            .expect_err("duplicate header");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn reads_other_delimiters() {
        let dir = fixture();
        fs::write(dir.path().join("tabs.csv"), "id\tname\n1\tann\n2\t\n").expect("write tabs");
        let source = CsvDirSource::new(dir.path()).with_delimiter(b'\t');

        assert_eq!(
            source.list_columns("tabs").await.expect("columns"),
            ["id", "name"]
        );
        let mut stream = source
            .open("tabs", "name", &ExtractOptions::default())
            .await
            .expect("open");
        assert_eq!(stream.next().await.expect("next"), Some(Value::from("ann")));
        assert_eq!(stream.next().await.expect("next"), Some(Value::from("")));
        assert_eq!(stream.next().await.expect("next"), None);
        stream.close().await.expect("close");
    }

    #[tokio::test]
    async fn filters_are_not_implemented() {
        let dir = fixture();
        let source = CsvDirSource::new(dir.path());
        let options = ExtractOptions {
            filter: Some("id > 1".to_string()),
            ..ExtractOptions::default()
        };

        let err = source
            .open("users", "id", &options)
            .await
            .expect_err("filter rejected");

        assert!(matches!(err, Error::NotImplemented(_)));
    }

    #[tokio::test]
    async fn unknown_column_and_table_are_reported() {
        let dir = fixture();
        let source = CsvDirSource::new(dir.path());

        let err = source
            .open("users", "missing", &ExtractOptions::default())
            .await
            .expect_err("missing column");
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = source
            .list_columns("ghost")
            .await
            .expect_err("missing table");
        assert!(matches!(err, Error::Io(_)));
    }
}
