use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::source::{ColumnValueSource, ExtractOptions, SchemaSource, ValueStream};
use crate::value::Value;

/// In-memory schema and value source: ordered tables, ordered columns, values per column.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    tables: Vec<MemoryTable>,
}

#[derive(Debug, Clone)]
struct MemoryTable {
    name: String,
    columns: Vec<MemoryColumn>,
}

#[derive(Debug, Clone)]
struct MemoryColumn {
    name: String,
    values: Vec<Value>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Adds a table with the given columns, all holding no values.
    pub fn with_table<I, C>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let entry = self.table_mut(table);
        for column in columns {
            let column = column.into();
            if !entry.columns.iter().any(|existing| existing.name == column) {
                entry.columns.push(MemoryColumn {
                    name: column,
                    values: Vec::new(),
                });
            }
        }
        self
    }

    /// Sets the values of `table.column`, adding the table and column if needed.
    pub fn with_values<I>(mut self, table: &str, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let entry = self.table_mut(table);
        let values: Vec<Value> = values.into_iter().collect();
        match entry.columns.iter_mut().find(|existing| existing.name == column) {
            Some(existing) => existing.values = values,
            None => entry.columns.push(MemoryColumn {
                name: column.to_string(),
                values,
            }),
        }
        self
    }

    fn table_mut(&mut self, table: &str) -> &mut MemoryTable {
        let index = match self.tables.iter().position(|entry| entry.name == table) {
            Some(index) => index,
            None => {
                self.tables.push(MemoryTable {
                    name: table.to_string(),
                    columns: Vec::new(),
                });
                self.tables.len() - 1
            }
        };
        &mut self.tables[index]
    }

    fn table(&self, table: &str) -> Result<&MemoryTable> {
        self.tables
            .iter()
            .find(|entry| entry.name == table)
            .ok_or_else(|| Error::InvalidInput(format!("unknown table: {table}")))
    }
}

#[async_trait]
impl SchemaSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|table| table.name.clone()).collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .table(table)?
            .columns
            .iter()
            .map(|column| column.name.clone())
            .collect())
    }
}

#[async_trait]
impl ColumnValueSource for MemorySource {
    type Stream = MemoryStream;

    async fn open(
        &self,
        table: &str,
        column: &str,
        options: &ExtractOptions,
    ) -> Result<Self::Stream> {
        let values = &self
            .table(table)?
            .columns
            .iter()
            .find(|entry| entry.name == column)
            .ok_or_else(|| Error::InvalidInput(format!("unknown column: {table}.{column}")))?
            .values;

        if let Some(filter) = &options.filter {
            tracing::debug!(event = "filter_ignored", table = %table, column = %column, filter = %filter);
        }

        let mut seen = HashSet::new();
        let mut selected: Vec<Value> = Vec::new();
        for value in values {
            if options.distinct && !seen.insert(value.distinct_key()) {
                continue;
            }
            selected.push(value.clone());
        }
        if let Some(limit) = options.row_limit() {
            selected.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(MemoryStream {
            values: selected.into_iter(),
        })
    }
}

/// Value stream over a snapshot of an in-memory column.
#[derive(Debug)]
pub struct MemoryStream {
    values: std::vec::IntoIter<Value>,
}

#[async_trait]
impl ValueStream for MemoryStream {
    async fn next(&mut self) -> Result<Option<Value>> {
        Ok(self.values.next())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
