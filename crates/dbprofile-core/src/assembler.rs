use crate::report::{Base, Column, Table};

/// Builds a [`Base`] from (table, column, metric) triples as they are produced.
#[derive(Debug)]
pub struct ReportAssembler<M> {
    name: String,
    tables: Vec<Table<M>>,
}

impl<M> ReportAssembler<M> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Appends a column to `table`, creating the table on first sight.
    pub fn push(&mut self, table: &str, column: &str, metric: M) {
        let column = Column {
            name: column.to_string(),
            metric,
        };

        // Columns of one table arrive consecutively, so the last table is the usual hit.
        let index = match self.tables.iter().rposition(|entry| entry.name == table) {
            Some(index) => index,
            None => {
                self.tables.push(Table {
                    name: table.to_string(),
                    columns: Vec::new(),
                });
                self.tables.len() - 1
            }
        };
        self.tables[index].columns.push(column);
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }

    pub fn finish(self) -> Base<M> {
        Base {
            name: self.name,
            tables: self.tables,
        }
    }
}
