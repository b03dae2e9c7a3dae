use crate::error::ProfileError;
use crate::source::SchemaSource;

/// Position of a [`TableColumnCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Before the first table.
    Unstarted,
    /// On a valid (table, column) pair.
    OnColumn,
    /// No pairs left. Terminal.
    Exhausted,
}

/// Two-level cursor over every (table, column) pair of a schema.
///
/// The table list is fetched once when the cursor is opened. Column lists are
/// fetched lazily, once per table, when the cursor first moves onto it; tables
/// without columns are stepped over.
#[derive(Debug)]
pub struct TableColumnCursor<'a, S: ?Sized> {
    source: &'a S,
    tables: Vec<String>,
    columns: Vec<String>,
    table_index: usize,
    column_index: usize,
    state: CursorState,
}

impl<'a, S> TableColumnCursor<'a, S>
where
    S: SchemaSource + ?Sized,
{
    /// Lists the tables of `source` and positions the cursor before the first one.
    pub async fn open(source: &'a S) -> Result<Self, ProfileError> {
        let tables = source
            .list_tables()
            .await
            .map_err(|source| ProfileError::Schema { source })?;

        Ok(Self {
            source,
            tables,
            columns: Vec::new(),
            table_index: 0,
            column_index: 0,
            state: CursorState::Unstarted,
        })
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Moves to the next (table, column) pair. Returns `false` once exhausted,
    /// and keeps returning `false` afterwards without touching the source.
    ///
    /// A failed column listing leaves the cursor exhausted.
    pub async fn advance(&mut self) -> Result<bool, ProfileError> {
        let mut candidate = match self.state {
            CursorState::Exhausted => return Ok(false),
            CursorState::OnColumn if self.column_index + 1 < self.columns.len() => {
                self.column_index += 1;
                return Ok(true);
            }
            CursorState::OnColumn => self.table_index + 1,
            CursorState::Unstarted => 0,
        };

        while candidate < self.tables.len() {
            let table = &self.tables[candidate];
            let columns = match self.source.list_columns(table).await {
                Ok(columns) => columns,
                Err(source) => {
                    let table = table.clone();
                    self.exhaust();
                    return Err(ProfileError::Columns { table, source });
                }
            };

            if columns.is_empty() {
                tracing::debug!(event = "table_skipped", table = %table, reason = "no_columns");
                candidate += 1;
                continue;
            }

            self.table_index = candidate;
            self.column_index = 0;
            self.columns = columns;
            self.state = CursorState::OnColumn;
            return Ok(true);
        }

        self.exhaust();
        Ok(false)
    }

    /// The (table, column) pair under the cursor. Only valid in [`CursorState::OnColumn`].
    pub fn current(&self) -> Result<(&str, &str), ProfileError> {
        if self.state != CursorState::OnColumn {
            return Err(ProfileError::InvalidState { state: self.state });
        }
        Ok((
            self.tables[self.table_index].as_str(),
            self.columns[self.column_index].as_str(),
        ))
    }

    fn exhaust(&mut self) {
        self.table_index = self.tables.len();
        self.column_index = 0;
        self.columns.clear();
        self.state = CursorState::Exhausted;
    }
}
