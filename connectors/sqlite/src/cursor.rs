use cursorspec::{column_at, Column, Cursor, CursorState, Error, Result, Value, ValueKind};
use rusqlite::types::ValueRef;
use rusqlite::Batch;
use rusqlite::fallible_iterator::FallibleIterator;
use tracing::trace;

/// One materialized result set.
struct ResultSet {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl ResultSet {
    fn sample(&self, ordinal: usize) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(ordinal))
    }
}

/// Cursor over a batch of statements. Each statement runs to completion when
/// its result set becomes current; statements without columns run but are
/// never exposed as result sets.
pub(crate) struct SqliteCursor<'a> {
    /// Statements not yet run. `None` once the batch is exhausted or a
    /// statement failed.
    pending: Option<Batch<'a, 'a>>,
    current: Option<ResultSet>,
    /// Index of the current row while `OnRow`.
    position: usize,
    state: CursorState,
}

impl<'a> SqliteCursor<'a> {
    pub(crate) fn execute(conn: &'a rusqlite::Connection, sql: &'a str) -> Result<Self> {
        let mut cursor = Self {
            pending: Some(Batch::new(conn, sql)),
            current: None,
            position: 0,
            state: CursorState::BeforeRow,
        };
        cursor.current = cursor.next_result_set()?;
        Ok(cursor)
    }

    /// Run pending statements until one yields columns.
    fn next_result_set(&mut self) -> Result<Option<ResultSet>> {
        let Some(batch) = self.pending.as_mut() else {
            return Ok(None);
        };
        while let Some(mut stmt) = batch.next().map_err(Error::backend)? {
            if stmt.column_count() == 0 {
                trace!("executing statement without result set");
                stmt.execute([]).map_err(Error::backend)?;
                continue;
            }
            let columns: Vec<Column> = stmt
                .columns()
                .iter()
                .map(|c| Column::new(c.name(), c.decl_type()))
                .collect();
            let mut rows = Vec::new();
            let mut query = stmt.query([]).map_err(Error::backend)?;
            while let Some(row) = query.next().map_err(Error::backend)? {
                let values = (0..columns.len())
                    .map(|i| row.get_ref(i).map_err(Error::backend).and_then(to_value))
                    .collect::<Result<Vec<_>>>()?;
                rows.push(values);
            }
            trace!(columns = columns.len(), rows = rows.len(), "materialized result set");
            return Ok(Some(ResultSet { columns, rows }));
        }
        self.pending = None;
        Ok(None)
    }

    /// Give up on the rest of the batch after a failed statement.
    fn abandon(&mut self, err: Error) -> Error {
        self.pending = None;
        self.current = None;
        self.state = CursorState::AfterLastRow;
        err
    }

    fn columns(&self) -> Result<&[Column]> {
        self.state.ensure_open()?;
        Ok(self
            .current
            .as_ref()
            .map(|set| set.columns.as_slice())
            .unwrap_or_default())
    }

    fn column(&self, ordinal: usize) -> Result<(&Column, Option<&Value>)> {
        let column = column_at(self.columns()?, ordinal)?;
        let sample = self.current.as_ref().and_then(|set| set.sample(ordinal));
        Ok((column, sample))
    }
}

fn to_value(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(Error::backend)?;
            Value::Text(text.to_string())
        }
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

impl Cursor for SqliteCursor<'_> {
    fn state(&self) -> CursorState {
        self.state
    }

    fn read(&mut self) -> Result<bool> {
        let row_count = match self.state {
            CursorState::Closed => return Err(Error::CursorClosed),
            CursorState::AfterLastRow => return Ok(false),
            _ => self.current.as_ref().map_or(0, |set| set.rows.len()),
        };
        let next = match self.state {
            CursorState::BeforeRow => 0,
            _ => self.position + 1,
        };
        if next < row_count {
            self.position = next;
            self.state = CursorState::OnRow;
            Ok(true)
        } else {
            self.state = CursorState::AfterLastRow;
            Ok(false)
        }
    }

    fn next_result(&mut self) -> Result<bool> {
        self.state.ensure_open()?;
        if self.current.is_none() {
            self.state = CursorState::AfterLastRow;
            return Ok(false);
        }
        self.current = match self.next_result_set() {
            Ok(set) => set,
            Err(err) => return Err(self.abandon(err)),
        };
        self.position = 0;
        if self.current.is_some() {
            self.state = CursorState::BeforeRow;
            Ok(true)
        } else {
            self.state = CursorState::AfterLastRow;
            Ok(false)
        }
    }

    fn field_count(&self) -> Result<usize> {
        Ok(self.columns()?.len())
    }

    fn name(&self, ordinal: usize) -> Result<String> {
        Ok(column_at(self.columns()?, ordinal)?.name.clone())
    }

    fn data_type_name(&self, ordinal: usize) -> Result<String> {
        let (column, sample) = self.column(ordinal)?;
        Ok(column.data_type_name(sample))
    }

    fn field_type(&self, ordinal: usize) -> Result<ValueKind> {
        let (column, sample) = self.column(ordinal)?;
        Ok(column.field_type(sample))
    }

    fn value(&self, ordinal: usize) -> Result<Value> {
        self.state.ensure_on_row()?;
        column_at(self.columns()?, ordinal)?;
        self.current
            .as_ref()
            .and_then(|set| set.rows.get(self.position))
            .and_then(|row| row.get(ordinal))
            .cloned()
            .ok_or(Error::Exhausted)
    }

    fn has_rows(&mut self) -> Result<bool> {
        self.state.ensure_open()?;
        Ok(self
            .current
            .as_ref()
            .is_some_and(|set| !set.rows.is_empty()))
    }

    fn close(&mut self) {
        self.state = CursorState::Closed;
        self.current = None;
        self.pending = None;
    }
}
