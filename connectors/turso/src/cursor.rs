use cursorspec::{column_at, Column, Cursor, CursorState, Error, Result, Value, ValueKind};
use futures::executor::block_on;
use tracing::trace;
use turso_parser::parser::Parser;

/// Statements of a batch, split where the parser finishes each command.
struct Statements<'a> {
    remaining: &'a str,
}

impl<'a> Statements<'a> {
    fn new(sql: &'a str) -> Self {
        Self { remaining: sql }
    }
}

impl<'a> Iterator for Statements<'a> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.remaining.trim().is_empty() {
            let mut parser = Parser::new(self.remaining.as_bytes());
            match parser.next()? {
                Ok(_cmd) => {
                    let (statement, rest) = self.remaining.split_at(parser.offset());
                    self.remaining = rest;
                    let statement = statement
                        .trim_start_matches(|c: char| c == ';' || c.is_whitespace())
                        .trim_end();
                    if !statement.is_empty() {
                        return Some(Ok(statement));
                    }
                }
                Err(e) => {
                    self.remaining = "";
                    return Some(Err(Error::backend(format!("parse error: {e}"))));
                }
            }
        }
        None
    }
}

/// The result set currently being streamed.
struct ResultStream {
    columns: Vec<Column>,
    rows: turso::Rows,
    /// Row fetched ahead of `read`.
    peeked: Option<Vec<Value>>,
    /// The first row's values, used to infer column types.
    sample: Option<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl ResultStream {
    fn open(columns: Vec<Column>, mut rows: turso::Rows) -> Result<Self> {
        let first = fetch(&mut rows, columns.len())?;
        Ok(Self {
            columns,
            rows,
            sample: first.clone(),
            peeked: first,
            current: None,
        })
    }

    fn advance(&mut self) -> Result<bool> {
        self.current = match self.peeked.take() {
            Some(row) => Some(row),
            None => fetch(&mut self.rows, self.columns.len())?,
        };
        Ok(self.current.is_some())
    }

    /// Step the rest of the rows so the statement finishes before the next
    /// one starts.
    fn drain(mut self) -> Result<()> {
        while block_on(self.rows.next()).map_err(Error::backend)?.is_some() {}
        Ok(())
    }
}

fn fetch(rows: &mut turso::Rows, width: usize) -> Result<Option<Vec<Value>>> {
    let Some(row) = block_on(rows.next()).map_err(Error::backend)? else {
        return Ok(None);
    };
    let values = (0..width)
        .map(|i| row.get_value(i).map(to_value).map_err(Error::backend))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(values))
}

fn to_value(value: turso::Value) -> Value {
    match value {
        turso::Value::Null => Value::Null,
        turso::Value::Integer(i) => Value::Integer(i),
        turso::Value::Real(f) => Value::Real(f),
        turso::Value::Text(s) => Value::Text(s),
        turso::Value::Blob(b) => Value::Blob(b),
    }
}

/// Streaming cursor over a batch of statements, one row of lookahead.
pub(crate) struct TursoCursor<'a> {
    conn: &'a turso::Connection,
    /// Emptied once the batch is exhausted or a statement failed.
    pending: Statements<'a>,
    stream: Option<ResultStream>,
    state: CursorState,
}

impl<'a> TursoCursor<'a> {
    pub(crate) fn execute(conn: &'a turso::Connection, sql: &'a str) -> Result<Self> {
        let mut cursor = Self {
            conn,
            pending: Statements::new(sql),
            stream: None,
            state: CursorState::BeforeRow,
        };
        cursor.stream = cursor.next_stream()?;
        Ok(cursor)
    }

    /// Run pending statements until one yields columns.
    fn next_stream(&mut self) -> Result<Option<ResultStream>> {
        while let Some(sql) = self.pending.next().transpose()? {
            let mut stmt = block_on(self.conn.prepare(sql)).map_err(Error::backend)?;
            let columns: Vec<Column> = stmt
                .columns()
                .iter()
                .map(|c| Column::new(c.name(), c.decl_type()))
                .collect();
            if columns.is_empty() {
                trace!(sql, "executing statement without result set");
                block_on(stmt.execute(())).map_err(Error::backend)?;
                continue;
            }
            let rows = block_on(stmt.query(())).map_err(Error::backend)?;
            return ResultStream::open(columns, rows).map(Some);
        }
        Ok(None)
    }

    /// Give up on the rest of the batch after a failed statement.
    fn abandon(&mut self, err: Error) -> Error {
        self.pending = Statements::new("");
        self.stream = None;
        self.state = CursorState::AfterLastRow;
        err
    }

    fn columns(&self) -> Result<&[Column]> {
        self.state.ensure_open()?;
        Ok(self
            .stream
            .as_ref()
            .map(|s| s.columns.as_slice())
            .unwrap_or_default())
    }

    fn column(&self, ordinal: usize) -> Result<(&Column, Option<&Value>)> {
        let column = column_at(self.columns()?, ordinal)?;
        let sample = self
            .stream
            .as_ref()
            .and_then(|s| s.sample.as_ref())
            .and_then(|row| row.get(ordinal));
        Ok((column, sample))
    }
}

impl Cursor for TursoCursor<'_> {
    fn state(&self) -> CursorState {
        self.state
    }

    fn read(&mut self) -> Result<bool> {
        match self.state {
            CursorState::Closed => return Err(Error::CursorClosed),
            CursorState::AfterLastRow => return Ok(false),
            CursorState::BeforeRow | CursorState::OnRow => {}
        }
        let advanced = match self.stream.as_mut().map(ResultStream::advance) {
            Some(Ok(advanced)) => advanced,
            Some(Err(err)) => return Err(self.abandon(err)),
            None => false,
        };
        self.state = if advanced {
            CursorState::OnRow
        } else {
            CursorState::AfterLastRow
        };
        Ok(advanced)
    }

    fn next_result(&mut self) -> Result<bool> {
        self.state.ensure_open()?;
        let Some(stream) = self.stream.take() else {
            self.state = CursorState::AfterLastRow;
            return Ok(false);
        };
        self.stream = match stream.drain().and_then(|()| self.next_stream()) {
            Ok(stream) => stream,
            Err(err) => return Err(self.abandon(err)),
        };
        if self.stream.is_some() {
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
        self.stream
            .as_ref()
            .and_then(|s| s.current.as_ref())
            .and_then(|row| row.get(ordinal))
            .cloned()
            .ok_or(Error::Exhausted)
    }

    fn has_rows(&mut self) -> Result<bool> {
        self.state.ensure_open()?;
        Ok(self.stream.as_ref().is_some_and(|s| s.sample.is_some()))
    }

    fn close(&mut self) {
        self.state = CursorState::Closed;
        self.stream = None;
        self.pending = Statements::new("");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursorspec::ErrorKind;

    fn conn() -> (turso::Database, turso::Connection) {
        let db = block_on(turso::Builder::new_local(":memory:").build()).unwrap();
        let conn = db.connect().unwrap();
        (db, conn)
    }

    #[test]
    fn test_lookahead_does_not_consume_rows() {
        let (_db, conn) = conn();
        let mut cursor =
            TursoCursor::execute(&conn, "SELECT 1 UNION ALL SELECT 2 UNION ALL SELECT 3;").unwrap();
        assert!(cursor.has_rows().unwrap());
        let mut seen = Vec::new();
        while cursor.read().unwrap() {
            seen.push(cursor.value(0).unwrap());
            assert!(cursor.has_rows().unwrap());
        }
        assert_eq!(
            seen,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn test_next_result_skips_unread_rows() {
        let (_db, conn) = conn();
        let sql = "SELECT 1 UNION ALL SELECT 2; SELECT 'x' AS b;";
        let mut cursor = TursoCursor::execute(&conn, sql).unwrap();
        assert!(cursor.next_result().unwrap());
        assert_eq!(cursor.name(0).unwrap(), "b");
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.value(0).unwrap(), Value::Text("x".to_string()));
        assert!(!cursor.next_result().unwrap());
        assert!(!cursor.next_result().unwrap());
    }

    #[test]
    fn test_statements_without_columns_run() {
        let (_db, conn) = conn();
        let sql = "CREATE TABLE t(x); INSERT INTO t VALUES (X'00FF'); SELECT x FROM t;";
        let mut cursor = TursoCursor::execute(&conn, sql).unwrap();
        assert_eq!(cursor.field_type(0).unwrap(), ValueKind::Blob);
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.value(0).unwrap(), Value::Blob(vec![0x00, 0xff]));
    }

    #[test]
    fn test_failed_statement_ends_the_batch() {
        let (_db, conn) = conn();
        let sql = "SELECT 1; SELECT * FROM missing; SELECT 3;";
        let mut cursor = TursoCursor::execute(&conn, sql).unwrap();
        assert!(cursor.read().unwrap());
        assert_eq!(cursor.next_result().unwrap_err().kind(), ErrorKind::Backend);

        assert_eq!(cursor.state(), CursorState::AfterLastRow);
        assert_eq!(cursor.value(0).unwrap_err().kind(), ErrorKind::Exhausted);
        assert_eq!(cursor.field_count().unwrap(), 0);
        assert!(!cursor.has_rows().unwrap());
        assert!(!cursor.read().unwrap());
        assert!(!cursor.next_result().unwrap());
    }

    #[test]
    fn test_statements_split_outside_literals_and_comments() {
        let sql = "SELECT ';'; -- SELECT 2;\n/* ; */ SELECT 'it''s';;";
        let statements: Vec<&str> = Statements::new(sql).map(Result::unwrap).collect();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("SELECT ';'"));
        assert!(statements[1].contains("SELECT 'it''s'"));
        assert!(Statements::new("  ").next().is_none());
    }

    #[test]
    fn test_unparsable_batch_fails_once() {
        let mut statements = Statements::new("SELEC 1; SELECT 2;");
        assert_eq!(statements.next().unwrap().unwrap_err().kind(), ErrorKind::Backend);
        assert!(statements.next().is_none());
    }

    proptest::proptest! {
        #[test]
        fn quoted_text_never_splits(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let first = format!("SELECT {};", cursorspec::sql::text_literal(&a));
            let second = format!("SELECT {};", cursorspec::sql::text_literal(&b));
            let batch = format!("{first} {second}");
            let statements: Vec<&str> = Statements::new(&batch).map(Result::unwrap).collect();
            proptest::prop_assert_eq!(statements.len(), 2);
            proptest::prop_assert!(statements[0].starts_with(first.trim_end_matches(';')));
            proptest::prop_assert!(statements[1].starts_with(second.trim_end_matches(';')));
        }
    }

    #[test]
    fn test_empty_result_set_types_default_to_blob() {
        let (_db, conn) = conn();
        let mut cursor =
            TursoCursor::execute(&conn, "SELECT 1 AS a FROM sqlite_schema WHERE 0 = 1;").unwrap();
        assert!(!cursor.has_rows().unwrap());
        assert_eq!(cursor.data_type_name(0).unwrap(), "BLOB");
        assert!(!cursor.read().unwrap());
        assert_eq!(cursor.value(0).unwrap_err().kind(), ErrorKind::Exhausted);
    }
}
