//! The contract every connector implements: connection, statement and a
//! forward-only result cursor.

use crate::error::{Error, Result};
use crate::value::{FromValue, Value, ValueKind};

/// Position of a cursor within its current result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    BeforeRow,
    OnRow,
    AfterLastRow,
    Closed,
}

impl CursorState {
    /// Error for a row accessor used outside `OnRow`, if any.
    pub fn row_access_error(self) -> Option<Error> {
        match self {
            CursorState::BeforeRow => Some(Error::BeforeRead),
            CursorState::OnRow => None,
            CursorState::AfterLastRow => Some(Error::Exhausted),
            CursorState::Closed => Some(Error::CursorClosed),
        }
    }

    /// Fail if the cursor is closed.
    pub fn ensure_open(self) -> Result<()> {
        match self {
            CursorState::Closed => Err(Error::CursorClosed),
            _ => Ok(()),
        }
    }

    /// Fail unless a row is current.
    pub fn ensure_on_row(self) -> Result<()> {
        match self.row_access_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Column metadata as a backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub decl_type: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, decl_type: Option<&str>) -> Self {
        Self {
            name: name.into(),
            decl_type: decl_type.map(str::to_string),
        }
    }

    /// Affinity of the declared type, else the storage class of `sample`
    /// (the column's value in the first row), else BLOB.
    pub fn field_type(&self, sample: Option<&Value>) -> ValueKind {
        match (&self.decl_type, sample.map(Value::kind)) {
            (Some(decl), _) => ValueKind::from_declared_type(decl),
            (None, Some(kind)) if kind != ValueKind::Null => kind,
            _ => ValueKind::Blob,
        }
    }

    pub fn data_type_name(&self, sample: Option<&Value>) -> String {
        match &self.decl_type {
            Some(decl) => decl.clone(),
            None => self.field_type(sample).type_name().to_string(),
        }
    }
}

/// Look up `ordinal` in `columns`.
pub fn column_at(columns: &[Column], ordinal: usize) -> Result<&Column> {
    columns.get(ordinal).ok_or(Error::OrdinalOutOfRange {
        ordinal,
        field_count: columns.len(),
    })
}

/// A forward-only cursor over one or more result sets.
///
/// Every operation other than [`Cursor::is_closed`] and [`Cursor::close`]
/// fails with [`Error::CursorClosed`] once the cursor is closed.
pub trait Cursor {
    fn state(&self) -> CursorState;

    /// Advance to the next row of the current result set.
    fn read(&mut self) -> Result<bool>;

    /// Move to the next result set, resetting column metadata. Returns false,
    /// and keeps returning false, once the last set has been passed.
    fn next_result(&mut self) -> Result<bool>;

    fn field_count(&self) -> Result<usize>;

    fn name(&self, ordinal: usize) -> Result<String>;

    /// Declared type name of a column, or the storage class of the first row
    /// when the backend does not report one.
    fn data_type_name(&self, ordinal: usize) -> Result<String>;

    fn field_type(&self, ordinal: usize) -> Result<ValueKind>;

    /// Untyped access. An absent value is `Value::Null`.
    fn value(&self, ordinal: usize) -> Result<Value>;

    /// Whether the current result set has at least one row.
    fn has_rows(&mut self) -> Result<bool>;

    /// Close the cursor. Idempotent.
    fn close(&mut self);

    fn is_closed(&self) -> bool {
        self.state() == CursorState::Closed
    }

    /// Nesting depth of the current row. Always zero: cursors do not nest.
    fn depth(&self) -> Result<usize> {
        self.state().ensure_open()?;
        Ok(0)
    }

    fn ordinal(&self, name: &str) -> Result<usize> {
        let field_count = self.field_count()?;
        for ordinal in 0..field_count {
            if self.name(ordinal)? == name {
                return Ok(ordinal);
            }
        }
        // fall back to a case-insensitive match
        (0..field_count)
            .find_map(|ordinal| match self.name(ordinal) {
                Ok(n) if n.eq_ignore_ascii_case(name) => Some(Ok(ordinal)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .unwrap_or_else(|| Err(Error::UnknownColumn(name.to_string())))
    }

    fn value_by_name(&self, name: &str) -> Result<Value> {
        let ordinal = self.ordinal(name)?;
        self.value(ordinal)
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(self.value(ordinal)?.is_null())
    }

    /// Copy bytes of a blob (or the UTF-8 encoding of a text value) starting
    /// at `data_offset` into `buffer`. Returns the number of bytes copied,
    /// which is zero when `data_offset` is past the end.
    fn get_bytes(&self, ordinal: usize, data_offset: usize, buffer: &mut [u8]) -> Result<usize> {
        let bytes = Vec::<u8>::from_sql(self.value(ordinal)?)?;
        let source = bytes.get(data_offset..).unwrap_or_default();
        let n = source.len().min(buffer.len());
        buffer[..n].copy_from_slice(&source[..n]);
        Ok(n)
    }

    /// Copy characters of a text value starting at character `data_offset`
    /// into `buffer`. Offsets and counts are in Unicode scalar values.
    fn get_chars(&self, ordinal: usize, data_offset: usize, buffer: &mut [char]) -> Result<usize> {
        let text = String::from_sql(self.value(ordinal)?)?;
        let mut copied = 0;
        for (slot, c) in buffer.iter_mut().zip(text.chars().skip(data_offset)) {
            *slot = c;
            copied += 1;
        }
        Ok(copied)
    }

    /// Fill `dest` from column 0 onwards. Copies `min(field_count, dest.len())`
    /// values and leaves the rest of `dest` untouched.
    fn get_values(&self, dest: &mut [Value]) -> Result<usize> {
        self.state().ensure_on_row()?;
        let n = self.field_count()?.min(dest.len());
        for (ordinal, slot) in dest.iter_mut().take(n).enumerate() {
            *slot = self.value(ordinal)?;
        }
        Ok(n)
    }
}

impl dyn Cursor + '_ {
    /// Typed access. Absent values convert only to [`crate::DbNull`].
    pub fn get<T: FromValue>(&self, ordinal: usize) -> Result<T> {
        T::from_sql(self.value(ordinal)?)
    }

    pub fn get_by_name<T: FromValue>(&self, name: &str) -> Result<T> {
        T::from_sql(self.value_by_name(name)?)
    }

    /// Iterate the remaining rows of the current result set, each as its full
    /// list of values.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            cursor: self,
            failed: false,
        }
    }
}

/// Iterator returned by `rows()` on a `dyn Cursor`. Ends after the first
/// error.
pub struct Rows<'c> {
    cursor: &'c mut dyn Cursor,
    failed: bool,
}

impl Rows<'_> {
    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        if !self.cursor.read()? {
            return Ok(None);
        }
        let mut row = vec![Value::Null; self.cursor.field_count()?];
        self.cursor.get_values(&mut row)?;
        Ok(Some(row))
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let row = self.next_row().transpose();
        self.failed = matches!(row, Some(Err(_)));
        row
    }
}

/// A statement bound to one open connection.
pub trait Statement {
    fn sql(&self) -> &str;

    /// Execute and return a cursor positioned before the first row of the
    /// first result set. The statement is borrowed until the cursor is
    /// dropped, so it runs at most one cursor at a time.
    fn execute_cursor(&mut self) -> Result<Box<dyn Cursor + '_>>;

    /// First column of the first row, or `None` when there is no row.
    /// An absent value in that position is `Some(Value::Null)`.
    fn execute_scalar(&mut self) -> Result<Option<Value>> {
        let mut cursor = self.execute_cursor()?;
        let scalar = if cursor.read()? {
            if cursor.field_count()? == 0 {
                None
            } else {
                Some(cursor.value(0)?)
            }
        } else {
            None
        };
        cursor.close();
        Ok(scalar)
    }
}

/// An open channel to a backend. Dropping it releases it.
pub trait Connection {
    /// Create a statement for `sql`, which may hold several `;`-separated
    /// statements.
    fn statement(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>>;

    /// Close the connection. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::DbNull;

    /// One row of fixed values, enough to exercise the provided methods.
    struct RowCursor {
        names: Vec<&'static str>,
        row: Vec<Value>,
        state: CursorState,
    }

    impl RowCursor {
        fn new(columns: Vec<(&'static str, Value)>) -> Self {
            let (names, row) = columns.into_iter().unzip();
            Self {
                names,
                row,
                state: CursorState::BeforeRow,
            }
        }
    }

    impl Cursor for RowCursor {
        fn state(&self) -> CursorState {
            self.state
        }

        fn read(&mut self) -> Result<bool> {
            self.state.ensure_open()?;
            self.state = match self.state {
                CursorState::BeforeRow => CursorState::OnRow,
                _ => CursorState::AfterLastRow,
            };
            Ok(self.state == CursorState::OnRow)
        }

        fn next_result(&mut self) -> Result<bool> {
            self.state.ensure_open()?;
            self.state = CursorState::AfterLastRow;
            Ok(false)
        }

        fn field_count(&self) -> Result<usize> {
            self.state.ensure_open()?;
            Ok(self.names.len())
        }

        fn name(&self, ordinal: usize) -> Result<String> {
            self.state.ensure_open()?;
            self.names
                .get(ordinal)
                .map(|n| n.to_string())
                .ok_or(Error::OrdinalOutOfRange {
                    ordinal,
                    field_count: self.names.len(),
                })
        }

        fn data_type_name(&self, ordinal: usize) -> Result<String> {
            Ok(self.field_type(ordinal)?.type_name().to_string())
        }

        fn field_type(&self, ordinal: usize) -> Result<ValueKind> {
            self.name(ordinal)?;
            Ok(self.row[ordinal].kind())
        }

        fn value(&self, ordinal: usize) -> Result<Value> {
            self.state.ensure_on_row()?;
            self.name(ordinal)?;
            Ok(self.row[ordinal].clone())
        }

        fn has_rows(&mut self) -> Result<bool> {
            self.state.ensure_open()?;
            Ok(true)
        }

        fn close(&mut self) {
            self.state = CursorState::Closed;
        }
    }

    fn on_row(columns: Vec<(&'static str, Value)>) -> Box<dyn Cursor> {
        let mut cursor: Box<dyn Cursor> = Box::new(RowCursor::new(columns));
        assert!(cursor.read().unwrap());
        cursor
    }

    #[test]
    fn test_rows_yields_remaining_rows_then_stops() {
        let mut cursor: Box<dyn Cursor> = Box::new(RowCursor::new(vec![
            ("a", Value::Integer(1)),
            ("b", Value::Null),
        ]));
        let rows: Vec<Vec<Value>> = cursor.rows().collect::<Result<_>>().unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(1), Value::Null]]);
        assert_eq!(cursor.state(), CursorState::AfterLastRow);
        assert!(cursor.rows().next().is_none());
    }

    #[test]
    fn test_rows_stops_after_error() {
        let mut cursor: Box<dyn Cursor> = Box::new(RowCursor::new(vec![("a", Value::Integer(1))]));
        cursor.close();
        let mut rows = cursor.rows();
        assert_eq!(rows.next().unwrap().unwrap_err().kind(), ErrorKind::Closed);
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_get_values_truncates_to_destination() {
        let cursor = on_row(vec![
            ("a", Value::Text("a".into())),
            ("b", Value::Text("b".into())),
        ]);
        let mut wide = vec![Value::Integer(9); 3];
        assert_eq!(cursor.get_values(&mut wide).unwrap(), 2);
        assert_eq!(wide[2], Value::Integer(9));

        let mut empty: Vec<Value> = Vec::new();
        assert_eq!(cursor.get_values(&mut empty).unwrap(), 0);
    }

    #[test]
    fn test_get_bytes_offsets() {
        let cursor = on_row(vec![("b", Value::Blob(vec![1, 2, 3, 4, 5]))]);
        let mut buf = [0u8; 2];
        assert_eq!(cursor.get_bytes(0, 0, &mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(cursor.get_bytes(0, 4, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(cursor.get_bytes(0, 10, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_get_chars_counts_scalars() {
        let cursor = on_row(vec![("t", Value::Text("a😀Ḁb".into()))]);
        let mut buf = ['\0'; 2];
        assert_eq!(cursor.get_chars(0, 1, &mut buf).unwrap(), 2);
        assert_eq!(buf, ['😀', 'Ḁ']);
        assert_eq!(cursor.get_chars(0, 3, &mut buf).unwrap(), 1);
        assert_eq!(buf[0], 'b');
    }

    #[test]
    fn test_ordinal_prefers_exact_then_case_insensitive() {
        let cursor = on_row(vec![("id", Value::Integer(1)), ("Id", Value::Integer(2))]);
        assert_eq!(cursor.ordinal("Id").unwrap(), 1);
        assert_eq!(cursor.ordinal("ID").unwrap(), 0);
        assert_eq!(
            cursor.ordinal("Name").unwrap_err().kind(),
            ErrorKind::IndexOutOfRange
        );
    }

    #[test]
    fn test_typed_get_on_dyn_cursor() {
        let cursor = on_row(vec![("n", Value::Null), ("v", Value::Integer(7))]);
        assert_eq!(cursor.get::<DbNull>(0).unwrap(), DbNull);
        assert_eq!(cursor.get_by_name::<i64>("v").unwrap(), 7);
        assert_eq!(
            cursor.get::<i64>(0).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_column_type_inference() {
        let declared = Column::new("a", Some("BIGINT"));
        assert_eq!(declared.field_type(Some(&Value::Text("x".into()))), ValueKind::Integer);
        assert_eq!(declared.data_type_name(None), "BIGINT");

        let expression = Column::new("b", None);
        assert_eq!(expression.field_type(Some(&Value::Real(1.5))), ValueKind::Real);
        assert_eq!(expression.data_type_name(Some(&Value::Text("x".into()))), "TEXT");
        assert_eq!(expression.field_type(Some(&Value::Null)), ValueKind::Blob);
        assert_eq!(expression.data_type_name(None), "BLOB");

        let columns = [declared, expression];
        assert_eq!(column_at(&columns, 1).unwrap().name, "b");
        assert_eq!(
            column_at(&columns, 2).unwrap_err().kind(),
            ErrorKind::IndexOutOfRange
        );
    }

    #[test]
    fn test_row_access_errors_follow_state() {
        let mut cursor: Box<dyn Cursor> = Box::new(RowCursor::new(vec![("a", Value::Integer(1))]));
        assert_eq!(cursor.value(0).unwrap_err().kind(), ErrorKind::BeforeRead);
        cursor.read().unwrap();
        cursor.read().unwrap();
        assert_eq!(cursor.value(0).unwrap_err().kind(), ErrorKind::Exhausted);
        cursor.close();
        assert_eq!(cursor.value(0).unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(cursor.depth().unwrap_err().kind(), ErrorKind::Closed);
        assert!(cursor.is_closed());
    }
}
