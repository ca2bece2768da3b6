//! Connector for the C SQLite engine, through `rusqlite`.

mod cursor;

use cursor::SqliteCursor;
use cursorspec::{
    Connection, ConnectionPool, Connector, Cursor, DatabaseLocation, Error, Fixture,
    LifecycleError, Overrides, PooledConnection, Result, Statement,
};
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Storage opened by `initialize`.
enum Storage {
    Memory,
    /// Deleted when dropped
    File(NamedTempFile),
}

pub struct SqliteConnector {
    location: DatabaseLocation,
    pool: ConnectionPool<rusqlite::Connection>,
    storage: Mutex<Option<Storage>>,
}

impl SqliteConnector {
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            pool: ConnectionPool::default(),
            storage: Mutex::new(None),
        }
    }

    pub fn location(&self) -> DatabaseLocation {
        self.location
    }

    fn connect(&self) -> Result<rusqlite::Connection> {
        let storage = self.storage.lock();
        let conn = match storage.as_ref() {
            Some(Storage::Memory) => rusqlite::Connection::open_in_memory(),
            Some(Storage::File(file)) => rusqlite::Connection::open(file.path()),
            None => return Err(Error::backend(LifecycleError::NotInitialized)),
        };
        conn.map_err(Error::backend)
    }
}

impl Default for SqliteConnector {
    fn default() -> Self {
        Self::new(DatabaseLocation::Memory)
    }
}

impl Fixture for SqliteConnector {
    fn open_connection(&self) -> Result<Box<dyn Connection>> {
        let conn = self.pool.get_or_create(|| self.connect())?;
        Ok(Box::new(SqliteConnection { conn: Some(conn) }))
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }

    fn select_no_rows(&self) -> &str {
        "SELECT 1 WHERE 0 = 1;"
    }
}

impl Connector for SqliteConnector {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn fixture(&self) -> &dyn Fixture {
        self
    }

    fn initialize(&self) -> std::result::Result<(), LifecycleError> {
        let storage = match self.location {
            DatabaseLocation::Memory => Storage::Memory,
            DatabaseLocation::TempFile => Storage::File(NamedTempFile::new()?),
        };
        debug!(location = %self.location, "sqlite connector initialized");
        *self.storage.lock() = Some(storage);
        Ok(())
    }

    fn uninitialize(&self) -> std::result::Result<(), LifecycleError> {
        self.pool.clear()?;
        if self.storage.lock().take().is_none() {
            return Err(LifecycleError::NotInitialized);
        }
        Ok(())
    }

    fn overrides(&self) -> Overrides {
        Overrides::new().with_statement(
            "execute_scalar_returns_null_when_empty",
            "SELECT 1 FROM sqlite_master WHERE 0 = 1;",
        )
    }
}

struct SqliteConnection {
    conn: Option<PooledConnection<rusqlite::Connection>>,
}

impl Connection for SqliteConnection {
    fn statement(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        let conn = self.conn.as_deref().ok_or(Error::ConnectionClosed)?;
        Ok(Box::new(SqliteStatement {
            conn,
            sql: sql.to_string(),
        }))
    }

    fn close(&mut self) {
        self.conn.take();
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }
}

struct SqliteStatement<'conn> {
    conn: &'conn rusqlite::Connection,
    sql: String,
}

impl Statement for SqliteStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn execute_cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        Ok(Box::new(SqliteCursor::execute(self.conn, &self.sql)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursorspec::{ErrorKind, Value};

    #[test]
    fn test_connections_require_initialize() {
        let connector = SqliteConnector::default();
        let err = connector.open_connection().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(matches!(
            connector.uninitialize(),
            Err(LifecycleError::NotInitialized)
        ));
    }

    #[test]
    fn test_uninitialize_detects_leaked_connection() {
        let connector = SqliteConnector::default();
        connector.initialize().unwrap();
        let conn = connector.open_connection().unwrap();
        assert!(matches!(
            connector.uninitialize(),
            Err(LifecycleError::LeakedConnections(1))
        ));
        drop(conn);
        connector.uninitialize().unwrap();
    }

    #[test]
    fn test_temp_file_is_shared_between_connections() {
        let connector = SqliteConnector::new(DatabaseLocation::TempFile);
        connector.initialize().unwrap();
        {
            let mut writer = connector.open_connection().unwrap();
            let mut stmt = writer
                .statement("CREATE TABLE t(a INTEGER); INSERT INTO t VALUES (7);")
                .unwrap();
            stmt.execute_cursor().unwrap();
            // a second connection, while the first is still checked out
            let mut reader = connector.open_connection().unwrap();
            let mut stmt = reader.statement("SELECT a FROM t;").unwrap();
            assert_eq!(stmt.execute_scalar().unwrap(), Some(Value::Integer(7)));
        }
        connector.uninitialize().unwrap();
    }

    #[test]
    fn test_declared_type_is_reported() {
        let connector = SqliteConnector::default();
        connector.initialize().unwrap();
        {
            let mut conn = connector.open_connection().unwrap();
            let mut stmt = conn
                .statement(
                    "CREATE TEMP TABLE typed(id BIGINT, label VARCHAR(10)); \
                     SELECT id, label FROM typed;",
                )
                .unwrap();
            let mut cursor = stmt.execute_cursor().unwrap();
            assert_eq!(cursor.data_type_name(0).unwrap(), "BIGINT");
            assert_eq!(
                cursor.field_type(1).unwrap(),
                cursorspec::ValueKind::Text
            );
            assert!(!cursor.has_rows().unwrap());
        }
        connector.uninitialize().unwrap();
    }

    #[test]
    fn test_literals() {
        let connector = SqliteConnector::default();
        assert_eq!(connector.binary_literal(&[0x7e, 0x57]), "X'7E57'");
        assert_eq!(connector.binary_literal(&[]), "X''");
        assert_eq!(connector.boolean_literal(false), "FALSE");
    }
}
