//! Connector for the Turso engine, through the `turso` crate.
//!
//! The `turso` API is async, but a local database performs its own I/O, so
//! every call is driven to completion on the calling thread.

mod cursor;

use cursor::TursoCursor;
use cursorspec::{
    Connection, ConnectionPool, Connector, Cursor, DatabaseLocation, Error, Fixture,
    LifecycleError, Overrides, PooledConnection, Result, Statement,
};
use futures::executor::block_on;
use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

struct Storage {
    db: turso::Database,
    /// Keep temp file alive - deleted when dropped
    _temp_file: Option<NamedTempFile>,
}

pub struct TursoConnector {
    location: DatabaseLocation,
    pool: ConnectionPool<turso::Connection>,
    storage: Mutex<Option<Storage>>,
}

impl TursoConnector {
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

    fn connect(&self) -> Result<turso::Connection> {
        let storage = self.storage.lock();
        let storage = storage
            .as_ref()
            .ok_or_else(|| Error::backend(LifecycleError::NotInitialized))?;
        storage.db.connect().map_err(Error::backend)
    }
}

impl Default for TursoConnector {
    fn default() -> Self {
        Self::new(DatabaseLocation::Memory)
    }
}

impl Fixture for TursoConnector {
    fn open_connection(&self) -> Result<Box<dyn Connection>> {
        let conn = self.pool.get_or_create(|| self.connect())?;
        Ok(Box::new(TursoConnection { conn: Some(conn) }))
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex::encode_upper(bytes))
    }

    fn select_no_rows(&self) -> &str {
        "SELECT 1 FROM sqlite_schema WHERE 0 = 1;"
    }
}

impl Connector for TursoConnector {
    fn name(&self) -> &str {
        "turso"
    }

    fn fixture(&self) -> &dyn Fixture {
        self
    }

    fn initialize(&self) -> std::result::Result<(), LifecycleError> {
        let (path, temp_file) = match self.location {
            DatabaseLocation::Memory => (":memory:".to_string(), None),
            DatabaseLocation::TempFile => {
                let temp = NamedTempFile::new()?;
                let path = temp.path().to_string_lossy().to_string();
                (path, Some(temp))
            }
        };
        let db = block_on(turso::Builder::new_local(&path).build())
            .map_err(LifecycleError::create_database)?;
        debug!(location = %self.location, path = %path, "turso connector initialized");
        *self.storage.lock() = Some(Storage {
            db,
            _temp_file: temp_file,
        });
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
        Overrides::new()
            .with_statement("read_works", "SELECT 1 UNION ALL SELECT 2;")
            .with_statement(
                "zero_row_result_exposes_metadata",
                "SELECT 1 AS a, 'x' AS b FROM sqlite_schema WHERE 0 = 1;",
            )
            .with_statement(
                "execute_scalar_returns_null_when_empty",
                "SELECT 1 FROM sqlite_schema WHERE 0 = 1;",
            )
    }
}

struct TursoConnection {
    conn: Option<PooledConnection<turso::Connection>>,
}

impl Connection for TursoConnection {
    fn statement(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>> {
        let conn = self.conn.as_deref().ok_or(Error::ConnectionClosed)?;
        Ok(Box::new(TursoStatement {
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

struct TursoStatement<'conn> {
    conn: &'conn turso::Connection,
    sql: String,
}

impl Statement for TursoStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn execute_cursor(&mut self) -> Result<Box<dyn Cursor + '_>> {
        Ok(Box::new(TursoCursor::execute(self.conn, &self.sql)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursorspec::{ErrorKind, Value};

    #[test]
    fn test_connections_require_initialize() {
        let connector = TursoConnector::default();
        let err = connector.open_connection().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_pool_reuses_released_connections() {
        let connector = TursoConnector::default();
        connector.initialize().unwrap();
        let first = connector.open_connection().unwrap();
        drop(first);
        assert_eq!(connector.pool.available_connections(), 1);
        let _second = connector.open_connection().unwrap();
        assert_eq!(connector.pool.available_connections(), 0);
        assert_eq!(connector.pool.checked_out(), 1);
        assert!(matches!(
            connector.uninitialize(),
            Err(LifecycleError::LeakedConnections(1))
        ));
    }

    #[test]
    fn test_closed_connection_rejects_statements() {
        let connector = TursoConnector::default();
        connector.initialize().unwrap();
        {
            let mut conn = connector.open_connection().unwrap();
            conn.close();
            conn.close();
            assert!(!conn.is_open());
            assert_eq!(
                conn.statement("SELECT 1;").err().unwrap().kind(),
                ErrorKind::Closed
            );
        }
        connector.uninitialize().unwrap();
    }

    #[test]
    fn test_temp_file_database() {
        let connector = TursoConnector::new(DatabaseLocation::TempFile);
        connector.initialize().unwrap();
        {
            let mut conn = connector.open_connection().unwrap();
            let mut stmt = conn
                .statement("CREATE TABLE t(a); INSERT INTO t VALUES ('kept'); SELECT a FROM t;")
                .unwrap();
            assert_eq!(
                stmt.execute_scalar().unwrap(),
                Some(Value::Text("kept".to_string()))
            );
        }
        connector.uninitialize().unwrap();
    }
}
