use crate::cursor::Connection;
use crate::error::{BoxError, Result};
use crate::overrides::Overrides;
use crate::sql;
use std::fmt;
use std::str::FromStr;

/// Supplies ready-to-use connections and the dialect-specific bits of SQL the
/// checks need.
pub trait Fixture: Send + Sync {
    fn open_connection(&self) -> Result<Box<dyn Connection>>;

    fn boolean_literal(&self, value: bool) -> String;

    fn binary_literal(&self, bytes: &[u8]) -> String;

    /// A statement that returns one column and zero rows. It ends with `;`
    /// so it can prefix a batch.
    fn select_no_rows(&self) -> &str;

    fn text_literal(&self, text: &str) -> String {
        sql::text_literal(text)
    }
}

/// A named backend under test.
///
/// The runner calls [`Connector::initialize`] once before the first check
/// and [`Connector::uninitialize`] once after the last; checks never call
/// either.
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn fixture(&self) -> &dyn Fixture;

    fn initialize(&self) -> std::result::Result<(), LifecycleError>;

    fn uninitialize(&self) -> std::result::Result<(), LifecycleError>;

    fn overrides(&self) -> Overrides {
        Overrides::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0} connection(s) still checked out")]
    LeakedConnections(usize),
    #[error("connector is not initialized")]
    NotInitialized,
    #[error("failed to create database: {0}")]
    CreateDatabase(#[source] BoxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LifecycleError {
    pub fn create_database(err: impl Into<BoxError>) -> Self {
        LifecycleError::CreateDatabase(err.into())
    }
}

/// Where a connector keeps its database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseLocation {
    /// In-memory database, private to each connection.
    #[default]
    Memory,
    /// Temporary file shared by the connector's connections, deleted on
    /// `uninitialize`.
    TempFile,
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::Memory => write!(f, "memory"),
            DatabaseLocation::TempFile => write!(f, "temp"),
        }
    }
}

impl FromStr for DatabaseLocation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | ":memory:" => Ok(DatabaseLocation::Memory),
            "temp" | "tempfile" => Ok(DatabaseLocation::TempFile),
            _ => Err(format!("unknown database location: {s}")),
        }
    }
}
