//! Registry of the connectors the runner knows how to build.

use cursorspec::{Connector, DatabaseLocation};
use cursorspec_sqlite::SqliteConnector;
use cursorspec_turso::TursoConnector;
use std::sync::Arc;

/// Registered connector names, in matrix order.
pub const CONNECTOR_NAMES: &[&str] = &["sqlite", "turso"];

#[derive(Debug, thiserror::Error)]
#[error("unknown connector '{0}', expected one of: {names}", names = CONNECTOR_NAMES.join(", "))]
pub struct UnknownConnector(pub String);

pub fn create_connector(
    name: &str,
    location: DatabaseLocation,
) -> Result<Arc<dyn Connector>, UnknownConnector> {
    match name.to_lowercase().as_str() {
        "sqlite" => Ok(Arc::new(SqliteConnector::new(location))),
        "turso" => Ok(Arc::new(TursoConnector::new(location))),
        _ => Err(UnknownConnector(name.to_string())),
    }
}

/// Build the connectors named by `names`; every registered one when `names`
/// is empty or contains `all`. Duplicates are dropped.
pub fn resolve_connectors(
    names: &[String],
    location: DatabaseLocation,
) -> Result<Vec<Arc<dyn Connector>>, UnknownConnector> {
    let all = names.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case("all"));
    let mut selected: Vec<String> = if all {
        CONNECTOR_NAMES.iter().map(|n| n.to_string()).collect()
    } else {
        names.iter().map(|n| n.to_lowercase()).collect()
    };
    let mut seen = std::collections::HashSet::new();
    selected.retain(|n| seen.insert(n.clone()));
    selected
        .iter()
        .map(|name| create_connector(name, location))
        .collect()
}
