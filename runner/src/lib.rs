pub mod connectors;
pub mod output;

pub use connectors::{create_connector, resolve_connectors, UnknownConnector, CONNECTOR_NAMES};
pub use output::{create_output, Format, OutputFormat};
