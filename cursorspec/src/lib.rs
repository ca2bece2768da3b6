//! # cursorspec
//!
//! A behavioral contract for forward-only result cursors, and the machinery to
//! check database connectors against it.
//!
//! A connector implements [`Connector`] (and through it [`Fixture`],
//! [`Connection`], [`Statement`] and [`Cursor`]). The same checks then run
//! against every connector, either from a test via [`conformance_tests!`] or
//! from the `cursorspec` binary through [`ConformanceRunner`].
//!
//! ```rust,ignore
//! use cursorspec::{ConformanceRunner, RunnerConfig};
//!
//! let runner = ConformanceRunner::new(RunnerConfig::default().with_max_jobs(4));
//! let report = runner.run_connector(connector, |run| println!("{run:?}")).await;
//! ```

pub mod cursor;
pub mod error;
pub mod fixture;
pub mod overrides;
pub mod pool;
pub mod runner;
pub mod sql;
pub mod suite;
pub mod value;

pub use cursor::{column_at, Column, Connection, Cursor, CursorState, Rows, Statement};
pub use error::{Error, ErrorKind, Result};
pub use fixture::{Connector, DatabaseLocation, Fixture, LifecycleError};
pub use overrides::{Override, Overrides};
pub use pool::{ConnectionPool, PooledConnection};
pub use runner::{
    assert_topic_conforms, matches_filter, run_check, summarize, CheckOutcome, CheckRun,
    ConformanceRunner, ConnectorReport, RunSummary, RunnerConfig,
};
pub use suite::{all_checks, checks_for, find_check, Check, CheckFailure, Suite, Topic};
pub use value::{DbNull, FromValue, Value, ValueKind};

/// Generate one `#[test]` per topic that runs the whole contract against the
/// connector built by `$connector`. Each test builds its own connector.
///
/// ```rust,ignore
/// cursorspec::conformance_tests!(SqliteConnector::new(DatabaseLocation::Memory));
/// ```
#[macro_export]
macro_rules! conformance_tests {
    ($connector:expr) => {
        $crate::conformance_tests!(@topic $connector, lifecycle, Lifecycle);
        $crate::conformance_tests!(@topic $connector, typed_access, TypedAccess);
        $crate::conformance_tests!(@topic $connector, null_semantics, NullSemantics);
        $crate::conformance_tests!(@topic $connector, metadata, Metadata);
        $crate::conformance_tests!(@topic $connector, buffers, Buffers);
        $crate::conformance_tests!(@topic $connector, text_encoding, TextEncoding);
        $crate::conformance_tests!(@topic $connector, statement, Statement);
    };
    (@topic $connector:expr, $name:ident, $topic:ident) => {
        #[test]
        fn $name() {
            let connector = $connector;
            $crate::assert_topic_conforms(&connector, $crate::Topic::$topic);
        }
    };
}
