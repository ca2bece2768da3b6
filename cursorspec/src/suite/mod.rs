//! The contract checks, grouped by suite and topic.
//!
//! Every check is a plain function over a [`CheckContext`]. A check id is the
//! function name; connectors key their [`Overrides`] by it.

#[macro_use]
mod assert;

mod buffers;
mod lifecycle;
mod metadata;
mod null_semantics;
mod statement;
mod text_encoding;
mod typed_access;

pub use assert::expect_kind;

use crate::cursor::{Connection, Cursor};
use crate::error::{Error, ErrorKind};
use crate::fixture::Fixture;
use crate::overrides::Overrides;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
    Cursor,
    Statement,
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suite::Cursor => write!(f, "cursor"),
            Suite::Statement => write!(f, "statement"),
        }
    }
}

impl FromStr for Suite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cursor" => Ok(Suite::Cursor),
            "statement" => Ok(Suite::Statement),
            _ => Err(format!("unknown suite: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Lifecycle,
    TypedAccess,
    NullSemantics,
    Metadata,
    Buffers,
    TextEncoding,
    Statement,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::Lifecycle,
        Topic::TypedAccess,
        Topic::NullSemantics,
        Topic::Metadata,
        Topic::Buffers,
        Topic::TextEncoding,
        Topic::Statement,
    ];

    pub fn suite(self) -> Suite {
        match self {
            Topic::Statement => Suite::Statement,
            _ => Suite::Cursor,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Topic::Lifecycle => "lifecycle",
            Topic::TypedAccess => "typed_access",
            Topic::NullSemantics => "null_semantics",
            Topic::Metadata => "metadata",
            Topic::Buffers => "buffers",
            Topic::TextEncoding => "text_encoding",
            Topic::Statement => "statement",
        }
    }

    fn checks(self) -> &'static [Check] {
        match self {
            Topic::Lifecycle => lifecycle::CHECKS,
            Topic::TypedAccess => typed_access::CHECKS,
            Topic::NullSemantics => null_semantics::CHECKS,
            Topic::Metadata => metadata::CHECKS,
            Topic::Buffers => buffers::CHECKS,
            Topic::TextEncoding => text_encoding::CHECKS,
            Topic::Statement => statement::CHECKS,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type CheckResult = std::result::Result<(), CheckFailure>;

/// Why a check did not pass.
#[derive(Debug)]
pub enum CheckFailure {
    /// The connector broke the contract.
    Violation(String),
    /// The backend failed below the contract; the check could not decide.
    Backend(Error),
}

impl CheckFailure {
    pub fn violation(reason: impl Into<String>) -> Self {
        CheckFailure::Violation(reason.into())
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFailure::Violation(reason) => f.write_str(reason),
            CheckFailure::Backend(err) => write!(f, "{err}"),
        }
    }
}

/// An unexpected contract error inside a check is itself a violation; only
/// backend errors are environmental.
impl From<Error> for CheckFailure {
    fn from(err: Error) -> Self {
        match err.kind() {
            ErrorKind::Backend => CheckFailure::Backend(err),
            kind => CheckFailure::Violation(format!("unexpected {kind} error: {err}")),
        }
    }
}

/// One contract check.
#[derive(Clone, Copy)]
pub struct Check {
    pub id: &'static str,
    pub topic: Topic,
    run: fn(&CheckContext<'_>) -> CheckResult,
}

impl Check {
    pub const fn new(
        id: &'static str,
        topic: Topic,
        run: fn(&CheckContext<'_>) -> CheckResult,
    ) -> Self {
        Self { id, topic, run }
    }

    pub fn suite(&self) -> Suite {
        self.topic.suite()
    }

    pub fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
        (self.run)(ctx)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .finish()
    }
}

/// Every check, ordered by topic.
pub fn all_checks() -> impl Iterator<Item = &'static Check> {
    Topic::ALL.into_iter().flat_map(|topic| topic.checks().iter())
}

pub fn checks_for(topic: Topic) -> &'static [Check] {
    topic.checks()
}

pub fn find_check(id: &str) -> Option<&'static Check> {
    all_checks().find(|check| check.id == id)
}

/// What a check sees of the connector under test.
pub struct CheckContext<'a> {
    check: &'static str,
    fixture: &'a dyn Fixture,
    overrides: &'a Overrides,
}

impl<'a> CheckContext<'a> {
    pub fn new(check: &'static str, fixture: &'a dyn Fixture, overrides: &'a Overrides) -> Self {
        Self {
            check,
            fixture,
            overrides,
        }
    }

    pub fn check_id(&self) -> &'static str {
        self.check
    }

    pub fn fixture(&self) -> &'a dyn Fixture {
        self.fixture
    }

    /// The statement to run: the connector's replacement for this check if
    /// it registered one, `default` otherwise.
    pub fn sql<'s>(&'s self, default: &'s str) -> &'s str {
        self.overrides.statement(self.check).unwrap_or(default)
    }

    pub fn open(&self) -> Result<Box<dyn Connection>, CheckFailure> {
        Ok(self.fixture.open_connection()?)
    }

    /// Open a connection, execute `sql` and hand the fresh cursor to `f`.
    /// Everything is released when `f` returns.
    pub fn with_cursor<F>(&self, sql: &str, f: F) -> CheckResult
    where
        F: FnOnce(&mut dyn Cursor) -> CheckResult,
    {
        let mut conn = self.open()?;
        let mut stmt = conn.statement(sql)?;
        let mut cursor = stmt.execute_cursor()?;
        f(cursor.as_mut())
    }

    /// Like [`CheckContext::with_cursor`], with the first row already read.
    pub fn with_row<F>(&self, sql: &str, f: F) -> CheckResult
    where
        F: FnOnce(&mut dyn Cursor) -> CheckResult,
    {
        self.with_cursor(sql, |cursor| {
            ensure!(cursor.read()?, "expected a row from {sql:?}");
            f(cursor)
        })
    }

    /// A cursor over `sql` that has been closed before `f` sees it.
    pub fn with_closed_cursor<F>(&self, sql: &str, f: F) -> CheckResult
    where
        F: FnOnce(&mut dyn Cursor) -> CheckResult,
    {
        self.with_cursor(sql, |cursor| {
            cursor.close();
            f(cursor)
        })
    }

    /// A cursor over `sql` whose only result set has been read to the end.
    pub fn with_exhausted_cursor<F>(&self, sql: &str, f: F) -> CheckResult
    where
        F: FnOnce(&mut dyn Cursor) -> CheckResult,
    {
        self.with_cursor(sql, |cursor| {
            while cursor.read()? {}
            f(cursor)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_check_ids_are_unique() {
        let mut seen = HashSet::new();
        for check in all_checks() {
            assert!(seen.insert(check.id), "duplicate check id {}", check.id);
        }
    }

    #[test]
    fn test_every_topic_has_checks() {
        for topic in Topic::ALL {
            assert!(!checks_for(topic).is_empty(), "{topic} has no checks");
            assert!(checks_for(topic).iter().all(|c| c.topic == topic));
        }
    }

    #[test]
    fn test_find_check() {
        let check = find_check("execute_scalar_returns_null_when_empty").unwrap();
        assert_eq!(check.suite(), Suite::Statement);
        assert_eq!(find_check("read_works").unwrap().topic, Topic::Lifecycle);
        assert!(find_check("no_such_check").is_none());
    }

    #[test]
    fn test_contract_errors_become_violations() {
        assert!(matches!(
            CheckFailure::from(Error::CursorClosed),
            CheckFailure::Violation(_)
        ));
        assert!(matches!(
            CheckFailure::from(Error::backend("io")),
            CheckFailure::Backend(_)
        ));
    }

    #[test]
    fn test_suite_parse() {
        assert_eq!("Cursor".parse::<Suite>(), Ok(Suite::Cursor));
        assert!("reader".parse::<Suite>().is_err());
    }
}
