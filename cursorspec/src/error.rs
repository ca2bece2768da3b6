use crate::value::ValueKind;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed classification of every failure a cursor, statement or connection
/// can report. Checks assert on the kind, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A row accessor was used before the first `read`.
    BeforeRead,
    /// A row accessor was used after `read` returned false.
    Exhausted,
    /// The cursor or connection has been closed.
    Closed,
    /// The stored value cannot be represented as the requested type.
    TypeMismatch,
    /// An ordinal past the field count, or a column name that does not exist.
    IndexOutOfRange,
    /// Anything reported by the database below the contract.
    Backend,
}

impl ErrorKind {
    /// Before-read, exhausted and closed access are all misuse of the cursor
    /// state machine.
    pub fn is_state_misuse(self) -> bool {
        matches!(
            self,
            ErrorKind::BeforeRead | ErrorKind::Exhausted | ErrorKind::Closed
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::BeforeRead => "before-read",
            ErrorKind::Exhausted => "exhausted",
            ErrorKind::Closed => "closed",
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::IndexOutOfRange => "index-out-of-range",
            ErrorKind::Backend => "backend",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no current row: read() has not been called")]
    BeforeRead,
    #[error("no current row: the result set is exhausted")]
    Exhausted,
    #[error("cursor is closed")]
    CursorClosed,
    #[error("connection is closed")]
    ConnectionClosed,
    #[error("cannot read {found} value as {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: ValueKind,
    },
    #[error("{value} does not fit in {expected}")]
    Overflow { expected: &'static str, value: String },
    #[error("ordinal {ordinal} is out of range for {field_count} field(s)")]
    OrdinalOutOfRange { ordinal: usize, field_count: usize },
    #[error("no column named `{0}`")]
    UnknownColumn(String),
    #[error("backend error: {0}")]
    Backend(#[source] BoxError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BeforeRead => ErrorKind::BeforeRead,
            Error::Exhausted => ErrorKind::Exhausted,
            Error::CursorClosed | Error::ConnectionClosed => ErrorKind::Closed,
            Error::TypeMismatch { .. } | Error::Overflow { .. } => ErrorKind::TypeMismatch,
            Error::OrdinalOutOfRange { .. } | Error::UnknownColumn(_) => {
                ErrorKind::IndexOutOfRange
            }
            Error::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Wrap a driver error that surfaced below the contract.
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Error::Backend(err.into())
    }

    pub(crate) fn mismatch(expected: &'static str, found: ValueKind) -> Self {
        Error::TypeMismatch { expected, found }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_variants_share_a_kind() {
        assert_eq!(Error::CursorClosed.kind(), ErrorKind::Closed);
        assert_eq!(Error::ConnectionClosed.kind(), ErrorKind::Closed);
        assert!(Error::CursorClosed.kind().is_state_misuse());
    }

    #[test]
    fn test_overflow_is_a_type_mismatch() {
        let err = Error::Overflow {
            expected: "u8",
            value: "300".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(!err.kind().is_state_misuse());
        assert_eq!(err.to_string(), "300 does not fit in u8");
    }

    #[test]
    fn test_backend_wraps_source() {
        let err = Error::backend("disk I/O error");
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.to_string(), "backend error: disk I/O error");
        assert!(std::error::Error::source(&err).is_some());
    }
}
