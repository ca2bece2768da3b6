use super::{CheckFailure, CheckResult};
use crate::error::{ErrorKind, Result};

/// Fail the check with a violation unless `cond` holds.
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::suite::CheckFailure::violation(format!($($arg)+)));
        }
    };
}

/// Fail the check with a violation unless both sides are equal.
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err($crate::suite::CheckFailure::violation(format!(
                        "`{}`: expected {:?}, got {:?}",
                        stringify!($left),
                        right,
                        left
                    )));
                }
            }
        }
    };
}

/// Register a topic's checks; each id is the function name.
macro_rules! checks {
    ($topic:expr => [$($check:ident),* $(,)?]) => {
        pub(super) const CHECKS: &[$crate::suite::Check] = &[
            $($crate::suite::Check::new(stringify!($check), $topic, $check)),*
        ];
    };
}

/// Pass only if `result` is an error of `kind`. `what` names the operation
/// in the failure message.
pub fn expect_kind<T>(result: Result<T>, kind: ErrorKind, what: &str) -> CheckResult {
    match result {
        Ok(_) => Err(CheckFailure::violation(format!(
            "{what}: expected a {kind} error, but it succeeded"
        ))),
        Err(err) if err.kind() == kind => Ok(()),
        Err(err) => Err(CheckFailure::violation(format!(
            "{what}: expected a {kind} error, got {}: {err}",
            err.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn compare(left: i64, right: i64) -> CheckResult {
        ensure_eq!(left, right);
        Ok(())
    }

    #[test]
    fn test_ensure_eq_reports_both_sides() {
        assert!(compare(1, 1).is_ok());
        match compare(1, 2) {
            Err(CheckFailure::Violation(reason)) => {
                assert_eq!(reason, "`left`: expected 2, got 1")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_expect_kind() {
        assert!(expect_kind::<()>(Err(Error::Exhausted), ErrorKind::Exhausted, "read").is_ok());
        assert!(expect_kind(Ok(1), ErrorKind::Closed, "read").is_err());
        let wrong = expect_kind::<()>(Err(Error::BeforeRead), ErrorKind::Closed, "get_value");
        match wrong {
            Err(CheckFailure::Violation(reason)) => assert_eq!(
                reason,
                "get_value: expected a closed error, got before-read: no current row: read() has not been called"
            ),
            other => panic!("unexpected {other:?}"),
        }
    }
}
