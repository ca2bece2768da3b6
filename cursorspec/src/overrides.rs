//! Per-connector adjustments to individual checks, keyed by check id.

use std::collections::HashMap;

/// What a connector changes about one check.
#[derive(Debug, Clone, PartialEq)]
pub enum Override {
    /// Run the same assertion against this statement text instead of the
    /// default one.
    Statement(String),
    /// Do not run the check.
    Skip { reason: String },
    /// The backend is known to violate this check. A violation is reported as
    /// a known deviation; an unexpected pass is a failure.
    KnownDeviation { reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: HashMap<String, Override>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(self, check: &str, sql: impl Into<String>) -> Self {
        self.with(check, Override::Statement(sql.into()))
    }

    pub fn with_skip(self, check: &str, reason: impl Into<String>) -> Self {
        self.with(
            check,
            Override::Skip {
                reason: reason.into(),
            },
        )
    }

    pub fn with_known_deviation(self, check: &str, reason: impl Into<String>) -> Self {
        self.with(
            check,
            Override::KnownDeviation {
                reason: reason.into(),
            },
        )
    }

    /// Later entries for the same check replace earlier ones.
    pub fn with(mut self, check: &str, entry: Override) -> Self {
        self.entries.insert(check.to_string(), entry);
        self
    }

    pub fn get(&self, check: &str) -> Option<&Override> {
        self.entries.get(check)
    }

    /// Replacement statement for `check`, if one is registered.
    pub fn statement(&self, check: &str) -> Option<&str> {
        match self.entries.get(check) {
            Some(Override::Statement(sql)) => Some(sql),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that do not name any of `known`, sorted.
    pub fn unknown_checks<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = self
            .entries
            .keys()
            .map(String::as_str)
            .filter(|id| !known.contains(id))
            .collect();
        unknown.sort_unstable();
        unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_lookup() {
        let overrides = Overrides::new()
            .with_statement("read_works", "SELECT 1 UNION ALL SELECT 2;")
            .with_skip("get_guid_works_when_text", "no uuid text support");

        assert_eq!(
            overrides.statement("read_works"),
            Some("SELECT 1 UNION ALL SELECT 2;")
        );
        assert_eq!(overrides.statement("get_guid_works_when_text"), None);
        assert!(matches!(
            overrides.get("get_guid_works_when_text"),
            Some(Override::Skip { .. })
        ));
        assert_eq!(overrides.get("depth_returns_zero"), None);
    }

    #[test]
    fn test_last_entry_wins() {
        let overrides = Overrides::new()
            .with_statement("read_works", "SELECT 1;")
            .with_known_deviation("read_works", "ordering differs");
        assert!(matches!(
            overrides.get("read_works"),
            Some(Override::KnownDeviation { .. })
        ));
    }

    #[test]
    fn test_unknown_checks() {
        let overrides = Overrides::new()
            .with_skip("read_works", "x")
            .with_skip("reed_works", "typo")
            .with_skip("a_typo", "typo");
        assert_eq!(
            overrides.unknown_checks(&["read_works", "depth_returns_zero"]),
            vec!["a_typo", "reed_works"]
        );
        assert!(Overrides::new().is_empty());
    }
}
