use crate::fixture::{Connector, LifecycleError};
use crate::overrides::{Override, Overrides};
use crate::suite::{all_checks, Check, CheckContext, CheckFailure, Suite, Topic};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Outcome of one check against one connector
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Passed,
    /// The connector violated the contract
    Failed { reason: String },
    /// Skipped by the connector's overrides
    Skipped { reason: String },
    /// The backend failed, or a lifecycle hook did
    Error { message: String },
    /// Violation the connector declared up front
    KnownDeviation { reason: String },
}

impl CheckOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CheckOutcome::Skipped { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CheckOutcome::Error { .. })
    }
}

/// Result of running a single check, or a lifecycle hook (`topic` is `None`)
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub id: &'static str,
    pub topic: Option<Topic>,
    pub outcome: CheckOutcome,
    pub duration: Duration,
}

impl CheckRun {
    fn lifecycle(id: &'static str, err: &LifecycleError, duration: Duration) -> Self {
        Self {
            id,
            topic: None,
            outcome: CheckOutcome::Error {
                message: format!("{id} failed: {err}"),
            },
            duration,
        }
    }
}

/// Every result for one connector
#[derive(Debug)]
pub struct ConnectorReport {
    pub connector: String,
    pub runs: Vec<CheckRun>,
    pub duration: Duration,
}

/// Aggregated results from a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub known_deviations: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn add(&mut self, outcome: &CheckOutcome) {
        self.total += 1;
        match outcome {
            CheckOutcome::Passed => self.passed += 1,
            CheckOutcome::Failed { .. } => self.failed += 1,
            CheckOutcome::Skipped { .. } => self.skipped += 1,
            CheckOutcome::Error { .. } => self.errors += 1,
            CheckOutcome::KnownDeviation { .. } => self.known_deviations += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum concurrent checks
    pub max_jobs: usize,
    /// Check id filter (glob pattern)
    pub filter: Option<String>,
    /// Suites to run; all when empty
    pub suites: Vec<Suite>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_jobs: num_cpus::get(),
            filter: None,
            suites: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn with_max_jobs(mut self, jobs: usize) -> Self {
        self.max_jobs = jobs.max(1);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_suite(mut self, suite: Suite) -> Self {
        if !self.suites.contains(&suite) {
            self.suites.push(suite);
        }
        self
    }

    fn selects(&self, check: &Check) -> bool {
        if !self.suites.is_empty() && !self.suites.contains(&check.suite()) {
            return false;
        }
        match &self.filter {
            Some(filter) => matches_filter(check.id, filter),
            None => true,
        }
    }
}

/// Runs the contract against connectors
pub struct ConformanceRunner {
    config: RunnerConfig,
    semaphore: Arc<Semaphore>,
}

impl Default for ConformanceRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl ConformanceRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_jobs.max(1)));
        Self { config, semaphore }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Checks this runner will execute, in catalogue order
    pub fn selected_checks(&self) -> Vec<&'static Check> {
        all_checks().filter(|c| self.config.selects(c)).collect()
    }

    /// Run every selected check against `connector`, bracketed by exactly one
    /// `initialize` and one `uninitialize`. `on_run` sees each result as soon
    /// as it completes.
    pub async fn run_connector<F>(&self, connector: Arc<dyn Connector>, mut on_run: F) -> ConnectorReport
    where
        F: FnMut(&CheckRun),
    {
        let start = Instant::now();
        let name = connector.name().to_string();
        let mut runs = Vec::new();
        info!(connector = %name, "running conformance checks");

        let hook_start = Instant::now();
        let init = {
            let connector = Arc::clone(&connector);
            tokio::task::spawn_blocking(move || connector.initialize()).await
        };
        match init {
            Ok(Ok(())) => debug!(connector = %name, "initialized"),
            Ok(Err(err)) => {
                warn!(connector = %name, error = %err, "initialize failed");
                let run = CheckRun::lifecycle("initialize", &err, hook_start.elapsed());
                on_run(&run);
                runs.push(run);
                return ConnectorReport {
                    connector: name,
                    runs,
                    duration: start.elapsed(),
                };
            }
            Err(e) => {
                let run = CheckRun {
                    id: "initialize",
                    topic: None,
                    outcome: CheckOutcome::Error {
                        message: format!("initialize panicked: {e}"),
                    },
                    duration: hook_start.elapsed(),
                };
                on_run(&run);
                runs.push(run);
                return ConnectorReport {
                    connector: name,
                    runs,
                    duration: start.elapsed(),
                };
            }
        }

        let overrides = Arc::new(connector.overrides());
        let known: Vec<&str> = all_checks().map(|c| c.id).collect();
        for id in overrides.unknown_checks(&known) {
            warn!(connector = %name, check = id, "override does not match any check");
        }

        let mut futures = FuturesUnordered::new();
        for check in self.selected_checks() {
            let connector = Arc::clone(&connector);
            let overrides = Arc::clone(&overrides);
            let semaphore = Arc::clone(&self.semaphore);
            futures.push(async move {
                let start = Instant::now();
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => tokio::task::spawn_blocking(move || {
                        run_check(check, connector.as_ref(), &overrides)
                    })
                    .await
                    .unwrap_or_else(|e| CheckOutcome::Error {
                        message: format!("check panicked: {e}"),
                    }),
                    Err(e) => CheckOutcome::Error {
                        message: format!("runner shut down: {e}"),
                    },
                };
                CheckRun {
                    id: check.id,
                    topic: Some(check.topic),
                    outcome,
                    duration: start.elapsed(),
                }
            });
        }

        while let Some(run) = futures.next().await {
            on_run(&run);
            runs.push(run);
        }

        let hook_start = Instant::now();
        let uninit = {
            let connector = Arc::clone(&connector);
            tokio::task::spawn_blocking(move || connector.uninitialize()).await
        };
        match uninit {
            Ok(Ok(())) => debug!(connector = %name, "uninitialized"),
            Ok(Err(err)) => {
                warn!(connector = %name, error = %err, "uninitialize failed");
                let run = CheckRun::lifecycle("uninitialize", &err, hook_start.elapsed());
                on_run(&run);
                runs.push(run);
            }
            Err(e) => {
                let run = CheckRun {
                    id: "uninitialize",
                    topic: None,
                    outcome: CheckOutcome::Error {
                        message: format!("uninitialize panicked: {e}"),
                    },
                    duration: hook_start.elapsed(),
                };
                on_run(&run);
                runs.push(run);
            }
        }

        ConnectorReport {
            connector: name,
            runs,
            duration: start.elapsed(),
        }
    }

    /// One full run per connector, in order. Connectors never share a run,
    /// so one backend's lifecycle cannot disturb another's.
    pub async fn run_matrix<F>(&self, connectors: &[Arc<dyn Connector>], mut on_run: F) -> Vec<ConnectorReport>
    where
        F: FnMut(&str, &CheckRun),
    {
        let mut reports = Vec::with_capacity(connectors.len());
        for connector in connectors {
            let name = connector.name().to_string();
            let report = self
                .run_connector(Arc::clone(connector), |run| on_run(&name, run))
                .await;
            reports.push(report);
        }
        reports
    }
}

/// Run one check synchronously, applying the connector's override for it.
pub fn run_check(check: &Check, connector: &dyn Connector, overrides: &Overrides) -> CheckOutcome {
    let deviation = match overrides.get(check.id) {
        Some(Override::Skip { reason }) => {
            debug!(check = check.id, %reason, "skipped by override");
            return CheckOutcome::Skipped {
                reason: reason.clone(),
            };
        }
        Some(Override::KnownDeviation { reason }) => Some(reason.clone()),
        Some(Override::Statement(_)) | None => None,
    };

    let ctx = CheckContext::new(check.id, connector.fixture(), overrides);
    let result = check.run(&ctx);
    debug!(check = check.id, connector = connector.name(), ok = result.is_ok(), "check finished");

    match (result, deviation) {
        (Ok(()), None) => CheckOutcome::Passed,
        (Ok(()), Some(reason)) => CheckOutcome::Failed {
            reason: format!("declared as a known deviation ({reason}) but passed"),
        },
        (Err(CheckFailure::Violation(reason)), None) => CheckOutcome::Failed { reason },
        (Err(CheckFailure::Violation(_)), Some(reason)) => {
            CheckOutcome::KnownDeviation { reason }
        }
        (Err(CheckFailure::Backend(err)), _) => CheckOutcome::Error {
            message: err.to_string(),
        },
    }
}

/// Check if check id matches filter pattern
pub fn matches_filter(name: &str, pattern: &str) -> bool {
    // Simple glob matching: * matches anything
    if pattern.contains('*') {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 2 {
            name.len() >= parts[0].len() + parts[1].len()
                && name.starts_with(parts[0])
                && name.ends_with(parts[1])
        } else {
            let mut rest = name;
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                if part.is_empty() {
                    continue;
                }
                if i == 0 {
                    match rest.strip_prefix(part) {
                        Some(r) => rest = r,
                        None => return false,
                    }
                } else if i == last {
                    return rest.ends_with(part);
                } else {
                    match rest.find(part) {
                        Some(pos) => rest = &rest[pos + part.len()..],
                        None => return false,
                    }
                }
            }
            true
        }
    } else {
        name == pattern
    }
}

/// Compute summary from connector reports
pub fn summarize(reports: &[ConnectorReport]) -> RunSummary {
    let mut summary = RunSummary::default();
    for report in reports {
        for run in &report.runs {
            summary.add(&run.outcome);
        }
    }
    summary.duration = reports.iter().map(|r| r.duration).sum();
    summary
}

/// Run every check of `topic` against `connector` and panic with a report of
/// every failure and error. Used by [`crate::conformance_tests!`].
pub fn assert_topic_conforms(connector: &dyn Connector, topic: Topic) {
    if let Err(err) = connector.initialize() {
        panic!("{}: initialize failed: {err}", connector.name());
    }
    let overrides = connector.overrides();
    let mut problems = Vec::new();
    for check in crate::suite::checks_for(topic) {
        match run_check(check, connector, &overrides) {
            CheckOutcome::Failed { reason } => problems.push(format!("FAIL  {}: {reason}", check.id)),
            CheckOutcome::Error { message } => problems.push(format!("ERROR {}: {message}", check.id)),
            _ => {}
        }
    }
    if let Err(err) = connector.uninitialize() {
        problems.push(format!("ERROR uninitialize: {err}"));
    }
    assert!(
        problems.is_empty(),
        "{} does not conform ({topic}):\n{}",
        connector.name(),
        problems.join("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_filter_exact() {
        assert!(matches_filter("read_works", "read_works"));
        assert!(!matches_filter("read_works", "read_throws_when_closed"));
    }

    #[test]
    fn test_matches_filter_prefix_and_suffix() {
        assert!(matches_filter("get_bytes_works", "get_bytes_*"));
        assert!(matches_filter("get_value_throws_when_closed", "*_when_closed"));
        assert!(!matches_filter("get_value_works_when_null", "*_when_closed"));
    }

    #[test]
    fn test_matches_filter_multiple_wildcards() {
        assert!(matches_filter("get_string_works_utf8_two_bytes", "*utf8*"));
        assert!(matches_filter("get_string_works_utf8_two_bytes", "get_*_utf8_*"));
        assert!(!matches_filter("get_chars_works", "*utf8*"));
        assert!(!matches_filter("is_db_null_works", "get_*_utf8_*"));
    }

    #[test]
    fn test_summary_add() {
        let mut summary = RunSummary::default();
        summary.add(&CheckOutcome::Passed);
        summary.add(&CheckOutcome::Passed);
        summary.add(&CheckOutcome::Failed {
            reason: "mismatch".to_string(),
        });
        summary.add(&CheckOutcome::Skipped {
            reason: "skip".to_string(),
        });
        summary.add(&CheckOutcome::KnownDeviation {
            reason: "ordering".to_string(),
        });

        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.known_deviations, 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_known_deviations_do_not_fail_a_run() {
        let mut summary = RunSummary::default();
        summary.add(&CheckOutcome::Passed);
        summary.add(&CheckOutcome::KnownDeviation {
            reason: "x".to_string(),
        });
        assert!(summary.is_success());
    }

    #[test]
    fn test_config_selection() {
        let runner = ConformanceRunner::new(RunnerConfig::default().with_suite(Suite::Statement));
        let checks = runner.selected_checks();
        assert!(!checks.is_empty());
        assert!(checks.iter().all(|c| c.suite() == Suite::Statement));

        let runner = ConformanceRunner::new(RunnerConfig::default().with_filter("read_*"));
        let ids: Vec<_> = runner.selected_checks().iter().map(|c| c.id).collect();
        assert_eq!(
            ids,
            vec!["read_works", "read_throws_when_closed", "read_returns_false_after_exhaustion"]
        );
    }
}
