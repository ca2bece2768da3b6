use super::OutputFormat;
use cursorspec::{CheckOutcome, CheckRun, ConnectorReport, RunSummary};
use serde::Serialize;

/// JSON output for machine consumption
pub struct JsonOutput {
    /// Results grouped by connector, in the order connectors ran
    connectors: Vec<JsonConnectorResult>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            connectors: Vec::new(),
        }
    }

    fn connector_mut(&mut self, name: &str) -> &mut JsonConnectorResult {
        let index = match self.connectors.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.connectors.push(JsonConnectorResult {
                    name: name.to_string(),
                    results: Vec::new(),
                    duration_ms: 0,
                });
                self.connectors.len() - 1
            }
        };
        &mut self.connectors[index]
    }

    /// Build the complete report, consuming the buffered results.
    fn take_report(&mut self, summary: &RunSummary) -> JsonReport {
        JsonReport {
            connectors: std::mem::take(&mut self.connectors),
            summary: JsonSummary {
                total: summary.total,
                passed: summary.passed,
                failed: summary.failed,
                skipped: summary.skipped,
                errors: summary.errors,
                known_deviations: summary.known_deviations,
                duration_ms: summary.duration.as_millis(),
                success: summary.is_success(),
            },
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonCheckResult {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    duration_ms: u128,
}

#[derive(Serialize)]
struct JsonConnectorResult {
    name: String,
    results: Vec<JsonCheckResult>,
    /// Wall time of the connector's run; checks overlap, so this is not the
    /// sum of their durations
    duration_ms: u128,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    errors: usize,
    known_deviations: usize,
    duration_ms: u128,
    success: bool,
}

#[derive(Serialize)]
struct JsonReport {
    connectors: Vec<JsonConnectorResult>,
    summary: JsonSummary,
}

impl OutputFormat for JsonOutput {
    fn write_run(&mut self, connector: &str, run: &CheckRun) {
        let (outcome, reason) = match &run.outcome {
            CheckOutcome::Passed => ("passed", None),
            CheckOutcome::Failed { reason } => ("failed", Some(reason.clone())),
            CheckOutcome::Skipped { reason } => ("skipped", Some(reason.clone())),
            CheckOutcome::Error { message } => ("error", Some(message.clone())),
            CheckOutcome::KnownDeviation { reason } => ("known_deviation", Some(reason.clone())),
        };

        let json_result = JsonCheckResult {
            id: run.id.to_string(),
            topic: run.topic.map(|t| t.name().to_string()),
            outcome,
            reason,
            duration_ms: run.duration.as_millis(),
        };

        self.connector_mut(connector).results.push(json_result);
    }

    fn end_connector(&mut self, report: &ConnectorReport) {
        self.connector_mut(&report.connector).duration_ms = report.duration.as_millis();
    }

    fn write_summary(&mut self, summary: &RunSummary) {
        let report = self.take_report(summary);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing JSON: {e}"),
        }
    }

    fn flush(&mut self) {
        // JSON output is done all at once in write_summary
    }
}
