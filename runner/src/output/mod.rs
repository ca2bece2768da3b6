pub mod json;
pub mod pretty;

use cursorspec::{CheckOutcome, CheckRun, ConnectorReport, RunSummary};

/// Output format trait
pub trait OutputFormat {
    /// Write the result of one check as it completes (for streaming output)
    fn write_run(&mut self, connector: &str, run: &CheckRun);

    /// Called once a connector's whole run, hooks included, has finished
    fn end_connector(&mut self, _report: &ConnectorReport) {}

    /// Write the final summary
    fn write_summary(&mut self, summary: &RunSummary);

    /// Flush any buffered output
    fn flush(&mut self);
}

/// Available output formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Format {
    Pretty,
    Json,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Format::Pretty),
            "json" => Ok(Format::Json),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

/// Create an output formatter for the given format
pub fn create_output(format: Format) -> Box<dyn OutputFormat> {
    match format {
        Format::Pretty => Box::new(pretty::PrettyOutput::new()),
        Format::Json => Box::new(json::JsonOutput::new()),
    }
}

/// Helper to get outcome symbol for display
pub fn outcome_symbol(outcome: &CheckOutcome) -> &'static str {
    match outcome {
        CheckOutcome::Passed => "PASS",
        CheckOutcome::Failed { .. } => "FAIL",
        CheckOutcome::Skipped { .. } => "SKIP",
        CheckOutcome::Error { .. } => "ERROR",
        CheckOutcome::KnownDeviation { .. } => "XFAIL",
    }
}

/// `topic/id` for checks, the bare hook name for lifecycle runs
pub fn run_label(run: &CheckRun) -> String {
    match run.topic {
        Some(topic) => format!("{topic}/{}", run.id),
        None => run.id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursorspec::Topic;
    use std::time::Duration;

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("pretty".parse::<Format>().unwrap(), Format::Pretty);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_run_label() {
        let mut run = CheckRun {
            id: "read_works",
            topic: Some(Topic::Lifecycle),
            outcome: CheckOutcome::Passed,
            duration: Duration::ZERO,
        };
        assert_eq!(run_label(&run), "lifecycle/read_works");
        run.id = "initialize";
        run.topic = None;
        assert_eq!(run_label(&run), "initialize");
    }
}
