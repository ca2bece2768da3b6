use super::{outcome_symbol, run_label, OutputFormat};
use colored::Colorize;
use cursorspec::{CheckOutcome, CheckRun, RunSummary};
use std::io::{self, Write};

/// Pretty human-readable output
pub struct PrettyOutput {
    current_connector: Option<String>,
    /// Store failed/error runs to print details at the end
    failed_runs: Vec<(String, CheckRun)>,
}

impl PrettyOutput {
    pub fn new() -> Self {
        Self {
            current_connector: None,
            failed_runs: Vec::new(),
        }
    }

    fn outcome_colored(&self, outcome: &CheckOutcome) -> colored::ColoredString {
        let symbol = outcome_symbol(outcome);
        match outcome {
            CheckOutcome::Passed => symbol.green(),
            CheckOutcome::Failed { .. } => symbol.red(),
            CheckOutcome::Skipped { .. } => symbol.yellow(),
            CheckOutcome::Error { .. } => symbol.red().bold(),
            CheckOutcome::KnownDeviation { .. } => symbol.cyan(),
        }
    }
}

impl Default for PrettyOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormat for PrettyOutput {
    fn write_run(&mut self, connector: &str, run: &CheckRun) {
        // Print connector header if new connector
        if self.current_connector.as_deref() != Some(connector) {
            if self.current_connector.is_some() {
                println!();
            }
            println!("{}", connector.bold());
            self.current_connector = Some(connector.to_string());
        }

        let duration_str = format!("({:.2?})", run.duration);
        let status = self.outcome_colored(&run.outcome);
        let label = run_label(run);

        match &run.outcome {
            CheckOutcome::Passed => {
                println!("  [{status}] {label:<60} {}", duration_str.dimmed());
            }
            CheckOutcome::Failed { .. } | CheckOutcome::Error { .. } => {
                println!("  [{status}] {label:<60} {}", duration_str.dimmed());
                self.failed_runs.push((connector.to_string(), run.clone()));
            }
            CheckOutcome::Skipped { reason } | CheckOutcome::KnownDeviation { reason } => {
                println!(
                    "  [{status}] {label:<60} {} {}",
                    duration_str.dimmed(),
                    format!("({reason})").dimmed()
                );
            }
        }
    }

    fn write_summary(&mut self, summary: &RunSummary) {
        // Print failure details at the end
        if !self.failed_runs.is_empty() {
            println!();
            println!("{}", "Failures:".red().bold());
            println!();

            for (connector, run) in &self.failed_runs {
                println!("{}", format!("── {} ({connector})", run_label(run)).red());
                match &run.outcome {
                    CheckOutcome::Failed { reason } => {
                        for line in reason.lines() {
                            println!("   {line}");
                        }
                    }
                    CheckOutcome::Error { message } => {
                        for line in message.lines() {
                            println!("   {}", line.red());
                        }
                    }
                    _ => {}
                }
                println!();
            }
        }

        println!("{}", "Summary:".bold());

        let mut parts = Vec::new();
        if summary.passed > 0 {
            parts.push(format!("{} passed", summary.passed).green().to_string());
        }
        if summary.failed > 0 {
            parts.push(format!("{} failed", summary.failed).red().to_string());
        }
        if summary.known_deviations > 0 {
            parts.push(
                format!("{} known deviations", summary.known_deviations)
                    .cyan()
                    .to_string(),
            );
        }
        if summary.skipped > 0 {
            parts.push(format!("{} skipped", summary.skipped).yellow().to_string());
        }
        if summary.errors > 0 {
            parts.push(format!("{} errors", summary.errors).red().to_string());
        }
        if parts.is_empty() {
            parts.push("no checks selected".dimmed().to_string());
        }

        println!("  {}", parts.join(", "));
        println!(
            "  {}",
            format!("Total time: {:.2?}", summary.duration).dimmed()
        );

        println!();
        if summary.is_success() {
            println!("{}", "All connectors conform.".green().bold());
        } else {
            println!("{}", "Some checks failed.".red().bold());
        }
    }

    fn flush(&mut self) {
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cursorspec::Topic;
    use std::time::Duration;

    fn run(id: &'static str, outcome: CheckOutcome) -> CheckRun {
        CheckRun {
            id,
            topic: Some(Topic::Metadata),
            outcome,
            duration: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_only_failures_and_errors_are_kept_for_details() {
        let mut output = PrettyOutput::new();
        output.write_run("sqlite", &run("get_name_works", CheckOutcome::Passed));
        output.write_run(
            "sqlite",
            &run(
                "get_ordinal_works",
                CheckOutcome::Failed {
                    reason: "wrong ordinal".to_string(),
                },
            ),
        );
        output.write_run(
            "turso",
            &run(
                "get_name_works",
                CheckOutcome::KnownDeviation {
                    reason: "names are lowercased".to_string(),
                },
            ),
        );
        output.write_run(
            "turso",
            &run(
                "get_ordinal_works",
                CheckOutcome::Error {
                    message: "disk I/O error".to_string(),
                },
            ),
        );

        let failed: Vec<(&str, &str)> = output
            .failed_runs
            .iter()
            .map(|(connector, run)| (connector.as_str(), run.id))
            .collect();
        assert_eq!(
            failed,
            vec![("sqlite", "get_ordinal_works"), ("turso", "get_ordinal_works")]
        );
        assert_eq!(output.current_connector.as_deref(), Some("turso"));
    }
}
