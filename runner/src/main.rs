use anyhow::Context;
use clap::{Parser, Subcommand};
use cursorspec::{
    all_checks, summarize, ConformanceRunner, DatabaseLocation, RunnerConfig, Suite, Topic,
};
use cursorspec_runner::{create_output, resolve_connectors, Format, OutputFormat, CONNECTOR_NAMES};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cursorspec")]
#[command(about = "Conformance checks for cursor-style database result APIs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the contract against one or more connectors
    Run {
        /// Connector to check; repeat for several. Defaults to all of them
        #[arg(short, long = "connector")]
        connectors: Vec<String>,

        /// Filter checks by id pattern (`*` matches anything)
        #[arg(short, long)]
        filter: Option<String>,

        /// Number of checks to run in parallel
        #[arg(short, long, default_value_t = num_cpus::get())]
        jobs: usize,

        /// Output format (pretty, json)
        #[arg(short, long, default_value = "pretty")]
        output: String,

        /// Restrict to a suite (cursor, statement); repeat for several
        #[arg(short, long = "suite")]
        suites: Vec<Suite>,

        /// Where connectors keep their database (memory, temp)
        #[arg(short, long, default_value = "memory")]
        location: DatabaseLocation,
    },

    /// Print the check catalogue
    List {
        /// Only list checks of this suite
        #[arg(short, long)]
        suite: Option<Suite>,
    },

    /// Print the registered connectors
    Connectors,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            connectors,
            filter,
            jobs,
            output,
            suites,
            location,
        } => run_checks(connectors, filter, jobs, output, suites, location).await,
        Commands::List { suite } => {
            list_checks(suite);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Connectors => {
            for name in CONNECTOR_NAMES {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr so JSON on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

async fn run_checks(
    connector_names: Vec<String>,
    filter: Option<String>,
    jobs: usize,
    output_format: String,
    suites: Vec<Suite>,
    location: DatabaseLocation,
) -> anyhow::Result<ExitCode> {
    let format: Format = output_format
        .parse()
        .map_err(anyhow::Error::msg)
        .context("invalid --output")?;
    let connectors = resolve_connectors(&connector_names, location)?;

    let mut config = RunnerConfig::default().with_max_jobs(jobs);
    if let Some(f) = filter {
        config = config.with_filter(f);
    }
    for suite in suites {
        config = config.with_suite(suite);
    }

    let runner = ConformanceRunner::new(config);
    if runner.selected_checks().is_empty() {
        anyhow::bail!("no checks match the given filter and suites");
    }
    tracing::info!(
        connectors = connectors.len(),
        checks = runner.selected_checks().len(),
        %location,
        "starting conformance run"
    );

    let mut output: Box<dyn OutputFormat> = create_output(format);
    let reports = runner
        .run_matrix(&connectors, |connector, run| {
            output.write_run(connector, run);
            output.flush();
        })
        .await;
    for report in &reports {
        output.end_connector(report);
    }

    let summary = summarize(&reports);
    output.write_summary(&summary);
    output.flush();

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn list_checks(suite: Option<Suite>) {
    for topic in Topic::ALL {
        if suite.is_some_and(|s| s != topic.suite()) {
            continue;
        }
        println!("{topic} ({})", topic.suite());
        for check in all_checks().filter(|c| c.topic == topic) {
            println!("  {}", check.id);
        }
    }
}
