//! Headless Outpost runner.
//!
//! Plays scenarios without graphics and prints results as JSON on stdout.
//! Designed for CI testing and determinism checks.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in scenario
//! cargo run -p outpost_headless -- run
//!
//! # Run a scenario file, pretty-printed
//! cargo run -p outpost_headless -- run --scenario mining.ron --pretty
//!
//! # Replay a scenario several times and compare hashes
//! cargo run -p outpost_headless -- verify --scenario mining.ron --runs 5
//!
//! # Check an initial-state file
//! cargo run -p outpost_headless -- validate --objects start.txt
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outpost_headless::{run_scenario, validate_objects, verify_scenario, Scenario, ScenarioError};

#[derive(Parser)]
#[command(name = "outpost_headless")]
#[command(about = "Headless Outpost runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario and print a summary
    Run {
        /// Scenario file to load (built-in scenario if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Pretty-print the JSON summary
        #[arg(long)]
        pretty: bool,
    },

    /// Verify determinism by playing the same scenario several times
    Verify {
        /// Scenario file to load (built-in scenario if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of verification runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Check an initial-state file
    Validate {
        /// Objects file (`type,x,y` per line)
        #[arg(short, long)]
        objects: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run { scenario, pretty }) => cmd_run(scenario.as_deref(), pretty),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario.as_deref(), runs),
        Some(Commands::Validate { objects }) => cmd_validate(&objects),
        None => cmd_run(None, false),
    }
}

/// Load the scenario at `path`, or the built-in one.
fn load_scenario(path: Option<&Path>) -> (Scenario, Option<PathBuf>) {
    let Some(path) = path else {
        return (Scenario::default(), None);
    };
    match Scenario::load(path) {
        Ok(scenario) => {
            let base_dir = path.parent().map(Path::to_path_buf);
            (scenario, base_dir)
        }
        Err(e) => fail("Failed to load scenario", &e),
    }
}

fn cmd_run(path: Option<&Path>, pretty: bool) {
    let (scenario, base_dir) = load_scenario(path);
    tracing::info!(scenario = %scenario.name, "Running scenario");

    match run_scenario(&scenario, base_dir.as_deref()) {
        Ok(summary) => print_json(&summary, pretty),
        Err(e) => fail("Scenario run failed", &e),
    }
}

fn cmd_verify(path: Option<&Path>, runs: u32) {
    let (scenario, base_dir) = load_scenario(path);
    tracing::info!(scenario = %scenario.name, runs, "Verifying determinism");

    let report = match verify_scenario(&scenario, base_dir.as_deref(), runs) {
        Ok(report) => report,
        Err(e) => fail("Verification failed to run", &e),
    };
    print_json(&report, false);

    if report.deterministic {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

fn cmd_validate(path: &Path) {
    let report = match validate_objects(path) {
        Ok(report) => report,
        Err(e) => fail("Failed to read objects file", &e),
    };
    print_json(&report, false);

    if report.skipped > 0 {
        eprintln!("WARN: {} of {} rows skipped", report.skipped, report.rows);
        std::process::exit(1);
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match output {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode output: {e}");
            std::process::exit(1);
        }
    }
}

fn fail(context: &str, error: &ScenarioError) -> ! {
    eprintln!("{context}: {error}");
    std::process::exit(1);
}
