//! Pilotador: CLI test runner for the Pilotar framework.
//!
//! ## Usage
//!
//! ```bash
//! pilotador --platform web --browser chrome           # web scenarios
//! pilotador --platform android --retries 2            # mobile with reruns
//! pilotador --platform web --parallel --workers 4     # parallel workers
//! pilotador --platform ios --video --performance      # capture extras
//! ```

mod runner;
mod scenarios;

use clap::Parser;
use pilotar::config::FrameworkConfig;
use pilotar::session::{BrowserKind, Platform};
use runner::{RunOptions, TestRunner};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Cross-platform UI test runner
#[derive(Debug, Parser)]
#[command(name = "pilotador", version, about)]
struct Cli {
    /// Platform to run tests on: web, android, or ios
    #[arg(long, default_value = "web", env = "PILOTAR_PLATFORM")]
    platform: String,

    /// Browser to use for web tests: chrome, firefox, or playwright
    #[arg(long, default_value = "chrome", env = "PILOTAR_BROWSER")]
    browser: String,

    /// Environment to run tests against
    #[arg(long, default_value = "qa")]
    env: String,

    /// Run tests in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of parallel workers (default: CPUs minus one)
    #[arg(long)]
    workers: Option<usize>,

    /// Record video of test execution (mobile sessions)
    #[arg(long)]
    video: bool,

    /// Collect performance metrics
    #[arg(long)]
    performance: bool,

    /// Enable distributed test execution
    #[arg(long)]
    distributed: bool,

    /// Node identifier for distributed execution
    #[arg(long = "node-id")]
    node_id: Option<String>,

    /// Master node address for distributed execution
    #[arg(long)]
    master: Option<String>,

    /// Number of times to retry failed tests
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Only retry tests marked as flaky
    #[arg(long = "flaky-tests-only")]
    flaky_tests_only: bool,

    /// Only run scenarios whose id contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Root directory for reports, results and videos
    #[arg(long = "reports-dir", default_value = "reports")]
    reports_dir: PathBuf,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress log output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> pilotar::result::PilotResult<bool> {
    // Unknown identifiers are fatal here, before any session exists
    let platform = Platform::parse(&cli.platform)?;
    let browser = BrowserKind::parse(&cli.browser)?;

    let mut config = FrameworkConfig::from_env();
    config.environment = cli.env.clone();
    config.browser = browser.as_str().to_string();

    let options = RunOptions {
        platform,
        browser,
        environment: cli.env.clone(),
        parallel: cli.parallel,
        workers: cli.workers,
        video: cli.video,
        performance: cli.performance,
        distributed: cli.distributed,
        node_id: cli.node_id.clone(),
        master: cli.master.clone(),
        retries: cli.retries,
        flaky_only: cli.flaky_tests_only,
        filter: cli.filter.clone(),
        reports_dir: cli.reports_dir.clone(),
    };

    let totals = TestRunner::new(options, config).run()?;
    Ok(totals.is_success())
}

fn init_tracing(cli: &Cli) {
    let directive = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pilotar={directive},pilotador={directive}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
