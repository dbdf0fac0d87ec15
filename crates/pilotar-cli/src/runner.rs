//! Scenario execution: worker pool, lifecycle wrapping, session-end
//! reporting.
//!
//! Each scenario executes on one worker thread with exclusive ownership of
//! its session handle; workers share only the orchestrator's record table
//! and the performance table, both behind mutexes. Aggregation and
//! persistence happen after every worker has joined.

use crate::scenarios::{Scenario, ScenarioEnv};
use pilotar::backend::Backend;
use pilotar::config::FrameworkConfig;
use pilotar::lifecycle::{LifecycleOrchestrator, RetryPolicy, TestOutcome};
use pilotar::performance::{collect_page_metrics, PageMetrics, PerformanceReport};
use pilotar::report::{RunMetadata, RunTotals, TrendAggregator};
use pilotar::result::PilotResult;
use pilotar::session::{BrowserKind, Platform, SessionFactory};
use pilotar::shard::ShardRouter;
use pilotar::video::VideoRecorder;
use pilotar::wait::WaitPolicy;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Runner options resolved from the CLI surface
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Target platform
    pub platform: Platform,
    /// Browser for web sessions
    pub browser: BrowserKind,
    /// Environment name recorded in run metadata
    pub environment: String,
    /// Run scenarios on parallel workers
    pub parallel: bool,
    /// Worker count override
    pub workers: Option<usize>,
    /// Record device video per scenario
    pub video: bool,
    /// Collect performance metrics
    pub performance: bool,
    /// Distributed routing active
    pub distributed: bool,
    /// Node identifier for distributed runs
    pub node_id: Option<String>,
    /// Master address for distributed runs
    pub master: Option<String>,
    /// Session-wide rerun budget
    pub retries: u32,
    /// Restrict reruns to flaky-marked scenarios
    pub flaky_only: bool,
    /// Scenario id substring filter
    pub filter: Option<String>,
    /// Root reports directory
    pub reports_dir: PathBuf,
}

/// One worker per CPU, leaving a core for the system
#[must_use]
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    cpus.saturating_sub(1).max(1)
}

/// Executes scenarios and produces the session's reports
#[derive(Debug)]
pub struct TestRunner {
    options: RunOptions,
    config: FrameworkConfig,
}

impl TestRunner {
    /// Build a runner over resolved options and configuration
    #[must_use]
    pub fn new(options: RunOptions, config: FrameworkConfig) -> Self {
        Self { options, config }
    }

    /// Run every selected scenario and persist the session reports.
    ///
    /// # Errors
    ///
    /// Only table-level failures surface here; per-scenario failures are
    /// recorded in the returned totals, and report persistence errors are
    /// logged and skipped.
    pub fn run(&self) -> PilotResult<RunTotals> {
        let scenarios =
            crate::scenarios::select(self.options.platform, self.options.filter.as_deref());
        let worker_count = self.worker_count();
        info!(
            platform = %self.options.platform,
            browser = %self.options.browser,
            scenarios = scenarios.len(),
            workers = worker_count,
            "session starting"
        );

        let mut metadata = self.begin_metadata(worker_count);
        let orchestrator = Arc::new(LifecycleOrchestrator::new(RetryPolicy {
            global_retries: self.options.retries,
            flaky_only: self.options.flaky_only,
        }));
        let perf = Arc::new(Mutex::new(PerformanceReport::new()));
        let progress = ProgressBar::new(scenarios.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let env = ScenarioEnv {
            config: self.config.clone(),
            browser: self.options.browser,
            wait: WaitPolicy::from_config(&self.config),
        };

        // Affinity routing: scenarios sharing a shard key stay on one worker
        let router = ShardRouter::new(worker_count);
        let mut batches: Vec<Vec<Scenario>> = vec![Vec::new(); worker_count];
        for scenario in scenarios {
            batches[router.worker_for(scenario.id)].push(scenario);
        }

        std::thread::scope(|scope| {
            for batch in &batches {
                let orchestrator = Arc::clone(&orchestrator);
                let perf = Arc::clone(&perf);
                let progress = progress.clone();
                let env = env.clone();
                scope.spawn(move || {
                    for scenario in batch {
                        self.run_scenario(*scenario, &env, &orchestrator, &perf, &progress);
                    }
                });
            }
        });
        progress.finish_and_clear();

        metadata.finalize(orchestrator.snapshot(), orchestrator.retry_stats());
        self.persist_reports(&metadata, &perf);
        self.print_summary(&metadata);
        Ok(metadata.totals)
    }

    fn worker_count(&self) -> usize {
        if self.options.parallel {
            self.options.workers.unwrap_or_else(default_worker_count)
        } else {
            1
        }
    }

    fn begin_metadata(&self, worker_count: usize) -> RunMetadata {
        let mut metadata = RunMetadata::begin(
            self.options.platform.as_str(),
            self.options.browser.as_str(),
            &self.options.environment,
        );
        metadata.parallel = self.options.parallel;
        metadata.workers = worker_count;
        metadata.video = self.options.video;
        metadata.performance = self.options.performance;
        metadata.distributed = self.options.distributed;
        metadata.node_id = self.options.node_id.clone();
        metadata.master = self.options.master.clone();
        metadata
    }

    fn run_scenario(
        &self,
        scenario: Scenario,
        env: &ScenarioEnv,
        orchestrator: &LifecycleOrchestrator,
        perf: &Mutex<PerformanceReport>,
        progress: &ProgressBar,
    ) {
        progress.set_message(scenario.id.to_string());
        let videos_dir = self.options.reports_dir.join("videos");
        let mut page_metrics: Option<PageMetrics> = None;

        let (outcome, last_error) = orchestrator.execute(scenario.id, scenario.flaky_reruns, || {
            let mut handle =
                SessionFactory::launch(self.options.platform, env.browser, &env.config)?;
            let mut recorder = VideoRecorder::new(&videos_dir);
            if self.options.video {
                recorder.start(&mut handle);
            }

            let mut returned = (scenario.run)(handle, env)?;

            if self.options.video {
                // Capture problems are logged, never failed
                if let Err(e) = recorder.stop_and_save(&mut returned, scenario.id) {
                    warn!(scenario = scenario.id, error = %e, "video capture skipped");
                }
            }
            if self.options.performance && self.options.platform == Platform::Web {
                match collect_page_metrics(&mut returned) {
                    Ok(metrics) => page_metrics = Some(metrics),
                    Err(e) => warn!(scenario = scenario.id, error = %e, "page metrics skipped"),
                }
            }
            returned.close()
        });

        if let Some(record) = orchestrator.record(scenario.id) {
            let label = match outcome {
                TestOutcome::Passed => "passed",
                TestOutcome::Failed => "failed",
                TestOutcome::Rerun => "rerun",
                TestOutcome::Skipped => "skipped",
            };
            perf.lock().expect("performance table poisoned").record(
                scenario.id,
                record.duration_seconds,
                label,
                page_metrics.take(),
            );
        }
        if let Some(e) = last_error {
            error!(scenario = scenario.id, error = %e, "scenario failed");
        }
        progress.inc(1);
    }

    fn persist_reports(&self, metadata: &RunMetadata, perf: &Mutex<PerformanceReport>) {
        let results_dir = self.options.reports_dir.join("results");
        if let Err(e) = metadata.save(&results_dir) {
            warn!(error = %e, "run metadata not persisted");
        }
        if self.options.performance {
            let mut perf = perf.lock().expect("performance table poisoned");
            if let Err(e) = perf.save(&results_dir) {
                warn!(error = %e, "performance report not persisted");
            }
        }
        if let Err(e) = TrendAggregator::new(&results_dir).aggregate_and_save() {
            warn!(error = %e, "trend aggregation skipped");
        }
    }

    fn print_summary(&self, metadata: &RunMetadata) {
        let totals = metadata.totals;
        let verdict = if totals.is_success() {
            style("PASSED").green().bold()
        } else {
            style("FAILED").red().bold()
        };
        println!(
            "{verdict}  {} passed · {} failed · {} skipped · {} retried",
            style(totals.passed).green(),
            style(totals.failed).red(),
            style(totals.skipped).yellow(),
            metadata.retry_stats.retried_tests,
        );
        if let Some(minutes) = metadata.duration_minutes() {
            println!("         {:.2} minutes · run {}", minutes, metadata.run_id);
        }
    }
}
