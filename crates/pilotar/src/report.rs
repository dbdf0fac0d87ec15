//! Run metadata persistence and historical trend aggregation.
//!
//! Each session writes exactly one `run_info_<timestamp>.json` into the
//! results directory; the rolling set of those files is the entire
//! historical store — there is no database. Trend aggregation folds the
//! files into a structured report for the rendering layer; this module
//! never produces HTML.
//!
//! Aggregation is best-effort by policy: unreadable or malformed run files
//! are logged and skipped, and never fail the run that triggered the
//! aggregation.

use crate::lifecycle::{RetryStats, TestExecutionRecord, TestOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filename prefix for persisted run metadata
const RUN_INFO_PREFIX: &str = "run_info_";

/// Outcome totals for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Tests with a record in the session table
    pub total: usize,
    /// Terminal passes
    pub passed: usize,
    /// Terminal failures
    pub failed: usize,
    /// Skipped tests
    pub skipped: usize,
}

impl RunTotals {
    /// Fold totals out of the session record table
    #[must_use]
    pub fn from_records(records: &[TestExecutionRecord]) -> Self {
        let mut totals = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.last_outcome {
                TestOutcome::Passed => totals.passed += 1,
                TestOutcome::Failed => totals.failed += 1,
                TestOutcome::Skipped => totals.skipped += 1,
                // A rerun as last outcome means the session aborted mid-flight;
                // count it as failed rather than losing it
                TestOutcome::Rerun => totals.failed += 1,
            }
        }
        totals
    }

    /// True when no test failed
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// One session's durable metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Unique run identifier
    pub run_id: uuid::Uuid,
    /// Session start
    pub start_time: DateTime<Utc>,
    /// Session end; absent while the run is in flight
    pub end_time: Option<DateTime<Utc>>,
    /// Target platform (web/android/ios)
    pub platform: String,
    /// Browser name for web sessions
    pub browser: String,
    /// Environment name
    pub environment: String,
    /// Whether tests ran on parallel workers
    pub parallel: bool,
    /// Worker count
    pub workers: usize,
    /// Whether screen recording was requested
    pub video: bool,
    /// Whether performance collection was requested
    pub performance: bool,
    /// Whether distributed routing was active
    pub distributed: bool,
    /// Node identifier for distributed runs
    pub node_id: Option<String>,
    /// Master address for distributed runs
    pub master: Option<String>,
    /// Outcome totals
    #[serde(default)]
    pub totals: RunTotals,
    /// Rerun statistics
    #[serde(default)]
    pub retry_stats: RetryStats,
    /// Per-test records
    #[serde(default)]
    pub tests: Vec<TestExecutionRecord>,
}

impl RunMetadata {
    /// Start metadata for a new session
    #[must_use]
    pub fn begin(platform: &str, browser: &str, environment: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            platform: platform.to_string(),
            browser: browser.to_string(),
            environment: environment.to_string(),
            parallel: false,
            workers: 1,
            video: false,
            performance: false,
            distributed: false,
            node_id: None,
            master: None,
            totals: RunTotals::default(),
            retry_stats: RetryStats::default(),
            tests: Vec::new(),
        }
    }

    /// Close the session: stamp the end time and fold in the record table
    pub fn finalize(&mut self, records: Vec<TestExecutionRecord>, retry_stats: RetryStats) {
        self.end_time = Some(Utc::now());
        self.totals = RunTotals::from_records(&records);
        self.retry_stats = retry_stats;
        self.tests = records;
    }

    /// Session duration in minutes, when finished
    #[must_use]
    pub fn duration_minutes(&self) -> Option<f64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 60_000.0)
    }

    /// Path this session persists to, keyed by start timestamp
    #[must_use]
    pub fn file_path(&self, results_dir: &Path) -> PathBuf {
        let stamp = self.start_time.format("%Y%m%d_%H%M%S");
        results_dir.join(format!("{RUN_INFO_PREFIX}{stamp}.json"))
    }

    /// Persist to the results directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// I/O and serialization errors; callers at session end log and skip.
    pub fn save(&self, results_dir: &Path) -> crate::result::PilotResult<PathBuf> {
        std::fs::create_dir_all(results_dir)?;
        let path = self.file_path(results_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        debug!(path = %path.display(), "run metadata persisted");
        Ok(path)
    }
}

/// One historical run in a trend report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Session start
    pub start_time: DateTime<Utc>,
    /// Terminal passes
    pub passed: usize,
    /// Terminal failures
    pub failed: usize,
    /// Session duration in minutes, when recorded
    pub duration_minutes: Option<f64>,
    /// Tests that needed reruns
    pub retried_tests: usize,
    /// Tests marked flaky
    pub flaky_tests: usize,
}

impl From<&RunMetadata> for TrendPoint {
    fn from(run: &RunMetadata) -> Self {
        Self {
            start_time: run.start_time,
            passed: run.totals.passed,
            failed: run.totals.failed,
            duration_minutes: run.duration_minutes(),
            retried_tests: run.retry_stats.retried_tests,
            flaky_tests: run.retry_stats.flaky_tests,
        }
    }
}

/// Structured trend data over the rolling run-file set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendReport {
    /// Runs ordered by start time
    pub runs: Vec<TrendPoint>,
}

impl TrendReport {
    /// Number of historical runs folded in
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Pass rate over every recorded run, in [0, 1]
    #[must_use]
    pub fn overall_pass_rate(&self) -> f64 {
        let (passed, total) = self.runs.iter().fold((0usize, 0usize), |(p, t), run| {
            (p + run.passed, t + run.passed + run.failed)
        });
        if total == 0 {
            1.0
        } else {
            passed as f64 / total as f64
        }
    }
}

/// Folds persisted run files into trend reports
#[derive(Debug, Clone)]
pub struct TrendAggregator {
    results_dir: PathBuf,
}

impl TrendAggregator {
    /// Aggregate over the given results directory
    #[must_use]
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Collect every readable run file, ordered by start time. Unreadable
    /// entries are logged and skipped.
    #[must_use]
    pub fn collect_runs(&self) -> Vec<RunMetadata> {
        let entries = match std::fs::read_dir(&self.results_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.results_dir.display(), error = %e, "results directory unreadable; trend skipped");
                return Vec::new();
            }
        };
        let mut runs = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(RUN_INFO_PREFIX) || !name.ends_with(".json") {
                continue;
            }
            match std::fs::read_to_string(entry.path())
                .map_err(crate::result::PilotError::from)
                .and_then(|text| Ok(serde_json::from_str::<RunMetadata>(&text)?))
            {
                Ok(run) => runs.push(run),
                Err(e) => {
                    warn!(file = %entry.path().display(), error = %e, "run file skipped");
                }
            }
        }
        runs.sort_by_key(|run| run.start_time);
        runs
    }

    /// Build the trend report over all readable runs
    #[must_use]
    pub fn aggregate(&self) -> TrendReport {
        let runs = self.collect_runs();
        TrendReport {
            runs: runs.iter().map(TrendPoint::from).collect(),
        }
    }

    /// Build and persist the trend report next to the run files.
    /// Failures here are the caller's to log and skip.
    ///
    /// # Errors
    ///
    /// I/O and serialization errors.
    pub fn aggregate_and_save(&self) -> crate::result::PilotResult<PathBuf> {
        let report = self.aggregate();
        let path = self.results_dir.join("trend_report.json");
        std::fs::create_dir_all(&self.results_dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        debug!(path = %path.display(), runs = report.run_count(), "trend report persisted");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, outcome: TestOutcome, reruns: u32) -> TestExecutionRecord {
        TestExecutionRecord {
            test_id: id.to_string(),
            execution_count: reruns,
            last_outcome: outcome,
            duration_seconds: 1.5,
            flaky: false,
        }
    }

    mod totals {
        use super::*;

        #[test]
        fn test_fold_outcomes() {
            let records = vec![
                record("a", TestOutcome::Passed, 0),
                record("b", TestOutcome::Passed, 2),
                record("c", TestOutcome::Failed, 1),
                record("d", TestOutcome::Skipped, 0),
            ];
            let totals = RunTotals::from_records(&records);
            assert_eq!(totals.total, 4);
            assert_eq!(totals.passed, 2);
            assert_eq!(totals.failed, 1);
            assert_eq!(totals.skipped, 1);
            assert!(!totals.is_success());
        }

        #[test]
        fn test_empty_run_is_success() {
            assert!(RunTotals::from_records(&[]).is_success());
        }
    }

    mod metadata {
        use super::*;

        #[test]
        fn test_finalize_stamps_end_and_totals() {
            let mut run = RunMetadata::begin("web", "chrome", "qa");
            assert!(run.end_time.is_none());
            run.finalize(vec![record("a", TestOutcome::Passed, 0)], RetryStats::default());
            assert!(run.end_time.is_some());
            assert_eq!(run.totals.total, 1);
            assert!(run.duration_minutes().is_some());
        }

        #[test]
        fn test_file_path_keyed_by_start_timestamp() {
            let run = RunMetadata::begin("web", "chrome", "qa");
            let path = run.file_path(Path::new("/tmp/results"));
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("run_info_"));
            assert!(name.ends_with(".json"));
        }

        #[test]
        fn test_save_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let mut run = RunMetadata::begin("android", "chrome", "qa");
            run.finalize(vec![record("a", TestOutcome::Failed, 3)], RetryStats {
                total_retries: 3,
                retried_tests: 1,
                flaky_tests: 0,
            });
            let path = run.save(dir.path()).unwrap();

            let text = std::fs::read_to_string(path).unwrap();
            let loaded: RunMetadata = serde_json::from_str(&text).unwrap();
            assert_eq!(loaded.platform, "android");
            assert_eq!(loaded.totals.failed, 1);
            assert_eq!(loaded.retry_stats.total_retries, 3);
            assert_eq!(loaded.tests.len(), 1);
        }
    }

    mod trends {
        use super::*;

        fn persist_run(dir: &Path, secs_ago: i64, passed: usize, failed: usize) {
            let mut run = RunMetadata::begin("web", "chrome", "qa");
            // Distinct start stamps keep filenames from colliding
            run.start_time = Utc::now() - chrono::Duration::seconds(secs_ago);
            let records: Vec<TestExecutionRecord> = (0..passed)
                .map(|i| record(&format!("p{i}"), TestOutcome::Passed, 0))
                .chain((0..failed).map(|i| record(&format!("f{i}"), TestOutcome::Failed, 0)))
                .collect();
            run.finalize(records, RetryStats::default());
            run.save(dir).unwrap();
        }

        #[test]
        fn test_aggregate_orders_by_start_time() {
            let dir = tempfile::tempdir().unwrap();
            persist_run(dir.path(), 120, 3, 0);
            persist_run(dir.path(), 60, 1, 1);

            let report = TrendAggregator::new(dir.path()).aggregate();
            assert_eq!(report.run_count(), 2);
            assert!(report.runs[0].start_time <= report.runs[1].start_time);
            assert_eq!(report.runs[0].passed, 3);
            assert_eq!(report.runs[1].failed, 1);
        }

        #[test]
        fn test_malformed_run_file_skipped() {
            let dir = tempfile::tempdir().unwrap();
            persist_run(dir.path(), 30, 2, 0);
            std::fs::write(dir.path().join("run_info_garbage.json"), "not json").unwrap();

            let report = TrendAggregator::new(dir.path()).aggregate();
            assert_eq!(report.run_count(), 1);
        }

        #[test]
        fn test_missing_directory_yields_empty_report() {
            let report = TrendAggregator::new("/nonexistent/pilotar-results").aggregate();
            assert_eq!(report.run_count(), 0);
            assert!((report.overall_pass_rate() - 1.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_unrelated_files_ignored() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("performance_report.json"), "{}").unwrap();
            let report = TrendAggregator::new(dir.path()).aggregate();
            assert_eq!(report.run_count(), 0);
        }

        #[test]
        fn test_pass_rate() {
            let dir = tempfile::tempdir().unwrap();
            persist_run(dir.path(), 30, 3, 1);
            let report = TrendAggregator::new(dir.path()).aggregate();
            assert!((report.overall_pass_rate() - 0.75).abs() < 1e-9);
        }

        #[test]
        fn test_aggregate_and_save_writes_report() {
            let dir = tempfile::tempdir().unwrap();
            persist_run(dir.path(), 30, 1, 0);
            let path = TrendAggregator::new(dir.path()).aggregate_and_save().unwrap();
            let text = std::fs::read_to_string(path).unwrap();
            let report: TrendReport = serde_json::from_str(&text).unwrap();
            assert_eq!(report.run_count(), 1);
        }
    }
}
