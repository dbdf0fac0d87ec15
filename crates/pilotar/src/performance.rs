//! Performance metric collection.
//!
//! Two layers: per-test wall-clock durations recorded by the runner, and
//! an in-page snapshot (navigation timing, JS heap) gathered through
//! `execute_script` on web backends. Everything folds into one
//! `performance_report.json` per session. A missing or malformed report is
//! never fatal — reporting consumers log and skip.

use crate::backend::Backend;
use crate::result::PilotResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Number of tests listed in the slowest/fastest summaries
const SUMMARY_HIGHLIGHTS: usize = 5;

/// In-page metrics snapshot from a web backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetrics {
    /// `performance.timing` export, when the page exposes it
    pub navigation_timing: Option<Value>,
    /// Used JS heap size in bytes
    pub js_heap_used_bytes: Option<u64>,
    /// Total JS heap size in bytes
    pub js_heap_total_bytes: Option<u64>,
}

/// Collect a metrics snapshot from the current page.
///
/// # Errors
///
/// Script evaluation errors from the backend; callers collecting
/// opportunistically log and skip.
pub fn collect_page_metrics<B: Backend>(backend: &mut B) -> PilotResult<PageMetrics> {
    let timing = backend.execute_script(
        "return JSON.parse(JSON.stringify(window.performance.timing || null));",
    )?;
    let memory = backend.execute_script(
        "var m = window.performance.memory; \
         return m ? { used: m.usedJSHeapSize, total: m.totalJSHeapSize } : null;",
    )?;
    Ok(PageMetrics {
        navigation_timing: (!timing.is_null()).then_some(timing),
        js_heap_used_bytes: memory.get("used").and_then(Value::as_u64),
        js_heap_total_bytes: memory.get("total").and_then(Value::as_u64),
    })
}

/// Timing entry for one executed test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestTiming {
    /// Wall-clock duration in seconds
    pub duration_seconds: f64,
    /// Terminal outcome label (passed/failed/...)
    pub outcome: String,
    /// When the test finished
    pub timestamp: DateTime<Utc>,
    /// Page metrics captured after the test, when collection was on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_metrics: Option<PageMetrics>,
}

/// Summary statistics over the timing table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Sum of all durations in seconds
    pub total_duration: f64,
    /// Mean duration in seconds
    pub average_duration: f64,
    /// The slowest tests, longest first
    pub slowest_tests: Vec<(String, f64)>,
    /// The fastest tests, shortest first
    pub fastest_tests: Vec<(String, f64)>,
}

/// Session-scoped performance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Timings keyed by test id
    pub tests: HashMap<String, TestTiming>,
    /// Derived summary, filled at session end
    pub summary: PerformanceSummary,
}

impl PerformanceReport {
    /// Empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one test's timing
    pub fn record(
        &mut self,
        test_id: &str,
        duration_seconds: f64,
        outcome: &str,
        page_metrics: Option<PageMetrics>,
    ) {
        self.tests.insert(
            test_id.to_string(),
            TestTiming {
                duration_seconds,
                outcome: outcome.to_string(),
                timestamp: Utc::now(),
                page_metrics,
            },
        );
    }

    /// Recompute the summary from the timing table
    pub fn summarize(&mut self) {
        if self.tests.is_empty() {
            self.summary = PerformanceSummary::default();
            return;
        }
        let mut by_duration: Vec<(String, f64)> = self
            .tests
            .iter()
            .map(|(id, timing)| (id.clone(), timing.duration_seconds))
            .collect();
        by_duration.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let total: f64 = by_duration.iter().map(|(_, d)| d).sum();
        self.summary = PerformanceSummary {
            total_duration: total,
            average_duration: total / by_duration.len() as f64,
            fastest_tests: by_duration.iter().take(SUMMARY_HIGHLIGHTS).cloned().collect(),
            slowest_tests: by_duration
                .iter()
                .rev()
                .take(SUMMARY_HIGHLIGHTS)
                .cloned()
                .collect(),
        };
    }

    /// Summarize and persist as `performance_report.json`.
    ///
    /// # Errors
    ///
    /// I/O and serialization errors; session-end callers log and skip.
    pub fn save(&mut self, results_dir: &Path) -> PilotResult<PathBuf> {
        self.summarize();
        std::fs::create_dir_all(results_dir)?;
        let path = results_dir.join("performance_report.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), tests = self.tests.len(), "performance report persisted");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use serde_json::json;

    mod page_metrics {
        use super::*;

        #[test]
        fn test_collect_with_memory() {
            let mut mock = MockBackend::desktop();
            mock.set_script_result(json!({ "used": 1024, "total": 4096 }));
            let metrics = collect_page_metrics(&mut mock).unwrap();
            assert_eq!(metrics.js_heap_used_bytes, Some(1024));
            assert_eq!(metrics.js_heap_total_bytes, Some(4096));
        }

        #[test]
        fn test_collect_null_results() {
            let mut mock = MockBackend::desktop();
            mock.set_script_result(Value::Null);
            let metrics = collect_page_metrics(&mut mock).unwrap();
            assert!(metrics.navigation_timing.is_none());
            assert!(metrics.js_heap_used_bytes.is_none());
        }
    }

    mod report {
        use super::*;

        fn seeded() -> PerformanceReport {
            let mut report = PerformanceReport::new();
            report.record("t::fast", 0.5, "passed", None);
            report.record("t::medium", 2.0, "passed", None);
            report.record("t::slow", 7.5, "failed", None);
            report
        }

        #[test]
        fn test_summary_totals() {
            let mut report = seeded();
            report.summarize();
            assert!((report.summary.total_duration - 10.0).abs() < 1e-9);
            assert!((report.summary.average_duration - (10.0 / 3.0)).abs() < 1e-9);
        }

        #[test]
        fn test_summary_ordering() {
            let mut report = seeded();
            report.summarize();
            assert_eq!(report.summary.fastest_tests[0].0, "t::fast");
            assert_eq!(report.summary.slowest_tests[0].0, "t::slow");
        }

        #[test]
        fn test_empty_summary() {
            let mut report = PerformanceReport::new();
            report.summarize();
            assert!(report.summary.slowest_tests.is_empty());
            assert!((report.summary.total_duration - 0.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_highlights_capped_at_five() {
            let mut report = PerformanceReport::new();
            for i in 0..10 {
                report.record(&format!("t::{i}"), i as f64, "passed", None);
            }
            report.summarize();
            assert_eq!(report.summary.slowest_tests.len(), 5);
            assert_eq!(report.summary.fastest_tests.len(), 5);
        }

        #[test]
        fn test_save_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let mut report = seeded();
            let path = report.save(dir.path()).unwrap();
            assert!(path.ends_with("performance_report.json"));

            let text = std::fs::read_to_string(path).unwrap();
            let loaded: PerformanceReport = serde_json::from_str(&text).unwrap();
            assert_eq!(loaded.tests.len(), 3);
            assert_eq!(loaded.tests["t::slow"].outcome, "failed");
        }
    }
}
