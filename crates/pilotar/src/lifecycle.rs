//! Test lifecycle orchestration: retries, reruns and the per-session
//! record table.
//!
//! Each test walks an explicit state machine:
//!
//! ```text
//! Pending → Running → Passed
//!                   → Failed            (rerun budget exhausted, or none)
//!                   → Rerun → Running   (failure reclassified, non-terminal)
//!                   → Skipped
//! ```
//!
//! Rerun bookkeeping lives in one session-scoped table keyed by test id —
//! a record per test, updated only through these transitions. The table is
//! Mutex-guarded so concurrent workers can report without coordination;
//! cross-test aggregation happens only after the workers have joined.

use crate::result::PilotResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Execution states of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestState {
    /// Not started
    Pending,
    /// An attempt is in flight
    Running,
    /// Terminal success
    Passed,
    /// Terminal failure
    Failed,
    /// Failure reclassified as non-terminal; another attempt follows
    Rerun,
    /// Never attempted by decision
    Skipped,
}

impl TestState {
    /// Whether the state machine admits this transition
    #[must_use]
    pub const fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Skipped)
                | (Self::Running, Self::Passed | Self::Failed | Self::Rerun)
                | (Self::Rerun, Self::Running)
        )
    }

    /// Terminal states admit no further transitions
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Skipped)
    }
}

/// Outcome recorded for a completed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// Attempt succeeded
    Passed,
    /// Attempt failed terminally
    Failed,
    /// Attempt failed but will be re-executed
    Rerun,
    /// Test was not executed
    Skipped,
}

/// Per-test record in the session table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExecutionRecord {
    /// Stable test identifier (e.g. `web::search::query_returns_results`)
    pub test_id: String,
    /// Number of reruns performed; 0 means the first attempt settled it
    pub execution_count: u32,
    /// Outcome of the most recent attempt
    pub last_outcome: TestOutcome,
    /// Wall-clock spent across all attempts
    pub duration_seconds: f64,
    /// Whether the test carries an explicit flaky marker
    pub flaky: bool,
}

/// Rerun policy for a session.
///
/// Two sources can grant a rerun budget: a per-test `flaky(reruns = n)`
/// marker and the session-wide `--retries n` count. When both are set the
/// marker wins. With `flaky_only`, unmarked tests get no budget at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Session-wide rerun budget for every test
    pub global_retries: u32,
    /// Restrict reruns to tests carrying a flaky marker
    pub flaky_only: bool,
}

impl RetryPolicy {
    /// No reruns at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            global_retries: 0,
            flaky_only: false,
        }
    }

    /// Resolve the rerun budget for one test
    #[must_use]
    pub const fn budget_for(&self, flaky_marker: Option<u32>) -> u32 {
        match flaky_marker {
            // Marker overrides the global count
            Some(reruns) => reruns,
            None if self.flaky_only => 0,
            None => self.global_retries,
        }
    }
}

/// Retry statistics aggregated over the record table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryStats {
    /// Sum of reruns across all tests
    pub total_retries: u32,
    /// Tests that needed at least one rerun
    pub retried_tests: usize,
    /// Tests carrying a flaky marker
    pub flaky_tests: usize,
}

/// Session-scoped orchestrator wrapping every test invocation
#[derive(Debug)]
pub struct LifecycleOrchestrator {
    policy: RetryPolicy,
    records: Mutex<HashMap<String, TestExecutionRecord>>,
}

impl LifecycleOrchestrator {
    /// Create an orchestrator for one session
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// The session retry policy
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a test under the rerun policy.
    ///
    /// `attempt` is invoked once per pass; a failed pass with budget
    /// remaining is recorded as a rerun and re-invoked. Returns the
    /// terminal outcome, with the final error for `Failed`.
    pub fn execute(
        &self,
        test_id: &str,
        flaky_marker: Option<u32>,
        mut attempt: impl FnMut() -> PilotResult<()>,
    ) -> (TestOutcome, Option<crate::result::PilotError>) {
        let budget = self.policy.budget_for(flaky_marker);
        let started = Instant::now();
        let mut state = TestState::Pending;
        let mut execution_count = 0u32;

        loop {
            debug_assert!(state.can_transition(TestState::Running));
            state = TestState::Running;
            debug!(test_id, execution_count, "attempt started");

            match attempt() {
                Ok(()) => {
                    debug_assert!(state.can_transition(TestState::Passed));
                    self.store(test_id, execution_count, TestOutcome::Passed, started, flaky_marker);
                    debug!(test_id, execution_count, "passed");
                    return (TestOutcome::Passed, None);
                }
                Err(error) if execution_count < budget && !error.is_unsupported() => {
                    debug_assert!(state.can_transition(TestState::Rerun));
                    state = TestState::Rerun;
                    execution_count += 1;
                    self.store(test_id, execution_count, TestOutcome::Rerun, started, flaky_marker);
                    info!(test_id, execution_count, budget, error = %error, "failure reclassified as rerun");
                }
                Err(error) => {
                    debug_assert!(state.can_transition(TestState::Failed));
                    self.store(test_id, execution_count, TestOutcome::Failed, started, flaky_marker);
                    info!(test_id, execution_count, error = %error, "failed");
                    return (TestOutcome::Failed, Some(error));
                }
            }
        }
    }

    /// Record a test as skipped without executing it
    pub fn skip(&self, test_id: &str, flaky_marker: Option<u32>) {
        let mut records = self.records.lock().expect("record table poisoned");
        records.insert(
            test_id.to_string(),
            TestExecutionRecord {
                test_id: test_id.to_string(),
                execution_count: 0,
                last_outcome: TestOutcome::Skipped,
                duration_seconds: 0.0,
                flaky: flaky_marker.is_some(),
            },
        );
    }

    fn store(
        &self,
        test_id: &str,
        execution_count: u32,
        outcome: TestOutcome,
        started: Instant,
        flaky_marker: Option<u32>,
    ) {
        let mut records = self.records.lock().expect("record table poisoned");
        records.insert(
            test_id.to_string(),
            TestExecutionRecord {
                test_id: test_id.to_string(),
                execution_count,
                last_outcome: outcome,
                duration_seconds: started.elapsed().as_secs_f64(),
                flaky: flaky_marker.is_some(),
            },
        );
    }

    /// Look up one record
    #[must_use]
    pub fn record(&self, test_id: &str) -> Option<TestExecutionRecord> {
        self.records
            .lock()
            .expect("record table poisoned")
            .get(test_id)
            .cloned()
    }

    /// Snapshot of the whole table, ordered by test id
    #[must_use]
    pub fn snapshot(&self) -> Vec<TestExecutionRecord> {
        let records = self.records.lock().expect("record table poisoned");
        let mut all: Vec<TestExecutionRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.test_id.cmp(&b.test_id));
        all
    }

    /// Fold the table into retry statistics
    #[must_use]
    pub fn retry_stats(&self) -> RetryStats {
        let records = self.records.lock().expect("record table poisoned");
        let mut stats = RetryStats::default();
        for record in records.values() {
            stats.total_retries += record.execution_count;
            if record.execution_count > 0 {
                stats.retried_tests += 1;
            }
            if record.flaky {
                stats.flaky_tests += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::PilotError;

    fn fail() -> PilotResult<()> {
        Err(PilotError::Timeout {
            ms: 1,
            condition: "x".to_string(),
        })
    }

    mod state_machine {
        use super::*;

        #[test]
        fn test_legal_transitions() {
            assert!(TestState::Pending.can_transition(TestState::Running));
            assert!(TestState::Pending.can_transition(TestState::Skipped));
            assert!(TestState::Running.can_transition(TestState::Passed));
            assert!(TestState::Running.can_transition(TestState::Failed));
            assert!(TestState::Running.can_transition(TestState::Rerun));
            assert!(TestState::Rerun.can_transition(TestState::Running));
        }

        #[test]
        fn test_illegal_transitions() {
            assert!(!TestState::Pending.can_transition(TestState::Passed));
            assert!(!TestState::Passed.can_transition(TestState::Running));
            assert!(!TestState::Failed.can_transition(TestState::Running));
            assert!(!TestState::Skipped.can_transition(TestState::Running));
            assert!(!TestState::Running.can_transition(TestState::Running));
        }

        #[test]
        fn test_terminal_states() {
            assert!(TestState::Passed.is_terminal());
            assert!(TestState::Failed.is_terminal());
            assert!(TestState::Skipped.is_terminal());
            assert!(!TestState::Rerun.is_terminal());
            assert!(!TestState::Running.is_terminal());
        }
    }

    mod retry_policy {
        use super::*;

        #[test]
        fn test_marker_overrides_global() {
            let policy = RetryPolicy {
                global_retries: 2,
                flaky_only: false,
            };
            assert_eq!(policy.budget_for(Some(5)), 5);
            assert_eq!(policy.budget_for(Some(0)), 0);
            assert_eq!(policy.budget_for(None), 2);
        }

        #[test]
        fn test_flaky_only_strips_unmarked() {
            let policy = RetryPolicy {
                global_retries: 3,
                flaky_only: true,
            };
            assert_eq!(policy.budget_for(None), 0);
            assert_eq!(policy.budget_for(Some(1)), 1);
        }

        #[test]
        fn test_none_policy() {
            assert_eq!(RetryPolicy::none().budget_for(None), 0);
        }
    }

    mod rerun_bounds {
        use super::*;

        #[test]
        fn test_always_failing_exhausts_budget_exactly() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy {
                global_retries: 3,
                flaky_only: false,
            });
            let mut attempts = 0;
            let (outcome, error) = orchestrator.execute("t::always_fails", None, || {
                attempts += 1;
                fail()
            });
            assert_eq!(outcome, TestOutcome::Failed);
            assert!(error.is_some());
            assert_eq!(attempts, 4); // 1 initial + 3 reruns

            let record = orchestrator.record("t::always_fails").unwrap();
            assert_eq!(record.execution_count, 3);
            assert_eq!(record.last_outcome, TestOutcome::Failed);
        }

        #[test]
        fn test_pass_on_attempt_k_counts_k_minus_one() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy {
                global_retries: 5,
                flaky_only: false,
            });
            let mut attempts = 0;
            let (outcome, _) = orchestrator.execute("t::third_time_lucky", None, || {
                attempts += 1;
                if attempts < 3 {
                    fail()
                } else {
                    Ok(())
                }
            });
            assert_eq!(outcome, TestOutcome::Passed);

            let record = orchestrator.record("t::third_time_lucky").unwrap();
            assert_eq!(record.execution_count, 2);
            assert_eq!(record.last_outcome, TestOutcome::Passed);
        }

        #[test]
        fn test_no_budget_fails_first_time() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy::none());
            let mut attempts = 0;
            let (outcome, _) = orchestrator.execute("t::fragile", None, || {
                attempts += 1;
                fail()
            });
            assert_eq!(outcome, TestOutcome::Failed);
            assert_eq!(attempts, 1);
        }

        #[test]
        fn test_unsupported_platform_never_rerun() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy {
                global_retries: 4,
                flaky_only: false,
            });
            let mut attempts = 0;
            let (outcome, error) = orchestrator.execute("t::bad_platform", None, || {
                attempts += 1;
                Err(PilotError::UnsupportedPlatform {
                    name: "vr".to_string(),
                })
            });
            assert_eq!(outcome, TestOutcome::Failed);
            assert_eq!(attempts, 1);
            assert!(error.unwrap().is_unsupported());
        }

        #[test]
        fn test_marker_budget_used_over_global() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy::none());
            let mut attempts = 0;
            let (outcome, _) = orchestrator.execute("t::marked", Some(2), || {
                attempts += 1;
                if attempts < 2 {
                    fail()
                } else {
                    Ok(())
                }
            });
            assert_eq!(outcome, TestOutcome::Passed);
            assert_eq!(attempts, 2);
            assert!(orchestrator.record("t::marked").unwrap().flaky);
        }
    }

    mod table {
        use super::*;

        #[test]
        fn test_skip_records_without_execution() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy::none());
            orchestrator.skip("t::not_today", None);
            let record = orchestrator.record("t::not_today").unwrap();
            assert_eq!(record.last_outcome, TestOutcome::Skipped);
            assert_eq!(record.execution_count, 0);
        }

        #[test]
        fn test_snapshot_sorted_by_id() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy::none());
            orchestrator.execute("t::b", None, || Ok(()));
            orchestrator.execute("t::a", None, || Ok(()));
            let snapshot = orchestrator.snapshot();
            let ids: Vec<&str> = snapshot.iter().map(|r| r.test_id.as_str()).collect();
            assert_eq!(ids, vec!["t::a", "t::b"]);
        }

        #[test]
        fn test_retry_stats_fold() {
            let orchestrator = LifecycleOrchestrator::new(RetryPolicy {
                global_retries: 2,
                flaky_only: false,
            });
            orchestrator.execute("t::clean", None, || Ok(()));
            let mut attempts = 0;
            orchestrator.execute("t::flaky", Some(3), || {
                attempts += 1;
                if attempts < 3 {
                    fail()
                } else {
                    Ok(())
                }
            });
            orchestrator.execute("t::doomed", None, || fail());

            let stats = orchestrator.retry_stats();
            assert_eq!(stats.total_retries, 2 + 2); // flaky reran twice, doomed twice
            assert_eq!(stats.retried_tests, 2);
            assert_eq!(stats.flaky_tests, 1);
        }

        #[test]
        fn test_concurrent_workers_share_table() {
            let orchestrator = std::sync::Arc::new(LifecycleOrchestrator::new(RetryPolicy::none()));
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let orchestrator = orchestrator.clone();
                    std::thread::spawn(move || {
                        orchestrator.execute(&format!("t::parallel_{i}"), None, || Ok(()));
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(orchestrator.snapshot().len(), 8);
        }
    }
}
