//! Blocking wait policy.
//!
//! The eager backends (WebDriver, Appium) synchronize by polling: a
//! condition is probed at a fixed interval until it holds or the deadline
//! elapses. The poll loop runs on the calling worker thread — suspension is
//! a plain `thread::sleep`, and a timeout aborts only the in-flight call.

use crate::result::{PilotError, PilotResult};
use std::time::{Duration, Instant};

/// Per-call wait configuration. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Total budget in milliseconds
    pub timeout_ms: u64,
    /// Interval between condition probes in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: crate::config::DEFAULT_EXPLICIT_WAIT_MS,
            poll_interval_ms: crate::config::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitPolicy {
    /// Create a policy
    #[must_use]
    pub const fn new(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout_ms,
            poll_interval_ms,
        }
    }

    /// Derive the policy from framework configuration
    #[must_use]
    pub const fn from_config(config: &crate::config::FrameworkConfig) -> Self {
        Self {
            timeout_ms: config.explicit_wait_ms,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    /// Budget as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `probe` until it yields a value or the policy deadline elapses.
///
/// The probe returns `Ok(Some(v))` when the condition holds, `Ok(None)` when
/// it does not hold yet, and `Err` for unrecoverable failures which abort
/// the wait immediately. `condition` describes what is being awaited and
/// ends up in the timeout error.
///
/// # Errors
///
/// `PilotError::Timeout` when the deadline elapses first; any `Err` from the
/// probe is passed through.
pub fn poll_until<T>(
    policy: &WaitPolicy,
    condition: &str,
    mut probe: impl FnMut() -> PilotResult<Option<T>>,
) -> PilotResult<T> {
    let deadline = Instant::now() + policy.timeout();
    loop {
        if let Some(value) = probe()? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(PilotError::Timeout {
                ms: policy.timeout_ms,
                condition: condition.to_string(),
            });
        }
        std::thread::sleep(policy.poll_interval());
    }
}

/// Poll a recoverable probe: probe errors count as "not yet" instead of
/// aborting. Used where the remote end reports absence as an error
/// (e.g. element lookup) while the element may still appear.
///
/// # Errors
///
/// `PilotError::Timeout` when the deadline elapses first.
pub fn poll_until_found<T>(
    policy: &WaitPolicy,
    condition: &str,
    mut probe: impl FnMut() -> PilotResult<T>,
) -> PilotResult<T> {
    poll_until(policy, condition, || match probe() {
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> WaitPolicy {
        WaitPolicy::new(200, 10)
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_default_matches_config_defaults() {
            let policy = WaitPolicy::default();
            assert_eq!(policy.timeout_ms, 10_000);
            assert_eq!(policy.poll_interval_ms, 250);
        }

        #[test]
        fn test_from_config() {
            let config = crate::config::FrameworkConfig {
                explicit_wait_ms: 3000,
                poll_interval_ms: 100,
                ..Default::default()
            };
            let policy = WaitPolicy::from_config(&config);
            assert_eq!(policy.timeout(), Duration::from_secs(3));
            assert_eq!(policy.poll_interval(), Duration::from_millis(100));
        }
    }

    mod poll_tests {
        use super::*;

        #[test]
        fn test_immediate_success_returns_before_deadline() {
            let start = Instant::now();
            let result = poll_until(&fast_policy(), "ready", || Ok(Some(42)));
            assert_eq!(result.unwrap(), 42);
            assert!(start.elapsed() < Duration::from_millis(200));
        }

        #[test]
        fn test_condition_true_before_deadline_succeeds() {
            let deadline = Instant::now() + Duration::from_millis(60);
            let start = Instant::now();
            let result = poll_until(&fast_policy(), "ready", || {
                Ok((Instant::now() >= deadline).then_some("done"))
            });
            assert_eq!(result.unwrap(), "done");
            // Succeeded after the condition flipped, within the budget
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(60));
            assert!(elapsed < Duration::from_millis(200));
        }

        #[test]
        fn test_never_true_times_out_near_deadline() {
            let start = Instant::now();
            let result: PilotResult<()> = poll_until(&fast_policy(), "ghost", || Ok(None));
            let elapsed = start.elapsed();
            match result {
                Err(PilotError::Timeout { ms, condition }) => {
                    assert_eq!(ms, 200);
                    assert_eq!(condition, "ghost");
                }
                other => panic!("expected timeout, got {other:?}"),
            }
            assert!(elapsed >= Duration::from_millis(200));
            assert!(elapsed < Duration::from_millis(600));
        }

        #[test]
        fn test_probe_error_aborts_wait() {
            let mut calls = 0;
            let result: PilotResult<()> = poll_until(&fast_policy(), "broken", || {
                calls += 1;
                Err(PilotError::Wire {
                    message: "connection reset".to_string(),
                })
            });
            assert!(matches!(result, Err(PilotError::Wire { .. })));
            assert_eq!(calls, 1);
        }

        #[test]
        fn test_found_variant_retries_probe_errors() {
            let mut calls = 0;
            let result = poll_until_found(&fast_policy(), "appears", || {
                calls += 1;
                if calls < 3 {
                    Err(PilotError::ElementNotFound {
                        strategy: "css".to_string(),
                        value: "#late".to_string(),
                    })
                } else {
                    Ok("element")
                }
            });
            assert_eq!(result.unwrap(), "element");
            assert_eq!(calls, 3);
        }

        #[test]
        fn test_found_variant_exhausts_to_timeout() {
            let result: PilotResult<()> = poll_until_found(&fast_policy(), "never", || {
                Err(PilotError::ElementNotFound {
                    strategy: "css".to_string(),
                    value: "#never".to_string(),
                })
            });
            assert!(result.unwrap_err().is_timeout());
        }
    }
}
