//! Soft assertions.
//!
//! A collector accumulates assertion failures without interrupting the
//! test: assertion methods never panic and never return errors. Failures
//! surface in one aggregate at `verify_all`, in call order. `reset` is the
//! only way to discard recorded failures.

use std::fmt::Debug;
use std::panic::Location;

/// A single recorded assertion failure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssertionFailure {
    /// What went wrong
    pub message: String,
    /// Call site that recorded the failure (`file:line`)
    pub location: String,
}

/// Collector for deferred assertion failures
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<AssertionFailure>,
    checked: usize,
}

impl SoftAssertions {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert two values are equal
    #[track_caller]
    pub fn assert_eq<T: PartialEq + Debug>(&mut self, actual: &T, expected: &T, message: &str) {
        self.checked += 1;
        if actual != expected {
            self.record(format!("{message}: expected {expected:?}, got {actual:?}"));
        }
    }

    /// Assert two values differ
    #[track_caller]
    pub fn assert_ne<T: PartialEq + Debug>(&mut self, actual: &T, expected: &T, message: &str) {
        self.checked += 1;
        if actual == expected {
            self.record(format!(
                "{message}: expected values to differ, both were {actual:?}"
            ));
        }
    }

    /// Assert a condition holds
    #[track_caller]
    pub fn assert_true(&mut self, condition: bool, message: &str) {
        self.checked += 1;
        if !condition {
            self.record(format!("{message}: expected true, got false"));
        }
    }

    /// Assert a condition does not hold
    #[track_caller]
    pub fn assert_false(&mut self, condition: bool, message: &str) {
        self.checked += 1;
        if condition {
            self.record(format!("{message}: expected false, got true"));
        }
    }

    /// Assert a string contains a substring
    #[track_caller]
    pub fn assert_contains(&mut self, haystack: &str, needle: &str, message: &str) {
        self.checked += 1;
        if !haystack.contains(needle) {
            self.record(format!(
                "{message}: expected '{haystack}' to contain '{needle}'"
            ));
        }
    }

    /// Record a failure unconditionally
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>) {
        self.checked += 1;
        self.record(message.into());
    }

    #[track_caller]
    fn record(&mut self, message: String) {
        let caller = Location::caller();
        self.failures.push(AssertionFailure {
            message,
            location: format!("{}:{}", caller.file(), caller.line()),
        });
    }

    /// Recorded failures in call order
    #[must_use]
    pub fn failures(&self) -> &[AssertionFailure] {
        &self.failures
    }

    /// Number of recorded failures
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Number of assertions checked since the last reset
    #[must_use]
    pub const fn checked_count(&self) -> usize {
        self.checked
    }

    /// True when nothing has failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Surface every accumulated failure as one aggregate error.
    ///
    /// # Errors
    ///
    /// `SoftAssertionError` carrying all failure messages in call order,
    /// when at least one assertion failed since the last reset.
    pub fn verify_all(&self) -> Result<(), SoftAssertionError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(SoftAssertionError::new(&self.failures))
        }
    }

    /// Discard all recorded failures and reset the counter
    pub fn reset(&mut self) {
        self.failures.clear();
        self.checked = 0;
    }
}

/// Aggregate of all soft-assertion failures in one verification window
#[derive(Debug, Clone)]
pub struct SoftAssertionError {
    /// Failure messages in call order
    pub failures: Vec<String>,
}

impl SoftAssertionError {
    /// Build from recorded failures
    #[must_use]
    pub fn new(failures: &[AssertionFailure]) -> Self {
        Self {
            failures: failures
                .iter()
                .map(|f| format!("{} ({})", f.message, f.location))
                .collect(),
        }
    }

    /// Number of component failures
    #[must_use]
    pub fn count(&self) -> usize {
        self.failures.len()
    }
}

impl std::fmt::Display for SoftAssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} soft assertion(s) failed:", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "  {}. {failure}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for SoftAssertionError {}

#[cfg(test)]
mod tests {
    use super::*;

    mod recording {
        use super::*;

        #[test]
        fn test_new_collector_is_clean() {
            let soft = SoftAssertions::new();
            assert!(soft.all_passed());
            assert_eq!(soft.failure_count(), 0);
            assert_eq!(soft.checked_count(), 0);
        }

        #[test]
        fn test_failing_assertions_do_not_interrupt() {
            let mut soft = SoftAssertions::new();
            soft.assert_eq(&1, &2, "first");
            soft.assert_true(false, "second");
            soft.assert_contains("abc", "xyz", "third");
            // Control flow reached here; all three recorded
            assert_eq!(soft.failure_count(), 3);
            assert_eq!(soft.checked_count(), 3);
        }

        #[test]
        fn test_passing_assertions_record_nothing() {
            let mut soft = SoftAssertions::new();
            soft.assert_eq(&7, &7, "eq");
            soft.assert_ne(&7, &8, "ne");
            soft.assert_false(false, "false");
            soft.assert_contains("hello world", "world", "contains");
            assert!(soft.all_passed());
            assert_eq!(soft.checked_count(), 4);
        }

        #[test]
        fn test_location_captured() {
            let mut soft = SoftAssertions::new();
            soft.fail("explicit");
            assert!(soft.failures()[0].location.contains("assertion.rs"));
        }
    }

    mod verify_all {
        use super::*;

        #[test]
        fn test_aggregate_has_exactly_n_messages_in_order() {
            let mut soft = SoftAssertions::new();
            soft.assert_true(false, "alpha");
            soft.assert_true(false, "beta");
            soft.assert_true(false, "gamma");

            let err = soft.verify_all().unwrap_err();
            assert_eq!(err.count(), 3);
            assert!(err.failures[0].contains("alpha"));
            assert!(err.failures[1].contains("beta"));
            assert!(err.failures[2].contains("gamma"));
        }

        #[test]
        fn test_verify_all_passes_when_clean() {
            let soft = SoftAssertions::new();
            assert!(soft.verify_all().is_ok());
        }

        #[test]
        fn test_display_numbers_components() {
            let mut soft = SoftAssertions::new();
            soft.assert_eq(&1, &2, "first");
            soft.assert_true(false, "second");
            let rendered = format!("{}", soft.verify_all().unwrap_err());
            assert!(rendered.contains("2 soft assertion(s) failed"));
            assert!(rendered.contains("1. first"));
            assert!(rendered.contains("2. second"));
        }
    }

    mod reset {
        use super::*;

        #[test]
        fn test_reset_clears_failures() {
            let mut soft = SoftAssertions::new();
            soft.assert_true(false, "will be discarded");
            soft.reset();
            assert!(soft.verify_all().is_ok());
            assert_eq!(soft.checked_count(), 0);
        }

        #[test]
        fn test_failures_after_reset_are_fresh() {
            let mut soft = SoftAssertions::new();
            soft.assert_true(false, "old");
            soft.reset();
            soft.assert_true(false, "new");
            let err = soft.verify_all().unwrap_err();
            assert_eq!(err.count(), 1);
            assert!(err.failures[0].contains("new"));
        }
    }
}
