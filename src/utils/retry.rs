//! Bounded retry with linear backoff.
//!
//! Every remote call in the crate (archive queries, changelog downloads, CVE
//! tracker lookups) goes through a [`RetryPolicy`]. After failed attempt `k`
//! (1-indexed) the caller sleeps `k - 1` delay units, so five failing attempts
//! sleep 0, 1, 2, 3 and 4 units. A first-try success never sleeps.

use crate::error::{ChangelogError, Result};
use std::fmt::Display;
use std::time::Duration;

/// Default number of attempts per remote call.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default backoff unit.
pub const DEFAULT_DELAY_UNIT: Duration = Duration::from_secs(1);

/// Blocks the calling thread between attempts.
///
/// Swapped out in tests to record delays instead of waiting.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Attempt bound and backoff unit for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of calls to the operation (at least 1 is always made)
    pub attempts: u32,
    /// Length of one backoff unit
    pub delay_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay_unit: DEFAULT_DELAY_UNIT,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, delay_unit: Duration) -> Self {
        Self {
            attempts,
            delay_unit,
        }
    }

    /// Call `operation` until it succeeds or the attempts run out, returning
    /// the last error on exhaustion.
    pub fn retry<T, E, F>(&self, operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: Display,
    {
        self.run(&ThreadSleeper, operation, |_| true)
    }

    /// Like [`retry`](Self::retry) but gives up immediately on errors that
    /// are not transient (not-found, malformed responses, 4xx).
    pub fn retry_transient<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.run(&ThreadSleeper, operation, ChangelogError::is_transient)
    }

    /// The retry loop with an explicit sleeper and retry predicate.
    pub fn run<T, E, F, P, S>(
        &self,
        sleeper: &S,
        mut operation: F,
        should_retry: P,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
        P: Fn(&E) -> bool,
        E: Display,
        S: Sleeper + ?Sized,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && should_retry(&e) => {
                    tracing::debug!("Attempt {}/{} failed: {}", attempt, attempts, e);
                    sleeper.sleep(self.delay_unit * (attempt - 1));
                    attempt += 1;
                }
                Err(e) => {
                    if should_retry(&e) {
                        // The last failed attempt pauses too.
                        sleeper.sleep(self.delay_unit * (attempt - 1));
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingSleeper {
        calls: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.calls.borrow_mut().push(duration);
        }
    }

    fn units(sleeper: &RecordingSleeper) -> Vec<u64> {
        sleeper.calls.borrow().iter().map(Duration::as_secs).collect()
    }

    #[test]
    fn test_first_try_success_does_not_sleep() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let result: std::result::Result<&str, String> = RetryPolicy::default().run(
            &sleeper,
            || {
                calls.set(calls.get() + 1);
                Ok("done")
            },
            |_| true,
        );

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 1);
        assert!(sleeper.calls.borrow().is_empty());
    }

    #[test]
    fn test_exhaustion_returns_last_error() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let result: std::result::Result<(), String> = RetryPolicy::default().run(
            &sleeper,
            || {
                calls.set(calls.get() + 1);
                Err(format!("failure {}", calls.get()))
            },
            |_| true,
        );

        assert_eq!(result.unwrap_err(), "failure 5");
        assert_eq!(calls.get(), 5);
        assert_eq!(units(&sleeper), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_success_after_failures() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let result: std::result::Result<u32, String> = RetryPolicy::new(3, Duration::from_secs(1))
            .run(
                &sleeper,
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 {
                        Err("transient".to_string())
                    } else {
                        Ok(calls.get())
                    }
                },
                |_| true,
            );

        assert_eq!(result.unwrap(), 3);
        assert_eq!(units(&sleeper), vec![0, 1]);
    }

    #[test]
    fn test_non_retryable_error_stops_immediately() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let result: Result<()> = RetryPolicy::default().run(
            &sleeper,
            || {
                calls.set(calls.get() + 1);
                Err(ChangelogError::not_found("cve", "active/CVE-2023-1111"))
            },
            ChangelogError::is_transient,
        );

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.get(), 1);
        assert!(sleeper.calls.borrow().is_empty());
    }

    #[test]
    fn test_zero_attempts_still_calls_once() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let _: std::result::Result<(), String> = RetryPolicy::new(0, Duration::from_millis(10))
            .run(
                &sleeper,
                || {
                    calls.set(calls.get() + 1);
                    Err("nope".to_string())
                },
                |_| true,
            );
        assert_eq!(calls.get(), 1);
    }
}
