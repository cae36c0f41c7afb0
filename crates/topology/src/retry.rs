//! Bounded retry for calls to external control-plane APIs.
//!
//! The operation is a closure. Every `Err` it returns, including an explicit
//! "not yet available" signal, counts as a failed attempt: the policy sleeps
//! for its wait interval and tries again until `max_attempts` invocations
//! have been made. The last error is then returned to the caller.
//!
//! There is no cancellation; callers needing a deadline bound it through
//! `max_attempts * wait`.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Retries exhausted; carries the last failure.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {source}")]
pub struct RetryError<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub source: E,
}

impl<E: std::error::Error + 'static> RetryError<E> {
    pub fn into_inner(self) -> E {
        self.source
    }
}

/// How many times to call, and how long to wait in between.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait: Duration,
}

impl RetryPolicy {
    /// `max_attempts` of zero is treated as one.
    pub const fn new(max_attempts: u32, wait: Duration) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self { max_attempts, wait }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Upper bound on time spent sleeping between attempts.
    pub fn max_total_wait(&self) -> Duration {
        self.wait * (self.max_attempts - 1)
    }

    /// Run `op` until it succeeds or attempts run out, blocking the calling
    /// thread between attempts.
    pub fn call<T, E, F>(&self, op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut() -> Result<T, E>,
    {
        self.call_with_sleeper(op, std::thread::sleep)
    }

    /// Like [`call`](Self::call), with the wait performed by `sleep`.
    pub fn call_with_sleeper<T, E, F, S>(&self, mut op: F, mut sleep: S) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut() -> Result<T, E>,
        S: FnMut(Duration),
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "remote call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(source) if attempt >= self.max_attempts => {
                    warn!(attempts = attempt, error = %source, "remote call failed, giving up");
                    return Err(RetryError {
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "remote call failed, retrying in {:?}",
                        self.wait
                    );
                    sleep(self.wait);
                    attempt += 1;
                }
            }
        }
    }
}
