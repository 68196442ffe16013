use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::errors::{AdapterError, Result};
use crate::utils::context::RequestContext;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded polling: at most `max_attempts` probes, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

/// Where a poll loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome<T> {
    pub last: T,
    pub attempts: u32,
    pub settled: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Probes until `settled` accepts the value or the attempts run out.
    ///
    /// Exhausting the budget is not an error; the caller inspects the outcome.
    /// Cancellation is checked before every probe and interrupts the sleep.
    pub async fn poll<T, F, Fut, S>(
        &self,
        ctx: &RequestContext,
        mut probe: F,
        settled: S,
    ) -> Result<PollOutcome<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
        S: Fn(&T) -> bool,
    {
        let mut attempts = 0;
        loop {
            if ctx.is_cancelled() {
                return Err(self.cancelled(attempts));
            }
            attempts += 1;
            let last = probe(attempts).await;
            if settled(&last) {
                return Ok(PollOutcome { last, attempts, settled: true });
            }
            if attempts >= self.max_attempts {
                if ctx.is_cancelled() {
                    return Err(self.cancelled(attempts));
                }
                return Ok(PollOutcome { last, attempts, settled: false });
            }
            debug!(attempt = attempts, max_attempts = self.max_attempts, "not settled yet, waiting");
            tokio::select! {
                biased;
                _ = ctx.cancellation().cancelled() => {
                    return Err(self.cancelled(attempts));
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    fn cancelled(&self, attempts: u32) -> AdapterError {
        AdapterError::Cancelled(format!(
            "polling stopped after {} of {} attempts",
            attempts, self.max_attempts
        ))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL)
    }
}
