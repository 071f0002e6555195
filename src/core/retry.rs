// src/core/retry.rs — Bounded retry with exponential backoff
//
// The orchestrator wraps each top-level stage in `RetryPolicy::run_if`.
// Delay after failed attempt `a` (0-based) is `base_delay * backoff_factor^a`.
// No sleep follows the final attempt; its error is returned as-is.

use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY_MS: u64 = 1_000;
const BACKOFF_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total invocations, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            backoff_factor: BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after failed attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::try_from_secs_f64(secs).unwrap_or(self.base_delay)
    }

    /// Retry every failure.
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(label, |_| true, |_, _, _| {}, op).await
    }

    /// Retry failures accepted by `retryable`. `on_retry` sees
    /// `(failed_attempt, delay, error)` before each backoff sleep.
    pub async fn run_if<T, E, F, Fut, P, N>(
        &self,
        label: &str,
        retryable: P,
        mut on_retry: N,
        mut op: F,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        N: FnMut(u32, Duration, &E),
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let last = attempt + 1 >= attempts;
                    if last || !retryable(&e) {
                        if last && attempts > 1 {
                            tracing::warn!(stage = label, attempts, "All retry attempts failed");
                        }
                        return Err(e);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        stage = label,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {}",
                        e
                    );
                    on_retry(attempt + 1, delay, &e);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
