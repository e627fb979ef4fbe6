//! Retry with exponential backoff for transient catalog failures.

use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Backoff policy: delays run `base_delay * 2^(attempt - 1)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 3 means up to 4 attempts total.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Run `op`, retrying transient failures under `policy`.
///
/// Only errors whose `is_transient()` is true are retried; anything else
/// returns immediately. Backoff blocks the calling thread, which is
/// acceptable for a synchronous pipeline driver.
pub fn retry_with_backoff<T>(policy: &RetryPolicy, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0u32;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                // Saturate so a large retry budget cannot overflow the factor
                // or the Duration multiply
                let factor = 2u32.saturating_pow(attempt - 1);
                let backoff = policy.base_delay.saturating_mul(factor);
                warn!(attempt, ?backoff, error = %err, "transient catalog failure, retrying");
                std::thread::sleep(backoff);
            }
            Err(err) => return Err(err),
        }
    }
}
