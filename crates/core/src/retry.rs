//! Bounded exponential-backoff retry for local-store writes.
//!
//! SQLite allows one writer at a time, and the background sweeps race the
//! request handlers for it. There is no application-level mutex; contention
//! is absorbed here instead, by retrying writes that failed on a lock. Any
//! non-lock failure, and exhaustion of the retry budget, propagate to the
//! caller unmodified.

use log::warn;
use rand::Rng;
use std::time::Duration;

use crate::errors::{Error, Result};

/// Retry budget and backoff shape for one class of store writes.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Policy for ordinary store writes.
    pub fn store_write() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_jitter: Duration::from_millis(100),
        }
    }

    /// Policy for writes on the hot sweep/request collision path, which get
    /// a larger budget and a slower first retry.
    pub fn sensitive_store_write() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_jitter: Duration::from_millis(100),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * 2u32.saturating_pow(attempt);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return backoff;
        }
        backoff + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }
}

/// True for failures caused by SQLite lock contention.
///
/// These are the only failures worth retrying: the competing writer will
/// release the lock within milliseconds.
pub fn is_lock_contention(error: &Error) -> bool {
    match error {
        Error::Database(db_err) => {
            let message = db_err.to_string();
            message.contains("database is locked") || message.contains("database table is locked")
        }
        _ => false,
    }
}

/// Runs `operation` until it succeeds, the failure is not retryable, or the
/// policy's attempt budget runs out. The jittered delay prevents retry
/// storms when a sweep and a request handler collide repeatedly.
pub async fn with_retry<T, F>(
    policy: &RetryPolicy,
    is_retryable: impl Fn(&Error) -> bool,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < policy.max_attempts && is_retryable(&err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "store write contended (attempt {}/{}), retrying in {:?}: {}",
                    attempt + 1,
                    policy.max_attempts,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
