//! Bounded-backoff retry for oracle round trips.
//!
//! Every oracle call is a network round trip against a live replica;
//! transient failures (connection refused, timeout, malformed what-if
//! statement) are retried a small fixed number of times with exponential
//! backoff before surfacing as a fatal run failure.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }
}

/// Runs `op`, retrying on any oracle error until the policy is exhausted.
/// The last error is returned unchanged so callers keep the real failure.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;

    let mut last_err = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt < attempts {
                    warn!(%what, attempt, error = %e, "oracle call failed, retrying");
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(policy.max_backoff);
                }
                last_err = Some(e);
            }
        }
    }

    // attempts >= 1, so an error is always recorded on the failure path.
    Err(last_err.unwrap_or_else(|| unreachable!("retry loop ran zero attempts")))
}
