//! Global rate-limit gate
//!
//! A single timestamp (milliseconds since the Unix epoch) marking the earliest
//! moment any shard may open a new session. The transport layer writes it when
//! the service reports a global rate limit and consults it before connecting.

use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Sentinel for "no rate limit observed yet"; distinct from zero.
const UNSET: i64 = i64::MIN;

/// Shared handle to the process-wide "next allowed connect" timestamp
///
/// Clones share the same cell, so one instance can be injected into every
/// scheduler. Reads and writes are lock-free.
#[derive(Clone)]
pub struct GlobalRateLimit {
    next_allowed: Arc<AtomicI64>,
}

impl GlobalRateLimit {
    /// Create an unset gate
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_allowed: Arc::new(AtomicI64::new(UNSET)),
        }
    }

    /// Next allowed connect time in epoch milliseconds, or `None` if unset
    pub fn get(&self) -> Option<i64> {
        match self.next_allowed.load(Ordering::Acquire) {
            UNSET => None,
            ts => Some(ts),
        }
    }

    /// Overwrite the next allowed connect time
    ///
    /// The value is not validated, except that `i64::MIN` is stored as
    /// `i64::MIN + 1` so it cannot read back as unset.
    pub fn set(&self, timestamp_ms: i64) {
        self.next_allowed
            .store(timestamp_ms.max(UNSET + 1), Ordering::Release);
    }

    /// Return the gate to the unset state
    pub fn reset(&self) {
        self.next_allowed.store(UNSET, Ordering::Release);
    }

    /// Push the gate to `now + retry_after`; never moves it backwards
    ///
    /// Returns the resulting gate value.
    pub fn set_retry_after(&self, retry_after: Duration) -> i64 {
        let delta = i64::try_from(retry_after.as_millis()).unwrap_or(i64::MAX);
        let until = now_millis().saturating_add(delta);
        let previous = self.next_allowed.fetch_max(until, Ordering::AcqRel);
        previous.max(until)
    }

    /// Time left before a connect is allowed, relative to the wall clock
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(now_millis())
    }

    /// Time left before a connect is allowed, relative to `now_ms`
    pub fn remaining_at(&self, now_ms: i64) -> Option<Duration> {
        let next = self.get()?;
        let left = next.checked_sub(now_ms).filter(|ms| *ms > 0)?;
        Some(Duration::from_millis(left as u64))
    }

    /// Whether connects are currently held back
    pub fn is_limited(&self) -> bool {
        self.remaining().is_some()
    }

    /// Apply a rate-limit response body from the HTTP layer
    ///
    /// Only global limits move the gate. Returns whether it was applied.
    pub fn apply(&self, response: &RateLimitResponse) -> bool {
        if !response.global {
            return false;
        }

        let until = self.set_retry_after(response.retry_after());
        tracing::warn!(
            retry_after_ms = response.retry_after().as_millis() as u64,
            until_ms = until,
            message = %response.message,
            "Global rate limit hit"
        );
        true
    }
}

impl Default for GlobalRateLimit {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GlobalRateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalRateLimit")
            .field("next_allowed", &self.get())
            .finish()
    }
}

/// Body of a `429 Too Many Requests` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateLimitResponse {
    #[serde(default)]
    pub message: String,
    /// Seconds to wait before retrying
    pub retry_after: f64,
    /// Whether the limit applies to the whole client rather than one route
    #[serde(default)]
    pub global: bool,
}

impl RateLimitResponse {
    /// `retry_after` as a duration; negative or non-finite values clamp to zero
    pub fn retry_after(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_after).unwrap_or_default()
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
