//! API quota bookkeeping for the request engine.

use chrono::{DateTime, Utc};
use core::cell::Cell;
use core::time::Duration;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    /// Extract rate limit information from API response headers
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<u64>().ok()?;
        let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
        let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

        Some(Self { remaining, reset_at })
    }
}

/// Parse the `Retry-After` header value as seconds.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()
}

/// Last-known quota of the API key.
///
/// Updated from every response the engine receives and consulted before every
/// request it sends. Only the engine owns and mutates it; the run is single-threaded,
/// so a `Cell` is all the synchronization it needs.
#[derive(Debug)]
pub struct QuotaTracker {
    state: Cell<Option<RateLimitInfo>>,
    max_wait: Duration,
}

impl QuotaTracker {
    #[must_use]
    pub const fn new(max_wait: Duration) -> Self {
        Self {
            state: Cell::new(None),
            max_wait,
        }
    }

    /// The most recent quota reported by the server, if any.
    #[must_use]
    pub fn current(&self) -> Option<RateLimitInfo> {
        self.state.get()
    }

    /// Record the quota reported by a response.
    pub fn observe(&self, info: RateLimitInfo) {
        self.state.set(Some(info));
    }

    /// Record that the server rejected a request because the quota ran out.
    pub fn mark_exhausted(&self, reset_at: DateTime<Utc>) {
        self.state.set(Some(RateLimitInfo { remaining: 0, reset_at }));
    }

    /// How long a request issued at `now` has to wait for the quota to reset.
    ///
    /// `None` unless the quota is known to be exhausted and the reset lies in the future.
    /// The wait is capped at the configured maximum.
    #[must_use]
    pub fn pending_wait(&self, now: DateTime<Utc>) -> Option<Duration> {
        let info = self.state.get()?;
        if info.remaining > 0 || info.reset_at <= now {
            return None;
        }

        let wait = (info.reset_at - now).to_std().ok()?;
        Some(wait.min(self.max_wait))
    }

    /// Block until the quota resets, if it is exhausted.
    ///
    /// Returns how long the call slept. After the wait the quota is considered unknown
    /// until the next response reports it again.
    pub async fn wait_for_reset(&self, now: DateTime<Utc>) -> Option<Duration> {
        let wait = self.pending_wait(now)?;
        tokio::time::sleep(wait).await;
        self.state.set(None);
        Some(wait)
    }
}
