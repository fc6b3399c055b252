//! Quota snapshots attached to rate-limit failures.
//!
//! When GitHub rejects a request because the quota is spent, the gateway asks
//! the `/rate_limit` endpoint when the window reopens and attaches the answer
//! to [`GitHubError::RateLimitExceeded`](super::GitHubError::RateLimitExceeded).

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Request quota reported by GitHub for the current window.
///
/// # Example
///
/// ```
/// use beacon::github::rate_limit::RateLimitInfo;
///
/// let info = RateLimitInfo::from_epoch(5000, 0, 1_700_000_000).expect("valid reset");
/// assert!(info.is_exhausted());
/// assert_eq!(info.resets_at().timestamp(), 1_700_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    limit: u32,
    remaining: u32,
    resets_at: DateTime<Utc>,
}

impl RateLimitInfo {
    /// Builds a snapshot from the epoch-seconds reset GitHub reports.
    ///
    /// Returns `None` when the reset does not fit a timestamp.
    #[must_use]
    pub fn from_epoch(limit: u32, remaining: u32, reset_epoch_seconds: u64) -> Option<Self> {
        let seconds = i64::try_from(reset_epoch_seconds).ok()?;
        let resets_at = DateTime::from_timestamp(seconds, 0)?;
        Some(Self {
            limit,
            remaining,
            resets_at,
        })
    }

    /// Requests allowed per window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Requests left in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// When the window reopens.
    #[must_use]
    pub const fn resets_at(&self) -> DateTime<Utc> {
        self.resets_at
    }

    /// Whether no requests remain.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Time left before the window reopens, zero once it has.
    #[must_use]
    pub fn retry_after(&self, now: DateTime<Utc>) -> Duration {
        self.resets_at
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
