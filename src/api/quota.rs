//! Rate-limit header parsing and quota suspension bookkeeping
//!
//! GitHub reports the remaining quota and the reset instant on every
//! response. [`QuotaTracker`] turns those readings into a suspension deadline
//! that the client honors before its next call.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use std::time::Duration;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Quota reading taken from one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: Option<u32>,
    pub remaining: u32,

    /// Reset instant as Unix epoch seconds
    pub reset_epoch: i64,
}

impl RateLimitStatus {
    /// Reads the `X-RateLimit-*` headers
    ///
    /// Returns `None` unless both the remaining count and the reset time are
    /// present and numeric.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number::<u32>(headers, REMAINING_HEADER)?;
        let reset_epoch = header_number::<i64>(headers, RESET_HEADER)?;
        Some(Self {
            limit: header_number(headers, LIMIT_HEADER),
            remaining,
            reset_epoch,
        })
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.reset_epoch, 0).single()
    }

    /// Time left until the reset instant plus `buffer`
    ///
    /// A reset instant in the past still yields `buffer`.
    pub fn wait_duration(&self, now: DateTime<Utc>, buffer: Duration) -> Duration {
        let until_reset = self
            .reset_at()
            .and_then(|reset| (reset - now).to_std().ok())
            .unwrap_or(Duration::ZERO);
        until_reset + buffer
    }
}

/// Parses `Retry-After` when it carries a delay in seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_number::<u64>(headers, RETRY_AFTER_HEADER).map(Duration::from_secs)
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Tracks the most recent quota reading and any pending suspension
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    threshold: u32,
    buffer: Duration,
    suspended_until: Option<DateTime<Utc>>,
    last_status: Option<RateLimitStatus>,
    suspensions: u64,
}

impl QuotaTracker {
    pub fn new(threshold: u32, buffer: Duration) -> Self {
        Self {
            threshold,
            buffer,
            suspended_until: None,
            last_status: None,
            suspensions: 0,
        }
    }

    /// Records a quota reading
    ///
    /// When fewer than `threshold` calls remain, a suspension lasting until the
    /// reset instant (plus the buffer) is scheduled and its length returned.
    pub fn observe(&mut self, status: RateLimitStatus, now: DateTime<Utc>) -> Option<Duration> {
        self.last_status = Some(status);
        if status.remaining >= self.threshold {
            return None;
        }
        let wait = status.wait_duration(now, self.buffer);
        self.suspend_for(wait, now);
        Some(wait)
    }

    /// Schedules a suspension of at least `wait` from `now`
    ///
    /// An already pending suspension that ends later is kept.
    pub fn suspend_for(&mut self, wait: Duration, now: DateTime<Utc>) {
        let Ok(wait) = chrono::Duration::from_std(wait) else {
            return;
        };
        let until = now + wait;
        if self.suspended_until.map_or(true, |current| until > current) {
            if self.suspended_until.is_none() {
                self.suspensions += 1;
            }
            self.suspended_until = Some(until);
        }
    }

    /// Remaining suspension at `now`, if any
    pub fn pending(&self, now: DateTime<Utc>) -> Option<Duration> {
        let until = self.suspended_until?;
        (until - now).to_std().ok().filter(|d| !d.is_zero())
    }

    /// Lifts the suspension after the caller has waited it out
    pub fn clear(&mut self) {
        self.suspended_until = None;
    }

    pub fn last_status(&self) -> Option<RateLimitStatus> {
        self.last_status
    }

    /// Number of distinct suspensions scheduled so far
    pub fn suspensions(&self) -> u64 {
        self.suspensions
    }
}
