use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info};

// Rate limit entry - tracks requests per key within one fixed window
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    // Whole seconds until the window resets, rounded up, never below 1
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.reset_at - now).num_milliseconds();
        ((ms + 999) / 1000).max(1)
    }
}

// Fixed-window counter keyed by client identity. A window starts on the
// key's first request and is replaced once `now` reaches `window_reset_at`,
// so up to 2 * limit requests can land around a boundary.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        self.check_at(key, limit, window, Utc::now())
    }

    // check with an explicit clock reading; the shard lock held by entry()
    // keeps the read-modify-write atomic per key
    pub fn check_at(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let reset_at = window_end(now, window);

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_reset_at: reset_at,
            });

        // fresh key or window elapsed: start over
        if entry.count == 0 || now >= entry.window_reset_at {
            entry.count = 1;
            entry.window_reset_at = reset_at;
            return RateLimitDecision {
                allowed: true,
                remaining: limit.saturating_sub(1),
                reset_at,
            };
        }

        entry.count = entry.count.saturating_add(1);

        RateLimitDecision {
            allowed: entry.count <= limit,
            remaining: limit.saturating_sub(entry.count),
            reset_at: entry.window_reset_at,
        }
    }

    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    // Drop entries whose window has already elapsed
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.window_reset_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn window_end(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// Sweeper - runs every `every` and drops expired windows
pub async fn sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    let mut interval = interval(every);

    info!(interval_secs = every.as_secs(), "Rate limit sweeper started");

    loop {
        interval.tick().await;

        let removed = limiter.sweep_expired();
        crate::metrics::RATE_LIMIT_KEYS.set(limiter.len() as f64);
        if removed > 0 {
            debug!(removed, remaining_keys = limiter.len(), "Swept expired rate limit entries");
        }
    }
}
