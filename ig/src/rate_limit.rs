//! Per-subject sliding-window rate limiter.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

pub struct RateLimiter {
    max_requests: u32,
    window_secs: i64,
    history: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

pub enum Decision {
    Allowed,
    Rejected { retry_after_secs: i64 },
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: i64) -> Self {
        Self {
            max_requests,
            window_secs,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether `subject` may proceed at `now`, recording the attempt
    /// if allowed. Decision and bookkeeping happen under a single lock per
    /// subject, per §5's "within a single critical section" requirement.
    pub fn check(&self, subject: &str, now: DateTime<Utc>) -> Decision {
        let mut history = self.history.lock().expect("rate limiter lock poisoned");
        let timestamps = history.entry(subject.to_string()).or_default();
        let cutoff = now - chrono::Duration::seconds(self.window_secs);
        timestamps.retain(|t| *t > cutoff);

        if timestamps.len() as u32 >= self.max_requests {
            let oldest = timestamps[0];
            let remaining = oldest + chrono::Duration::seconds(self.window_secs) - now;
            let whole_secs = remaining.num_seconds();
            let has_remainder = (remaining - chrono::Duration::seconds(whole_secs)).num_nanoseconds().unwrap_or(0) != 0;
            let retry_after = if has_remainder { whole_secs + 1 } else { whole_secs }.max(1);
            return Decision::Rejected { retry_after_secs: retry_after };
        }

        timestamps.push(now);
        Decision::Allowed
    }
}
