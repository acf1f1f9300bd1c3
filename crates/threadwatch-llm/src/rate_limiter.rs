use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Length of the sliding window both ceilings are measured over
pub const WINDOW: Duration = Duration::from_secs(60);

/// Added to every computed wait so the entry has aged out when we wake up
pub const SAFETY_MARGIN: Duration = Duration::from_millis(500);

/// Per-minute ceilings imposed by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub requests_per_minute: u32,
    pub tokens_per_minute: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: 50,
            tokens_per_minute: 50_000,
        }
    }
}

/// Sliding-window limiter over requests and tokens.
///
/// Callers ask [`RateLimiter::wait_if_needed`] before a call with an
/// estimated token cost, and report the call's actual usage through
/// [`RateLimiter::record_request`] once it succeeded. Timestamps use
/// `tokio::time::Instant`, so paused-clock tests drive it deterministically.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    request_times: VecDeque<Instant>,
    token_usage: VecDeque<(Instant, u64)>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            request_times: VecDeque::new(),
            token_usage: VecDeque::new(),
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Block until a call costing `estimated_tokens` fits under both ceilings.
    ///
    /// The request ceiling is settled first, then the token ceiling is
    /// re-checked against the pruned window. Returns the total time slept.
    pub async fn wait_if_needed(&mut self, estimated_tokens: u64) -> Duration {
        let mut waited = Duration::ZERO;

        let now = Instant::now();
        self.prune(now);
        let wait = self.request_wait(now);
        if !wait.is_zero() {
            tracing::info!(
                wait_secs = wait.as_secs_f64(),
                in_window = self.request_times.len(),
                limit = self.limits.requests_per_minute,
                "Rate limit: waiting for request quota"
            );
            tokio::time::sleep(wait).await;
            waited += wait;
        }

        let now = Instant::now();
        self.prune(now);
        let wait = self.token_wait(now, estimated_tokens);
        if !wait.is_zero() {
            tracing::info!(
                wait_secs = wait.as_secs_f64(),
                in_window = self.window_tokens(),
                estimated_tokens,
                limit = self.limits.tokens_per_minute,
                "Rate limit: waiting for token quota"
            );
            tokio::time::sleep(wait).await;
            waited += wait;
            self.prune(Instant::now());
        }

        waited
    }

    /// Record a completed call with its actual token usage
    pub fn record_request(&mut self, tokens_used: u64) {
        let now = Instant::now();
        self.request_times.push_back(now);
        self.token_usage.push_back((now, tokens_used));
    }

    /// Requests inside the current window
    pub fn current_request_count(&mut self) -> usize {
        self.prune(Instant::now());
        self.request_times.len()
    }

    /// Tokens consumed inside the current window
    pub fn current_token_count(&mut self) -> u64 {
        self.prune(Instant::now());
        self.window_tokens()
    }

    fn window_tokens(&self) -> u64 {
        self.token_usage.iter().map(|(_, tokens)| tokens).sum()
    }

    fn prune(&mut self, now: Instant) {
        while self
            .request_times
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= WINDOW)
        {
            self.request_times.pop_front();
        }
        while self
            .token_usage
            .front()
            .is_some_and(|(t, _)| now.saturating_duration_since(*t) >= WINDOW)
        {
            self.token_usage.pop_front();
        }
    }

    /// Time until the window holds fewer than `requests_per_minute` entries.
    fn request_wait(&self, now: Instant) -> Duration {
        let limit = self.limits.requests_per_minute.max(1) as usize;
        let in_window = self.request_times.len();
        if in_window < limit {
            return Duration::ZERO;
        }
        // With exactly `limit` entries this is the oldest one.
        let index = in_window - limit;
        self.request_times
            .get(index)
            .map(|t| Self::until_expiry(now, *t))
            .unwrap_or(Duration::ZERO)
    }

    /// Time until enough usage ages out that `usage + estimate < ceiling`.
    fn token_wait(&self, now: Instant, estimated_tokens: u64) -> Duration {
        let ceiling = self.limits.tokens_per_minute;
        let mut remaining = self.window_tokens();
        if remaining + estimated_tokens < ceiling {
            return Duration::ZERO;
        }

        for (t, tokens) in &self.token_usage {
            remaining -= tokens;
            if remaining + estimated_tokens < ceiling {
                return Self::until_expiry(now, *t);
            }
        }

        // The estimate alone meets the ceiling: let the whole window drain.
        self.token_usage
            .back()
            .map(|(t, _)| Self::until_expiry(now, *t))
            .unwrap_or(Duration::ZERO)
    }

    fn until_expiry(now: Instant, recorded_at: Instant) -> Duration {
        WINDOW.saturating_sub(now.saturating_duration_since(recorded_at)) + SAFETY_MARGIN
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimits::default())
    }
}
