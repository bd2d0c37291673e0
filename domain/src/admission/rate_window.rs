//! Sliding-window rate accounting

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Length of the sliding window used for all rate limits.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Trailing-window record of dispatched requests and the tokens they used.
///
/// Events older than the window are pruned on every check. A limit of `0`
/// disables that dimension.
#[derive(Debug, Clone)]
pub struct RateWindow {
    window: Duration,
    requests: VecDeque<Instant>,
    tokens: VecDeque<(Instant, u64)>,
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(RATE_WINDOW)
    }
}

impl RateWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            requests: VecDeque::new(),
            tokens: VecDeque::new(),
        }
    }

    /// Drop every event that has left the window at `now`.
    pub fn prune(&mut self, now: Instant) {
        while let Some(&ts) = self.requests.front() {
            if ts + self.window <= now {
                self.requests.pop_front();
            } else {
                break;
            }
        }
        while let Some(&(ts, _)) = self.tokens.front() {
            if ts + self.window <= now {
                self.tokens.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long to wait before one more request using `tokens` fits.
    ///
    /// Returns `None` when it fits now. Otherwise the wait lasts until the
    /// oldest event of the exhausted dimension leaves the window; the caller
    /// is expected to recheck afterwards. A single request larger than the
    /// whole token budget is let through once the window is empty.
    pub fn wait_time(
        &mut self,
        now: Instant,
        requests_per_minute: u32,
        token_budget: u64,
        tokens: u64,
    ) -> Option<Duration> {
        self.prune(now);

        let mut wait: Option<Duration> = None;

        if requests_per_minute > 0
            && self.requests.len() >= requests_per_minute as usize
            && let Some(&oldest) = self.requests.front()
        {
            wait = Some((oldest + self.window).saturating_duration_since(now));
        }

        if token_budget > 0
            && self.token_total().saturating_add(tokens) > token_budget
            && let Some(&(oldest, _)) = self.tokens.front()
        {
            let token_wait = (oldest + self.window).saturating_duration_since(now);
            wait = Some(wait.map_or(token_wait, |w| w.max(token_wait)));
        }

        wait
    }

    /// Record one dispatched request.
    pub fn record(&mut self, now: Instant, tokens: u64) {
        self.requests.push_back(now);
        if tokens > 0 {
            self.tokens.push_back((now, tokens));
        }
    }

    /// Requests currently counted in the window.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    /// Tokens currently counted in the window.
    pub fn token_total(&self) -> u64 {
        self.tokens.iter().map(|(_, t)| *t).sum()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.tokens.clear();
    }
}
