//! Synchronous, rejecting rate limiter
//!
//! A request arriving before the minimum inter-request interval (`60s / rpm`)
//! has elapsed, or one that would push the rolling 60-second token total over
//! `tokens_per_minute`, fails immediately with `Error::RateLimit`. Nothing is
//! queued and nothing sleeps.

use super::config::RateLimit;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct WindowState {
    last_request: Option<Instant>,
    tokens: VecDeque<(Instant, u32)>,
}

/// Per-provider rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    limit: Option<RateLimit>,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter; `None` admits everything
    #[must_use]
    pub fn new(limit: Option<RateLimit>) -> Self {
        Self {
            limit,
            state: Mutex::new(WindowState::default()),
        }
    }

    /// The configured limit
    #[must_use]
    pub fn limit(&self) -> Option<RateLimit> {
        self.limit
    }

    /// Minimum spacing between two requests
    #[must_use]
    pub fn min_interval(&self) -> Option<Duration> {
        match self.limit {
            Some(limit) if limit.requests_per_minute > 0 => {
                Some(WINDOW / limit.requests_per_minute)
            }
            _ => None,
        }
    }

    /// Admit a request of `tokens` estimated tokens at the current instant
    pub fn check(&self, provider: &str, tokens: u32) -> Result<()> {
        self.check_at(provider, tokens, Instant::now())
    }

    /// Admit a request at an explicit instant
    pub fn check_at(&self, provider: &str, tokens: u32, now: Instant) -> Result<()> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let (Some(interval), Some(last)) = (self.min_interval(), state.last_request) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < interval {
                return Err(Error::RateLimit {
                    provider: provider.to_string(),
                    retry_after_ms: duration_ms(interval - elapsed),
                });
            }
        }

        while let Some(&(at, _)) = state.tokens.front() {
            if now.saturating_duration_since(at) >= WINDOW {
                state.tokens.pop_front();
            } else {
                break;
            }
        }

        // An oversized request is still admitted into an empty window.
        if limit.tokens_per_minute > 0 && !state.tokens.is_empty() {
            let used: u64 = state.tokens.iter().map(|(_, t)| u64::from(*t)).sum();
            if used + u64::from(tokens) > u64::from(limit.tokens_per_minute) {
                let retry_after = state
                    .tokens
                    .front()
                    .map(|(at, _)| WINDOW.saturating_sub(now.saturating_duration_since(*at)))
                    .unwrap_or(WINDOW);
                return Err(Error::RateLimit {
                    provider: provider.to_string(),
                    retry_after_ms: duration_ms(retry_after),
                });
            }
        }

        state.last_request = Some(now);
        state.tokens.push_back((now, tokens));
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
