// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by caller.
//!
//! Each caller key owns a counter and a window start. The counter resets
//! entirely when a window expires; there is no sliding decay and no token
//! refill. Rejected requests still increment the counter, so an abusive
//! caller stays rejected until its window rolls over.
//!
//! Entries are never evicted: counters live for the process lifetime and do
//! not survive a restart.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Result of an admission check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is admitted
    Allowed {
        /// Remaining requests in the current window
        remaining: u32,
        /// Time until the current window rolls over
        reset_in: Duration,
    },
    /// Request is over budget for the current window
    Limited {
        /// Time until the window rolls over and requests are admitted again
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Per-key window state.
#[derive(Debug)]
struct WindowState {
    /// Requests seen in the current window, including rejected ones
    count: u32,
    /// Start of the current window; monotonically non-decreasing per key
    window_start: Instant,
}

/// Thread-safe fixed-window rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: RwLock<HashMap<String, WindowState>>,
}

impl RateLimiter {
    /// Create a rate limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a rate limiter on an injected clock (used by tests to simulate
    /// window expiry).
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Check whether `key` is over budget and record this request.
    ///
    /// The read-compare-write sequence runs under a single write lock, so
    /// concurrent calls for the same key are serialized and no update is
    /// lost.
    pub async fn check_and_record(&self, key: &str) -> RateLimitResult {
        let now = self.clock.now();
        let window = self.config.window_duration();

        let mut windows = self.windows.write().await;

        let state = match windows.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(WindowState {
                    count: 1,
                    window_start: now,
                });
                debug!(client = %key, "first request, window opened");
                return RateLimitResult::Allowed {
                    remaining: self.config.max_requests.saturating_sub(1),
                    reset_in: window,
                };
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        let elapsed = now.saturating_duration_since(state.window_start);
        if elapsed > window {
            // Window expired, reset
            state.count = 1;
            state.window_start = now;
            debug!(client = %key, "window rolled over");
            return RateLimitResult::Allowed {
                remaining: self.config.max_requests.saturating_sub(1),
                reset_in: window,
            };
        }

        state.count = state.count.saturating_add(1);
        let reset_in = window - elapsed;

        if state.count > self.config.max_requests {
            debug!(client = %key, count = state.count, "over budget");
            RateLimitResult::Limited {
                retry_after: reset_in,
            }
        } else {
            RateLimitResult::Allowed {
                remaining: self.config.max_requests - state.count,
                reset_in,
            }
        }
    }
}
