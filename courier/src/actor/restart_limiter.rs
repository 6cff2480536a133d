/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Caps how often a failing actor may be restarted.
//!
//! The limiter is off unless enabled in the `[restarts]` config section or with
//! [`Props::with_restart_limits`](crate::actor::Props::with_restart_limits); a
//! disabled limiter grants every restart the strategy asks for.
//!
//! Restarts are counted inside a sliding window. Once the window holds
//! `max_restarts` entries, the next restart request is refused and the run loop
//! stops the actor instead, as if the strategy had escalated. Granted restarts
//! are spaced out with exponential backoff that resets once a message is handled
//! successfully.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Restart limits and backoff, configurable globally or per actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartLimiterConfig {
    /// When `false` (the default), every restart is granted immediately.
    pub enabled: bool,
    /// Restarts allowed inside one window.
    pub max_restarts: u32,
    /// Length of the sliding window, in seconds.
    pub window_secs: u64,
    /// Delay before the first restart of a failure streak, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on the delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Growth factor applied per consecutive restart.
    pub backoff_multiplier: f64,
}

impl Default for RestartLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_restarts: 10,
            window_secs: 60,
            initial_backoff_ms: 0,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RestartLimiterConfig {
    /// A configuration that never refuses or delays a restart.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_restarts: 0,
            window_secs: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// The sliding window as a `Duration`.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// A restart was refused because the window is full.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("restart limit reached: {restarts} restarts within {window:?} (max {max_restarts})")]
pub struct RestartLimitExceeded {
    /// Restarts currently inside the window.
    pub restarts: usize,
    /// The configured maximum.
    pub max_restarts: u32,
    /// The configured window.
    pub window: Duration,
}

/// Per-actor restart bookkeeping.
#[derive(Debug)]
pub struct RestartLimiter {
    config: RestartLimiterConfig,
    window: VecDeque<Instant>,
    streak: u32,
}

impl RestartLimiter {
    /// A limiter with no restarts recorded.
    #[must_use]
    pub const fn new(config: RestartLimiterConfig) -> Self {
        Self {
            config,
            window: VecDeque::new(),
            streak: 0,
        }
    }

    /// Requests permission for a restart now.
    ///
    /// On success the restart is recorded and the backoff to wait before building
    /// the new instance is returned.
    ///
    /// # Errors
    ///
    /// [`RestartLimitExceeded`] when the window already holds `max_restarts` restarts.
    pub fn try_restart(&mut self) -> Result<Duration, RestartLimitExceeded> {
        self.try_restart_at(Instant::now())
    }

    /// [`try_restart`](Self::try_restart) against an explicit clock reading.
    ///
    /// # Errors
    ///
    /// [`RestartLimitExceeded`] when the window already holds `max_restarts` restarts.
    pub fn try_restart_at(&mut self, now: Instant) -> Result<Duration, RestartLimitExceeded> {
        if !self.config.enabled {
            return Ok(Duration::ZERO);
        }

        let window = self.config.window();
        while self
            .window
            .front()
            .is_some_and(|&at| now.saturating_duration_since(at) >= window)
        {
            self.window.pop_front();
        }

        if self.window.len() >= self.config.max_restarts as usize {
            return Err(RestartLimitExceeded {
                restarts: self.window.len(),
                max_restarts: self.config.max_restarts,
                window,
            });
        }

        self.window.push_back(now);
        let backoff = self.backoff(self.streak);
        self.streak = self.streak.saturating_add(1);
        Ok(backoff)
    }

    /// Ends the current failure streak so the next backoff starts from the beginning.
    ///
    /// The window itself is untouched.
    pub fn note_success(&mut self) {
        self.streak = 0;
    }

    /// Restarts currently counted in the window.
    #[must_use]
    pub fn restarts_in_window(&self) -> usize {
        self.window.len()
    }

    fn backoff(&self, streak: u32) -> Duration {
        if self.config.initial_backoff_ms == 0 {
            return Duration::ZERO;
        }
        #[allow(clippy::cast_precision_loss)]
        let scaled = self.config.initial_backoff_ms as f64
            * self
                .config
                .backoff_multiplier
                .powi(i32::try_from(streak).unwrap_or(i32::MAX));
        #[allow(
            clippy::cast_sign_loss,
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss
        )]
        let capped = scaled.clamp(0.0, self.config.max_backoff_ms as f64) as u64;
        Duration::from_millis(capped)
    }
}

impl Default for RestartLimiter {
    fn default() -> Self {
        Self::new(RestartLimiterConfig::default())
    }
}
