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

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::actor::RestartLimiterConfig;

/// Runtime defaults for Courier.
///
/// Loaded once from `$XDG_CONFIG_HOME/courier/config.toml` into [`CONFIG`]; every
/// section and field is optional and falls back to its default. A system can also
/// be launched with an explicit configuration through
/// [`ActorSystem::launch_with_config`](crate::common::ActorSystem::launch_with_config).
///
/// ```toml
/// [timeouts]
/// actor_shutdown_timeout_ms = 2000
///
/// [limits]
/// mailbox_capacity = 256
///
/// [restarts]
/// enabled = true
/// max_restarts = 3
/// window_secs = 30
///
/// [behavior]
/// dead_letter_listener = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Shutdown grace periods.
    pub timeouts: TimeoutConfig,
    /// Capacity defaults.
    pub limits: LimitsConfig,
    /// Default restart limits for every actor; off unless `enabled` is set.
    pub restarts: RestartLimiterConfig,
    /// Behavioral switches.
    pub behavior: BehaviorConfig,
}

/// Shutdown grace periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long `stop_actor` waits for an actor's task to finish, in milliseconds.
    pub actor_shutdown_timeout_ms: u64,
    /// How long `shutdown` waits for all tasks before aborting them, in milliseconds.
    pub system_shutdown_timeout_ms: u64,
}

/// Capacity defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Mailbox capacity used when [`Props`](crate::actor::Props) do not set one.
    pub mailbox_capacity: usize,
}

/// Behavioral switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Start the default dead letter listener when the system launches.
    pub dead_letter_listener: bool,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            actor_shutdown_timeout_ms: 5_000,
            system_shutdown_timeout_ms: 5_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1_000,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            dead_letter_listener: true,
        }
    }
}

impl CourierConfig {
    /// `timeouts.actor_shutdown_timeout_ms` as a `Duration`.
    #[must_use]
    pub const fn actor_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.actor_shutdown_timeout_ms)
    }

    /// `timeouts.system_shutdown_timeout_ms` as a `Duration`.
    #[must_use]
    pub const fn system_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.system_shutdown_timeout_ms)
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error when the text is malformed or a value has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&text)?)
    }

    /// Loads configuration from XDG-compliant locations.
    ///
    /// Looks for `courier/config.toml` under `$XDG_CONFIG_HOME` and the XDG fallbacks.
    /// A missing file yields the defaults. A malformed one is logged and also yields
    /// the defaults.
    #[must_use]
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("courier") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration file {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration loaded from XDG-compliant locations on first use.
    pub static ref CONFIG: CourierConfig = CourierConfig::load();
}
