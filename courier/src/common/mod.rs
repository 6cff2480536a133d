//! The actor system and the services it owns.
//!
//! *   [`ActorSystem`]: creates, looks up and stops actors, routes dead letters
//!     and performs the graceful shutdown of everything it started.
//! *   [`Scheduler`]: one-shot and repeating delivery of messages to actors.
//! *   [`EventBus`]: typed publish/subscribe, independent of actor mailboxes.
//! *   [`DeadLetter`]: the record kept for every message that could not be delivered.
//! *   [`CourierConfig`]: runtime defaults loaded from an XDG config file.

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

pub use actor_system::ActorSystem;
pub use config::{BehaviorConfig, CourierConfig, LimitsConfig, TimeoutConfig, CONFIG};
pub use dead_letter::{DeadLetter, DeadLetterListener, DeadLetterReason, DEAD_LETTERS};
pub use errors::{AskError, SendError, SystemError};
pub use event_bus::EventBus;
pub use scheduler::{Cancellable, Scheduler};

pub(crate) use actor_system::SystemInner;
pub(crate) use registry::{Registry, RegistryEntry};

/// Defines the `ActorSystem` entry point and its shared state.
mod actor_system;
/// Loads runtime defaults from XDG-compliant locations.
pub mod config;
/// Dead letter records and the default listener actor.
mod dead_letter;
/// Error types returned by system, send and ask operations.
mod errors;
/// Typed publish/subscribe.
mod event_bus;
/// The name-keyed registry of live actors.
mod registry;
/// Delayed and repeating message delivery.
mod scheduler;
