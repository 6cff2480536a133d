//! Actor behavior, lifecycle and supervision.
//!
//! *   [`Actor`]: the trait user types implement: a message handler plus lifecycle hooks.
//! *   [`Props`]: the recipe for creating an actor: factory, mailbox capacity and
//!     supervision strategy.
//! *   [`Context`]: what a running handler can see and do: its own reference, the
//!     current sender, replies, child creation and the system services.
//! *   [`SupervisionStrategy`] and [`Directive`]: the failure policy applied after a
//!     handler returns an error or panics.
//! *   [`RestartLimiter`]: caps restarts within a sliding window and spaces them out
//!     with exponential backoff.

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

pub use actor_error::{ActorError, FailureKind};
pub use context::Context;
pub use props::Props;
pub use restart_limiter::{RestartLimitExceeded, RestartLimiter, RestartLimiterConfig};
pub use supervision::{Decider, Directive, SupervisionStrategy};
pub use crate::traits::Actor;

pub(crate) use actor_cell::{running_incarnation, ActorCell};
pub(crate) use actor_error::panic_message;

/// The per-actor run loop that applies supervision.
mod actor_cell;
/// Failures reported by handlers and lifecycle hooks.
mod actor_error;
/// The execution context handed to hooks and handlers.
mod context;
/// Actor creation recipes.
mod props;
/// Sliding-window restart limits with exponential backoff.
mod restart_limiter;
/// Supervision strategies and the directives they produce.
mod supervision;
