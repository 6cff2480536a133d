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
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Courier is a minimal in-process actor runtime built on Tokio.
//!
//! Actors are named, independently executing units of state. Each one owns a
//! bounded mailbox and handles its messages one at a time, in arrival order.
//! The runtime offers:
//!
//! * fire-and-forget [`send`](crate::message::ActorRef::send) and request/response
//!   [`ask`](crate::message::ActorRef::ask) with a deadline,
//! * lifecycle hooks and per-actor [`SupervisionStrategy`](crate::actor::SupervisionStrategy)
//!   deciding what happens after a handler fails or panics,
//! * a [`Scheduler`](crate::common::Scheduler) for delayed and repeating delivery,
//! * a typed publish/subscribe [`EventBus`](crate::common::EventBus),
//! * dead letters for every message that could not be delivered.
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[courier_message]
//! enum CounterMessage {
//!     Increment,
//!     Get,
//! }
//!
//! #[derive(Default)]
//! struct Counter(u64);
//!
//! #[async_trait]
//! impl Actor for Counter {
//!     type Message = CounterMessage;
//!     type Reply = u64;
//!
//!     async fn handle(&mut self, message: CounterMessage, ctx: &mut Context<Self>) -> Result<(), ActorError> {
//!         match message {
//!             CounterMessage::Increment => self.0 += 1,
//!             CounterMessage::Get => {
//!                 ctx.reply(self.0);
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let system = ActorSystem::launch().await;
//! let counter = system.create_actor("counter", Props::<Counter>::default())?;
//! counter.send(CounterMessage::Increment)?;
//! let total = counter.ask(CounterMessage::Get, Duration::from_secs(1)).await?;
//! system.shutdown().await?;
//! ```

/// Actor behavior, lifecycle and supervision.
pub mod actor;

/// The actor system and the services it owns.
pub mod common;

/// Envelopes and the references used to address actors.
pub mod message;

/// Traits shared across the runtime.
pub mod traits;

/// Re-exports of the types most programs need.
pub mod prelude {
    pub use std::time::Duration;

    pub use async_trait::async_trait;
    pub use courier_macro::courier_message;

    pub use crate::actor::{
        Actor, ActorError, Context, Directive, FailureKind, Props, RestartLimitExceeded,
        RestartLimiter, RestartLimiterConfig, SupervisionStrategy,
    };
    pub use crate::common::{
        ActorSystem, AskError, Cancellable, CourierConfig, DeadLetter, DeadLetterListener,
        DeadLetterReason, EventBus, Scheduler, SendError, SystemError, CONFIG,
    };
    pub use crate::message::{ActorAddress, ActorId, ActorRef, Envelope, MessageId, ReplyTo};
    pub use crate::traits::Addressable;
}
