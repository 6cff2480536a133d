//! Envelopes and the references used to address actors.
//!
//! *   [`ActorRef`]: the typed handle used to `send` to and `ask` an actor.
//! *   [`ActorAddress`]: an untyped address, used for senders, parents and subscribers.
//! *   [`Envelope`]: a payload plus its identifier, optional sender and optional reply slot.
//! *   [`ReplyTo`]: the one-shot slot a handler resolves to answer an `ask`.

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

pub use actor_address::ActorAddress;
pub use actor_ref::ActorRef;
pub use envelope::{Envelope, ReplyTo};
pub use ids::{ActorId, MessageId};

mod actor_address;
mod actor_ref;
mod envelope;
mod ids;
