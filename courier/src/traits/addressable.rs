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

use crate::message::{ActorAddress, ActorId, ActorRef};
use crate::traits::Actor;

/// Anything that names a running (or once-running) actor.
///
/// Implemented by typed [`ActorRef`]s and untyped [`ActorAddress`]es so system
/// operations such as `stop_actor` and event bus subscriptions accept either.
pub trait Addressable {
    /// The actor's unique name.
    fn id(&self) -> &ActorId;

    /// An untyped address for the actor.
    fn address(&self) -> ActorAddress;
}

impl<A: Actor> Addressable for ActorRef<A> {
    fn id(&self) -> &ActorId {
        ActorRef::id(self)
    }

    fn address(&self) -> ActorAddress {
        ActorRef::address(self)
    }
}

impl Addressable for ActorAddress {
    fn id(&self) -> &ActorId {
        ActorAddress::id(self)
    }

    fn address(&self) -> ActorAddress {
        self.clone()
    }
}
