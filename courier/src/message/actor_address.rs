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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Weak;

use crate::common::SystemInner;
use crate::message::{ActorId, ActorRef};
use crate::traits::Actor;

/// An untyped address of an actor.
///
/// Used wherever the message type is not known statically: the sender of an
/// envelope, an actor's parent, event bus subscribers. Recover a typed
/// reference with [`typed`](Self::typed).
#[derive(Clone)]
pub struct ActorAddress {
    id: ActorId,
    system: Weak<SystemInner>,
}

impl ActorAddress {
    pub(crate) const fn new(id: ActorId, system: Weak<SystemInner>) -> Self {
        Self { id, system }
    }

    /// The actor's unique name.
    #[must_use]
    pub const fn id(&self) -> &ActorId {
        &self.id
    }

    /// A typed reference, if the actor is registered and of type `A`.
    #[must_use]
    pub fn typed<A: Actor>(&self) -> Option<ActorRef<A>> {
        let system = self.system.upgrade()?;
        system.registry.typed_ref::<A>(self.id.as_str(), &self.system)
    }

    /// Whether an actor with this name is currently registered.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.system
            .upgrade()
            .is_some_and(|system| system.registry.contains(self.id.as_str()))
    }
}

impl PartialEq for ActorAddress {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActorAddress {}

impl Hash for ActorAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorAddress({})", self.id)
    }
}

impl fmt::Display for ActorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl<A: Actor> From<&ActorRef<A>> for ActorAddress {
    fn from(actor_ref: &ActorRef<A>) -> Self {
        actor_ref.address()
    }
}
