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

use tracing::trace;

use crate::actor::Props;
use crate::common::{ActorSystem, EventBus, Scheduler, SystemError};
use crate::message::{ActorAddress, ActorId, ActorRef, MessageId, ReplyTo};
use crate::traits::Actor;

/// The execution context handed to every hook and handler.
///
/// It knows who the actor is, who its parent is and, while a message is being
/// handled, who sent it and whether a reply is expected. Outside of a handler
/// the per-message accessors return `None`.
pub struct Context<A: Actor> {
    myself: ActorRef<A>,
    parent: Option<ActorAddress>,
    system: ActorSystem,
    incarnation: u64,
    current: Option<CurrentMessage<A::Reply>>,
}

struct CurrentMessage<R> {
    id: MessageId,
    sender: Option<ActorAddress>,
    reply_to: Option<ReplyTo<R>>,
}

impl<A: Actor> Context<A> {
    pub(crate) fn new(
        myself: ActorRef<A>,
        parent: Option<ActorAddress>,
        system: ActorSystem,
        incarnation: u64,
    ) -> Self {
        Self {
            myself,
            parent,
            system,
            incarnation,
            current: None,
        }
    }

    pub(crate) fn begin(
        &mut self,
        id: MessageId,
        sender: Option<ActorAddress>,
        reply_to: Option<ReplyTo<A::Reply>>,
    ) {
        self.current = Some(CurrentMessage {
            id,
            sender,
            reply_to,
        });
    }

    /// Ends the current message. An unresolved reply slot is dropped here.
    pub(crate) fn end(&mut self) {
        if let Some(CurrentMessage {
            id,
            reply_to: Some(_),
            ..
        }) = self.current.take()
        {
            trace!(actor = %self.myself.id(), message = %id, "handler left an ask unanswered");
        }
    }

    /// This actor's name.
    #[must_use]
    pub fn id(&self) -> &ActorId {
        self.myself.id()
    }

    /// A reference to this actor.
    #[must_use]
    pub const fn myself(&self) -> &ActorRef<A> {
        &self.myself
    }

    /// The actor that created this one, if it was created from a handler.
    #[must_use]
    pub const fn parent(&self) -> Option<&ActorAddress> {
        self.parent.as_ref()
    }

    /// The owning system.
    #[must_use]
    pub const fn system(&self) -> &ActorSystem {
        &self.system
    }

    /// The system scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        self.system.scheduler()
    }

    /// The system event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        self.system.event_bus()
    }

    /// The sender of the message being handled, if it was supplied.
    #[must_use]
    pub fn sender(&self) -> Option<&ActorAddress> {
        self.current.as_ref().and_then(|current| current.sender.as_ref())
    }

    /// The identifier of the message being handled.
    #[must_use]
    pub fn message_id(&self) -> Option<MessageId> {
        self.current.as_ref().map(|current| current.id)
    }

    /// Whether the message being handled came from `ask` and has not been answered yet.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.reply_to.is_some())
    }

    /// Answers the pending `ask`.
    ///
    /// Returns `false` when there is nothing to answer: the message was a plain
    /// `send`, it was already answered, or the asker gave up.
    pub fn reply(&mut self, value: A::Reply) -> bool {
        self.take_reply().is_some_and(|reply_to| reply_to.reply(value))
    }

    /// Answers the pending `ask` with an error.
    pub fn reply_error(&mut self, error: impl Into<anyhow::Error>) -> bool {
        self.take_reply().is_some_and(|reply_to| reply_to.fail(error))
    }

    /// Takes the reply slot out of the current message.
    ///
    /// Useful when the answer is produced later, for instance by another task.
    pub fn take_reply(&mut self) -> Option<ReplyTo<A::Reply>> {
        self.current.as_mut().and_then(|current| current.reply_to.take())
    }

    /// Creates a child actor whose parent is this actor.
    ///
    /// # Errors
    ///
    /// See [`ActorSystem::create_actor`].
    pub fn create_actor<B: Actor>(
        &self,
        name: impl Into<ActorId>,
        props: Props<B>,
    ) -> Result<ActorRef<B>, SystemError> {
        self.system
            .create_actor_with_parent(name.into(), props, Some(self.id().clone()))
    }

    /// Stops this actor once the current handler returns.
    ///
    /// The actor is deregistered immediately; messages still queued are discarded.
    pub fn stop(&self) {
        self.myself.cancel();
        self.system.inner.deregister(self.id(), self.incarnation);
    }
}

impl<A: Actor> fmt::Debug for Context<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", self.id())
            .field("parent", &self.parent)
            .field("message_id", &self.message_id())
            .finish_non_exhaustive()
    }
}
