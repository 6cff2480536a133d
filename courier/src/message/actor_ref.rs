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
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace, warn};

use crate::common::{AskError, DeadLetter, DeadLetterReason, SendError, SystemInner};
use crate::message::{ActorAddress, ActorId, Envelope, MessageId, ReplyTo};
use crate::traits::{Actor, Addressable};

/// A typed, cloneable handle to an actor.
///
/// Delivery is non-blocking. A message that cannot be enqueued, because the
/// actor has stopped or its mailbox is full, is routed to dead letters and the
/// failure is reported to the caller. Nothing is dropped silently.
///
/// Two references are equal when they name the same actor. A reference is
/// bound to one incarnation, though: after the actor stops and the name is
/// reused, an old reference still compares equal to the new one but keeps
/// failing with [`SendError::NotFound`]. Look the name up again to reach the
/// new actor.
pub struct ActorRef<A: Actor> {
    id: ActorId,
    mailbox: mpsc::Sender<Envelope<A>>,
    token: CancellationToken,
    system: Weak<SystemInner>,
}

impl<A: Actor> ActorRef<A> {
    pub(crate) const fn new(
        id: ActorId,
        mailbox: mpsc::Sender<Envelope<A>>,
        token: CancellationToken,
        system: Weak<SystemInner>,
    ) -> Self {
        Self {
            id,
            mailbox,
            token,
            system,
        }
    }

    /// The actor's unique name.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> &ActorId {
        &self.id
    }

    /// An untyped address for this actor.
    #[must_use]
    pub fn address(&self) -> ActorAddress {
        ActorAddress::new(self.id.clone(), self.system.clone())
    }

    /// Whether the actor is still accepting messages.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.token.is_cancelled() && !self.mailbox.is_closed()
    }

    /// Sends a message without a sender.
    ///
    /// # Errors
    ///
    /// [`SendError::NotFound`] when the actor has stopped, [`SendError::MailboxFull`]
    /// when its mailbox is at capacity. The message has been routed to dead letters
    /// in both cases.
    pub fn send(&self, message: A::Message) -> Result<(), SendError> {
        self.tell(message, None)
    }

    /// Sends a message on behalf of another actor, which the handler sees as
    /// [`Context::sender`](crate::actor::Context::sender).
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub fn send_from(&self, message: A::Message, sender: &impl Addressable) -> Result<(), SendError> {
        self.tell(message, Some(sender.address()))
    }

    /// Sends a message with an optional sender.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub fn tell(&self, message: A::Message, sender: Option<ActorAddress>) -> Result<(), SendError> {
        self.enqueue(Envelope::new(message, sender, None))
    }

    /// Sends a message and waits for the handler's reply.
    ///
    /// The wait ends at the first of: a reply, an error reply, or `timeout`. A
    /// timeout is never reported before `timeout` has elapsed, and a reply arriving
    /// after it is discarded. A zero timeout succeeds only if the reply is already
    /// available.
    ///
    /// # Errors
    ///
    /// * [`AskError::NotFound`] immediately when the actor has stopped.
    /// * [`AskError::MailboxFull`] immediately when its mailbox is at capacity.
    /// * [`AskError::Failed`] when the handler answered with an error.
    /// * [`AskError::Timeout`] when no answer arrived in time, including when the
    ///   handler finished without answering.
    pub async fn ask(&self, message: A::Message, timeout: Duration) -> Result<A::Reply, AskError> {
        self.ask_from(message, None, timeout).await
    }

    /// [`ask`](Self::ask) with an explicit sender.
    ///
    /// # Errors
    ///
    /// As for [`ask`](Self::ask).
    #[instrument(skip(self, message, sender), fields(actor = %self.id))]
    pub async fn ask_from(
        &self,
        message: A::Message,
        sender: Option<ActorAddress>,
        timeout: Duration,
    ) -> Result<A::Reply, AskError> {
        let started = Instant::now();
        let asker = sender.as_ref().map(|address| address.id().clone());
        let (reply_to, reply) = ReplyTo::channel();
        let envelope = Envelope::new(message, sender, Some(reply_to));
        let message_id = envelope.id;

        self.enqueue(envelope)?;

        match tokio::time::timeout(timeout, reply).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(error))) => Err(AskError::Failed(error)),
            Ok(Err(_)) => {
                // The handler dropped the reply slot; the caller still waits out the deadline.
                tokio::time::sleep(timeout.saturating_sub(started.elapsed())).await;
                Err(self.ask_timed_out(message_id, asker, timeout))
            }
            Err(_) => Err(self.ask_timed_out(message_id, asker, timeout)),
        }
    }

    /// Enqueues without dead-lettering, handing the envelope back on failure.
    pub(crate) fn try_enqueue(&self, envelope: Envelope<A>) -> Result<(), (Envelope<A>, SendError)> {
        if self.token.is_cancelled() {
            return Err((envelope, SendError::NotFound(self.id.clone())));
        }
        self.mailbox.try_send(envelope).map_err(|error| match error {
            TrySendError::Full(envelope) => (envelope, SendError::MailboxFull(self.id.clone())),
            TrySendError::Closed(envelope) => (envelope, SendError::NotFound(self.id.clone())),
        })
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    fn enqueue(&self, envelope: Envelope<A>) -> Result<(), SendError> {
        let Err((envelope, error)) = self.try_enqueue(envelope) else {
            return Ok(());
        };
        trace!(actor = %self.id, message = %envelope.id, "undeliverable: {error}");
        let reason = match error {
            SendError::NotFound(_) => DeadLetterReason::NotFound,
            SendError::MailboxFull(_) => DeadLetterReason::MailboxFull,
        };
        self.dead_letter(DeadLetter::from_envelope(envelope, self.id.clone(), reason));
        Err(error)
    }

    fn ask_timed_out(&self, message_id: MessageId, asker: Option<ActorId>, timeout: Duration) -> AskError {
        self.dead_letter(DeadLetter {
            message_id,
            recipient: self.id.clone(),
            sender: asker,
            reason: DeadLetterReason::AskTimedOut,
            message: None,
        });
        AskError::Timeout {
            actor: self.id.clone(),
            timeout,
        }
    }

    fn dead_letter(&self, letter: DeadLetter) {
        match self.system.upgrade() {
            Some(system) => system.route_dead_letter(letter),
            None => warn!(recipient = %letter.recipient, reason = %letter.reason, "{letter} (system gone)"),
        }
    }
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            mailbox: self.mailbox.clone(),
            token: self.token.clone(),
            system: self.system.clone(),
        }
    }
}

// Equality ignores the incarnation, so refs from before and after a name reuse
// are equal even though only the newer one delivers.
impl<A: Actor> PartialEq for ActorRef<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A: Actor> Eq for ActorRef<A> {}

impl<A: Actor> Hash for ActorRef<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<A: Actor> fmt::Debug for ActorRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
