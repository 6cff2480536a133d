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

use tokio::sync::oneshot;

use crate::message::{ActorAddress, MessageId};
use crate::traits::Actor;

/// The unit of delivery: a payload plus its routing metadata.
///
/// Envelopes are created by [`ActorRef`](crate::message::ActorRef) and consumed by
/// the receiving actor's run loop. The sender is advisory and may be absent. The
/// reply slot is present only for envelopes produced by `ask`.
pub struct Envelope<A: Actor> {
    /// Assigned at creation; carried into dead letters.
    pub id: MessageId,
    /// The message itself.
    pub payload: A::Message,
    /// Who sent it, when known.
    pub sender: Option<ActorAddress>,
    /// Resolved by the handler to answer an `ask`.
    pub reply_to: Option<ReplyTo<A::Reply>>,
}

impl<A: Actor> Envelope<A> {
    /// Wraps a payload in a new envelope with a fresh [`MessageId`].
    pub fn new(
        payload: A::Message,
        sender: Option<ActorAddress>,
        reply_to: Option<ReplyTo<A::Reply>>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            payload,
            sender,
            reply_to,
        }
    }

    /// Whether the sender is waiting for an answer.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}

impl<A: Actor> fmt::Debug for Envelope<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .field("sender", &self.sender)
            .field("expects_reply", &self.reply_to.is_some())
            .finish()
    }
}

/// A single-use reply slot for one `ask`.
///
/// Resolving consumes the slot, so a reply can be delivered at most once. Dropping
/// it unresolved leaves the asker waiting until its deadline, where it observes a
/// timeout.
pub struct ReplyTo<R> {
    tx: oneshot::Sender<Result<R, anyhow::Error>>,
}

pub(crate) type ReplyReceiver<R> = oneshot::Receiver<Result<R, anyhow::Error>>;

impl<R> ReplyTo<R> {
    pub(crate) fn channel() -> (Self, ReplyReceiver<R>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Completes the `ask` with a value.
    ///
    /// Returns `false` when the asker is no longer waiting, for instance because its
    /// deadline has already passed. The value is discarded in that case.
    pub fn reply(self, value: R) -> bool {
        self.tx.send(Ok(value)).is_ok()
    }

    /// Completes the `ask` with an error.
    pub fn fail(self, error: impl Into<anyhow::Error>) -> bool {
        self.tx.send(Err(error.into())).is_ok()
    }

    /// Whether the asker has stopped waiting.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<R> fmt::Debug for ReplyTo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyTo")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reply_is_delivered_once() {
        let (reply_to, rx) = ReplyTo::<u32>::channel();
        assert!(!reply_to.is_closed());
        assert!(reply_to.reply(42));
        assert_eq!(rx.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn late_reply_is_discarded() {
        let (reply_to, rx) = ReplyTo::<u32>::channel();
        drop(rx);
        assert!(reply_to.is_closed());
        assert!(!reply_to.reply(1));
    }

    #[tokio::test]
    async fn failure_reaches_the_asker() {
        let (reply_to, rx) = ReplyTo::<u32>::channel();
        assert!(reply_to.fail(anyhow::anyhow!("no such key")));
        let error = rx.await.unwrap().unwrap_err();
        assert_eq!(error.to_string(), "no such key");
    }

    #[tokio::test]
    async fn dropped_slot_closes_the_channel() {
        let (reply_to, rx) = ReplyTo::<u32>::channel();
        drop(reply_to);
        assert!(rx.await.is_err());
    }
}
