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

use async_trait::async_trait;
use tracing::{trace, warn};

use crate::actor::{ActorError, Context};
use crate::message::{ActorId, Envelope, MessageId};
use crate::traits::Actor;

/// Registered name of the default dead letter listener.
pub const DEAD_LETTERS: &str = "deadLetters";

/// Why a message became a dead letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadLetterReason {
    /// The recipient was stopped or never registered.
    NotFound,
    /// The recipient's mailbox was at capacity.
    MailboxFull,
    /// An `ask` got no reply before its deadline.
    AskTimedOut,
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "recipient not found"),
            Self::MailboxFull => write!(f, "mailbox full"),
            Self::AskTimedOut => write!(f, "ask timed out"),
        }
    }
}

/// The record kept for a message that could not be delivered.
pub struct DeadLetter {
    /// The undelivered envelope's identifier.
    pub message_id: MessageId,
    /// The intended recipient.
    pub recipient: ActorId,
    /// The sender, when known.
    pub sender: Option<ActorId>,
    /// What went wrong.
    pub reason: DeadLetterReason,
    /// The payload, when it could be preserved. Absent for ask timeouts, whose
    /// payload was already consumed by the recipient or discarded with its mailbox.
    pub message: Option<Box<dyn fmt::Debug + Send>>,
}

impl DeadLetter {
    pub(crate) fn from_envelope<A: Actor>(
        envelope: Envelope<A>,
        recipient: ActorId,
        reason: DeadLetterReason,
    ) -> Self {
        let Envelope {
            id,
            payload,
            sender,
            ..
        } = envelope;
        Self {
            message_id: id,
            recipient,
            sender: sender.map(|address| address.id().clone()),
            reason,
            message: Some(Box::new(payload)),
        }
    }
}

impl fmt::Debug for DeadLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadLetter")
            .field("message_id", &self.message_id)
            .field("recipient", &self.recipient)
            .field("sender", &self.sender)
            .field("reason", &self.reason)
            .field("message", &self.message)
            .finish()
    }
}

impl fmt::Display for DeadLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dead letter {} to '{}' ({})", self.message_id, self.recipient, self.reason)?;
        if let Some(sender) = &self.sender {
            write!(f, " from '{sender}'")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message:?}")?;
        }
        Ok(())
    }
}

/// The default dead letter actor: logs every letter it receives.
///
/// Registered as [`DEAD_LETTERS`] when the system launches, unless disabled in
/// [`BehaviorConfig`](crate::common::BehaviorConfig). Asking it anything returns
/// the number of letters it has logged.
#[derive(Debug, Default)]
pub struct DeadLetterListener {
    logged: u64,
}

#[async_trait]
impl Actor for DeadLetterListener {
    type Message = DeadLetter;
    type Reply = u64;

    async fn pre_start(&mut self, ctx: &mut Context<Self>) -> Result<(), ActorError> {
        trace!(actor = %ctx.id(), "dead letter listener started");
        Ok(())
    }

    async fn handle(&mut self, letter: DeadLetter, ctx: &mut Context<Self>) -> Result<(), ActorError> {
        self.logged += 1;
        warn!(recipient = %letter.recipient, reason = %letter.reason, "{letter}");
        ctx.reply(self.logged);
        Ok(())
    }

    async fn post_stop(&mut self, _ctx: &mut Context<Self>) {
        trace!(logged = self.logged, "dead letter listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_recipient_reason_and_payload() {
        let letter = DeadLetter {
            message_id: MessageId::new(),
            recipient: ActorId::from("printer"),
            sender: Some(ActorId::from("client")),
            reason: DeadLetterReason::MailboxFull,
            message: Some(Box::new("page 3")),
        };
        let text = letter.to_string();
        assert!(text.contains("to 'printer' (mailbox full) from 'client'"));
        assert!(text.ends_with(": \"page 3\""));
    }

    #[test]
    fn ask_timeouts_carry_no_payload() {
        let letter = DeadLetter {
            message_id: MessageId::new(),
            recipient: ActorId::from("slow"),
            sender: None,
            reason: DeadLetterReason::AskTimedOut,
            message: None,
        };
        assert!(letter.to_string().ends_with("(ask timed out)"));
    }
}
