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

use std::time::Duration;

use thiserror::Error;

use crate::message::ActorId;

/// Errors returned by [`ActorSystem`](crate::common::ActorSystem) operations.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The name is taken by an actor of a different type.
    #[error("actor '{name}' already exists as {existing}, cannot create it as {requested}")]
    TypeMismatch {
        /// The contested name.
        name: ActorId,
        /// Type of the registered actor.
        existing: &'static str,
        /// Type the caller asked for.
        requested: &'static str,
    },
    /// The system has been shut down and no longer creates actors.
    #[error("the actor system has been shut down")]
    ShutDown,
}

/// Why a fire-and-forget `send` could not be delivered.
///
/// In both cases the message has already been routed to dead letters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The recipient is stopped or was never registered.
    #[error("actor '{0}' not found")]
    NotFound(ActorId),
    /// The recipient's mailbox is at capacity.
    #[error("mailbox of actor '{0}' is full")]
    MailboxFull(ActorId),
}

/// Why an `ask` produced no reply.
#[derive(Debug, Error)]
pub enum AskError {
    /// No reply arrived before the deadline.
    #[error("ask to actor '{actor}' timed out after {timeout:?}")]
    Timeout {
        /// The actor that was asked.
        actor: ActorId,
        /// The deadline the caller supplied.
        timeout: Duration,
    },
    /// The recipient is stopped or was never registered.
    #[error("actor '{0}' not found")]
    NotFound(ActorId),
    /// The recipient's mailbox is at capacity.
    #[error("mailbox of actor '{0}' is full")]
    MailboxFull(ActorId),
    /// The handler answered with an error.
    #[error("actor replied with an error: {0}")]
    Failed(anyhow::Error),
}

impl AskError {
    /// Whether the ask ended because its deadline passed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the recipient was not running.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<SendError> for AskError {
    fn from(error: SendError) -> Self {
        match error {
            SendError::NotFound(actor) => Self::NotFound(actor),
            SendError::MailboxFull(actor) => Self::MailboxFull(actor),
        }
    }
}
