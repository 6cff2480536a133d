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

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Broad category of a failure, used by [`SupervisionStrategy::Classifying`](crate::actor::SupervisionStrategy::Classifying).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The message itself was unacceptable. Safe to skip and continue.
    InvalidArgument,
    /// The actor's state is corrupt and should be rebuilt.
    InvalidState,
    /// The actor explicitly asked its supervisor to decide.
    Escalation,
    /// A handler or hook panicked.
    Panic,
    /// Anything else.
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::Escalation => write!(f, "escalation"),
            Self::Panic => write!(f, "panic"),
            Self::Other => write!(f, "failure"),
        }
    }
}

/// A failure reported by a message handler or lifecycle hook.
///
/// The [`FailureKind`] drives supervision; the wrapped error carries the detail.
/// Panics caught by the run loop are turned into `ActorError`s of kind
/// [`FailureKind::Panic`].
///
/// `?` works on any `anyhow::Result` inside a handler; such errors are classified
/// as [`FailureKind::Other`].
#[derive(Debug, Error)]
#[error("{kind}: {error}")]
pub struct ActorError {
    kind: FailureKind,
    error: anyhow::Error,
}

impl ActorError {
    /// Wraps an error with an explicit kind.
    pub fn new(kind: FailureKind, error: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// The message was unacceptable.
    pub fn invalid_argument(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::InvalidArgument, anyhow::anyhow!("{message}"))
    }

    /// The actor's state is no longer trustworthy.
    pub fn invalid_state(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::InvalidState, anyhow::anyhow!("{message}"))
    }

    /// Hands the decision to the supervisor.
    pub fn escalate(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::Escalation, anyhow::anyhow!("{message}"))
    }

    /// A failure with no particular classification.
    pub fn other(message: impl fmt::Display) -> Self {
        Self::new(FailureKind::Other, anyhow::anyhow!("{message}"))
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new(
            FailureKind::Panic,
            anyhow::anyhow!("panicked: {}", panic_message(payload)),
        )
    }

    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Whether the failure was a caught panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panic)
    }

    /// The underlying error.
    #[must_use]
    pub const fn error(&self) -> &anyhow::Error {
        &self.error
    }
}

impl From<anyhow::Error> for ActorError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(FailureKind::Other, error)
    }
}

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
