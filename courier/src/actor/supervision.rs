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

//! Supervision strategies for actors whose handlers fail.
//!
//! Every actor carries one [`SupervisionStrategy`], fixed by its
//! [`Props`](crate::actor::Props). When a message handler returns an error or
//! panics, the run loop asks the strategy for a [`Directive`] and applies it.
//!
//! # Strategies
//!
//! - [`SupervisionStrategy::AlwaysResume`]: keep the instance and move on
//! - [`SupervisionStrategy::AlwaysRestart`]: replace the instance with a fresh one (default)
//! - [`SupervisionStrategy::AlwaysStop`]: stop the actor
//! - [`SupervisionStrategy::Classifying`]: choose by [`FailureKind`]
//! - [`SupervisionStrategy::Custom`]: any user-supplied decision function
//!
//! # Example
//!
//! ```rust,ignore
//! use courier::prelude::*;
//!
//! let props = Props::new(Parser::default).with_supervision_strategy(
//!     SupervisionStrategy::custom(|failure| match failure.kind() {
//!         FailureKind::InvalidArgument => Directive::Resume,
//!         _ => Directive::Stop,
//!     }),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use crate::actor::{ActorError, FailureKind};

/// A user-supplied mapping from failure to directive.
pub type Decider = Arc<dyn Fn(&ActorError) -> Directive + Send + Sync>;

/// What the run loop does after a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Keep the current instance and continue with the next message.
    Resume,
    /// Discard the instance, build a fresh one from the factory and continue.
    Restart,
    /// Stop the actor.
    Stop,
    /// Hand the failure upward. Top-level actors treat this as [`Directive::Stop`].
    Escalate,
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resume => write!(f, "resume"),
            Self::Restart => write!(f, "restart"),
            Self::Stop => write!(f, "stop"),
            Self::Escalate => write!(f, "escalate"),
        }
    }
}

/// Failure policy for a single actor.
#[derive(Clone, Default)]
pub enum SupervisionStrategy {
    /// Always [`Directive::Resume`].
    AlwaysResume,
    /// Always [`Directive::Restart`].
    #[default]
    AlwaysRestart,
    /// Always [`Directive::Stop`].
    AlwaysStop,
    /// Decide by failure kind:
    ///
    /// | kind                            | directive  |
    /// |---------------------------------|------------|
    /// | [`FailureKind::InvalidArgument`] | `Resume`   |
    /// | [`FailureKind::InvalidState`]    | `Restart`  |
    /// | [`FailureKind::Escalation`]      | `Escalate` |
    /// | anything else, panics included   | `Stop`     |
    Classifying,
    /// A caller-supplied decision function.
    Custom(Decider),
}

impl SupervisionStrategy {
    /// Wraps a closure as a [`SupervisionStrategy::Custom`] strategy.
    pub fn custom<F>(decide: F) -> Self
    where
        F: Fn(&ActorError) -> Directive + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(decide))
    }

    /// Maps a failure to the directive the run loop should apply.
    #[must_use]
    pub fn decide(&self, failure: &ActorError) -> Directive {
        match self {
            Self::AlwaysResume => Directive::Resume,
            Self::AlwaysRestart => Directive::Restart,
            Self::AlwaysStop => Directive::Stop,
            Self::Classifying => match failure.kind() {
                FailureKind::InvalidArgument => Directive::Resume,
                FailureKind::InvalidState => Directive::Restart,
                FailureKind::Escalation => Directive::Escalate,
                FailureKind::Panic | FailureKind::Other => Directive::Stop,
            },
            Self::Custom(decide) => decide(failure),
        }
    }
}

impl fmt::Debug for SupervisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysResume => write!(f, "AlwaysResume"),
            Self::AlwaysRestart => write!(f, "AlwaysRestart"),
            Self::AlwaysStop => write!(f, "AlwaysStop"),
            Self::Classifying => write!(f, "Classifying"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl fmt::Display for SupervisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysResume => write!(f, "always_resume"),
            Self::AlwaysRestart => write!(f, "always_restart"),
            Self::AlwaysStop => write!(f, "always_stop"),
            Self::Classifying => write!(f, "classifying"),
            Self::Custom(_) => write!(f, "custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures() -> Vec<ActorError> {
        vec![
            ActorError::invalid_argument("bad input"),
            ActorError::invalid_state("corrupt"),
            ActorError::escalate("help"),
            ActorError::other("whatever"),
            ActorError::new(FailureKind::Panic, anyhow::anyhow!("boom")),
        ]
    }

    #[test]
    fn fixed_strategies_ignore_the_failure() {
        for failure in failures() {
            assert_eq!(SupervisionStrategy::AlwaysResume.decide(&failure), Directive::Resume);
            assert_eq!(SupervisionStrategy::AlwaysRestart.decide(&failure), Directive::Restart);
            assert_eq!(SupervisionStrategy::AlwaysStop.decide(&failure), Directive::Stop);
        }
    }

    #[test]
    fn classifying_strategy_maps_kinds() {
        let decisions: Vec<Directive> = failures()
            .iter()
            .map(|failure| SupervisionStrategy::Classifying.decide(failure))
            .collect();
        assert_eq!(
            decisions,
            vec![
                Directive::Resume,
                Directive::Restart,
                Directive::Escalate,
                Directive::Stop,
                Directive::Stop,
            ]
        );
    }

    #[test]
    fn custom_strategy_uses_the_closure() {
        let strategy = SupervisionStrategy::custom(|failure| {
            if failure.is_panic() {
                Directive::Restart
            } else {
                Directive::Resume
            }
        });
        assert_eq!(
            strategy.decide(&ActorError::new(FailureKind::Panic, anyhow::anyhow!("boom"))),
            Directive::Restart
        );
        assert_eq!(strategy.decide(&ActorError::other("meh")), Directive::Resume);
        assert_eq!(format!("{strategy:?}"), "Custom(..)");
    }

    #[test]
    fn default_strategy_is_always_restart() {
        assert!(matches!(
            SupervisionStrategy::default(),
            SupervisionStrategy::AlwaysRestart
        ));
        assert_eq!(SupervisionStrategy::default().to_string(), "always_restart");
    }
}
