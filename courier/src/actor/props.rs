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

use std::any::type_name;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::actor::{panic_message, ActorError, FailureKind, RestartLimiterConfig, SupervisionStrategy};
use crate::traits::Actor;

type Factory<A> = Arc<dyn Fn() -> anyhow::Result<A> + Send + Sync>;

/// The recipe for creating an actor.
///
/// The factory runs once at creation and again for every restart, so each
/// restart starts from freshly built state. The system keeps the props for the
/// lifetime of the actor.
///
/// ```rust,ignore
/// let props = Props::new(|| Counter::with_start(10))
///     .with_mailbox_capacity(64)
///     .with_supervision_strategy(SupervisionStrategy::Classifying);
/// ```
pub struct Props<A: Actor> {
    factory: Factory<A>,
    mailbox_capacity: Option<usize>,
    strategy: SupervisionStrategy,
    restart_limits: Option<RestartLimiterConfig>,
}

impl<A: Actor> Props<A> {
    /// Props from an infallible factory, with the default strategy
    /// ([`SupervisionStrategy::AlwaysRestart`]) and the configured mailbox capacity.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        Self::try_new(move || Ok(factory()))
    }

    /// Props from a fallible factory.
    ///
    /// A factory error at creation or restart stops the actor for good.
    pub fn try_new<F>(factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<A> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            mailbox_capacity: None,
            strategy: SupervisionStrategy::default(),
            restart_limits: None,
        }
    }

    /// Overrides the mailbox capacity. Values below one are raised to one.
    #[must_use]
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = Some(capacity.max(1));
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_supervision_strategy(mut self, strategy: SupervisionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Overrides the system-wide restart limits for this actor.
    #[must_use]
    pub fn with_restart_limits(mut self, limits: RestartLimiterConfig) -> Self {
        self.restart_limits = Some(limits);
        self
    }

    /// The explicit mailbox capacity, if one was set.
    #[must_use]
    pub const fn mailbox_capacity(&self) -> Option<usize> {
        self.mailbox_capacity
    }

    /// The failure policy.
    #[must_use]
    pub const fn supervision_strategy(&self) -> &SupervisionStrategy {
        &self.strategy
    }

    /// The restart limit override, if one was set.
    #[must_use]
    pub const fn restart_limits(&self) -> Option<&RestartLimiterConfig> {
        self.restart_limits.as_ref()
    }

    /// Builds a new instance, turning factory errors and panics into an [`ActorError`].
    pub(crate) fn produce(&self) -> Result<A, ActorError> {
        match catch_unwind(AssertUnwindSafe(|| (self.factory)())) {
            Ok(Ok(actor)) => Ok(actor),
            Ok(Err(error)) => Err(ActorError::new(FailureKind::Other, error)),
            Err(payload) => Err(ActorError::new(
                FailureKind::Panic,
                anyhow::anyhow!("factory panicked: {}", panic_message(payload.as_ref())),
            )),
        }
    }
}

impl<A: Actor + Default> Default for Props<A> {
    fn default() -> Self {
        Self::new(A::default)
    }
}

impl<A: Actor> Clone for Props<A> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            mailbox_capacity: self.mailbox_capacity,
            strategy: self.strategy.clone(),
            restart_limits: self.restart_limits.clone(),
        }
    }
}

impl<A: Actor> fmt::Debug for Props<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("actor", &type_name::<A>())
            .field("mailbox_capacity", &self.mailbox_capacity)
            .field("strategy", &self.strategy)
            .field("restart_limits", &self.restart_limits)
            .finish()
    }
}
