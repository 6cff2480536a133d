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

//! Delayed and repeating message delivery.
//!
//! Every scheduled delivery is a small task owned by the scheduler's
//! [`TaskTracker`] and guarded by a child of the scheduler's cancellation token.
//! Cancelling the returned [`Cancellable`] stops future firings; shutting the
//! scheduler down cancels everything at once.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use crate::common::SendError;
use crate::message::{ActorAddress, ActorRef};
use crate::traits::Actor;

/// Handle to a scheduled delivery.
///
/// Dropping the handle does not cancel the delivery.
#[derive(Debug, Clone)]
pub struct Cancellable {
    token: CancellationToken,
}

impl Cancellable {
    /// Stops all future firings. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the delivery was cancelled, directly or by scheduler shutdown.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Time-based delivery of messages to actors.
///
/// Obtain it from [`ActorSystem::scheduler`](crate::common::ActorSystem::scheduler)
/// or [`Context::scheduler`](crate::actor::Context::scheduler). Deliveries go
/// through [`ActorRef::tell`], so a target that has stopped or is full produces
/// dead letters like any other send. A repeating delivery ends on its own once
/// its target has stopped.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl Scheduler {
    /// Delivers `message` to `target` once, after `delay`.
    pub fn schedule_once<A: Actor>(
        &self,
        delay: Duration,
        target: &ActorRef<A>,
        message: A::Message,
        sender: Option<ActorAddress>,
    ) -> Cancellable {
        let target = target.clone();
        self.spawn_timer(move |token| async move {
            tokio::select! {
                biased;
                () = token.cancelled() => trace!(target = %target.id(), "scheduled delivery cancelled"),
                () = tokio::time::sleep(delay) => {
                    let _ = deliver(&target, message, sender);
                }
            }
        })
    }

    /// Delivers a copy of `message` every `interval`, starting after `initial_delay`.
    ///
    /// Firings are anchored to the start time, so a slow recipient does not make
    /// the schedule drift; ticks missed while the runtime was busy are delivered
    /// back to back. A zero interval is raised to one millisecond.
    pub fn schedule_at_fixed_rate<A>(
        &self,
        initial_delay: Duration,
        interval: Duration,
        target: &ActorRef<A>,
        message: A::Message,
        sender: Option<ActorAddress>,
    ) -> Cancellable
    where
        A: Actor,
        A::Message: Clone,
    {
        let target = target.clone();
        let interval = interval.max(Duration::from_millis(1));
        self.spawn_timer(move |token| async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(SendError::NotFound(_)) = deliver(&target, message.clone(), sender.clone()) {
                            break;
                        }
                    }
                }
            }
            trace!(target = %target.id(), "fixed-rate schedule finished");
        })
    }

    /// Delivers a copy of `message` after `initial_delay`, then again `delay`
    /// after each delivery.
    pub fn schedule_with_fixed_delay<A>(
        &self,
        initial_delay: Duration,
        delay: Duration,
        target: &ActorRef<A>,
        message: A::Message,
        sender: Option<ActorAddress>,
    ) -> Cancellable
    where
        A: Actor,
        A::Message: Clone,
    {
        let target = target.clone();
        self.spawn_timer(move |token| async move {
            let mut pause = initial_delay;
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(pause) => {
                        if let Err(SendError::NotFound(_)) = deliver(&target, message.clone(), sender.clone()) {
                            break;
                        }
                    }
                }
                pause = delay;
            }
            trace!(target = %target.id(), "fixed-delay schedule finished");
        })
    }

    /// Number of scheduled deliveries still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Whether the scheduler has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels every scheduled delivery and waits up to `grace` for the timer tasks
    /// to wind down. Returns `false` if some were still running at the deadline.
    pub(crate) async fn shutdown(&self, grace: Duration) -> bool {
        self.token.cancel();
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(pending = self.tracker.len(), "scheduler did not wind down within {:?}", grace);
            return false;
        }
        debug!("scheduler shut down");
        true
    }

    fn spawn_timer<F, Fut>(&self, timer: F) -> Cancellable
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let token = self.token.child_token();
        self.tracker.spawn(timer(token.clone()));
        Cancellable { token }
    }
}

fn deliver<A: Actor>(
    target: &ActorRef<A>,
    message: A::Message,
    sender: Option<ActorAddress>,
) -> Result<(), SendError> {
    let delivered = target.tell(message, sender);
    if let Err(error) = &delivered {
        debug!(target = %target.id(), "scheduled delivery failed: {error}");
    }
    delivered
}
