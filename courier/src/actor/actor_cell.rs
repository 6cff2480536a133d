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

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace, warn};

use crate::actor::{ActorError, Context, Directive, Props, RestartLimiter};
use crate::message::Envelope;
use crate::traits::Actor;

tokio::task_local! {
    /// Incarnation of the actor whose run loop owns the current task.
    static RUNNING: u64;
}

/// The incarnation of the actor running on the current task, if any.
///
/// Tasks spawned from a handler do not inherit it.
pub(crate) fn running_incarnation() -> Option<u64> {
    RUNNING.try_with(|incarnation| *incarnation).ok()
}

/// Where the run loop goes after a lifecycle step.
enum Step<A> {
    /// Keep processing with this instance.
    Continue(A),
    /// Leave the loop; `post_stop` runs on the instance if there is one.
    Stop(Option<A>),
}

/// Catches a panic in a hook future and reports it as a failure.
async fn guarded<F>(hook: F) -> Result<(), ActorError>
where
    F: std::future::Future<Output = Result<(), ActorError>>,
{
    AssertUnwindSafe(hook)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(ActorError::from_panic(payload.as_ref())))
}

/// Owns one actor's mailbox and drives its instance from creation to stop.
pub(crate) struct ActorCell<A: Actor> {
    props: Props<A>,
    inbox: mpsc::Receiver<Envelope<A>>,
    token: CancellationToken,
    ctx: Context<A>,
    limiter: RestartLimiter,
    incarnation: u64,
}

impl<A: Actor> ActorCell<A> {
    pub(crate) fn new(
        props: Props<A>,
        inbox: mpsc::Receiver<Envelope<A>>,
        token: CancellationToken,
        ctx: Context<A>,
        limiter: RestartLimiter,
        incarnation: u64,
    ) -> Self {
        Self {
            props,
            inbox,
            token,
            ctx,
            limiter,
            incarnation,
        }
    }

    /// Runs the actor until it is stopped, fails fatally or the system shuts down.
    pub(crate) async fn run(self) {
        let incarnation = self.incarnation;
        RUNNING.scope(incarnation, self.drive()).await;
    }

    #[instrument(name = "actor", skip(self), fields(id = %self.ctx.id()))]
    async fn drive(mut self) {
        let mut actor = match self.start().await {
            Step::Continue(actor) => actor,
            Step::Stop(last) => return self.finish(last).await,
        };

        let last = loop {
            let envelope = tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    trace!("stop requested");
                    break Some(actor);
                }
                received = self.inbox.recv() => match received {
                    Some(envelope) => envelope,
                    None => break Some(actor),
                }
            };

            match self.dispatch(&mut actor, envelope).await {
                Ok(()) => self.limiter.note_success(),
                Err(failure) => match self.supervise(actor, failure).await {
                    Step::Continue(next) => actor = next,
                    Step::Stop(last) => break last,
                },
            }
        };

        self.finish(last).await;
    }

    async fn start(&mut self) -> Step<A> {
        let mut actor = match self.props.produce() {
            Ok(actor) => actor,
            Err(failure) => {
                error!("factory failed, actor will not start: {failure}");
                return Step::Stop(None);
            }
        };
        match guarded(actor.pre_start(&mut self.ctx)).await {
            Ok(()) => {
                debug!("started");
                Step::Continue(actor)
            }
            Err(failure) => {
                error!("pre_start failed, stopping: {failure}");
                Step::Stop(Some(actor))
            }
        }
    }

    async fn dispatch(&mut self, actor: &mut A, envelope: Envelope<A>) -> Result<(), ActorError> {
        let Envelope {
            id,
            payload,
            sender,
            reply_to,
        } = envelope;
        trace!(message = %id, ?payload, "handling");
        self.ctx.begin(id, sender, reply_to);
        let outcome = guarded(actor.handle(payload, &mut self.ctx)).await;
        self.ctx.end();
        outcome
    }

    async fn supervise(&mut self, actor: A, failure: ActorError) -> Step<A> {
        let directive = self.props.supervision_strategy().decide(&failure);
        error!(%directive, "handler failed: {failure}");
        match directive {
            Directive::Resume => Step::Continue(actor),
            Directive::Restart => self.restart(actor, &failure).await,
            Directive::Stop => Step::Stop(Some(actor)),
            Directive::Escalate => {
                warn!("no supervisor to escalate to, stopping");
                Step::Stop(Some(actor))
            }
        }
    }

    async fn restart(&mut self, mut failed: A, failure: &ActorError) -> Step<A> {
        let backoff = match self.limiter.try_restart() {
            Ok(backoff) => backoff,
            Err(exceeded) => {
                error!("{exceeded}, escalating");
                return Step::Stop(Some(failed));
            }
        };

        if let Err(hook_failure) = guarded(async {
            failed.pre_restart(&mut self.ctx, failure).await;
            Ok(())
        })
        .await
        {
            warn!("pre_restart failed: {hook_failure}");
        }
        drop(failed);

        if !backoff.is_zero() {
            trace!(?backoff, "waiting before restart");
            tokio::select! {
                biased;
                () = self.token.cancelled() => {}
                () = tokio::time::sleep(backoff) => {}
            }
        }

        let mut fresh = match self.props.produce() {
            Ok(actor) => actor,
            Err(factory_failure) => {
                error!("factory failed during restart, stopping: {factory_failure}");
                return Step::Stop(None);
            }
        };
        match guarded(fresh.post_restart(&mut self.ctx, failure)).await {
            Ok(()) => {
                debug!(restarts = self.limiter.restarts_in_window(), "restarted");
                Step::Continue(fresh)
            }
            Err(hook_failure) => {
                error!("post_restart failed, stopping: {hook_failure}");
                Step::Stop(Some(fresh))
            }
        }
    }

    /// Deregisters the actor, discards queued messages and runs `post_stop` once.
    async fn finish(mut self, last: Option<A>) {
        self.token.cancel();
        self.ctx.system().inner.deregister(self.ctx.id(), self.incarnation);
        self.inbox.close();
        let discarded = std::iter::from_fn(|| self.inbox.try_recv().ok()).count();
        if discarded > 0 {
            debug!(discarded, "discarded queued messages");
        }

        if let Some(mut actor) = last {
            if let Err(failure) = guarded(async {
                actor.post_stop(&mut self.ctx).await;
                Ok(())
            })
            .await
            {
                error!("post_stop failed: {failure}");
            }
        }
        debug!("stopped");
    }
}
