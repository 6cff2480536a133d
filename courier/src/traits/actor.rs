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

use std::fmt::Debug;

use async_trait::async_trait;

use crate::actor::{ActorError, Context};

/// Behavior and lifecycle of an actor.
///
/// An implementation owns the actor's state. The runtime calls its methods from
/// a single task, one at a time, so no locking is needed inside.
///
/// # Lifecycle
///
/// 1. The [`Props`](crate::actor::Props) factory builds the instance.
/// 2. [`pre_start`](Actor::pre_start) runs once before any message.
/// 3. [`handle`](Actor::handle) runs for each message in mailbox order.
/// 4. After a failure the supervision strategy decides. On restart,
///    [`pre_restart`](Actor::pre_restart) runs on the failed instance, the factory
///    builds a fresh one and [`post_restart`](Actor::post_restart) runs on it.
/// 5. [`post_stop`](Actor::post_stop) runs exactly once on the last live instance.
///
/// Any hook may fail by returning an error or by panicking; both are caught.
///
/// # Example
///
/// ```rust,ignore
/// struct Echo;
///
/// #[async_trait]
/// impl Actor for Echo {
///     type Message = String;
///     type Reply = String;
///
///     async fn handle(&mut self, message: String, ctx: &mut Context<Self>) -> Result<(), ActorError> {
///         ctx.reply(message);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Actor: Send + Sized + 'static {
    /// The messages this actor accepts.
    type Message: Debug + Send + 'static;

    /// The answer type for `ask`. Use `()` for actors that never reply.
    type Reply: Send + 'static;

    /// Runs once before the first message.
    ///
    /// An error here stops the actor: `post_stop` still runs, no restart is attempted.
    async fn pre_start(&mut self, _ctx: &mut Context<Self>) -> Result<(), ActorError> {
        Ok(())
    }

    /// Handles one message.
    ///
    /// Answer an `ask` with [`Context::reply`]. Returning an error hands the failure
    /// to the actor's supervision strategy.
    async fn handle(
        &mut self,
        message: Self::Message,
        ctx: &mut Context<Self>,
    ) -> Result<(), ActorError>;

    /// Runs on the failed instance just before it is replaced.
    async fn pre_restart(&mut self, _ctx: &mut Context<Self>, _reason: &ActorError) {}

    /// Runs on the replacement instance after a restart.
    ///
    /// Defaults to calling [`pre_start`](Actor::pre_start).
    async fn post_restart(
        &mut self,
        ctx: &mut Context<Self>,
        _reason: &ActorError,
    ) -> Result<(), ActorError> {
        self.pre_start(ctx).await
    }

    /// Runs once when the actor stops, whatever the cause.
    async fn post_stop(&mut self, _ctx: &mut Context<Self>) {}
}
