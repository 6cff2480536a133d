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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use courier::prelude::*;

/// Shared counters for every lifecycle event of a probe, across all its instances.
#[derive(Debug, Default)]
pub struct Lifecycle {
    created: AtomicUsize,
    pre_start: AtomicUsize,
    pre_restart: AtomicUsize,
    post_restart: AtomicUsize,
    post_stop: AtomicUsize,
}

impl Lifecycle {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn pre_start(&self) -> usize {
        self.pre_start.load(Ordering::SeqCst)
    }

    pub fn pre_restart(&self) -> usize {
        self.pre_restart.load(Ordering::SeqCst)
    }

    pub fn post_restart(&self) -> usize {
        self.post_restart.load(Ordering::SeqCst)
    }

    pub fn post_stop(&self) -> usize {
        self.post_stop.load(Ordering::SeqCst)
    }
}

#[courier_message]
pub enum ProbeMessage {
    /// Counted by the current instance.
    Ping,
    /// Replies with the number of pings the current instance has seen.
    Handled,
    /// Returns an error of the given kind.
    Fail(FailureKind),
    /// Panics.
    Panic,
    /// Sleeps before returning.
    Nap(u64),
}

/// Records its lifecycle in a shared [`Lifecycle`] and fails on request.
#[derive(Debug)]
pub struct Probe {
    lifecycle: Arc<Lifecycle>,
    pings: u64,
}

impl Probe {
    pub fn props(lifecycle: &Arc<Lifecycle>) -> Props<Self> {
        let lifecycle = Arc::clone(lifecycle);
        Props::new(move || {
            lifecycle.created.fetch_add(1, Ordering::SeqCst);
            Self {
                lifecycle: Arc::clone(&lifecycle),
                pings: 0,
            }
        })
    }
}

#[async_trait]
impl Actor for Probe {
    type Message = ProbeMessage;
    type Reply = u64;

    async fn pre_start(&mut self, _ctx: &mut Context<Self>) -> Result<(), ActorError> {
        self.lifecycle.pre_start.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn handle(&mut self, message: ProbeMessage, ctx: &mut Context<Self>) -> Result<(), ActorError> {
        match message {
            ProbeMessage::Ping => self.pings += 1,
            ProbeMessage::Handled => {
                ctx.reply(self.pings);
            }
            ProbeMessage::Fail(kind) => {
                return Err(ActorError::new(kind, anyhow::anyhow!("requested failure")));
            }
            ProbeMessage::Panic => panic!("requested panic"),
            ProbeMessage::Nap(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
        Ok(())
    }

    async fn pre_restart(&mut self, _ctx: &mut Context<Self>, _reason: &ActorError) {
        self.lifecycle.pre_restart.fetch_add(1, Ordering::SeqCst);
    }

    async fn post_restart(&mut self, ctx: &mut Context<Self>, _reason: &ActorError) -> Result<(), ActorError> {
        self.lifecycle.post_restart.fetch_add(1, Ordering::SeqCst);
        self.pre_start(ctx).await
    }

    async fn post_stop(&mut self, _ctx: &mut Context<Self>) {
        self.lifecycle.post_stop.fetch_add(1, Ordering::SeqCst);
    }
}
