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

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{error, trace};

use crate::actor::panic_message;
use crate::message::{ActorAddress, ActorRef};
use crate::traits::{Actor, Addressable};

type EventHandler = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone)]
struct Subscription {
    subscriber: ActorAddress,
    handler: EventHandler,
}

/// Typed publish/subscribe, keyed by the event's Rust type.
///
/// Handlers run synchronously on the publisher's task, in subscription order,
/// and are not serialized through the subscriber's mailbox. A handler that
/// returns an error or panics is logged and skipped; the remaining handlers
/// still run. Use [`forward_to`](Self::forward_to) to route events into an
/// actor's mailbox instead.
#[derive(Clone, Default)]
pub struct EventBus {
    subscriptions: Arc<DashMap<TypeId, Vec<Subscription>>>,
}

impl EventBus {
    /// Registers `handler` for events of type `E` on behalf of `subscriber`.
    ///
    /// Subscriptions stay in place until removed with [`unsubscribe`](Self::unsubscribe),
    /// even if the subscriber stops.
    pub fn subscribe<E, F>(&self, subscriber: &impl Addressable, handler: F)
    where
        E: Any + Send + Sync,
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler: EventHandler = Arc::new(move |event: &(dyn Any + Send + Sync)| {
            match event.downcast_ref::<E>() {
                Some(event) => handler(event),
                None => Ok(()),
            }
        });
        self.subscriptions
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Subscription {
                subscriber: subscriber.address(),
                handler,
            });
        trace!(subscriber = %subscriber.id(), event = type_name::<E>(), "subscribed");
    }

    /// Subscribes `target` so every `E` is converted and sent to its mailbox.
    ///
    /// Delivery failures (stopped target, full mailbox) count as handler failures.
    pub fn forward_to<E, A>(&self, target: &ActorRef<A>)
    where
        E: Any + Send + Sync + Clone,
        A: Actor,
        A::Message: From<E>,
    {
        let recipient = target.clone();
        self.subscribe::<E, _>(target, move |event: &E| {
            recipient.send(A::Message::from(event.clone()))?;
            Ok(())
        });
    }

    /// Removes every subscription `subscriber` holds for `E`. Returns how many were removed.
    pub fn unsubscribe<E: Any>(&self, subscriber: &impl Addressable) -> usize {
        let Some(mut subscriptions) = self.subscriptions.get_mut(&TypeId::of::<E>()) else {
            return 0;
        };
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.subscriber.id() != subscriber.id());
        before - subscriptions.len()
    }

    /// Number of handlers currently registered for `E`.
    #[must_use]
    pub fn subscriber_count<E: Any>(&self) -> usize {
        self.subscriptions
            .get(&TypeId::of::<E>())
            .map_or(0, |subscriptions| subscriptions.len())
    }

    /// Invokes every handler registered for `E` and returns how many succeeded.
    ///
    /// The subscriber list is snapshotted first, so handlers may subscribe or
    /// unsubscribe without deadlocking; such changes apply from the next publish.
    pub fn publish<E: Any + Send + Sync>(&self, event: &E) -> usize {
        let snapshot: Vec<Subscription> = match self.subscriptions.get(&TypeId::of::<E>()) {
            Some(subscriptions) => subscriptions.clone(),
            None => {
                trace!(event = type_name::<E>(), "published with no subscribers");
                return 0;
            }
        };

        let mut delivered = 0;
        for subscription in snapshot {
            let handler = &subscription.handler;
            match catch_unwind(AssertUnwindSafe(|| handler(event as &(dyn Any + Send + Sync)))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => error!(
                    subscriber = %subscription.subscriber,
                    event = type_name::<E>(),
                    "event handler failed: {e:#}"
                ),
                Err(payload) => error!(
                    subscriber = %subscription.subscriber,
                    event = type_name::<E>(),
                    "event handler panicked: {}",
                    panic_message(payload.as_ref())
                ),
            }
        }
        delivered
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.subscriptions.len())
            .finish()
    }
}
