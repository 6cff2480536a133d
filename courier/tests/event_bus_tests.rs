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
//! Event bus delivery.
//!
//! `#[tokio::test]` is used here because one test subscribes a handler that
//! panics on purpose.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use courier::prelude::*;

use crate::setup::actors::{Counter, Echo, Record, Recorder};
use crate::setup::initialize_tracing;

mod setup;

#[courier_message]
struct PriceChanged(u32);

#[courier_message]
struct MarketClosed;

impl From<PriceChanged> for Record {
    fn from(PriceChanged(price): PriceChanged) -> Self {
        Record(price)
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_subscriber_receives_the_event() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let first = system.create_actor("first", Props::<Counter>::default())?;
    let second = system.create_actor("second", Props::<Echo>::default())?;
    let total = Arc::new(AtomicU32::new(0));

    for subscriber in [first.address(), second.address()] {
        let total = Arc::clone(&total);
        system.event_bus().subscribe(&subscriber, move |event: &PriceChanged| {
            total.fetch_add(event.0, Ordering::SeqCst);
            Ok(())
        });
    }

    assert_eq!(system.event_bus().subscriber_count::<PriceChanged>(), 2);
    assert_eq!(system.event_bus().publish(&PriceChanged(5)), 2);
    assert_eq!(total.load(Ordering::SeqCst), 10);
    system.shutdown().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_handlers_do_not_block_the_rest() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let counter = system.create_actor("counter", Props::<Counter>::default())?;
    let reached = Arc::new(AtomicU32::new(0));
    let bus = system.event_bus();

    bus.subscribe(&counter, |_: &PriceChanged| Err(anyhow::anyhow!("cannot price")));
    bus.subscribe(&counter, |_: &PriceChanged| -> anyhow::Result<()> { panic!("handler bug") });
    let last = Arc::clone(&reached);
    bus.subscribe(&counter, move |_: &PriceChanged| {
        last.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(bus.publish(&PriceChanged(1)), 1);
    assert_eq!(reached.load(Ordering::SeqCst), 1);
    system.shutdown().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_events_are_routed_by_type() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let counter = system.create_actor("counter", Props::<Counter>::default())?;
    let closes = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&closes);
    system.event_bus().subscribe(&counter, move |_: &MarketClosed| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(system.event_bus().publish(&PriceChanged(3)), 0);
    assert_eq!(system.event_bus().publish(&MarketClosed), 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    system.shutdown().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsubscribe_removes_only_that_subscriber() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let stays = system.create_actor("stays", Props::<Counter>::default())?;
    let leaves = system.create_actor("leaves", Props::<Echo>::default())?;
    let bus = system.event_bus();

    bus.subscribe(&stays, |_: &MarketClosed| Ok(()));
    bus.subscribe(&leaves, |_: &MarketClosed| Ok(()));
    bus.subscribe(&leaves, |_: &PriceChanged| Ok(()));

    assert_eq!(bus.unsubscribe::<MarketClosed>(&leaves), 1);
    assert_eq!(bus.unsubscribe::<MarketClosed>(&leaves), 0);
    assert_eq!(bus.subscriber_count::<MarketClosed>(), 1);
    assert_eq!(bus.subscriber_count::<PriceChanged>(), 1);
    assert_eq!(bus.publish(&MarketClosed), 1);
    system.shutdown().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forwarded_events_arrive_in_the_mailbox() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let recorder = Recorder::default();
    let target = system.create_actor("recorder", recorder.props())?;

    system.event_bus().forward_to::<PriceChanged, _>(&target);
    assert_eq!(system.event_bus().publish(&PriceChanged(42)), 1);
    assert_eq!(system.event_bus().publish(&PriceChanged(43)), 1);

    let seen = target.ask(Record(0), Duration::from_secs(1)).await?;
    assert_eq!(seen, 3);
    assert_eq!(recorder.values(), vec![42, 43, 0]);

    system.stop_actor(&target).await;
    assert_eq!(system.event_bus().publish(&PriceChanged(44)), 0, "a stopped target fails delivery");
    system.shutdown().await
}
