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
use std::sync::Arc;

use courier::prelude::*;
use courier_test::courier_test;
use parking_lot::Mutex;

use crate::setup::actors::{Echo, EchoMessage};
use crate::setup::{eventually, initialize_tracing};

mod setup;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Collected {
    recipient: String,
    sender: Option<String>,
    reason: DeadLetterReason,
    message: Option<String>,
}

/// Keeps a readable copy of every dead letter routed to it.
#[derive(Debug, Clone, Default)]
struct Collector {
    letters: Arc<Mutex<Vec<Collected>>>,
}

impl Collector {
    fn letters(&self) -> Vec<Collected> {
        self.letters.lock().clone()
    }
}

#[async_trait]
impl Actor for Collector {
    type Message = DeadLetter;
    type Reply = ();

    async fn handle(&mut self, letter: DeadLetter, _ctx: &mut Context<Self>) -> Result<(), ActorError> {
        self.letters.lock().push(Collected {
            recipient: letter.recipient.to_string(),
            sender: letter.sender.map(|sender| sender.to_string()),
            reason: letter.reason,
            message: letter.message.map(|message| format!("{message:?}")),
        });
        Ok(())
    }
}

#[courier_test]
async fn test_messages_to_stopped_actors_reach_the_designated_actor() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let collector = Collector::default();
    let seen = collector.clone();
    let sink = system.spawn("collector", move || seen.clone())?;
    system.designate_dead_letter_actor(&sink);

    let echo = system.create_actor("echo", Props::<Echo>::default())?;
    system.stop_actor(&echo).await;

    let outcome = echo.tell(EchoMessage::Say("anyone?".into()), Some(sink.address()));
    assert_eq!(outcome, Err(SendError::NotFound(ActorId::from("echo"))));

    assert!(eventually(|| !collector.letters().is_empty()).await);
    assert_eq!(
        collector.letters(),
        vec![Collected {
            recipient: "echo".into(),
            sender: Some("collector".into()),
            reason: DeadLetterReason::NotFound,
            message: Some("Say(\"anyone?\")".into()),
        }]
    );
    assert_eq!(system.dead_letter_count(), 1);
    system.shutdown().await
}

#[courier_test]
async fn test_ask_timeouts_become_dead_letters_without_payload() -> anyhow::Result<()> {
    initialize_tracing();
    let system = ActorSystem::launch().await;
    let collector = Collector::default();
    let seen = collector.clone();
    let sink = system.spawn("collector", move || seen.clone())?;
    system.designate_dead_letter_actor(&sink);

    let echo = system.create_actor("echo", Props::<Echo>::default())?;
    let error = echo
        .ask(EchoMessage::Ignore, Duration::from_millis(50))
        .await
        .expect_err("nobody replies");
    assert!(error.is_timeout());

    assert!(eventually(|| !collector.letters().is_empty()).await);
    let letters = collector.letters();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].recipient, "echo");
    assert_eq!(letters[0].reason, DeadLetterReason::AskTimedOut);
    assert_eq!(letters[0].message, None);
    system.shutdown().await
}

#[courier_test]
async fn test_dead_letters_are_counted_without_a_listener() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = CourierConfig::default();
    config.behavior.dead_letter_listener = false;
    let system = ActorSystem::launch_with_config(config).await;

    let echo = system.create_actor("echo", Props::<Echo>::default())?;
    system.stop_actor(&echo).await;
    for _ in 0..3 {
        assert!(echo.send(EchoMessage::Ignore).is_err());
    }

    assert_eq!(system.dead_letter_count(), 3);
    assert_eq!(system.actor_count(), 0);
    system.shutdown().await
}
