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
use courier::prelude::*;

#[courier_message]
pub enum EchoMessage {
    /// Replies with the text.
    Say(String),
    /// Waits, then replies with the text.
    SayLater { delay_ms: u64, text: String },
    /// Handles the message without replying.
    Ignore,
    /// Replies with an error.
    Refuse(String),
}

/// Answers every `ask` with what it was given.
#[derive(Debug, Default)]
pub struct Echo;

#[async_trait]
impl Actor for Echo {
    type Message = EchoMessage;
    type Reply = String;

    async fn handle(&mut self, message: EchoMessage, ctx: &mut Context<Self>) -> Result<(), ActorError> {
        match message {
            EchoMessage::Say(text) => {
                ctx.reply(text);
            }
            EchoMessage::SayLater { delay_ms, text } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                ctx.reply(text);
            }
            EchoMessage::Ignore => {}
            EchoMessage::Refuse(reason) => {
                ctx.reply_error(anyhow::anyhow!(reason));
            }
        }
        Ok(())
    }
}
