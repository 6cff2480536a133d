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
pub enum CounterMessage {
    Increment,
    Get,
}

/// Counts `Increment`s and answers `Get` with the total.
#[derive(Debug, Default)]
pub struct Counter {
    pub count: u64,
}

#[async_trait]
impl Actor for Counter {
    type Message = CounterMessage;
    type Reply = u64;

    async fn handle(&mut self, message: CounterMessage, ctx: &mut Context<Self>) -> Result<(), ActorError> {
        match message {
            CounterMessage::Increment => self.count += 1,
            CounterMessage::Get => {
                ctx.reply(self.count);
            }
        }
        Ok(())
    }
}
