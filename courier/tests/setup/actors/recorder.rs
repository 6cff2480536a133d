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
use parking_lot::Mutex;

#[courier_message]
pub struct Record(pub u32);

/// Appends every value it receives to a shared log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub log: Arc<Mutex<Vec<u32>>>,
}

impl Recorder {
    pub fn values(&self) -> Vec<u32> {
        self.log.lock().clone()
    }

    pub fn props(&self) -> Props<Self> {
        let recorder = self.clone();
        Props::new(move || recorder.clone())
    }
}

#[async_trait]
impl Actor for Recorder {
    type Message = Record;
    type Reply = usize;

    async fn handle(&mut self, Record(value): Record, ctx: &mut Context<Self>) -> Result<(), ActorError> {
        let len = {
            let mut log = self.log.lock();
            log.push(value);
            log.len()
        };
        ctx.reply(len);
        Ok(())
    }
}
