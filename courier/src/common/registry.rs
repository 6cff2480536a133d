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

use std::any::{type_name, Any};
use std::sync::Weak;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::common::{SystemError, SystemInner};
use crate::message::{ActorId, ActorRef, Envelope};
use crate::traits::Actor;

/// Everything the system keeps about one live actor.
pub(crate) struct RegistryEntry {
    /// The typed mailbox sender, erased. Always an `mpsc::Sender<Envelope<A>>`.
    pub(crate) mailbox: Box<dyn Any + Send + Sync>,
    pub(crate) actor_type: &'static str,
    pub(crate) parent: Option<ActorId>,
    pub(crate) token: CancellationToken,
    pub(crate) tracker: TaskTracker,
    pub(crate) abort: AbortHandle,
    pub(crate) incarnation: u64,
}

impl RegistryEntry {
    fn typed_ref<A: Actor>(&self, id: &ActorId, system: &Weak<SystemInner>) -> Option<ActorRef<A>> {
        self.mailbox
            .downcast_ref::<mpsc::Sender<Envelope<A>>>()
            .map(|mailbox| {
                ActorRef::new(id.clone(), mailbox.clone(), self.token.clone(), system.clone())
            })
    }
}

/// Name-keyed table of live actors.
///
/// Check-and-insert goes through the map's entry API, so two concurrent
/// creations under one name can never both spawn.
#[derive(Default)]
pub(crate) struct Registry {
    entries: DashMap<ActorId, RegistryEntry>,
}

impl Registry {
    /// Returns the registered reference for `id`, or registers the entry built by `register`.
    ///
    /// `register` runs while the name is reserved and only when the name is free.
    pub(crate) fn get_or_register<A: Actor>(
        &self,
        id: &ActorId,
        system: &Weak<SystemInner>,
        register: impl FnOnce() -> (RegistryEntry, ActorRef<A>),
    ) -> Result<ActorRef<A>, SystemError> {
        match self.entries.entry(id.clone()) {
            Entry::Occupied(existing) => {
                warn!(actor = %id, "an actor with this name already exists, returning the existing reference");
                let existing = existing.get();
                existing
                    .typed_ref::<A>(id, system)
                    .ok_or_else(|| SystemError::TypeMismatch {
                        name: id.clone(),
                        existing: existing.actor_type,
                        requested: type_name::<A>(),
                    })
            }
            Entry::Vacant(slot) => {
                let (entry, actor_ref) = register();
                slot.insert(entry);
                Ok(actor_ref)
            }
        }
    }

    pub(crate) fn typed_ref<A: Actor>(&self, id: &str, system: &Weak<SystemInner>) -> Option<ActorRef<A>> {
        let entry = self.entries.get(id)?;
        entry.typed_ref::<A>(entry.key(), system)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn parent_of(&self, id: &str) -> Option<ActorId> {
        self.entries.get(id).and_then(|entry| entry.parent.clone())
    }

    pub(crate) fn children_of(&self, id: &str) -> Vec<ActorId> {
        self.entries
            .iter()
            .filter(|entry| entry.parent.as_ref().is_some_and(|parent| parent.as_str() == id))
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub(crate) fn remove(&self, id: &str) -> Option<RegistryEntry> {
        self.entries.remove(id).map(|(_, entry)| entry)
    }

    /// Removes `id` only if it still belongs to the given incarnation.
    pub(crate) fn remove_incarnation(&self, id: &str, incarnation: u64) -> Option<RegistryEntry> {
        self.entries
            .remove_if(id, |_, entry| entry.incarnation == incarnation)
            .map(|(_, entry)| entry)
    }

    /// Removes every entry except `keep`.
    pub(crate) fn drain_except(&self, keep: Option<&ActorId>) -> Vec<(ActorId, RegistryEntry)> {
        let names: Vec<ActorId> = self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|name| Some(name) != keep)
            .collect();
        names
            .into_iter()
            .filter_map(|name| self.entries.remove(&name))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn names(&self) -> Vec<ActorId> {
        let mut names: Vec<ActorId> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}
