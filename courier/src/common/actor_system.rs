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

use std::any::type_name;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::actor::{running_incarnation, ActorCell, Context, Props, RestartLimiter};
use crate::common::{
    CourierConfig, DeadLetter, DeadLetterListener, EventBus, Registry, RegistryEntry, Scheduler,
    SystemError, CONFIG, DEAD_LETTERS,
};
use crate::message::{ActorAddress, ActorId, ActorRef, Envelope};
use crate::traits::{Actor, Addressable};

type DeadLetterSink = Arc<dyn Fn(DeadLetter) + Send + Sync>;

/// Incarnations are unique across every system in the process.
static INCARNATIONS: AtomicU64 = AtomicU64::new(0);

/// Whether `entry` is the actor whose handler is making the current call.
///
/// Such an actor cannot be waited on: its `post_stop` runs after the handler returns.
fn is_calling_actor(entry: &RegistryEntry) -> bool {
    running_incarnation() == Some(entry.incarnation)
}

/// The actor currently receiving dead letters.
#[derive(Clone)]
struct DeadLetterRoute {
    id: ActorId,
    sink: DeadLetterSink,
}

/// State shared by every handle to one actor system.
pub(crate) struct SystemInner {
    pub(crate) registry: Registry,
    scheduler: Scheduler,
    event_bus: EventBus,
    config: CourierConfig,
    root_token: CancellationToken,
    dead_letters: RwLock<Option<DeadLetterRoute>>,
    dead_letter_count: AtomicU64,
    shut_down: AtomicBool,
}

impl SystemInner {
    fn new(config: CourierConfig) -> Self {
        Self {
            registry: Registry::default(),
            scheduler: Scheduler::default(),
            event_bus: EventBus::default(),
            config,
            root_token: CancellationToken::new(),
            dead_letters: RwLock::new(None),
            dead_letter_count: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Counts the letter and hands it to the dead letter actor, or logs it when
    /// no listener is available.
    pub(crate) fn route_dead_letter(&self, letter: DeadLetter) {
        self.dead_letter_count.fetch_add(1, Ordering::Relaxed);
        let route = self.dead_letters.read().clone();
        match route {
            Some(route) if route.id != letter.recipient => (route.sink)(letter),
            _ => warn!(recipient = %letter.recipient, reason = %letter.reason, "{letter}"),
        }
    }

    /// Removes the actor's registration if it still belongs to `incarnation`.
    pub(crate) fn deregister(&self, id: &ActorId, incarnation: u64) {
        if self.registry.remove_incarnation(id.as_str(), incarnation).is_some() {
            trace!(actor = %id, "deregistered");
        }
    }
}

/// A running actor system: the registry of named actors plus the scheduler,
/// event bus and dead letter routing they share.
///
/// Cloning is cheap and every clone controls the same system. Actors keep the
/// system alive, so call [`shutdown`](Self::shutdown) when done.
#[derive(Clone)]
pub struct ActorSystem {
    pub(crate) inner: Arc<SystemInner>,
}

impl ActorSystem {
    /// Launches a system configured from [`CONFIG`].
    pub async fn launch() -> Self {
        Self::launch_with_config(CONFIG.clone()).await
    }

    /// Launches a system with an explicit configuration.
    ///
    /// Unless `behavior.dead_letter_listener` is off, a [`DeadLetterListener`] is
    /// registered under [`DEAD_LETTERS`] and becomes the dead letter actor.
    pub async fn launch_with_config(config: CourierConfig) -> Self {
        let listener_enabled = config.behavior.dead_letter_listener;
        let system = Self {
            inner: Arc::new(SystemInner::new(config)),
        };

        if listener_enabled {
            match system.create_actor(DEAD_LETTERS, Props::<DeadLetterListener>::default()) {
                Ok(listener) => system.designate_dead_letter_actor(&listener),
                Err(e) => error!("Failed to start the dead letter listener: {e}"),
            }
        }

        info!(
            mailbox_capacity = system.inner.config.limits.mailbox_capacity,
            "actor system launched"
        );
        system
    }

    /// Creates a top-level actor named `name`.
    ///
    /// If the name is already taken by an actor of the same type, a warning is
    /// logged and the existing reference is returned; the new props are ignored.
    ///
    /// # Errors
    ///
    /// * [`SystemError::TypeMismatch`] when the name is taken by an actor of another type.
    /// * [`SystemError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub fn create_actor<A: Actor>(
        &self,
        name: impl Into<ActorId>,
        props: Props<A>,
    ) -> Result<ActorRef<A>, SystemError> {
        self.create_actor_with_parent(name.into(), props, None)
    }

    /// Creates a top-level actor from a plain factory with default props.
    ///
    /// # Errors
    ///
    /// As for [`create_actor`](Self::create_actor).
    pub fn spawn<A, F>(&self, name: impl Into<ActorId>, factory: F) -> Result<ActorRef<A>, SystemError>
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.create_actor(name, Props::new(factory))
    }

    #[instrument(skip(self, props), fields(actor = type_name::<A>()))]
    pub(crate) fn create_actor_with_parent<A: Actor>(
        &self,
        name: ActorId,
        props: Props<A>,
        parent: Option<ActorId>,
    ) -> Result<ActorRef<A>, SystemError> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(SystemError::ShutDown);
        }

        let system = Arc::downgrade(&self.inner);
        let actor_ref = self.inner.registry.get_or_register(&name, &system, || {
            let capacity = props
                .mailbox_capacity()
                .unwrap_or(self.inner.config.limits.mailbox_capacity)
                .max(1);
            let limits = props
                .restart_limits()
                .cloned()
                .unwrap_or_else(|| self.inner.config.restarts.clone());
            let (mailbox, inbox) = mpsc::channel(capacity);
            let token = self.inner.root_token.child_token();
            let incarnation = INCARNATIONS.fetch_add(1, Ordering::Relaxed);

            let actor_ref = ActorRef::new(name.clone(), mailbox.clone(), token.clone(), system.clone());
            let parent_address = parent
                .as_ref()
                .map(|parent| ActorAddress::new(parent.clone(), system.clone()));
            let ctx = Context::new(actor_ref.clone(), parent_address, self.clone(), incarnation);
            let cell = ActorCell::new(
                props,
                inbox,
                token.clone(),
                ctx,
                RestartLimiter::new(limits),
                incarnation,
            );

            let tracker = TaskTracker::new();
            let abort = tracker.spawn(cell.run()).abort_handle();
            tracker.close();
            debug!(capacity, parent = ?parent, "actor created");

            let entry = RegistryEntry {
                mailbox: Box::new(mailbox),
                actor_type: type_name::<A>(),
                parent,
                token,
                tracker,
                abort,
                incarnation,
            };
            (entry, actor_ref)
        })?;

        // A shutdown that started meanwhile may have drained the registry already.
        if self.inner.shut_down.load(Ordering::SeqCst) {
            if let Some(entry) = self.inner.registry.remove(name.as_str()) {
                entry.token.cancel();
            }
            return Err(SystemError::ShutDown);
        }
        Ok(actor_ref)
    }

    /// A typed reference to the actor named `name`, if it is registered with type `A`.
    #[must_use]
    pub fn get_actor<A: Actor>(&self, name: &str) -> Option<ActorRef<A>> {
        self.inner
            .registry
            .typed_ref::<A>(name, &Arc::downgrade(&self.inner))
    }

    /// An untyped address of the actor named `name`, if it is registered.
    #[must_use]
    pub fn get_address(&self, name: &str) -> Option<ActorAddress> {
        self.inner
            .registry
            .contains(name)
            .then(|| ActorAddress::new(ActorId::from(name), Arc::downgrade(&self.inner)))
    }

    /// The parent of the actor named `name`, if both are registered.
    #[must_use]
    pub fn get_parent(&self, name: &str) -> Option<ActorAddress> {
        let parent = self.inner.registry.parent_of(name)?;
        self.get_address(parent.as_str())
    }

    /// Registered actors created from the handlers of the actor named `name`.
    #[must_use]
    pub fn children_of(&self, name: &str) -> Vec<ActorAddress> {
        self.inner
            .registry
            .children_of(name)
            .into_iter()
            .map(|child| ActorAddress::new(child, Arc::downgrade(&self.inner)))
            .collect()
    }

    /// Stops an actor and waits for it to finish, up to the configured actor
    /// shutdown timeout.
    ///
    /// The handler currently running completes; queued messages are discarded and
    /// `post_stop` runs. Returns `false` when no such actor was registered, which
    /// makes stopping twice a no-op.
    ///
    /// An actor may stop itself this way from its own handler. The call then
    /// returns at once and `post_stop` runs after the handler returns.
    #[instrument(skip(self, target), fields(actor = %target.id()))]
    pub async fn stop_actor(&self, target: &impl Addressable) -> bool {
        let Some(entry) = self.inner.registry.remove(target.id().as_str()) else {
            trace!("stop requested for an actor that is not registered");
            return false;
        };
        entry.token.cancel();
        if is_calling_actor(&entry) {
            trace!("actor stopping itself, post_stop follows the current handler");
            return true;
        }

        let grace = self.inner.config.actor_shutdown_timeout();
        if tokio::time::timeout(grace, entry.tracker.wait()).await.is_err() {
            warn!("actor did not stop within {:?}, aborting", grace);
            entry.abort.abort();
        }
        true
    }

    /// Routes dead letters to `target` from now on.
    ///
    /// Letters are converted with `From<DeadLetter>` and enqueued without blocking.
    /// A letter the target cannot accept is logged. Letters addressed to the
    /// target itself are only logged.
    pub fn designate_dead_letter_actor<A>(&self, target: &ActorRef<A>)
    where
        A: Actor,
        A::Message: From<DeadLetter>,
    {
        let recipient = target.clone();
        let sink: DeadLetterSink = Arc::new(move |letter: DeadLetter| {
            let envelope = Envelope::new(A::Message::from(letter), None, None);
            if let Err((envelope, error)) = recipient.try_enqueue(envelope) {
                warn!(listener = %recipient.id(), "dead letter dropped ({error}): {:?}", envelope.payload);
            }
        });
        *self.inner.dead_letters.write() = Some(DeadLetterRoute {
            id: target.id().clone(),
            sink,
        });
        debug!(listener = %target.id(), "dead letter actor designated");
    }

    /// Total dead letters produced since launch.
    #[must_use]
    pub fn dead_letter_count(&self) -> u64 {
        self.inner.dead_letter_count.load(Ordering::Relaxed)
    }

    /// Number of registered actors, the dead letter listener included.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Names of the registered actors, sorted.
    #[must_use]
    pub fn actor_names(&self) -> Vec<ActorId> {
        self.inner.registry.names()
    }

    /// The system scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// The system event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    /// The configuration the system was launched with.
    #[must_use]
    pub fn config(&self) -> &CourierConfig {
        &self.inner.config
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Stops every actor, then the dead letter actor, then the scheduler.
    ///
    /// Actors are cancelled together and given the system shutdown timeout to
    /// finish their current message and `post_stop`; stragglers are aborted.
    /// Only the first call does anything. When called from a handler, the calling
    /// actor is not waited on; it stops after that handler returns.
    ///
    /// # Errors
    ///
    /// Returns an error when some task had to be aborted or did not wind down in
    /// time. The system is shut down either way.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            trace!("shutdown already performed");
            return Ok(());
        }

        let grace = self.inner.config.system_shutdown_timeout();
        let listener = self.inner.dead_letters.read().as_ref().map(|route| route.id.clone());
        let mut forced = Vec::new();

        let stopping = self.inner.registry.drain_except(listener.as_ref());
        trace!(actors = stopping.len(), "stopping actors");
        if !Self::stop_entries(&stopping, grace).await {
            forced.extend(stopping.iter().map(|(id, _)| id.clone()));
        }

        if let Some(listener) = listener {
            if let Some(entry) = self.inner.registry.remove(listener.as_str()) {
                let entries = [(listener.clone(), entry)];
                if !Self::stop_entries(&entries, grace).await {
                    forced.push(listener);
                }
            }
        }
        *self.inner.dead_letters.write() = None;

        let scheduler_clean = self.inner.scheduler.shutdown(grace).await;
        self.inner.root_token.cancel();

        if !forced.is_empty() {
            error!(?forced, "shutdown timeout of {:?} expired, remaining actors were aborted", grace);
            return Err(anyhow::anyhow!(
                "{} actor(s) did not stop within {grace:?} and were aborted",
                forced.len()
            ));
        }
        if !scheduler_clean {
            return Err(anyhow::anyhow!("scheduler did not wind down within {grace:?}"));
        }
        info!("actor system shut down");
        Ok(())
    }

    /// Cancels the entries and waits for them; aborts whatever is left at the deadline.
    async fn stop_entries(entries: &[(ActorId, RegistryEntry)], grace: std::time::Duration) -> bool {
        for (_, entry) in entries {
            entry.token.cancel();
        }
        let finished = join_all(
            entries
                .iter()
                .filter(|(_, entry)| !is_calling_actor(entry))
                .map(|(_, entry)| entry.tracker.wait()),
        );
        if tokio::time::timeout(grace, finished).await.is_ok() {
            return true;
        }
        for (id, entry) in entries {
            if !entry.tracker.is_empty() && !is_calling_actor(entry) {
                warn!(actor = %id, "aborting actor that did not stop in time");
                entry.abort.abort();
            }
        }
        false
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("actors", &self.inner.registry.len())
            .field("dead_letters", &self.dead_letter_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
