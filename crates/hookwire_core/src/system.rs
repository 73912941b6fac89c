// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event system: owns the listeners and the scheduler, forwards host events.
//!
//! The host calls [`EventSystem::dispatch`] (or one of the lifecycle helpers)
//! whenever something happens to an object, and [`EventSystem::tick`] once
//! per frame. Timeline events arrive through subscriptions and are routed
//! during the tick, followed by one scheduler step.

use crate::config::{ListenerFile, RuntimeSettings};
use crate::error::BindingError;
use crate::gate;
use crate::invoke::{Invoker, TriggerReport};
use crate::listener::{EventKind, EventListener, ListenerId};
use crate::registry::TypeRegistry;
use crate::scene::{ObjectId, Scene};
use crate::scheduler::Scheduler;
use hookwire_timeline::Timelines;
use indexmap::IndexMap;

#[derive(Debug)]
struct ListenerEntry {
    owner: ObjectId,
    listener: EventListener,
    enabled: bool,
}

/// Top-level event processing
#[derive(Debug)]
pub struct EventSystem {
    registry: TypeRegistry,
    settings: RuntimeSettings,
    scheduler: Scheduler,
    listeners: IndexMap<ListenerId, ListenerEntry>,
    pending_refires: Vec<ListenerId>,
}

impl EventSystem {
    /// Create an event system with its own scheduler
    pub fn new(registry: TypeRegistry, settings: RuntimeSettings) -> Self {
        Self {
            registry,
            settings,
            scheduler: Scheduler::new(),
            listeners: IndexMap::new(),
            pending_refires: Vec::new(),
        }
    }

    /// Registered types
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Mutable access to the registered types
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Active settings
    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Scheduler running deferred calls
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Attach a listener to an object. It stays disabled until enabled.
    pub fn attach(&mut self, owner: ObjectId, listener: EventListener) -> ListenerId {
        if listener.listener.is_push_subscribed() && listener.timeline.is_none() {
            tracing::warn!(%owner, kind = ?listener.listener, "timeline listener without a timeline");
        }
        let id = ListenerId::new();
        self.listeners.insert(
            id,
            ListenerEntry {
                owner,
                listener,
                enabled: false,
            },
        );
        id
    }

    /// Attach every listener of a listener file
    pub fn attach_file(&mut self, file: &ListenerFile) -> Vec<ListenerId> {
        file.listeners
            .iter()
            .map(|attached| self.attach(attached.owner, attached.listener.clone()))
            .collect()
    }

    /// Remove a listener, dropping its timeline subscription
    pub fn detach(&mut self, id: ListenerId, timelines: &mut Timelines) -> Option<EventListener> {
        self.disable_listener(id, timelines);
        self.listeners.shift_remove(&id).map(|entry| entry.listener)
    }

    /// A listener's configuration
    pub fn listener(&self, id: ListenerId) -> Option<&EventListener> {
        self.listeners.get(&id).map(|entry| &entry.listener)
    }

    /// Listeners attached to an object, in attachment order
    pub fn listeners_of(&self, owner: ObjectId) -> impl Iterator<Item = (ListenerId, &EventListener)> {
        self.listeners
            .iter()
            .filter(move |(_, entry)| entry.owner == owner)
            .map(|(id, entry)| (*id, &entry.listener))
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether a listener exists and is enabled
    pub fn is_enabled(&self, id: ListenerId) -> bool {
        self.listeners.get(&id).is_some_and(|entry| entry.enabled)
    }

    /// Enable a listener and subscribe it to its timeline.
    ///
    /// Subscribing is idempotent. A played-listener that subscribes while its
    /// timeline is already playing from the start has missed the played
    /// signal; one synthetic played event is queued for the next tick.
    pub fn enable_listener(&mut self, id: ListenerId, timelines: &mut Timelines) -> bool {
        let Some(entry) = self.listeners.get_mut(&id) else {
            return false;
        };
        entry.enabled = true;

        let kind = entry.listener.listener;
        let Some(timeline_id) = entry.listener.timeline.filter(|_| kind.is_push_subscribed()) else {
            return true;
        };
        let Some(timeline) = timelines.get_mut(timeline_id) else {
            tracing::warn!(listener = %id.0, "timeline not found, listener will not receive signals");
            return true;
        };

        let was_subscribed = timeline.subscribe(id.subscriber());
        if !was_subscribed
            && kind == EventKind::OnTimelinePlayed
            && timeline.is_playing_from_start()
            && !self.pending_refires.contains(&id)
        {
            tracing::debug!(listener = %id.0, "timeline already playing, re-firing played next tick");
            self.pending_refires.push(id);
        }
        true
    }

    /// Disable a listener and unsubscribe it from its timeline
    pub fn disable_listener(&mut self, id: ListenerId, timelines: &mut Timelines) -> bool {
        let Some(entry) = self.listeners.get_mut(&id) else {
            return false;
        };
        entry.enabled = false;
        self.pending_refires.retain(|pending| *pending != id);
        if let Some(timeline) = entry.listener.timeline.and_then(|t| timelines.get_mut(t)) {
            timeline.unsubscribe(id.subscriber());
        }
        true
    }

    /// Forward a host event for `owner` to its enabled listeners.
    ///
    /// Events for an inactive object are ignored. Every listener that passes
    /// the gate runs its callbacks; with the propagating policy the first
    /// failure is returned after all listeners have run.
    pub fn dispatch(
        &mut self,
        scene: &mut Scene,
        owner: ObjectId,
        kind: EventKind,
        actor: Option<ObjectId>,
    ) -> Result<TriggerReport, BindingError> {
        if !scene.is_active(owner) {
            tracing::trace!(%owner, ?kind, "event for inactive object ignored");
            return Ok(TriggerReport::default());
        }
        let ids = self.matching(scene, owner, kind, actor, false);
        self.fire(scene, &ids, kind, actor)
    }

    /// Run a listener's callbacks without consulting the gate
    pub fn trigger(
        &mut self,
        scene: &mut Scene,
        id: ListenerId,
        actor: Option<ObjectId>,
    ) -> Result<TriggerReport, BindingError> {
        let kind = match self.listeners.get(&id) {
            Some(entry) => entry.listener.listener,
            None => return Ok(TriggerReport::default()),
        };
        self.fire(scene, &[id], kind, actor)
    }

    /// Object created: fire `OnAwake`, for enabled and disabled listeners alike
    pub fn awake(&mut self, scene: &mut Scene, owner: ObjectId) -> Result<TriggerReport, BindingError> {
        let ids = self.matching(scene, owner, EventKind::OnAwake, None, true);
        self.fire(scene, &ids, EventKind::OnAwake, None)
    }

    /// Object activated: enable its listeners, then fire `OnEnable`
    pub fn enable(
        &mut self,
        scene: &mut Scene,
        owner: ObjectId,
        timelines: &mut Timelines,
    ) -> Result<TriggerReport, BindingError> {
        scene.set_active(owner, true);
        let ids: Vec<ListenerId> = self.listeners_of(owner).map(|(id, _)| id).collect();
        for id in ids {
            self.enable_listener(id, timelines);
        }
        self.dispatch(scene, owner, EventKind::OnEnable, None)
    }

    /// First frame: fire `OnStart`
    pub fn start(&mut self, scene: &mut Scene, owner: ObjectId) -> Result<TriggerReport, BindingError> {
        self.dispatch(scene, owner, EventKind::OnStart, None)
    }

    /// Object deactivated: fire `OnDisable`, then disable its listeners
    pub fn disable(
        &mut self,
        scene: &mut Scene,
        owner: ObjectId,
        timelines: &mut Timelines,
    ) -> Result<TriggerReport, BindingError> {
        let result = self.dispatch(scene, owner, EventKind::OnDisable, None);
        let ids: Vec<ListenerId> = self.listeners_of(owner).map(|(id, _)| id).collect();
        for id in ids {
            self.disable_listener(id, timelines);
        }
        scene.set_active(owner, false);
        result
    }

    /// One host frame: one scheduler step, then queued re-fires and timeline signals.
    ///
    /// Deferred calls started by the routed events wait for the next frame,
    /// the same as calls started by [`EventSystem::dispatch`] between frames.
    pub fn tick(&mut self, scene: &mut Scene, timelines: &mut Timelines) -> Result<TriggerReport, BindingError> {
        let mut report = TriggerReport::default();
        let mut first_error = None;

        let finished = self.scheduler.tick();
        if finished > 0 {
            tracing::trace!(finished, pending = self.scheduler.pending(), "scheduler step");
        }

        for id in std::mem::take(&mut self.pending_refires) {
            if self.passes(id, EventKind::OnTimelinePlayed) {
                absorb(self.fire(scene, &[id], EventKind::OnTimelinePlayed, None), &mut report, &mut first_error);
            }
        }

        for (timeline, subscriber, signal) in timelines.take_signals() {
            let id = ListenerId::from(subscriber);
            let kind = EventKind::from_timeline_signal(signal);
            let subscribed_here = self
                .listeners
                .get(&id)
                .is_some_and(|entry| entry.listener.timeline == Some(timeline));
            if subscribed_here && self.passes(id, kind) {
                absorb(self.fire(scene, &[id], kind, None), &mut report, &mut first_error);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Drop every running deferred call
    pub fn shutdown(&mut self) {
        self.scheduler.clear();
        self.pending_refires.clear();
    }

    fn passes(&self, id: ListenerId, kind: EventKind) -> bool {
        self.listeners
            .get(&id)
            .is_some_and(|entry| entry.enabled && gate::matches(&entry.listener, kind, None))
    }

    fn matching(
        &self,
        scene: &Scene,
        owner: ObjectId,
        kind: EventKind,
        actor: Option<ObjectId>,
        include_disabled: bool,
    ) -> Vec<ListenerId> {
        let actor_tag = actor.and_then(|a| scene.tag(a));
        self.listeners
            .iter()
            .filter(|(_, entry)| {
                entry.owner == owner
                    && (entry.enabled || include_disabled)
                    && gate::matches(&entry.listener, kind, actor_tag)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn fire(
        &mut self,
        scene: &mut Scene,
        ids: &[ListenerId],
        kind: EventKind,
        actor: Option<ObjectId>,
    ) -> Result<TriggerReport, BindingError> {
        let mut report = TriggerReport::default();
        let mut first_error = None;
        let mut invoker =
            Invoker::new(&self.registry, &mut self.scheduler).with_policy(self.settings.invocation_policy);

        for id in ids {
            let Some(entry) = self.listeners.get(id) else {
                continue;
            };
            tracing::debug!(listener = %id.0, owner = %entry.owner, ?kind, "listener triggered");
            absorb(invoker.invoke_all(scene, &entry.listener, actor), &mut report, &mut first_error);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

fn absorb(
    result: Result<TriggerReport, BindingError>,
    report: &mut TriggerReport,
    first_error: &mut Option<BindingError>,
) {
    match result {
        Ok(other) => report.merge(other),
        Err(e) => {
            first_error.get_or_insert(e);
        }
    }
}
