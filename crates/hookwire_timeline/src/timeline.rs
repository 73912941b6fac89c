// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback clock and signal queue.

use crate::subscription::{SubscriberId, SubscriberSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

/// Notification pushed to subscribers on a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineSignal {
    /// Playback started or resumed
    Played,
    /// Playback paused
    Paused,
    /// Playback stopped, explicitly or by reaching the end
    Stopped,
}

/// A playable timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Unique timeline ID
    pub id: TimelineId,
    /// Timeline name
    pub name: String,
    /// Duration in seconds
    pub duration: f32,
    /// Time playback starts from and returns to on stop
    pub initial_time: f32,
    /// Whether playback wraps at the end
    pub looping: bool,
    /// Playback speed multiplier
    pub speed: f32,
    /// Current playback time
    #[serde(skip)]
    time: f32,
    /// Playback state
    #[serde(skip)]
    state: PlaybackState,
    #[serde(skip)]
    subscribers: SubscriberSet,
    #[serde(skip)]
    pending_signals: Vec<(SubscriberId, TimelineSignal)>,
}

impl Timeline {
    /// Create a new stopped timeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            duration: 10.0,
            initial_time: 0.0,
            looping: false,
            speed: 1.0,
            time: 0.0,
            state: PlaybackState::Stopped,
            subscribers: SubscriberSet::new(),
            pending_signals: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    /// Set the initial time (also moves the playhead there)
    pub fn with_initial_time(mut self, time: f32) -> Self {
        self.initial_time = time.max(0.0);
        self.time = self.initial_time;
        self
    }

    /// Enable looping
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Current playback time
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Playing, and the playhead has not yet left the initial time.
    ///
    /// This is the window in which a subscriber that registers late has missed
    /// the played signal.
    pub fn is_playing_from_start(&self) -> bool {
        self.is_playing() && self.time == self.initial_time
    }

    /// Play from current position
    pub fn play(&mut self) {
        if self.state != PlaybackState::Playing {
            self.state = PlaybackState::Playing;
            tracing::debug!(timeline = %self.name, "timeline played");
            self.emit(TimelineSignal::Played);
        }
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            tracing::debug!(timeline = %self.name, "timeline paused");
            self.emit(TimelineSignal::Paused);
        }
    }

    /// Stop and rewind to the initial time
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            self.state = PlaybackState::Stopped;
            self.time = self.initial_time;
            tracing::debug!(timeline = %self.name, "timeline stopped");
            self.emit(TimelineSignal::Stopped);
        }
    }

    /// Seek to a specific time
    pub fn seek(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.duration);
    }

    /// Advance playback by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        if self.state != PlaybackState::Playing {
            return;
        }

        self.time += delta_time * self.speed;
        if self.time >= self.duration {
            if self.looping && self.duration > 0.0 {
                self.time = self.initial_time + (self.time - self.duration);
            } else {
                self.time = self.duration;
                self.stop();
            }
        }
    }

    /// Register a subscriber (unsubscribe-then-subscribe)
    pub fn subscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.subscribe(id)
    }

    /// Remove a subscriber and any signal still queued for it
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.pending_signals.retain(|(sub, _)| *sub != id);
        self.subscribers.unsubscribe(id)
    }

    /// Check if a subscriber is registered
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.contains(id)
    }

    /// Number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Get queued signals and clear them
    pub fn take_signals(&mut self) -> Vec<(SubscriberId, TimelineSignal)> {
        std::mem::take(&mut self.pending_signals)
    }

    fn emit(&mut self, signal: TimelineSignal) {
        for id in self.subscribers.iter() {
            self.pending_signals.push((id, signal));
        }
    }

    /// Serialize the timeline settings to RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize timeline settings from RON
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        let mut timeline: Self = ron::from_str(s)?;
        timeline.time = timeline.initial_time;
        Ok(timeline)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new("Untitled Timeline")
    }
}

/// Collection of timelines owned by the host
#[derive(Debug, Clone, Default)]
pub struct Timelines {
    timelines: IndexMap<TimelineId, Timeline>,
}

impl Timelines {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a timeline
    pub fn add(&mut self, timeline: Timeline) -> TimelineId {
        let id = timeline.id;
        self.timelines.insert(id, timeline);
        id
    }

    /// Remove a timeline
    pub fn remove(&mut self, id: TimelineId) -> Option<Timeline> {
        self.timelines.shift_remove(&id)
    }

    /// Get a timeline
    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    /// Get a mutable timeline
    pub fn get_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
        self.timelines.get_mut(&id)
    }

    /// Advance every timeline
    pub fn update(&mut self, delta_time: f32) {
        for timeline in self.timelines.values_mut() {
            timeline.update(delta_time);
        }
    }

    /// Drain queued signals of every timeline, tagged with their source
    pub fn take_signals(&mut self) -> Vec<(TimelineId, SubscriberId, TimelineSignal)> {
        let mut signals = Vec::new();
        for (id, timeline) in self.timelines.iter_mut() {
            signals.extend(
                timeline
                    .take_signals()
                    .into_iter()
                    .map(|(sub, signal)| (*id, sub, signal)),
            );
        }
        signals
    }

    /// Number of timelines
    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }
}
