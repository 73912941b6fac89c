// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subscriber bookkeeping for timelines.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of something subscribed to a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(pub Uuid);

impl SubscriberId {
    /// Create a new random subscriber ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered set of subscribers.
///
/// Registration is idempotent: subscribing twice leaves a single entry, moved
/// to the end of the notification order.
#[derive(Debug, Clone, Default)]
pub struct SubscriberSet {
    subscribers: IndexSet<SubscriberId>,
}

impl SubscriberSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsubscribe-then-subscribe. Returns true if the subscriber was already present.
    pub fn subscribe(&mut self, id: SubscriberId) -> bool {
        let existed = self.subscribers.shift_remove(&id);
        self.subscribers.insert(id);
        existed
    }

    /// Remove a subscriber. Returns true if it was present.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.shift_remove(&id)
    }

    /// Check membership
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.contains(&id)
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Subscribers in notification order
    pub fn iter(&self) -> impl Iterator<Item = SubscriberId> + '_ {
        self.subscribers.iter().copied()
    }
}
