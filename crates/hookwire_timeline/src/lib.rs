// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback for hookwire.
//!
//! Timelines are the one event source that listeners subscribe to instead of
//! receiving forwarded host calls:
//! - Playback control (play, pause, stop, looping)
//! - Subscriber sets with idempotent registration
//! - Queued played/paused/stopped signals, drained once per host tick
//!
//! ## Architecture
//!
//! A [`Timeline`] keeps its own playback clock. Every state transition
//! queues one [`TimelineSignal`] per subscriber; the owner of the timelines
//! drains them with [`Timeline::take_signals`] and routes them onwards.

pub mod subscription;
pub mod timeline;

pub use subscription::{SubscriberId, SubscriberSet};
pub use timeline::{PlaybackState, Timeline, TimelineId, TimelineSignal, Timelines};
