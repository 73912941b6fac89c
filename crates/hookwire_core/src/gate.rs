// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event match gate.

use crate::listener::{EventKind, EventListener};

/// Whether an actor with `actor_tag` passes a tag filter.
///
/// An empty filter passes every actor, including no actor at all. Otherwise
/// the actor must be present and its tag must equal the filter exactly.
pub fn tag_matches(filter: &str, actor_tag: Option<&str>) -> bool {
    filter.is_empty() || actor_tag == Some(filter)
}

/// Whether `listener` should fire for an event of `kind` caused by an actor tagged `actor_tag`
pub fn matches(listener: &EventListener, kind: EventKind, actor_tag: Option<&str>) -> bool {
    listener.listener == kind && tag_matches(&listener.tag_match, actor_tag)
}
