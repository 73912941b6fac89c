// SPDX-License-Identifier: MIT OR Apache-2.0
//! Listener configuration: event kinds, stored bindings and stored arguments.
//!
//! Field names and kind tags are kept exactly as they appear in existing
//! authored data, so files written by older tools still load.

use crate::scene::ObjectId;
use hookwire_timeline::{SubscriberId, TimelineId, TimelineSignal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an attached listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Create a new random listener ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identity used when subscribing to timelines
    pub fn subscriber(self) -> SubscriberId {
        SubscriberId(self.0)
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SubscriberId> for ListenerId {
    fn from(id: SubscriberId) -> Self {
        Self(id.0)
    }
}

/// Where an event kind comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// Component lifecycle, forwarded by the host
    Lifecycle,
    /// Use, bark, conversation and sequence events
    Dialogue,
    /// 3D trigger and collision callbacks
    Physics3D,
    /// 2D trigger and collision callbacks
    Physics2D,
    /// Timeline playback, delivered through subscriptions
    Timeline,
}

/// Event a listener can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Component created
    OnAwake,
    /// First update
    OnStart,
    /// Component enabled
    OnEnable,
    /// Component disabled
    OnDisable,
    /// Actor used the object
    OnUse,
    /// Bark started
    OnBarkStart,
    /// Bark ended
    OnBarkEnd,
    /// Conversation started
    OnConversationStart,
    /// Conversation ended
    OnConversationEnd,
    /// Sequence started
    OnSequenceStart,
    /// Sequence ended
    OnSequenceEnd,
    /// Actor inside trigger volume
    OnTriggerStay,
    /// Actor entered trigger volume
    OnTriggerEnter,
    /// Actor left trigger volume
    OnTriggerExit,
    /// Collision ongoing
    OnCollisionStay,
    /// Collision began
    OnCollisionEnter,
    /// Collision ended
    OnCollisionExit,
    /// Actor inside 2D trigger
    OnTriggerStay2D,
    /// Actor entered 2D trigger
    OnTriggerEnter2D,
    /// Actor left 2D trigger
    OnTriggerExit2D,
    /// 2D collision ongoing
    OnCollisionStay2D,
    /// 2D collision began
    OnCollisionEnter2D,
    /// 2D collision ended
    OnCollisionExit2D,
    /// Timeline started playing
    OnTimelinePlayed,
    /// Timeline paused
    OnTimelinePaused,
    /// Timeline stopped
    OnTimelineStopped,
}

impl EventKind {
    /// Every event kind, in declaration order
    pub fn all() -> &'static [EventKind] {
        use EventKind::*;
        &[
            OnAwake,
            OnStart,
            OnEnable,
            OnDisable,
            OnUse,
            OnBarkStart,
            OnBarkEnd,
            OnConversationStart,
            OnConversationEnd,
            OnSequenceStart,
            OnSequenceEnd,
            OnTriggerStay,
            OnTriggerEnter,
            OnTriggerExit,
            OnCollisionStay,
            OnCollisionEnter,
            OnCollisionExit,
            OnTriggerStay2D,
            OnTriggerEnter2D,
            OnTriggerExit2D,
            OnCollisionStay2D,
            OnCollisionEnter2D,
            OnCollisionExit2D,
            OnTimelinePlayed,
            OnTimelinePaused,
            OnTimelineStopped,
        ]
    }

    /// Source of this event kind
    pub fn source(self) -> EventSource {
        use EventKind::*;
        match self {
            OnAwake | OnStart | OnEnable | OnDisable => EventSource::Lifecycle,
            OnUse | OnBarkStart | OnBarkEnd | OnConversationStart | OnConversationEnd
            | OnSequenceStart | OnSequenceEnd => EventSource::Dialogue,
            OnTriggerStay | OnTriggerEnter | OnTriggerExit | OnCollisionStay
            | OnCollisionEnter | OnCollisionExit => EventSource::Physics3D,
            OnTriggerStay2D | OnTriggerEnter2D | OnTriggerExit2D | OnCollisionStay2D
            | OnCollisionEnter2D | OnCollisionExit2D => EventSource::Physics2D,
            OnTimelinePlayed | OnTimelinePaused | OnTimelineStopped => EventSource::Timeline,
        }
    }

    /// Whether listeners receive this kind through a subscription
    /// instead of a call forwarded by the host
    pub fn is_push_subscribed(self) -> bool {
        self.source() == EventSource::Timeline
    }

    /// Event kind corresponding to a timeline signal
    pub fn from_timeline_signal(signal: TimelineSignal) -> Self {
        match signal {
            TimelineSignal::Played => Self::OnTimelinePlayed,
            TimelineSignal::Paused => Self::OnTimelinePaused,
            TimelineSignal::Stopped => Self::OnTimelineStopped,
        }
    }
}

/// Kind tag of a stored argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArgKind {
    /// No value
    #[default]
    None,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    String,
    /// Object reference
    Object,
    /// Integer-backed enum
    Enum,
}

/// A stored call argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ArgumentRecord", into = "ArgumentRecord")]
pub enum StoredArgument {
    /// No value
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// Text
    String(String),
    /// Object reference (possibly null)
    Object(Option<ObjectId>),
    /// Enum ordinal with the enum's full type name
    Enum {
        /// Underlying integer value
        value: i32,
        /// Full name of the enum type
        type_name: String,
    },
    /// A record written before enum arguments had their own kind tag:
    /// no kind, but an enum ordinal and type name in the payload
    Unset {
        /// Underlying integer value
        value: i32,
        /// Full name of the enum type
        type_name: String,
    },
    /// A scalar or object record whose text payload still names a type,
    /// usually an enum argument whose kind was changed. Kept whole so it
    /// can match an enum parameter and saves back unchanged.
    Retyped(ArgumentRecord),
}

impl StoredArgument {
    /// Kind tag of this argument
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::None | Self::Unset { .. } => ArgKind::None,
            Self::Bool(_) => ArgKind::Bool,
            Self::Int(_) => ArgKind::Int,
            Self::Float(_) => ArgKind::Float,
            Self::String(_) => ArgKind::String,
            Self::Object(_) => ArgKind::Object,
            Self::Enum { .. } => ArgKind::Enum,
            Self::Retyped(record) => record.parameter_type,
        }
    }

    /// Text payload compared against enum type names, whatever the kind
    pub fn enum_type_name(&self) -> Option<&str> {
        match self {
            Self::Enum { type_name, .. } | Self::Unset { type_name, .. } => Some(type_name),
            Self::String(text) => Some(text),
            Self::Retyped(record) => Some(&record.string_value),
            _ => None,
        }
    }

    /// Stored enum ordinal; for other kinds the integer payload if kept
    pub fn ordinal(&self) -> Option<i32> {
        match self {
            Self::Enum { value, .. } | Self::Unset { value, .. } => Some(*value),
            Self::Retyped(record) => Some(record.int_value),
            _ => None,
        }
    }
}

impl Default for StoredArgument {
    fn default() -> Self {
        Self::None
    }
}

/// On-disk shape of a [`StoredArgument`]: one kind tag plus one field per payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentRecord {
    /// Kind tag
    #[serde(rename = "parameterType", default)]
    pub parameter_type: ArgKind,
    /// Boolean payload
    #[serde(rename = "Bool", default)]
    pub bool_value: bool,
    /// Integer payload, also the enum ordinal
    #[serde(rename = "Int", default)]
    pub int_value: i32,
    /// Text payload, also the enum type name
    #[serde(rename = "String", default)]
    pub string_value: String,
    /// Float payload
    #[serde(rename = "Float", default)]
    pub float_value: f32,
    /// Object payload
    #[serde(rename = "Object", default)]
    pub object_value: Option<ObjectId>,
}

impl ArgumentRecord {
    /// The argument selected by the kind tag, ignoring the other payloads
    pub fn active_payload(&self) -> StoredArgument {
        match self.parameter_type {
            ArgKind::None => StoredArgument::None,
            ArgKind::Bool => StoredArgument::Bool(self.bool_value),
            ArgKind::Int => StoredArgument::Int(self.int_value),
            ArgKind::Float => StoredArgument::Float(self.float_value),
            ArgKind::String => StoredArgument::String(self.string_value.clone()),
            ArgKind::Object => StoredArgument::Object(self.object_value),
            ArgKind::Enum => StoredArgument::Enum {
                value: self.int_value,
                type_name: self.string_value.clone(),
            },
        }
    }
}

impl From<ArgumentRecord> for StoredArgument {
    fn from(record: ArgumentRecord) -> Self {
        match record.parameter_type {
            ArgKind::None if record.string_value.is_empty() => Self::None,
            ArgKind::None => Self::Unset {
                value: record.int_value,
                type_name: record.string_value,
            },
            ArgKind::Bool | ArgKind::Int | ArgKind::Float | ArgKind::Object if !record.string_value.is_empty() => {
                Self::Retyped(record)
            }
            ArgKind::Bool => Self::Bool(record.bool_value),
            ArgKind::Int => Self::Int(record.int_value),
            ArgKind::Float => Self::Float(record.float_value),
            ArgKind::String => Self::String(record.string_value),
            ArgKind::Object => Self::Object(record.object_value),
            ArgKind::Enum => Self::Enum {
                value: record.int_value,
                type_name: record.string_value,
            },
        }
    }
}

impl From<StoredArgument> for ArgumentRecord {
    fn from(argument: StoredArgument) -> Self {
        if let StoredArgument::Retyped(record) = argument {
            return record;
        }
        let mut record = ArgumentRecord {
            parameter_type: argument.kind(),
            ..Default::default()
        };
        match argument {
            StoredArgument::None | StoredArgument::Retyped(_) => {}
            StoredArgument::Bool(v) => record.bool_value = v,
            StoredArgument::Int(v) => record.int_value = v,
            StoredArgument::Float(v) => record.float_value = v,
            StoredArgument::String(v) => record.string_value = v,
            StoredArgument::Object(v) => record.object_value = v,
            StoredArgument::Enum { value, type_name } | StoredArgument::Unset { value, type_name } => {
                record.int_value = value;
                record.string_value = type_name;
            }
        }
        record
    }
}

/// A stored method call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredBinding {
    /// Object owning the method; `None` means a static context
    #[serde(rename = "objectReference", default)]
    pub target: Option<ObjectId>,
    /// Owner type name as stored at authoring time, possibly module-qualified
    #[serde(rename = "assemblyName", default)]
    pub owner_type_name: String,
    /// Simple method name
    #[serde(rename = "methodName", default)]
    pub method_name: String,
    /// Arguments in parameter order
    #[serde(default)]
    pub arguments: Vec<StoredArgument>,
}

impl StoredBinding {
    /// Create a binding
    pub fn new(
        target: Option<ObjectId>,
        owner_type_name: impl Into<String>,
        method_name: impl Into<String>,
        arguments: Vec<StoredArgument>,
    ) -> Self {
        Self {
            target,
            owner_type_name: owner_type_name.into(),
            method_name: method_name.into(),
            arguments,
        }
    }
}

/// A listener attached to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListener {
    /// Event this listener reacts to
    pub listener: EventKind,
    /// Required actor tag; empty matches any actor
    #[serde(rename = "tagMatch", default)]
    pub tag_match: String,
    /// Resolve call targets relative to the actor that caused the event
    #[serde(rename = "bindOtherObject", default)]
    pub bind_other_object: bool,
    /// Timeline to subscribe to, for timeline event kinds
    #[serde(default)]
    pub timeline: Option<TimelineId>,
    /// Calls made when the event matches, in order
    #[serde(default)]
    pub callbacks: Vec<StoredBinding>,
}

impl EventListener {
    /// Create a listener without a tag filter or callbacks
    pub fn new(listener: EventKind) -> Self {
        Self {
            listener,
            tag_match: String::new(),
            bind_other_object: false,
            timeline: None,
            callbacks: Vec::new(),
        }
    }

    /// Set the tag filter
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_match = tag.into();
        self
    }

    /// Target the actor instead of stored references
    pub fn binding_other_object(mut self) -> Self {
        self.bind_other_object = true;
        self
    }

    /// Subscribe to a timeline
    pub fn with_timeline(mut self, timeline: TimelineId) -> Self {
        self.timeline = Some(timeline);
        self
    }

    /// Append a callback
    pub fn with_callback(mut self, binding: StoredBinding) -> Self {
        self.callbacks.push(binding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field_names() {
        let argument = StoredArgument::Enum {
            value: 2,
            type_name: "Game.Weather".into(),
        };
        let json = serde_json::to_value(&argument).unwrap();
        assert_eq!(json["parameterType"], "Enum");
        assert_eq!(json["Int"], 2);
        assert_eq!(json["String"], "Game.Weather");
        assert_eq!(json["Bool"], false);
        assert!(json.get("Float").is_some());
        assert!(json.get("Object").is_some());
    }

    #[test]
    fn test_binding_field_names() {
        let binding = StoredBinding::new(None, "Game.Door,Game", "SetOpen", vec![StoredArgument::Bool(true)]);
        let json = serde_json::to_value(&binding).unwrap();
        assert!(json.get("objectReference").is_some());
        assert_eq!(json["assemblyName"], "Game.Door,Game");
        assert_eq!(json["methodName"], "SetOpen");
        assert_eq!(json["arguments"][0]["parameterType"], "Bool");
    }

    #[test]
    fn test_legacy_enum_record() {
        let record = ArgumentRecord {
            parameter_type: ArgKind::None,
            int_value: 1,
            string_value: "Game.Weather".into(),
            ..Default::default()
        };
        let argument = StoredArgument::from(record.clone());
        assert_eq!(argument.kind(), ArgKind::None);
        assert_eq!(argument.enum_type_name(), Some("Game.Weather"));
        assert_eq!(ArgumentRecord::from(argument), record);
    }

    #[test]
    fn test_retyped_record_keeps_text_payload() {
        let text = r#"(parameterType: Int, Int: 2, String: "Game.Weather,Game")"#;
        let argument: StoredArgument = ron::from_str(text).unwrap();
        assert_eq!(argument.kind(), ArgKind::Int);
        assert_eq!(argument.enum_type_name(), Some("Game.Weather,Game"));
        assert_eq!(argument.ordinal(), Some(2));

        let record = ArgumentRecord::from(argument);
        assert_eq!(record.parameter_type, ArgKind::Int);
        assert_eq!(record.int_value, 2);
        assert_eq!(record.string_value, "Game.Weather,Game");
        assert_eq!(record.active_payload(), StoredArgument::Int(2));
    }

    #[test]
    fn test_plain_int_record_normalized() {
        let argument: StoredArgument = ron::from_str("(parameterType: Int, Int: 4, Bool: true)").unwrap();
        assert_eq!(argument, StoredArgument::Int(4));
    }

    #[test]
    fn test_listener_ron_round_trip() {
        let listener = EventListener::new(EventKind::OnTriggerEnter)
            .with_tag("Player")
            .with_callback(StoredBinding::new(
                Some(ObjectId::new()),
                "Game.Door",
                "SetOpen",
                vec![StoredArgument::Bool(true)],
            ));
        let text = ron::ser::to_string_pretty(&listener, ron::ser::PrettyConfig::default()).unwrap();
        assert!(text.contains("tagMatch"));
        let loaded: EventListener = ron::from_str(&text).unwrap();
        assert_eq!(loaded, listener);
    }

    #[test]
    fn test_missing_bind_other_object_defaults_false() {
        let text = r#"(listener: OnUse, tagMatch: "", callbacks: [])"#;
        let loaded: EventListener = ron::from_str(text).unwrap();
        assert!(!loaded.bind_other_object);
        assert_eq!(loaded.timeline, None);
    }

    #[test]
    fn test_event_sources() {
        assert_eq!(EventKind::all().len(), 26);
        assert!(EventKind::OnTimelinePlayed.is_push_subscribed());
        assert!(!EventKind::OnTriggerEnter2D.is_push_subscribed());
        assert_eq!(EventKind::OnCollisionExit2D.source(), EventSource::Physics2D);
        assert_eq!(
            EventKind::from_timeline_signal(TimelineSignal::Paused),
            EventKind::OnTimelinePaused
        );
    }
}
