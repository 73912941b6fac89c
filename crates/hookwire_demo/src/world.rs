// SPDX-License-Identifier: MIT OR Apache-2.0
//! The demo scene: a gatehouse with a door, a lamp, a sky and a narrator.
//!
//! Object and timeline IDs are fixed so that listener files written against
//! this scene stay valid between runs.

use futures::FutureExt;
use hookwire_core::{
    next_tick, CallOutcome, EnumDef, EventKind, EventListener, InvocationError, ListenerFile, MethodDef,
    ObjectId, ParamSpec, ParamType, Scene, StoredArgument, StoredBinding, TypeBuilder, TypeRegistry, Value,
};
use hookwire_timeline::{Timeline, TimelineId, Timelines};
use uuid::Uuid;

/// Module name of the demo types
pub const MODULE: &str = "Demo";

/// Gatehouse root
pub const GATEHOUSE: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0001));
/// Trigger volume in front of the door
pub const THRESHOLD: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0002));
/// The door
pub const DOOR: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0003));
/// Lamp above the door
pub const LAMP: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0004));
/// Sky controller
pub const SKY: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0005));
/// The player
pub const PLAYER: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0006));
/// A wandering guard
pub const GUARD: ObjectId = ObjectId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0000_0007));
/// Opening cutscene
pub const OPENING: TimelineId = TimelineId(Uuid::from_u128(0x6f1d_0000_0000_4000_8000_0000_0001_0001));

/// Door component
#[derive(Debug, Default)]
pub struct Door {
    /// Open state
    pub open: bool,
    /// Locked state
    pub locked: bool,
}

/// Lamp component
#[derive(Debug, Default)]
pub struct Lamp {
    /// Light intensity
    pub intensity: f32,
    /// Object the lamp points at
    pub focus: Option<ObjectId>,
}

/// Sky component
#[derive(Debug, Default)]
pub struct Sky {
    /// Current weather enumerator
    pub weather: Option<String>,
}

/// Actor component for the player and guards
#[derive(Debug, Default)]
pub struct Actor {
    /// Times the actor was greeted
    pub greetings: i32,
}

/// Register every demo type
pub fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_enum(EnumDef::new("Demo.Weather", MODULE, ["Sunny", "Rainy", "Stormy"]));

    registry.register_type(
        TypeBuilder::new("Demo.Door", MODULE)
            .method("SetOpen", vec![ParamSpec::new("open", ParamType::Bool)], |receiver, args| {
                let door = receiver.downcast::<Door>()?;
                let open = args.bool(0)?;
                if open && door.locked {
                    return Err(InvocationError::Failed("door is locked".into()));
                }
                door.open = open;
                tracing::info!(open, "door");
                Ok(CallOutcome::Done)
            })
            .method("Unlock", vec![ParamSpec::new("code", ParamType::I32)], |receiver, args| {
                let door = receiver.downcast::<Door>()?;
                door.locked = args.int(0)? != 1234;
                tracing::info!(locked = door.locked, "door lock");
                Ok(CallOutcome::Done)
            })
            .method("Awake", vec![], |_, _| Ok(CallOutcome::Done))
            .build(),
    );

    registry.register_type(
        TypeBuilder::new("Demo.Lamp", MODULE)
            .method(
                "SetIntensity",
                vec![ParamSpec::new("intensity", ParamType::F32).with_default(Value::Float(1.0))],
                |receiver, args| {
                    receiver.downcast::<Lamp>()?.intensity = args.float(0)?;
                    Ok(CallOutcome::Done)
                },
            )
            .method("PointAt", vec![ParamSpec::new("target", ParamType::AnyObject)], |receiver, args| {
                receiver.downcast::<Lamp>()?.focus = args.object(0)?;
                Ok(CallOutcome::Done)
            })
            .method(
                "Blend",
                vec![ParamSpec::new("color", ParamType::Struct("Color".into()))],
                |_, _| Ok(CallOutcome::Done),
            )
            .build(),
    );

    registry.register_type(
        TypeBuilder::new("Demo.Sky", MODULE)
            .method(
                "SetWeather",
                vec![ParamSpec::new("weather", ParamType::Enum("Demo.Weather".into()))],
                |receiver, args| {
                    let weather = args.enumerator(0)?;
                    receiver.downcast::<Sky>()?.weather = weather.name.clone();
                    tracing::info!(weather = ?weather.name, "sky");
                    Ok(CallOutcome::Done)
                },
            )
            .build(),
    );

    registry.register_type(
        TypeBuilder::new("Demo.Actor", MODULE)
            .method("Greet", vec![], |receiver, _| {
                receiver.downcast::<Actor>()?.greetings += 1;
                Ok(CallOutcome::Done)
            })
            .build(),
    );

    registry.register_type(
        TypeBuilder::new("Demo.Narrator", MODULE)
            .static_method("Say", vec![ParamSpec::new("line", ParamType::Str)], |_, args| {
                tracing::info!("narrator: {}", args.string(0)?);
                Ok(CallOutcome::Done)
            })
            .method_def(
                MethodDef::new(
                    "Countdown",
                    vec![ParamSpec::new("from", ParamType::I32)],
                    |_, args| {
                        let from = args.int(0)?;
                        Ok(CallOutcome::Deferred(
                            async move {
                                for n in (1..=from).rev() {
                                    tracing::info!("narrator: {n}...");
                                    next_tick().await;
                                }
                                tracing::info!("narrator: go!");
                            }
                            .boxed_local(),
                        ))
                    },
                )
                .into_static()
                .into_deferred(),
            )
            .build(),
    );

    registry
}

/// Build the gatehouse scene
pub fn scene() -> Scene {
    let mut scene = Scene::new();
    let objects = [
        (GATEHOUSE, "Gatehouse", None),
        (THRESHOLD, "Threshold", Some(GATEHOUSE)),
        (DOOR, "Door", Some(GATEHOUSE)),
        (LAMP, "Lamp", Some(GATEHOUSE)),
        (SKY, "Sky", None),
        (PLAYER, "Player", None),
        (GUARD, "Guard", None),
    ];
    for (id, name, parent) in objects {
        if scene.spawn_with_id(id, name, parent).is_none() {
            tracing::warn!(%id, name, "could not place object");
        }
    }

    scene.attach(DOOR, "Demo.Door", Door {
        open: false,
        locked: true,
    });
    scene.attach(LAMP, "Demo.Lamp", Lamp::default());
    scene.attach(SKY, "Demo.Sky", Sky::default());
    scene.attach(PLAYER, "Demo.Actor", Actor::default());
    scene.attach(GUARD, "Demo.Actor", Actor::default());
    scene.set_tag(PLAYER, "Player");
    scene.set_tag(GUARD, "Enemy");
    scene
}

/// Timelines of the demo
pub fn timelines() -> Timelines {
    let mut opening = Timeline::new("Opening").with_duration(3.0);
    opening.id = OPENING;
    let mut timelines = Timelines::new();
    timelines.add(opening);
    timelines
}

fn call(target: Option<ObjectId>, owner: &str, method: &str, arguments: Vec<StoredArgument>) -> StoredBinding {
    StoredBinding::new(target, format!("{owner},{MODULE}"), method, arguments)
}

/// Listeners used when no listener file is given
pub fn default_listeners() -> ListenerFile {
    let mut file = ListenerFile::default();

    file.push(
        THRESHOLD,
        EventListener::new(EventKind::OnTriggerEnter)
            .with_tag("Player")
            .with_callback(call(Some(GATEHOUSE), "Demo.Door", "Unlock", vec![StoredArgument::Int(1234)]))
            .with_callback(call(Some(DOOR), "Demo.Door", "SetOpen", vec![StoredArgument::Bool(true)]))
            .with_callback(call(Some(LAMP), "Demo.Lamp", "PointAt", vec![StoredArgument::Object(Some(PLAYER))])),
    );
    file.push(
        THRESHOLD,
        EventListener::new(EventKind::OnTriggerEnter)
            .with_tag("Player")
            .binding_other_object()
            .with_callback(call(None, "Demo.Actor", "Greet", vec![])),
    );
    file.push(
        THRESHOLD,
        EventListener::new(EventKind::OnTriggerEnter)
            .with_tag("Enemy")
            .with_callback(call(None, "Demo.Narrator", "Say", vec![StoredArgument::String("Halt!".into())])),
    );
    file.push(
        THRESHOLD,
        EventListener::new(EventKind::OnTriggerExit)
            .with_callback(call(Some(DOOR), "Demo.Door", "SetOpen", vec![StoredArgument::Bool(false)]))
            .with_callback(call(Some(DOOR), "Demo.Door", "Slam", vec![StoredArgument::Float(2.0)])),
    );
    file.push(
        SKY,
        EventListener::new(EventKind::OnStart).with_callback(call(
            Some(SKY),
            "Demo.Sky",
            "SetWeather",
            vec![StoredArgument::Enum {
                value: 2,
                type_name: "Demo.Weather".into(),
            }],
        )),
    );
    file.push(
        GATEHOUSE,
        EventListener::new(EventKind::OnTimelinePlayed)
            .with_timeline(OPENING)
            .with_callback(call(None, "Demo.Narrator", "Countdown", vec![StoredArgument::Int(3)]))
            .with_callback(call(Some(LAMP), "Demo.Lamp", "SetIntensity", vec![StoredArgument::Float(0.25)])),
    );
    file.push(
        GATEHOUSE,
        EventListener::new(EventKind::OnTimelineStopped)
            .with_timeline(OPENING)
            .with_callback(call(None, "Demo.Narrator", "Say", vec![StoredArgument::String("The gate awaits.".into())])),
    );
    file
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookwire_core::{CatalogBuilder, InvocationPolicy, RuntimeSettings};

    #[test]
    fn test_scene_layout() {
        let scene = scene();
        assert_eq!(scene.object_count(), 7);
        assert_eq!(scene.object(GATEHOUSE).unwrap().children(), &[THRESHOLD, DOOR, LAMP]);
        assert_eq!(scene.tag(GUARD), Some("Enemy"));
    }

    #[test]
    fn test_catalog_skips_unsupported_and_reserved() {
        let registry = registry();
        let scene = scene();
        let catalog = CatalogBuilder::new(&registry).build(&scene, &[GATEHOUSE, SKY]);
        let names: Vec<_> = catalog.iter().map(|d| d.display_signature.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SetOpen(bool open)",
                "Unlock(int code)",
                "PointAt(Object target)",
                "SetIntensity(float intensity)",
                "SetWeather(Weather weather)",
            ]
        );
    }

    #[test]
    fn test_default_listeners_reference_known_methods_except_slam() {
        let registry = registry();
        let catalog = CatalogBuilder::new(&registry)
            .build_for_types(&["Demo.Door", "Demo.Lamp", "Demo.Sky", "Demo.Actor", "Demo.Narrator"]);
        let listeners = default_listeners();
        let stale: Vec<_> = listeners
            .listeners
            .iter()
            .flat_map(|attached| attached.listener.callbacks.iter())
            .filter(|binding| catalog.find_binding(binding).is_none())
            .map(|binding| binding.method_name.as_str())
            .collect();
        assert_eq!(stale, vec!["Slam"]);
    }

    #[test]
    fn test_sample_files_load() {
        let settings = RuntimeSettings::from_ron(include_str!("../../../demos/settings.ron")).unwrap();
        assert_eq!(settings.invocation_policy, InvocationPolicy::Report);

        let file = ListenerFile::from_ron(include_str!("../../../demos/doors.ron")).unwrap();
        assert_eq!(file.listeners.len(), 4);
        assert!(file.listeners[1].listener.bind_other_object);
        assert_eq!(file.listeners[3].listener.timeline, Some(OPENING));

        let registry = registry();
        let catalog = CatalogBuilder::new(&registry).build(&scene(), &[GATEHOUSE, SKY]);
        let legacy_weather = &file.listeners[2].listener.callbacks[0];
        assert!(catalog.find_binding(legacy_weather).is_some());
    }
}
