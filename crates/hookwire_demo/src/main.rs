// SPDX-License-Identifier: MIT OR Apache-2.0
//! hookwire demo
//!
//! Runs a scripted gatehouse scene through the binding layer:
//! - Lifecycle events (awake, enable, start)
//! - Trigger events gated by actor tag, with stored and actor-relative targets
//! - A stale binding that no longer matches any method
//! - A timeline that is already playing when its listener subscribes
//! - A deferred countdown spread over several frames
//!
//! ## Usage
//!
//! Set `RUST_LOG` to adjust logging; `hookwire_core=trace` shows catalog
//! decisions and scheduler steps.

mod args;
mod world;

use args::Cli;
use clap::Parser;
use hookwire_core::{
    BindingError, CatalogBuilder, EventKind, EventSystem, ListenerFile, RuntimeSettings, Scene, TriggerReport,
};
use hookwire_timeline::Timelines;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Seconds advanced per simulated frame
const FRAME_TIME: f32 = 0.75;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] hookwire_core::ConfigError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("catalog export failed: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hookwire_core=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(&cli) {
        tracing::error!("demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(options: &Cli) -> Result<(), DemoError> {
    tracing::info!("Starting hookwire demo v{}", env!("CARGO_PKG_VERSION"));

    let settings = match &options.settings {
        Some(path) => RuntimeSettings::load(path)?,
        None => RuntimeSettings::default(),
    };
    let listeners = match &options.listeners {
        Some(path) => ListenerFile::load(path)?,
        None => world::default_listeners(),
    };
    if let Some(path) = &options.save_listeners {
        listeners.save(path)?;
    }

    let registry = world::registry();
    let mut scene = world::scene();
    let mut timelines = world::timelines();

    let catalog = CatalogBuilder::from_settings(&registry, &settings).build(&scene, &[world::GATEHOUSE, world::SKY]);
    if options.catalog_json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }
    tracing::info!(entries = catalog.len(), "method catalog built");
    for descriptor in catalog.iter() {
        tracing::debug!(owner = %descriptor.owner_type_name, "{}", descriptor.display_signature);
    }
    for attached in &listeners.listeners {
        for binding in &attached.listener.callbacks {
            if binding.target.is_some() && catalog.find_binding(binding).is_none() {
                tracing::warn!(method = %binding.method_name, owner = %binding.owner_type_name, "binding has no matching method");
            }
        }
    }

    let mut system = EventSystem::new(registry, settings);
    system.attach_file(&listeners);

    // The cutscene starts before the gatehouse listeners subscribe
    if let Some(opening) = timelines.get_mut(world::OPENING) {
        opening.play();
    }

    let owners = [world::GATEHOUSE, world::THRESHOLD, world::SKY];
    for owner in owners {
        report("awake", system.awake(&mut scene, owner));
    }
    for owner in owners {
        report("enable", system.enable(&mut scene, owner, &mut timelines));
    }
    for owner in owners {
        report("start", system.start(&mut scene, owner));
    }

    for frame in 0..options.frames {
        simulate_frame(frame, &mut system, &mut scene);
        timelines.update(FRAME_TIME);
        report("tick", system.tick(&mut scene, &mut timelines));
    }

    summarize(&scene);
    system.shutdown();
    Ok(())
}

fn simulate_frame(frame: u32, system: &mut EventSystem, scene: &mut Scene) {
    let event = match frame {
        1 => Some((EventKind::OnTriggerEnter, world::GUARD)),
        2 => Some((EventKind::OnTriggerEnter, world::PLAYER)),
        4 => Some((EventKind::OnTriggerExit, world::PLAYER)),
        _ => None,
    };
    if let Some((kind, actor)) = event {
        tracing::info!(frame, ?kind, actor = scene.tag(actor).unwrap_or_default(), "event");
        report("dispatch", system.dispatch(scene, world::THRESHOLD, kind, Some(actor)));
    }
}

fn report(stage: &str, result: Result<TriggerReport, BindingError>) {
    match result {
        Ok(report) if !report.is_clean() => {
            tracing::warn!(stage, invoked = report.invoked, skipped = report.skipped.len(), "some callbacks did not run");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(stage, "listener failed: {e}"),
    }
}

fn summarize(scene: &Scene) {
    let component = |id| scene.find_component_in_children(id, |_| true).map(|(c, _)| c);

    if let Some(door) = component(world::DOOR).and_then(|c| scene.component::<world::Door>(c)) {
        tracing::info!(open = door.open, locked = door.locked, "door");
    }
    if let Some(lamp) = component(world::LAMP).and_then(|c| scene.component::<world::Lamp>(c)) {
        tracing::info!(intensity = lamp.intensity, focus = ?lamp.focus, "lamp");
    }
    if let Some(sky) = component(world::SKY).and_then(|c| scene.component::<world::Sky>(c)) {
        tracing::info!(weather = ?sky.weather, "sky");
    }
    for actor in [world::PLAYER, world::GUARD] {
        if let Some(state) = component(actor).and_then(|c| scene.component::<world::Actor>(c)) {
            tracing::info!(actor = scene.tag(actor).unwrap_or_default(), greetings = state.greetings, "actor");
        }
    }
}
