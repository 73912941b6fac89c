// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event-to-method-call bindings for hookwire.
//!
//! A listener observes one event kind (lifecycle, dialogue, physics or
//! timeline). When that event fires, optionally filtered by the tag of the
//! triggering actor, the listener calls a list of configured methods on other
//! components, each with a stored list of typed arguments.
//!
//! ## Architecture
//!
//! Configuration time:
//! - [`TypeRegistry`] holds every callable type, registered at startup
//! - [`CatalogBuilder`] turns the registry plus a set of scene objects into an
//!   ordinal-sorted [`Catalog`] of [`CallableDescriptor`]s
//! - [`matcher`] recovers a stored binding's catalog entry
//!
//! Run time:
//! - [`EventSystem`] forwards host events through the [`gate`]
//! - [`Invoker`] resolves the receiver, marshals arguments with [`marshal()`]
//!   and calls the method; deferred results run on the [`Scheduler`]

pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod gate;
pub mod invoke;
pub mod listener;
pub mod marshal;
pub mod matcher;
pub mod registry;
pub mod scene;
pub mod scheduler;
pub mod system;
pub mod value;

pub use catalog::{CallableDescriptor, Catalog, CatalogBuilder};
pub use classify::{classify, ParamKind};
pub use config::{AttachedListener, ConfigError, ListenerFile, RuntimeSettings};
pub use error::{BindingError, InvocationError};
pub use invoke::{InvocationPolicy, Invoked, Invoker, TriggerReport};
pub use listener::{ArgKind, EventKind, EventListener, ListenerId, StoredArgument, StoredBinding};
pub use marshal::marshal;
pub use matcher::find_method;
pub use registry::{
    CallOutcome, EnumDef, IntRepr, MethodDef, ParamSpec, ParamType, Receiver, TypeBuilder, TypeDef,
    TypeRegistry,
};
pub use scene::{ComponentRef, ObjectId, Scene};
pub use scheduler::{next_tick, Scheduler, TaskId};
pub use system::EventSystem;
pub use value::{Args, EnumValue, RuntimeType, Value};
