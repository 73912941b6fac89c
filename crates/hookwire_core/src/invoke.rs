// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolve a stored binding to a receiver and a method, then call it.

use crate::error::BindingError;
use crate::listener::{EventListener, StoredBinding};
use crate::marshal::marshal;
use crate::registry::{CallOutcome, MethodDef, Receiver, ReturnShape, TypeRegistry};
use crate::scene::{ObjectId, Scene};
use crate::scheduler::{Scheduler, TaskId};
use crate::value::{Args, RuntimeType, Value};
use serde::{Deserialize, Serialize};

/// What happens when a called method reports an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvocationPolicy {
    /// Stop the listener's remaining calls and return the error
    #[default]
    Propagate,
    /// Log the error and continue with the next call
    Report,
}

/// How a single call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invoked {
    /// The method returned synchronously
    Immediate,
    /// The method returned a deferred sequence, now running on the scheduler
    Deferred(TaskId),
}

/// Summary of one trigger pass over a listener's callbacks
#[derive(Debug, Default)]
pub struct TriggerReport {
    /// Calls that were made
    pub invoked: usize,
    /// Tasks spawned by deferred results
    pub deferred: Vec<TaskId>,
    /// Callbacks that did not run, by position, with the reason
    pub skipped: Vec<(usize, BindingError)>,
}

impl TriggerReport {
    /// Whether every callback ran
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fold another pass into this one
    pub fn merge(&mut self, other: TriggerReport) {
        self.invoked += other.invoked;
        self.deferred.extend(other.deferred);
        self.skipped.extend(other.skipped);
    }
}

/// Calls stored bindings against a scene
pub struct Invoker<'a> {
    registry: &'a TypeRegistry,
    scheduler: &'a mut Scheduler,
    policy: InvocationPolicy,
}

impl<'a> Invoker<'a> {
    /// Invoker with the default [`InvocationPolicy`]
    pub fn new(registry: &'a TypeRegistry, scheduler: &'a mut Scheduler) -> Self {
        Self {
            registry,
            scheduler,
            policy: InvocationPolicy::default(),
        }
    }

    /// Set the invocation policy
    pub fn with_policy(mut self, policy: InvocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Call one binding.
    ///
    /// With `bind_other_object` the receiver is searched under `actor`
    /// instead of the binding's stored target. A binding without a target
    /// calls a static method of its owner type.
    pub fn invoke(
        &mut self,
        scene: &mut Scene,
        bind_other_object: bool,
        binding: &StoredBinding,
        actor: Option<ObjectId>,
    ) -> Result<Invoked, BindingError> {
        let registry = self.registry;
        let owner = registry
            .get_type(&binding.owner_type_name)
            .ok_or_else(|| BindingError::UnresolvedType(binding.owner_type_name.clone()))?;
        let values = marshal(&binding.arguments, registry)?;
        let runtime_types: Vec<RuntimeType> = values.iter().map(Value::runtime_type).collect();

        let target = if bind_other_object {
            Some(actor.ok_or_else(|| BindingError::UnresolvedTarget("event has no actor".to_string()))?)
        } else {
            binding.target
        };

        let (method, outcome) = match target {
            Some(object) => {
                if !scene.contains(object) {
                    return Err(BindingError::UnresolvedTarget(format!("object {object} does not exist")));
                }
                let (component, type_name) = scene
                    .find_component_in_children(object, |t| registry.is_subtype(t, &owner.full_name))
                    .map(|(component, type_name)| (component, type_name.to_string()))
                    .ok_or_else(|| {
                        BindingError::UnresolvedTarget(format!("object {object} has no {}", owner.full_name))
                    })?;
                let method = self.resolve(&type_name, binding, &runtime_types, false)?;
                let instance = scene.component_any_mut(component).ok_or_else(|| {
                    BindingError::UnresolvedTarget(format!("component {} of {object} is gone", component.index))
                })?;
                tracing::debug!(%object, method = %method.name, "invoking");
                (method, method.call(Receiver::Instance(instance), Args::new(&values))?)
            }
            None => {
                let method = self.resolve(&owner.full_name, binding, &runtime_types, true)?;
                tracing::debug!(owner = %owner.full_name, method = %method.name, "invoking static");
                (method, method.call(Receiver::Static, Args::new(&values))?)
            }
        };

        // The returned outcome decides scheduling, not the declaration
        Ok(match outcome {
            CallOutcome::Done => {
                if method.returns == ReturnShape::Deferred {
                    tracing::warn!(method = %method.name, "declared deferred but returned immediately");
                }
                Invoked::Immediate
            }
            CallOutcome::Deferred(future) => {
                if method.returns == ReturnShape::Immediate {
                    tracing::warn!(method = %method.name, "declared immediate but returned a deferred sequence");
                }
                Invoked::Deferred(self.scheduler.spawn(future))
            }
        })
    }

    /// Call every callback of a listener in declared order.
    ///
    /// A callback that cannot be resolved is skipped with a warning. A method
    /// that fails is handled according to the invocation policy.
    pub fn invoke_all(
        &mut self,
        scene: &mut Scene,
        listener: &EventListener,
        actor: Option<ObjectId>,
    ) -> Result<TriggerReport, BindingError> {
        let mut report = TriggerReport::default();
        for (index, binding) in listener.callbacks.iter().enumerate() {
            match self.invoke(scene, listener.bind_other_object, binding, actor) {
                Ok(Invoked::Immediate) => report.invoked += 1,
                Ok(Invoked::Deferred(task)) => {
                    report.invoked += 1;
                    report.deferred.push(task);
                }
                Err(BindingError::Invocation(e)) if self.policy == InvocationPolicy::Propagate => {
                    return Err(BindingError::Invocation(e));
                }
                Err(e @ BindingError::Invocation(_)) => {
                    tracing::error!(index, method = %binding.method_name, "call failed: {e}");
                    report.skipped.push((index, e));
                }
                Err(e) => {
                    tracing::warn!(index, method = %binding.method_name, "skipped callback: {e}");
                    report.skipped.push((index, e));
                }
            }
        }
        Ok(report)
    }

    /// Method named like the binding whose parameters take exactly these runtime types
    fn resolve(
        &self,
        type_name: &str,
        binding: &StoredBinding,
        runtime_types: &[RuntimeType],
        static_only: bool,
    ) -> Result<&'a MethodDef, BindingError> {
        let registry = self.registry;
        registry
            .ancestry(type_name)
            .into_iter()
            .flat_map(|def| def.methods.iter())
            .find(|method| {
                method.name == binding.method_name
                    && (method.is_static || !static_only)
                    && method.accepts(runtime_types)
            })
            .ok_or_else(|| BindingError::Unmatched {
                type_name: binding.owner_type_name.clone(),
                method: binding.method_name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvocationError;
    use crate::listener::{EventKind, StoredArgument};
    use crate::registry::{ParamSpec, ParamType, TypeBuilder};
    use crate::scheduler::next_tick;
    use futures::FutureExt;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Door {
        open: bool,
        slams: i32,
    }

    struct Fixture {
        registry: TypeRegistry,
        scene: Scene,
        root: ObjectId,
        door: ObjectId,
        resets: Rc<Cell<i32>>,
    }

    fn fixture() -> Fixture {
        let resets = Rc::new(Cell::new(0));
        let static_resets = Rc::clone(&resets);

        let mut registry = TypeRegistry::new();
        registry.register_type(
            TypeBuilder::new("Game.Door", "Game")
                .method("SetOpen", vec![ParamSpec::new("open", ParamType::Bool)], |receiver, args| {
                    receiver.downcast::<Door>()?.open = args.bool(0)?;
                    Ok(CallOutcome::Done)
                })
                .method("Jam", vec![], |_, _| Err(InvocationError::Failed("jammed".into())))
                .static_method("ResetAll", vec![], move |_, _| {
                    static_resets.set(static_resets.get() + 1);
                    Ok(CallOutcome::Done)
                })
                .build(),
        );
        registry.register_type(
            TypeBuilder::new("Game.SlidingDoor", "Game")
                .base("Game.Door")
                .method("Slam", vec![ParamSpec::new("times", ParamType::I32)], |receiver, args| {
                    receiver.downcast::<Door>()?.slams += args.int(0)?;
                    Ok(CallOutcome::Done)
                })
                .build(),
        );

        let mut scene = Scene::new();
        let root = scene.spawn("Level");
        let door = scene.spawn_child(root, "Door").unwrap();
        scene.attach(door, "Game.SlidingDoor", Door::default());

        Fixture {
            registry,
            scene,
            root,
            door,
            resets,
        }
    }

    fn door_state(f: &Fixture) -> &Door {
        let (component, _) = f.scene.find_component_in_children(f.door, |_| true).unwrap();
        f.scene.component::<Door>(component).unwrap()
    }

    #[test]
    fn test_instance_call_through_subtree_and_base_type() {
        let mut f = fixture();
        let mut scheduler = Scheduler::new();
        let binding = StoredBinding::new(Some(f.root), "Game.Door,Game", "SetOpen", vec![StoredArgument::Bool(true)]);

        let result = Invoker::new(&f.registry, &mut scheduler).invoke(&mut f.scene, false, &binding, None);
        assert_eq!(result.unwrap(), Invoked::Immediate);
        assert!(door_state(&f).open);
    }

    #[test]
    fn test_static_call() {
        let mut f = fixture();
        let mut scheduler = Scheduler::new();
        let binding = StoredBinding::new(None, "Game.Door", "ResetAll", vec![]);

        Invoker::new(&f.registry, &mut scheduler)
            .invoke(&mut f.scene, false, &binding, None)
            .unwrap();
        assert_eq!(f.resets.get(), 1);

        let instance_only = StoredBinding::new(None, "Game.Door", "SetOpen", vec![StoredArgument::Bool(true)]);
        assert!(matches!(
            Invoker::new(&f.registry, &mut scheduler).invoke(&mut f.scene, false, &instance_only, None),
            Err(BindingError::Unmatched { .. })
        ));
    }

    #[test]
    fn test_bind_other_object_uses_actor() {
        let mut f = fixture();
        let mut scheduler = Scheduler::new();
        let binding = StoredBinding::new(None, "Game.SlidingDoor", "Slam", vec![StoredArgument::Int(2)]);

        Invoker::new(&f.registry, &mut scheduler)
            .invoke(&mut f.scene, true, &binding, Some(f.door))
            .unwrap();
        assert_eq!(door_state(&f).slams, 2);

        assert!(matches!(
            Invoker::new(&f.registry, &mut scheduler).invoke(&mut f.scene, true, &binding, None),
            Err(BindingError::UnresolvedTarget(_))
        ));
    }

    #[test]
    fn test_resolution_errors() {
        let mut f = fixture();
        let mut scheduler = Scheduler::new();
        let mut invoker = Invoker::new(&f.registry, &mut scheduler);

        let wrong_shape = StoredBinding::new(Some(f.door), "Game.Door", "SetOpen", vec![StoredArgument::Int(1)]);
        assert!(matches!(
            invoker.invoke(&mut f.scene, false, &wrong_shape, None),
            Err(BindingError::Unmatched { .. })
        ));

        let missing_object = StoredBinding::new(Some(ObjectId::new()), "Game.Door", "SetOpen", vec![StoredArgument::Bool(true)]);
        assert!(matches!(
            invoker.invoke(&mut f.scene, false, &missing_object, None),
            Err(BindingError::UnresolvedTarget(_))
        ));

        let unknown_type = StoredBinding::new(None, "Game.Window", "Open", vec![]);
        assert!(matches!(
            invoker.invoke(&mut f.scene, false, &unknown_type, None),
            Err(BindingError::UnresolvedType(_))
        ));

        let unset = StoredBinding::new(Some(f.door), "Game.Door", "SetOpen", vec![StoredArgument::None]);
        assert!(matches!(
            invoker.invoke(&mut f.scene, false, &unset, None),
            Err(BindingError::UnsetArgument(0))
        ));
    }

    #[test]
    fn test_deferred_result_is_scheduled() {
        let mut f = fixture();
        let steps = Rc::new(Cell::new(0));
        let task_steps = Rc::clone(&steps);
        f.registry.register_type(
            TypeBuilder::new("Game.Fader", "Game")
                .deferred_method("FadeOut", vec![], move |_, _| {
                    let steps = Rc::clone(&task_steps);
                    Ok(CallOutcome::Deferred(
                        async move {
                            steps.set(1);
                            next_tick().await;
                            steps.set(2);
                        }
                        .boxed_local(),
                    ))
                })
                .build(),
        );
        let fader = f.scene.spawn("Fader");
        f.scene.attach(fader, "Game.Fader", ());

        let mut scheduler = Scheduler::new();
        let binding = StoredBinding::new(Some(fader), "Game.Fader", "FadeOut", vec![]);
        let invoked = Invoker::new(&f.registry, &mut scheduler)
            .invoke(&mut f.scene, false, &binding, None)
            .unwrap();

        assert!(matches!(invoked, Invoked::Deferred(_)));
        assert_eq!(steps.get(), 0);
        scheduler.tick();
        assert_eq!(steps.get(), 1);
        scheduler.tick();
        assert_eq!(steps.get(), 2);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_outcome_decides_scheduling_over_declaration() {
        let mut f = fixture();
        f.registry.register_type(
            TypeBuilder::new("Game.Bell", "Game")
                .deferred_method("Ring", vec![], |_, _| Ok(CallOutcome::Done))
                .method("Toll", vec![], |_, _| Ok(CallOutcome::Deferred(async {}.boxed_local())))
                .build(),
        );
        let bell = f.scene.spawn("Bell");
        f.scene.attach(bell, "Game.Bell", ());
        let mut scheduler = Scheduler::new();
        let mut invoker = Invoker::new(&f.registry, &mut scheduler);

        let ring = StoredBinding::new(Some(bell), "Game.Bell", "Ring", vec![]);
        assert_eq!(invoker.invoke(&mut f.scene, false, &ring, None).unwrap(), Invoked::Immediate);

        let toll = StoredBinding::new(Some(bell), "Game.Bell", "Toll", vec![]);
        assert!(matches!(
            invoker.invoke(&mut f.scene, false, &toll, None).unwrap(),
            Invoked::Deferred(_)
        ));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_invocation_policy() {
        let mut f = fixture();
        let listener = EventListener::new(EventKind::OnUse)
            .with_callback(StoredBinding::new(Some(f.door), "Game.Door", "Jam", vec![]))
            .with_callback(StoredBinding::new(None, "Game.Door", "ResetAll", vec![]));
        let mut scheduler = Scheduler::new();

        let result = Invoker::new(&f.registry, &mut scheduler).invoke_all(&mut f.scene, &listener, None);
        assert!(matches!(
            result,
            Err(BindingError::Invocation(InvocationError::Failed(ref msg))) if msg == "jammed"
        ));
        assert_eq!(f.resets.get(), 0);

        let report = Invoker::new(&f.registry, &mut scheduler)
            .with_policy(InvocationPolicy::Report)
            .invoke_all(&mut f.scene, &listener, None)
            .unwrap();
        assert_eq!(report.invoked, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 0);
        assert_eq!(f.resets.get(), 1);
    }

    #[test]
    fn test_unresolved_binding_does_not_stop_the_rest() {
        let mut f = fixture();
        let listener = EventListener::new(EventKind::OnUse)
            .with_callback(StoredBinding::new(Some(f.door), "Game.Door", "Removed", vec![]))
            .with_callback(StoredBinding::new(Some(f.door), "Game.Door", "SetOpen", vec![StoredArgument::Bool(true)]));
        let mut scheduler = Scheduler::new();

        let report = Invoker::new(&f.registry, &mut scheduler)
            .invoke_all(&mut f.scene, &listener, None)
            .unwrap();
        assert_eq!(report.invoked, 1);
        assert!(!report.is_clean());
        assert!(door_state(&f).open);
    }
}
