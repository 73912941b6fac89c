// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host scene graph.
//!
//! Objects carry a name, a tag and an ordered list of attached component
//! instances, and form a parent/child hierarchy. This is the minimal surface
//! the binding layer needs from the host: tag lookup for event gating and
//! "find component in children" for receiver resolution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

/// Unique identifier for a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    /// Create a new random object ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of one attached component: owning object plus slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    /// Owning object
    pub object: ObjectId,
    /// Index in the object's component list
    pub index: usize,
}

/// A component instance attached to an object
pub struct AttachedComponent {
    /// Registered type name of the instance
    pub type_name: String,
    instance: Box<dyn Any>,
}

impl std::fmt::Debug for AttachedComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedComponent")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// An object in the scene
#[derive(Debug)]
pub struct SceneObject {
    /// Object ID
    pub id: ObjectId,
    /// Display name
    pub name: String,
    /// Tag used for event filtering
    pub tag: String,
    /// Whether the object takes part in the scene
    pub active: bool,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    components: Vec<AttachedComponent>,
}

impl SceneObject {
    fn new(name: impl Into<String>, parent: Option<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            tag: "Untagged".to_string(),
            active: true,
            parent,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Parent object, if any
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Direct children in insertion order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Attached components in attachment order
    pub fn components(&self) -> &[AttachedComponent] {
        &self.components
    }
}

/// The host scene
#[derive(Debug, Default)]
pub struct Scene {
    objects: IndexMap<ObjectId, SceneObject>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root object
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        let object = SceneObject::new(name, None);
        let id = object.id;
        self.objects.insert(id, object);
        id
    }

    /// Create an object under `parent`. Returns `None` if the parent does not exist.
    pub fn spawn_child(&mut self, parent: ObjectId, name: impl Into<String>) -> Option<ObjectId> {
        let object = SceneObject::new(name, Some(parent));
        let id = object.id;
        self.objects.get_mut(&parent)?.children.push(id);
        self.objects.insert(id, object);
        Some(id)
    }

    /// Create an object with a known ID, for scenes rebuilt from authored data.
    ///
    /// Returns `None` if the ID is taken or the parent does not exist.
    pub fn spawn_with_id(
        &mut self,
        id: ObjectId,
        name: impl Into<String>,
        parent: Option<ObjectId>,
    ) -> Option<ObjectId> {
        if self.objects.contains_key(&id) {
            return None;
        }
        if let Some(parent) = parent {
            self.objects.get_mut(&parent)?.children.push(id);
        }
        let mut object = SceneObject::new(name, parent);
        object.id = id;
        self.objects.insert(id, object);
        Some(id)
    }

    /// Remove an object and its whole subtree
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        let Some(parent) = self.objects.get(&id).map(|o| o.parent) else {
            return false;
        };
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        for removed in self.descendants(id) {
            self.objects.shift_remove(&removed);
        }
        true
    }

    /// Set an object's tag
    pub fn set_tag(&mut self, id: ObjectId, tag: impl Into<String>) -> bool {
        match self.objects.get_mut(&id) {
            Some(object) => {
                object.tag = tag.into();
                true
            }
            None => false,
        }
    }

    /// Activate or deactivate an object
    pub fn set_active(&mut self, id: ObjectId, active: bool) -> bool {
        match self.objects.get_mut(&id) {
            Some(object) => {
                object.active = active;
                true
            }
            None => false,
        }
    }

    /// Whether an object exists and is active
    pub fn is_active(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.active)
    }

    /// Attach a component instance registered under `type_name`
    pub fn attach<T: Any>(
        &mut self,
        id: ObjectId,
        type_name: impl Into<String>,
        component: T,
    ) -> Option<ComponentRef> {
        let object = self.objects.get_mut(&id)?;
        object.components.push(AttachedComponent {
            type_name: type_name.into(),
            instance: Box::new(component),
        });
        Some(ComponentRef {
            object: id,
            index: object.components.len() - 1,
        })
    }

    /// Get an object
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Whether an object exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Tag of an object
    pub fn tag(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(&id).map(|o| o.tag.as_str())
    }

    /// Number of objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// The object and all of its descendants, depth first, parents before children
    pub fn descendants(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(object) = self.objects.get(&current) else {
                continue;
            };
            order.push(current);
            stack.extend(object.children.iter().rev().copied());
        }
        order
    }

    /// Every component on the object or its descendants, with its type name
    pub fn components_in_children(&self, id: ObjectId) -> Vec<(ComponentRef, &str)> {
        let mut found = Vec::new();
        for object_id in self.descendants(id) {
            let Some(object) = self.objects.get(&object_id) else {
                continue;
            };
            for (index, component) in object.components.iter().enumerate() {
                found.push((
                    ComponentRef {
                        object: object_id,
                        index,
                    },
                    component.type_name.as_str(),
                ));
            }
        }
        found
    }

    /// First component on the object or its descendants whose type name satisfies `predicate`
    pub fn find_component_in_children(
        &self,
        id: ObjectId,
        mut predicate: impl FnMut(&str) -> bool,
    ) -> Option<(ComponentRef, &str)> {
        self.components_in_children(id)
            .into_iter()
            .find(|(_, type_name)| predicate(type_name))
    }

    /// Type-erased mutable access to a component instance
    pub fn component_any_mut(&mut self, component: ComponentRef) -> Option<&mut (dyn Any + 'static)> {
        self.objects
            .get_mut(&component.object)?
            .components
            .get_mut(component.index)
            .map(|c| c.instance.as_mut())
    }

    /// Typed access to a component instance
    pub fn component<T: Any>(&self, component: ComponentRef) -> Option<&T> {
        self.objects
            .get(&component.object)?
            .components
            .get(component.index)?
            .instance
            .downcast_ref::<T>()
    }

    /// Typed mutable access to a component instance
    pub fn component_mut<T: Any>(&mut self, component: ComponentRef) -> Option<&mut T> {
        self.objects
            .get_mut(&component.object)?
            .components
            .get_mut(component.index)?
            .instance
            .downcast_mut::<T>()
    }
}
