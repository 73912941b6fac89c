// SPDX-License-Identifier: MIT OR Apache-2.0
//! Method catalog: every method a binding can target on a set of objects.
//!
//! The catalog is a derived view over the [`TypeRegistry`]; it is rebuilt
//! whenever the candidate objects change and is never persisted. Entries are
//! sorted by [`CallableDescriptor::sort_key`] with a byte-wise comparison so
//! identical inputs always produce the same order.

use crate::classify::{classify_all, ParamKind};
use crate::config::RuntimeSettings;
use crate::listener::{StoredArgument, StoredBinding};
use crate::matcher;
use crate::registry::{MethodDef, ReturnShape, TypeDef, TypeRegistry, BASE_BEHAVIOUR_TYPE};
use crate::scene::{ObjectId, Scene};
use crate::value::Value;
use serde::Serialize;

/// Lifecycle method names that never appear in the catalog
pub const RESERVED_METHOD_NAMES: [&str; 4] = ["Main", "Start", "Awake", "Update"];

/// One discoverable target method
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallableDescriptor {
    /// Declaring type name with its module qualifier
    pub owner_type_name: String,
    /// Simple method name
    pub method_name: String,
    /// Classified parameter kinds, one per parameter
    pub parameter_kinds: Vec<ParamKind>,
    /// Declared parameter names
    pub parameter_names: Vec<String>,
    /// `name(kind1 p1, kind2 p2)`
    pub display_signature: String,
    /// `owner/first char of signature/signature`
    pub sort_key: String,
    /// Per-parameter default used to pre-fill new bindings
    pub default_arguments: Vec<Option<StoredArgument>>,
    /// Callable without a receiver
    pub is_static: bool,
    /// Returns a deferred sequence
    pub returns_deferred: bool,
}

impl CallableDescriptor {
    fn new(owner: &TypeDef, method: &MethodDef, kinds: Vec<ParamKind>) -> Self {
        let owner_type_name = owner.qualified_name();
        let parameters = kinds
            .iter()
            .zip(&method.params)
            .map(|(kind, param)| format!("{} {}", kind.label(), param.name))
            .collect::<Vec<_>>()
            .join(", ");
        let display_signature = format!("{}({})", method.name, parameters);
        let first = display_signature.chars().next().unwrap_or_default();
        let sort_key = format!("{owner_type_name}/{first}/{display_signature}");
        let default_arguments = kinds
            .iter()
            .zip(&method.params)
            .map(|(kind, param)| param.default.as_ref().and_then(|v| default_argument(kind, v)))
            .collect();

        Self {
            owner_type_name,
            method_name: method.name.clone(),
            parameter_names: method.params.iter().map(|p| p.name.clone()).collect(),
            parameter_kinds: kinds,
            display_signature,
            sort_key,
            default_arguments,
            is_static: method.is_static,
            returns_deferred: method.returns == ReturnShape::Deferred,
        }
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameter_kinds.len()
    }

    /// A fresh binding to this method with defaults or zero values as arguments
    pub fn new_binding(&self, target: Option<ObjectId>) -> StoredBinding {
        let arguments = self
            .parameter_kinds
            .iter()
            .zip(&self.default_arguments)
            .map(|(kind, default)| default.clone().unwrap_or_else(|| placeholder(kind)))
            .collect();
        StoredBinding::new(target, &self.owner_type_name, &self.method_name, arguments)
    }

    /// Point an existing binding at this method.
    ///
    /// Arguments are resized to the arity. An argument that fits its
    /// parameter keeps its value (records matched through their enum type
    /// name are upgraded to the enum kind); any other is replaced by the parameter's default or zero
    /// value.
    pub fn conform(&self, binding: &mut StoredBinding) {
        binding.owner_type_name.clone_from(&self.owner_type_name);
        binding.method_name.clone_from(&self.method_name);
        binding.arguments.resize(self.arity(), StoredArgument::None);

        for ((argument, kind), default) in binding
            .arguments
            .iter_mut()
            .zip(&self.parameter_kinds)
            .zip(&self.default_arguments)
        {
            if !matcher::is_compatible(argument, kind) {
                *argument = default.clone().unwrap_or_else(|| placeholder(kind));
                continue;
            }
            if let ParamKind::Enum { type_name } = kind {
                *argument = StoredArgument::Enum {
                    value: argument.ordinal().unwrap_or(0),
                    type_name: type_name.clone(),
                };
            }
        }
    }
}

fn placeholder(kind: &ParamKind) -> StoredArgument {
    match kind {
        ParamKind::Bool => StoredArgument::Bool(false),
        ParamKind::Int => StoredArgument::Int(0),
        ParamKind::Float => StoredArgument::Float(0.0),
        ParamKind::String => StoredArgument::String(String::new()),
        ParamKind::Object { .. } => StoredArgument::Object(None),
        ParamKind::Enum { type_name } => StoredArgument::Enum {
            value: 0,
            type_name: type_name.clone(),
        },
    }
}

fn default_argument(kind: &ParamKind, value: &Value) -> Option<StoredArgument> {
    match (kind, value) {
        (ParamKind::Bool, Value::Bool(v)) => Some(StoredArgument::Bool(*v)),
        (ParamKind::Int, Value::Int(v)) => Some(StoredArgument::Int(*v)),
        (ParamKind::Float, Value::Float(v)) => Some(StoredArgument::Float(*v)),
        (ParamKind::String, Value::String(v)) => Some(StoredArgument::String(v.clone())),
        (ParamKind::Object { .. }, Value::Object(v)) => Some(StoredArgument::Object(*v)),
        (ParamKind::Enum { type_name }, Value::Enum(v)) => Some(StoredArgument::Enum {
            value: v.value,
            type_name: type_name.clone(),
        }),
        _ => {
            tracing::debug!(?kind, ?value, "ignoring default of mismatched type");
            None
        }
    }
}

/// Ordered list of callable descriptors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    entries: Vec<CallableDescriptor>,
}

impl Catalog {
    /// Sort descriptors into a catalog
    pub fn from_entries(mut entries: Vec<CallableDescriptor>) -> Self {
        // String ordering is byte-wise, independent of locale; the sort is stable
        entries.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`
    pub fn get(&self, index: usize) -> Option<&CallableDescriptor> {
        self.entries.get(index)
    }

    /// All entries in order
    pub fn entries(&self) -> &[CallableDescriptor] {
        &self.entries
    }

    /// Iterate entries in order
    pub fn iter(&self) -> impl Iterator<Item = &CallableDescriptor> {
        self.entries.iter()
    }

    /// Entries declared by one owner type (module qualifiers ignored)
    pub fn entries_for_owner<'a>(
        &'a self,
        owner_type_name: &'a str,
    ) -> impl Iterator<Item = &'a CallableDescriptor> + 'a {
        self.entries
            .iter()
            .filter(move |d| matcher::same_type(&d.owner_type_name, owner_type_name))
    }

    /// Index of the first entry matching an owner, a method name and an argument shape
    pub fn position_of(
        &self,
        owner_type_name: &str,
        method_name: &str,
        arguments: &[StoredArgument],
    ) -> Option<usize> {
        matcher::find_method(&self.entries, owner_type_name, method_name, arguments)
    }

    /// Index of the entry a stored binding refers to
    pub fn find_binding(&self, binding: &StoredBinding) -> Option<usize> {
        self.position_of(&binding.owner_type_name, &binding.method_name, &binding.arguments)
    }
}

/// Builds a [`Catalog`] from the registry and a set of candidate objects
#[derive(Debug, Clone, Copy)]
pub struct CatalogBuilder<'r> {
    registry: &'r TypeRegistry,
    include_instance_methods: bool,
    filter_reserved_names: bool,
}

impl<'r> CatalogBuilder<'r> {
    /// Builder including instance methods and filtering reserved names
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            include_instance_methods: true,
            filter_reserved_names: true,
        }
    }

    /// Builder configured from runtime settings
    pub fn from_settings(registry: &'r TypeRegistry, settings: &RuntimeSettings) -> Self {
        Self::new(registry)
            .include_instance_methods(settings.include_instance_methods)
            .filter_reserved_names(settings.filter_reserved_names)
    }

    /// Whether instance methods are listed (static methods always are)
    pub fn include_instance_methods(mut self, include: bool) -> Self {
        self.include_instance_methods = include;
        self
    }

    /// Whether [`RESERVED_METHOD_NAMES`] are left out
    pub fn filter_reserved_names(mut self, filter: bool) -> Self {
        self.filter_reserved_names = filter;
        self
    }

    /// Catalog of every component on the roots and their descendants
    pub fn build(&self, scene: &Scene, roots: &[ObjectId]) -> Catalog {
        let mut entries = Vec::new();
        for root in roots {
            for (_, type_name) in scene.components_in_children(*root) {
                self.collect_type(type_name, &mut entries);
            }
        }
        Catalog::from_entries(entries)
    }

    /// Catalog of named types, for static contexts without an object
    pub fn build_for_types(&self, type_names: &[&str]) -> Catalog {
        let mut entries = Vec::new();
        for type_name in type_names {
            self.collect_type(type_name, &mut entries);
        }
        Catalog::from_entries(entries)
    }

    fn collect_type(&self, type_name: &str, entries: &mut Vec<CallableDescriptor>) {
        let chain = self.registry.ancestry(type_name);
        if chain.is_empty() {
            tracing::trace!(%type_name, "component type not registered");
            return;
        }

        for def in chain
            .into_iter()
            .take_while(|def| def.full_name != BASE_BEHAVIOUR_TYPE)
        {
            for method in &def.methods {
                if !method.is_static && !self.include_instance_methods {
                    continue;
                }
                if self.filter_reserved_names && RESERVED_METHOD_NAMES.contains(&method.name.as_str()) {
                    continue;
                }
                match classify_all(&method.params, self.registry) {
                    Ok(kinds) => entries.push(CallableDescriptor::new(def, method, kinds)),
                    Err(e) => {
                        tracing::trace!(owner = %def.full_name, method = %method.name, "skipped: {e}");
                    }
                }
            }
        }
    }
}
