// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registration table of callable types.
//!
//! Every component type that can be the target of a binding registers its
//! base type, its defining module and its declared methods once at startup.
//! The catalog builder walks this table instead of inspecting live types.

use crate::error::InvocationError;
use crate::value::{Args, RuntimeType, Value};
use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use std::any::Any;
use std::rc::Rc;

/// Root of the host's object reference hierarchy
pub const BASE_REFERENCE_TYPE: &str = "Object";

/// Generic base behaviour type; catalog walks stop below it
pub const BASE_BEHAVIOUR_TYPE: &str = "Behaviour";

/// Module that defines the host's built-in types
pub const HOST_MODULE: &str = "HostCore";

/// Part of a qualified type name before the first module qualifier.
///
/// `"Game.Door,GameModule"` and `"Game.Door"` both yield `"Game.Door"`.
pub fn leading_segment(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

/// Declared type of a method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// `bool`
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Text
    Str,
    /// Untyped object reference
    AnyObject,
    /// Reference to a named registered type
    Reference(String),
    /// Registered enum, by full name
    Enum(String),
    /// Plain value type (vectors, colors, ...)
    Struct(String),
}

impl ParamType {
    /// Whether a value of runtime type `runtime` can be passed for this parameter
    pub fn accepts(&self, runtime: &RuntimeType) -> bool {
        match (self, runtime) {
            (Self::Bool, RuntimeType::Bool)
            | (Self::I32, RuntimeType::I32)
            | (Self::F32, RuntimeType::F32)
            | (Self::Str, RuntimeType::Str)
            | (Self::AnyObject | Self::Reference(_), RuntimeType::Object) => true,
            (Self::Enum(declared), RuntimeType::Enum(actual)) => {
                leading_segment(declared) == leading_segment(actual)
            }
            _ => false,
        }
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str => "string",
            Self::AnyObject => BASE_REFERENCE_TYPE,
            Self::Reference(name) | Self::Enum(name) | Self::Struct(name) => name,
        }
    }
}

/// A declared method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: ParamType,
    /// Default value, if the parameter has one
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Create a parameter without a default
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// What a method hands back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnShape {
    /// Nothing, or a value the binding layer ignores
    #[default]
    Immediate,
    /// A deferred sequence driven by the scheduler
    Deferred,
}

/// Receiver of a call
pub enum Receiver<'a> {
    /// A component instance
    Instance(&'a mut (dyn Any + 'static)),
    /// A static context
    Static,
}

impl<'a> Receiver<'a> {
    /// Downcast the receiver to the component type the method was registered for
    pub fn downcast<T: Any>(self) -> Result<&'a mut T, InvocationError> {
        match self {
            Self::Instance(instance) => {
                instance
                    .downcast_mut::<T>()
                    .ok_or(InvocationError::ReceiverType {
                        expected: std::any::type_name::<T>(),
                    })
            }
            Self::Static => Err(InvocationError::StaticReceiver),
        }
    }
}

/// Result of a successful call
pub enum CallOutcome {
    /// The call finished synchronously
    Done,
    /// The call returned work that continues across scheduler ticks
    Deferred(LocalBoxFuture<'static, ()>),
}

impl std::fmt::Debug for CallOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Done => f.write_str("Done"),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Type-erased method body
pub type MethodFn = Rc<dyn Fn(Receiver<'_>, Args<'_>) -> Result<CallOutcome, InvocationError>>;

/// A method declared on a registered type
#[derive(Clone)]
pub struct MethodDef {
    /// Simple method name
    pub name: String,
    /// Declared parameters
    pub params: Vec<ParamSpec>,
    /// Static methods need no receiver
    pub is_static: bool,
    /// Declared return shape
    pub returns: ReturnShape,
    body: MethodFn,
}

impl MethodDef {
    /// Create a method definition
    pub fn new<F>(name: impl Into<String>, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(Receiver<'_>, Args<'_>) -> Result<CallOutcome, InvocationError> + 'static,
    {
        Self {
            name: name.into(),
            params,
            is_static: false,
            returns: ReturnShape::Immediate,
            body: Rc::new(body),
        }
    }

    /// Mark as static
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as returning a deferred sequence
    pub fn into_deferred(mut self) -> Self {
        self.returns = ReturnShape::Deferred;
        self
    }

    /// Whether the declared parameters accept exactly these runtime types
    pub fn accepts(&self, runtime_types: &[RuntimeType]) -> bool {
        self.params.len() == runtime_types.len()
            && self
                .params
                .iter()
                .zip(runtime_types)
                .all(|(param, runtime)| param.ty.accepts(runtime))
    }

    /// Call the method body
    pub fn call(&self, receiver: Receiver<'_>, args: Args<'_>) -> Result<CallOutcome, InvocationError> {
        (self.body)(receiver, args)
    }
}

impl std::fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("is_static", &self.is_static)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// A registered type
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Fully qualified type name, e.g. `Game.Door`
    pub full_name: String,
    /// Defining module
    pub module: String,
    /// Base type, if any
    pub base: Option<String>,
    /// Methods declared on this type only
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    /// Type name plus defining-module qualifier
    pub fn qualified_name(&self) -> String {
        format!("{},{}", self.full_name, self.module)
    }
}

/// Integer storage of an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntRepr {
    /// 8-bit unsigned
    U8,
    /// 16-bit signed
    I16,
    /// 32-bit signed
    #[default]
    I32,
    /// 64-bit signed
    I64,
}

/// A registered enum type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Fully qualified name
    pub full_name: String,
    /// Defining module
    pub module: String,
    /// Underlying storage
    pub repr: IntRepr,
    /// Declared enumerators and their values
    pub variants: Vec<(String, i64)>,
}

impl EnumDef {
    /// Create an `i32`-backed enum whose enumerators are numbered from zero
    pub fn new<S: Into<String>>(
        full_name: impl Into<String>,
        module: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            module: module.into(),
            repr: IntRepr::I32,
            variants: variants
                .into_iter()
                .enumerate()
                .map(|(i, name)| (name.into(), i as i64))
                .collect(),
        }
    }

    /// Change the underlying storage
    pub fn with_repr(mut self, repr: IntRepr) -> Self {
        self.repr = repr;
        self
    }

    /// Name without namespace, e.g. `Weather` for `Game.Weather`
    pub fn simple_name(&self) -> &str {
        self.full_name
            .rsplit(['.', '+'])
            .next()
            .unwrap_or(&self.full_name)
    }

    /// Name of the enumerator with value `value`
    pub fn variant_name(&self, value: i64) -> Option<&str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(name, _)| name.as_str())
    }

    /// Value of the enumerator named `name`
    pub fn variant_value(&self, name: &str) -> Option<i64> {
        self.variants.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Parameter type referring to this enum
    pub fn param_type(&self) -> ParamType {
        ParamType::Enum(self.full_name.clone())
    }
}

/// Builder for a [`TypeDef`]
#[derive(Debug)]
pub struct TypeBuilder {
    def: TypeDef,
}

impl TypeBuilder {
    /// Start a type deriving from the base behaviour type
    pub fn new(full_name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            def: TypeDef {
                full_name: full_name.into(),
                module: module.into(),
                base: Some(BASE_BEHAVIOUR_TYPE.to_string()),
                methods: Vec::new(),
            },
        }
    }

    /// Set the base type
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.def.base = Some(base.into());
        self
    }

    /// Declare an instance method
    pub fn method<F>(mut self, name: &str, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(Receiver<'_>, Args<'_>) -> Result<CallOutcome, InvocationError> + 'static,
    {
        self.def.methods.push(MethodDef::new(name, params, body));
        self
    }

    /// Declare a static method
    pub fn static_method<F>(mut self, name: &str, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(Receiver<'_>, Args<'_>) -> Result<CallOutcome, InvocationError> + 'static,
    {
        self.def
            .methods
            .push(MethodDef::new(name, params, body).into_static());
        self
    }

    /// Declare an instance method returning a deferred sequence
    pub fn deferred_method<F>(mut self, name: &str, params: Vec<ParamSpec>, body: F) -> Self
    where
        F: Fn(Receiver<'_>, Args<'_>) -> Result<CallOutcome, InvocationError> + 'static,
    {
        self.def
            .methods
            .push(MethodDef::new(name, params, body).into_deferred());
        self
    }

    /// Declare a prepared method
    pub fn method_def(mut self, method: MethodDef) -> Self {
        self.def.methods.push(method);
        self
    }

    /// Finish the type
    pub fn build(self) -> TypeDef {
        self.def
    }
}

/// Registry of callable types and enums
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDef>,
    enums: IndexMap<String, EnumDef>,
}

impl TypeRegistry {
    /// Create a registry holding the host's built-in reference hierarchy
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let builtins = [
            (BASE_REFERENCE_TYPE, None),
            ("GameObject", Some(BASE_REFERENCE_TYPE)),
            ("Component", Some(BASE_REFERENCE_TYPE)),
            ("Transform", Some("Component")),
            (BASE_BEHAVIOUR_TYPE, Some("Component")),
        ];
        for (name, base) in builtins {
            registry.register_type(TypeDef {
                full_name: name.to_string(),
                module: HOST_MODULE.to_string(),
                base: base.map(str::to_string),
                methods: Vec::new(),
            });
        }
        registry
    }

    /// Create a registry without any types
    pub fn empty() -> Self {
        Self {
            types: IndexMap::new(),
            enums: IndexMap::new(),
        }
    }

    /// Register or replace a type
    pub fn register_type(&mut self, def: TypeDef) {
        tracing::trace!(type_name = %def.full_name, methods = def.methods.len(), "registered type");
        self.types.insert(def.full_name.clone(), def);
    }

    /// Register or replace an enum
    pub fn register_enum(&mut self, def: EnumDef) {
        self.enums.insert(def.full_name.clone(), def);
    }

    /// Look up a type by name; module qualifiers are ignored
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(leading_segment(name))
    }

    /// Look up an enum by name; module qualifiers are ignored
    pub fn get_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(leading_segment(name))
    }

    /// All registered types
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// The named type followed by each registered ancestor, nearest first
    pub fn ancestry(&self, name: &str) -> Vec<&TypeDef> {
        let mut chain = Vec::new();
        let mut current = self.get_type(name);
        while let Some(def) = current {
            // A cyclic base declaration must not loop forever
            if chain.len() > self.types.len() {
                tracing::warn!(type_name = %name, "cyclic base type chain");
                break;
            }
            chain.push(def);
            current = def.base.as_deref().and_then(|base| self.get_type(base));
        }
        chain
    }

    /// Whether `name` is `ancestor` or derives from it
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        let ancestor = leading_segment(ancestor);
        self.ancestry(name)
            .iter()
            .any(|def| def.full_name == ancestor)
    }

    /// Whether `name` is part of the host's object reference hierarchy
    pub fn is_reference_type(&self, name: &str) -> bool {
        self.is_subtype(name, BASE_REFERENCE_TYPE)
    }

    /// Number of registered types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
