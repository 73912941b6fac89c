// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete call arguments.

use crate::error::InvocationError;
use crate::scene::ObjectId;
use serde::{Deserialize, Serialize};

/// An enumerator reconstructed from a stored ordinal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Full name of the enum type
    pub type_name: String,
    /// Underlying integer value
    pub value: i32,
    /// Name of the enumerator, if the value is declared
    pub name: Option<String>,
}

/// A marshalled argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 32-bit float
    Float(f32),
    /// Text
    String(String),
    /// Object reference (possibly null)
    Object(Option<ObjectId>),
    /// Enumerator
    Enum(EnumValue),
}

/// Runtime type of a [`Value`], used for exact overload resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeType {
    /// `bool`
    Bool,
    /// `i32`
    I32,
    /// `f32`
    F32,
    /// Text
    Str,
    /// Object reference
    Object,
    /// Enum with its full type name
    Enum(String),
}

impl Value {
    /// Runtime type of this value
    pub fn runtime_type(&self) -> RuntimeType {
        match self {
            Self::Bool(_) => RuntimeType::Bool,
            Self::Int(_) => RuntimeType::I32,
            Self::Float(_) => RuntimeType::F32,
            Self::String(_) => RuntimeType::Str,
            Self::Object(_) => RuntimeType::Object,
            Self::Enum(e) => RuntimeType::Enum(e.type_name.clone()),
        }
    }
}

/// Typed view over a method's arguments
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    /// Wrap a marshalled argument list
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `index`
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    /// Boolean at `index`
    pub fn bool(&self, index: usize) -> Result<bool, InvocationError> {
        match self.values.get(index) {
            Some(Value::Bool(v)) => Ok(*v),
            _ => Err(InvocationError::ArgumentType { index, expected: "bool" }),
        }
    }

    /// Integer at `index`
    pub fn int(&self, index: usize) -> Result<i32, InvocationError> {
        match self.values.get(index) {
            Some(Value::Int(v)) => Ok(*v),
            _ => Err(InvocationError::ArgumentType { index, expected: "int" }),
        }
    }

    /// Float at `index`
    pub fn float(&self, index: usize) -> Result<f32, InvocationError> {
        match self.values.get(index) {
            Some(Value::Float(v)) => Ok(*v),
            _ => Err(InvocationError::ArgumentType { index, expected: "float" }),
        }
    }

    /// Text at `index`
    pub fn string(&self, index: usize) -> Result<&'a str, InvocationError> {
        match self.values.get(index) {
            Some(Value::String(v)) => Ok(v.as_str()),
            _ => Err(InvocationError::ArgumentType { index, expected: "string" }),
        }
    }

    /// Object reference at `index`
    pub fn object(&self, index: usize) -> Result<Option<ObjectId>, InvocationError> {
        match self.values.get(index) {
            Some(Value::Object(v)) => Ok(*v),
            _ => Err(InvocationError::ArgumentType { index, expected: "Object" }),
        }
    }

    /// Enumerator at `index`
    pub fn enumerator(&self, index: usize) -> Result<&'a EnumValue, InvocationError> {
        match self.values.get(index) {
            Some(Value::Enum(v)) => Ok(v),
            _ => Err(InvocationError::ArgumentType { index, expected: "enum" }),
        }
    }
}
