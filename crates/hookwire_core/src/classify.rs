// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter classification into the supported argument kinds.

use crate::listener::ArgKind;
use crate::registry::{IntRepr, ParamSpec, ParamType, TypeRegistry, BASE_REFERENCE_TYPE};
use serde::{Deserialize, Serialize};

/// Supported kind of a method parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    String,
    /// Object reference of the named type
    Object {
        /// Declared reference type
        type_name: String,
    },
    /// Integer-backed enum
    Enum {
        /// Full name of the enum type
        type_name: String,
    },
}

impl ParamKind {
    /// Kind tag a stored argument needs for this parameter
    pub fn arg_kind(&self) -> ArgKind {
        match self {
            Self::Bool => ArgKind::Bool,
            Self::Int => ArgKind::Int,
            Self::Float => ArgKind::Float,
            Self::String => ArgKind::String,
            Self::Object { .. } => ArgKind::Object,
            Self::Enum { .. } => ArgKind::Enum,
        }
    }

    /// Label used in display signatures
    pub fn label(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Object { .. } => BASE_REFERENCE_TYPE,
            Self::Enum { type_name } => type_name
                .rsplit(['.', '+'])
                .next()
                .unwrap_or(type_name),
        }
    }
}

/// A parameter type outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// The parameter cannot be represented by a stored argument
    #[error("unsupported parameter type: {0}")]
    UnsupportedParameter(String),
}

/// Classify one parameter type.
///
/// Rules apply in order: bool, 32-bit int, 32-bit float, text, object
/// reference (untyped, or any type deriving from the base reference type),
/// enum stored as a 32-bit int. Everything else is rejected.
pub fn classify(ty: &ParamType, registry: &TypeRegistry) -> Result<ParamKind, ClassifyError> {
    let unsupported = || ClassifyError::UnsupportedParameter(ty.name().to_string());
    match ty {
        ParamType::Bool => Ok(ParamKind::Bool),
        ParamType::I32 => Ok(ParamKind::Int),
        ParamType::F32 => Ok(ParamKind::Float),
        ParamType::Str => Ok(ParamKind::String),
        ParamType::AnyObject => Ok(ParamKind::Object {
            type_name: BASE_REFERENCE_TYPE.to_string(),
        }),
        ParamType::Reference(name) if registry.is_reference_type(name) => Ok(ParamKind::Object {
            type_name: name.clone(),
        }),
        ParamType::Enum(name) => match registry.get_enum(name) {
            Some(def) if def.repr == IntRepr::I32 => Ok(ParamKind::Enum {
                type_name: def.full_name.clone(),
            }),
            _ => Err(unsupported()),
        },
        _ => Err(unsupported()),
    }
}

/// Classify every parameter of a method; one rejection rejects the method.
pub fn classify_all(
    params: &[ParamSpec],
    registry: &TypeRegistry,
) -> Result<Vec<ParamKind>, ClassifyError> {
    params.iter().map(|p| classify(&p.ty, registry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{EnumDef, TypeBuilder};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_type(TypeBuilder::new("Game.Door", "Game").build());
        registry.register_enum(EnumDef::new("Game.Weather", "Game", ["Sunny", "Rainy", "Stormy"]));
        registry.register_enum(
            EnumDef::new("Game.Layer", "Game", ["Default", "Water"]).with_repr(IntRepr::U8),
        );
        registry
    }

    #[test]
    fn test_supported_kinds() {
        let registry = registry();
        assert_eq!(classify(&ParamType::Bool, &registry), Ok(ParamKind::Bool));
        assert_eq!(classify(&ParamType::I32, &registry), Ok(ParamKind::Int));
        assert_eq!(classify(&ParamType::F32, &registry), Ok(ParamKind::Float));
        assert_eq!(classify(&ParamType::Str, &registry), Ok(ParamKind::String));
        assert_eq!(
            classify(&ParamType::AnyObject, &registry),
            Ok(ParamKind::Object { type_name: "Object".into() })
        );
        assert_eq!(
            classify(&ParamType::Reference("GameObject".into()), &registry),
            Ok(ParamKind::Object { type_name: "GameObject".into() })
        );
        assert_eq!(
            classify(&ParamType::Reference("Game.Door".into()), &registry),
            Ok(ParamKind::Object { type_name: "Game.Door".into() })
        );
        assert_eq!(
            classify(&ParamType::Enum("Game.Weather".into()), &registry),
            Ok(ParamKind::Enum { type_name: "Game.Weather".into() })
        );
    }

    #[test]
    fn test_rejected_types() {
        let registry = registry();
        for ty in [
            ParamType::I64,
            ParamType::F64,
            ParamType::Struct("Vector3".into()),
            ParamType::Reference("NotRegistered".into()),
            ParamType::Enum("Game.Layer".into()),
            ParamType::Enum("Game.Unknown".into()),
        ] {
            assert!(classify(&ty, &registry).is_err(), "{ty:?} should be rejected");
        }
    }

    #[test]
    fn test_one_rejection_rejects_method() {
        let registry = registry();
        let params = vec![
            ParamSpec::new("open", ParamType::Bool),
            ParamSpec::new("offset", ParamType::Struct("Vector3".into())),
        ];
        assert_eq!(
            classify_all(&params, &registry),
            Err(ClassifyError::UnsupportedParameter("Vector3".into()))
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(ParamKind::Int.label(), "int");
        assert_eq!(ParamKind::Enum { type_name: "Game.Weather".into() }.label(), "Weather");
        assert_eq!(ParamKind::Object { type_name: "Game.Door".into() }.label(), "Object");
    }
}
