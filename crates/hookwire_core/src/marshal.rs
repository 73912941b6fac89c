// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stored arguments to concrete call values.

use crate::error::BindingError;
use crate::listener::StoredArgument;
use crate::registry::TypeRegistry;
use crate::value::{EnumValue, Value};

/// Convert stored arguments into call values, in order.
///
/// Enum arguments are rebuilt from their stored type name and ordinal. The
/// ordinal does not have to name a declared enumerator, the same way an
/// integer cast to an enum is not range checked.
pub fn marshal(arguments: &[StoredArgument], registry: &TypeRegistry) -> Result<Vec<Value>, BindingError> {
    arguments
        .iter()
        .enumerate()
        .map(|(index, argument)| marshal_one(index, argument, registry))
        .collect()
}

fn marshal_one(index: usize, argument: &StoredArgument, registry: &TypeRegistry) -> Result<Value, BindingError> {
    match argument {
        StoredArgument::None => Err(BindingError::UnsetArgument(index)),
        StoredArgument::Bool(v) => Ok(Value::Bool(*v)),
        StoredArgument::Int(v) => Ok(Value::Int(*v)),
        StoredArgument::Float(v) => Ok(Value::Float(*v)),
        StoredArgument::String(v) => Ok(Value::String(v.clone())),
        StoredArgument::Object(v) => Ok(Value::Object(*v)),
        StoredArgument::Enum { value, type_name } | StoredArgument::Unset { value, type_name } => {
            let def = registry
                .get_enum(type_name)
                .ok_or_else(|| BindingError::UnresolvedType(type_name.clone()))?;
            Ok(Value::Enum(EnumValue {
                type_name: def.full_name.clone(),
                value: *value,
                name: def.variant_name(i64::from(*value)).map(str::to_string),
            }))
        }
        StoredArgument::Retyped(record) => marshal_one(index, &record.active_payload(), registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EnumDef;
    use crate::scene::ObjectId;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_enum(EnumDef::new("Game.Weather", "Game", ["Sunny", "Rainy", "Stormy"]));
        registry
    }

    #[test]
    fn test_scalars_pass_through() {
        let target = ObjectId::new();
        let values = marshal(
            &[
                StoredArgument::Bool(true),
                StoredArgument::Int(-4),
                StoredArgument::Float(0.5),
                StoredArgument::String("open".into()),
                StoredArgument::Object(Some(target)),
                StoredArgument::Object(None),
            ],
            &registry(),
        )
        .unwrap();
        assert_eq!(
            values,
            vec![
                Value::Bool(true),
                Value::Int(-4),
                Value::Float(0.5),
                Value::String("open".into()),
                Value::Object(Some(target)),
                Value::Object(None),
            ]
        );
    }

    #[test]
    fn test_enum_reconstruction() {
        let registry = registry();
        let values = marshal(
            &[StoredArgument::Enum {
                value: 2,
                type_name: "Game.Weather,Game".into(),
            }],
            &registry,
        )
        .unwrap();
        assert_eq!(
            values[0],
            Value::Enum(EnumValue {
                type_name: "Game.Weather".into(),
                value: 2,
                name: Some("Stormy".into()),
            })
        );
    }

    #[test]
    fn test_legacy_record_marshals_as_enum() {
        let values = marshal(
            &[StoredArgument::Unset {
                value: 1,
                type_name: "Game.Weather".into(),
            }],
            &registry(),
        )
        .unwrap();
        assert!(matches!(&values[0], Value::Enum(e) if e.name.as_deref() == Some("Rainy")));
    }

    #[test]
    fn test_retyped_record_marshals_active_payload() {
        let argument: StoredArgument =
            ron::from_str(r#"(parameterType: Int, Int: 2, String: "Game.Weather,Game")"#).unwrap();
        assert_eq!(marshal(&[argument], &registry()).unwrap(), vec![Value::Int(2)]);
    }

    #[test]
    fn test_undeclared_ordinal_accepted() {
        let values = marshal(
            &[StoredArgument::Enum {
                value: 42,
                type_name: "Game.Weather".into(),
            }],
            &registry(),
        )
        .unwrap();
        assert!(matches!(&values[0], Value::Enum(e) if e.value == 42 && e.name.is_none()));
    }

    #[test]
    fn test_errors() {
        let registry = registry();
        assert!(matches!(
            marshal(&[StoredArgument::Int(1), StoredArgument::None], &registry),
            Err(BindingError::UnsetArgument(1))
        ));
        assert!(matches!(
            marshal(
                &[StoredArgument::Enum {
                    value: 0,
                    type_name: "Game.Mood".into()
                }],
                &registry
            ),
            Err(BindingError::UnresolvedType(name)) if name == "Game.Mood"
        ));
    }
}
