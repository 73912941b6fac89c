// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recover a stored binding's catalog entry.
//!
//! Type names are compared on their leading segment only, so a binding
//! authored against `Game.Door,OldModule` still finds `Game.Door,Game` after
//! the type moved between modules.

use crate::catalog::CallableDescriptor;
use crate::classify::ParamKind;
use crate::listener::{ArgKind, StoredArgument};
use crate::registry::leading_segment;

/// Whether two type names refer to the same type, ignoring module qualifiers
pub fn same_type(a: &str, b: &str) -> bool {
    leading_segment(a) == leading_segment(b)
}

/// Whether a stored argument can be passed for a parameter of kind `kind`
pub fn is_compatible(argument: &StoredArgument, kind: &ParamKind) -> bool {
    match kind {
        ParamKind::Enum { type_name } => {
            argument.kind() == ArgKind::Enum
                || argument
                    .enum_type_name()
                    .is_some_and(|stored| leading_segment(stored) == type_name)
        }
        _ => argument.kind() == kind.arg_kind(),
    }
}

/// Index of the first descriptor matching owner, method name and argument shape
pub fn find_method(
    catalog: &[CallableDescriptor],
    owner_type_name: &str,
    method_name: &str,
    arguments: &[StoredArgument],
) -> Option<usize> {
    catalog.iter().position(|descriptor| {
        descriptor.arity() == arguments.len()
            && same_type(&descriptor.owner_type_name, owner_type_name)
            && descriptor.method_name == method_name
            && arguments
                .iter()
                .zip(&descriptor.parameter_kinds)
                .all(|(argument, kind)| is_compatible(argument, kind))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::error::InvocationError;
    use crate::registry::{CallOutcome, EnumDef, ParamSpec, ParamType, Receiver, TypeBuilder, TypeRegistry};
    use crate::scene::Scene;
    use crate::value::Args;

    fn noop(_: Receiver<'_>, _: Args<'_>) -> Result<CallOutcome, InvocationError> {
        Ok(CallOutcome::Done)
    }

    fn catalog() -> Vec<CallableDescriptor> {
        let mut registry = TypeRegistry::new();
        registry.register_enum(EnumDef::new("Game.Weather", "Game", ["Sunny", "Rainy", "Stormy"]));
        registry.register_type(
            TypeBuilder::new("Game.Door", "Game")
                .method("SetOpen", vec![ParamSpec::new("open", ParamType::Bool)], noop)
                .method("SetOpen", vec![ParamSpec::new("speed", ParamType::F32)], noop)
                .method("Label", vec![ParamSpec::new("text", ParamType::Str)], noop)
                .build(),
        );
        registry.register_type(
            TypeBuilder::new("Game.Sky", "Game")
                .method("SetWeather", vec![ParamSpec::new("weather", ParamType::Enum("Game.Weather".into()))], noop)
                .build(),
        );
        CatalogBuilder::new(&registry)
            .build_for_types(&["Game.Door", "Game.Sky"])
            .entries()
            .to_vec()
    }

    #[test]
    fn test_descriptor_recovers_itself() {
        let catalog = catalog();
        for (index, descriptor) in catalog.iter().enumerate() {
            let binding = descriptor.new_binding(None);
            assert_eq!(
                find_method(&catalog, &binding.owner_type_name, &binding.method_name, &binding.arguments),
                Some(index),
                "{}",
                descriptor.display_signature
            );
        }
    }

    #[test]
    fn test_module_qualifier_ignored() {
        let catalog = catalog();
        let found = find_method(&catalog, "Game.Door, OtherModule", "SetOpen", &[StoredArgument::Bool(true)]);
        assert_eq!(catalog[found.unwrap()].parameter_kinds, vec![ParamKind::Bool]);

        let found = find_method(&catalog, "Game.Door", "SetOpen", &[StoredArgument::Float(1.0)]);
        assert_eq!(catalog[found.unwrap()].parameter_kinds, vec![ParamKind::Float]);
    }

    #[test]
    fn test_shape_mismatch_not_found() {
        let catalog = catalog();
        assert_eq!(find_method(&catalog, "Game.Door", "SetOpen", &[StoredArgument::Int(1)]), None);
        assert_eq!(find_method(&catalog, "Game.Door", "SetOpen", &[]), None);
        assert_eq!(find_method(&catalog, "Game.Door", "Missing", &[StoredArgument::Bool(true)]), None);
        assert_eq!(find_method(&catalog, "Game.Gate", "SetOpen", &[StoredArgument::Bool(true)]), None);
    }

    #[test]
    fn test_legacy_enum_record_matches() {
        let catalog = catalog();
        let legacy = StoredArgument::Unset {
            value: 1,
            type_name: "Game.Weather,Game".into(),
        };
        assert!(find_method(&catalog, "Game.Sky", "SetWeather", &[legacy]).is_some());

        let other = StoredArgument::Unset {
            value: 1,
            type_name: "Game.Mood".into(),
        };
        assert_eq!(find_method(&catalog, "Game.Sky", "SetWeather", &[other]), None);
        assert_eq!(find_method(&catalog, "Game.Sky", "SetWeather", &[StoredArgument::None]), None);
    }

    #[test]
    fn test_enum_type_name_matches_any_kind() {
        let catalog = catalog();
        let retyped: StoredArgument =
            ron::from_str(r#"(parameterType: Int, Int: 2, String: "Game.Weather,Game")"#).unwrap();
        assert!(find_method(&catalog, "Game.Sky", "SetWeather", std::slice::from_ref(&retyped)).is_some());
        assert_eq!(find_method(&catalog, "Game.Door", "SetOpen", &[retyped]), None);

        let text = StoredArgument::String("Game.Weather".into());
        assert!(find_method(&catalog, "Game.Sky", "SetWeather", &[text]).is_some());

        let plain: StoredArgument = ron::from_str("(parameterType: Int, Int: 2)").unwrap();
        assert_eq!(find_method(&catalog, "Game.Sky", "SetWeather", &[plain]), None);
    }

    #[test]
    fn test_duplicate_components_resolve_to_first() {
        let mut registry = TypeRegistry::new();
        registry.register_type(
            TypeBuilder::new("Game.Door", "Game")
                .method("SetOpen", vec![ParamSpec::new("open", ParamType::Bool)], noop)
                .build(),
        );
        let mut scene = Scene::new();
        let gate = scene.spawn("Gate");
        scene.attach(gate, "Game.Door", ());
        scene.attach(gate, "Game.Door", ());

        let catalog = CatalogBuilder::new(&registry).build(&scene, &[gate]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0), catalog.get(1));
        assert_eq!(
            find_method(catalog.entries(), "Game.Door", "SetOpen", &[StoredArgument::Bool(true)]),
            Some(0)
        );
    }

    #[test]
    fn test_is_compatible() {
        let weather = ParamKind::Enum { type_name: "Game.Weather".into() };
        assert!(is_compatible(
            &StoredArgument::Enum { value: 0, type_name: String::new() },
            &weather
        ));
        assert!(!is_compatible(&StoredArgument::Int(0), &weather));
        assert!(is_compatible(
            &StoredArgument::Object(None),
            &ParamKind::Object { type_name: "GameObject".into() }
        ));
        assert!(!is_compatible(&StoredArgument::String("x".into()), &ParamKind::Bool));
    }
}
