//! Proptest strategies for Tessera value types.

use proptest::prelude::*;
use tessera_core::{ModuleId, Version};

/// Strategy for version strings the parser accepts: one to four numeric
/// components, optionally followed by an alphanumeric tail.
pub fn version_string() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(0u64..30, 1..4),
        prop::option::of("[a-z]{1,5}"),
    )
        .prop_map(|(numbers, tail)| {
            let mut s = numbers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".");
            if let Some(tail) = tail {
                s.push('-');
                s.push_str(&tail);
            }
            s
        })
}

/// Strategy for parsed [`Version`] values.
pub fn arb_version() -> impl Strategy<Value = Version> {
    version_string().prop_map(|s| Version::parse(&s).expect("generated version parses"))
}

/// Strategy for valid module names.
pub fn module_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}(\\.[a-z][a-z0-9]{0,6}){0,2}"
}

/// Strategy for module ids with a version.
pub fn arb_module_id() -> impl Strategy<Value = ModuleId> {
    (module_name(), version_string()).prop_map(|(name, version)| {
        ModuleId::parse(&format!("{name}@{version}")).expect("generated id parses")
    })
}
