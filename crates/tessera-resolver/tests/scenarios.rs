//! End-to-end resolver scenarios over in-memory catalogs.

use pretty_assertions::assert_eq;
use tessera_core::ModuleIdQuery;
use tessera_resolver::{
    ConfiguredContext, ResolveError, configure, configure_paths, resolve,
};
use tessera_test_utils::fixtures::Fixtures;
use tessera_test_utils::logging::init_tracing;

fn roots(queries: &[&str]) -> Vec<ModuleIdQuery> {
    queries
        .iter()
        .map(|q| ModuleIdQuery::parse(q).unwrap())
        .collect()
}

#[test]
fn trivial_chain_forms_two_contexts() {
    init_tracing();
    let catalog = Fixtures::trivial();
    let resolution = resolve(&catalog, &roots(&["x@1"])).unwrap();
    let config = configure(&resolution).unwrap();

    let names: Vec<&str> = config.contexts().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["+x", "+y"]);

    let x = config.context("+x").unwrap();
    assert_eq!(x.local_class("x.Main").unwrap().to_string(), "x@1");
    assert_eq!(x.remote_package("y.api"), Some("+y"));

    let y = config.context("+y").unwrap();
    assert_eq!(y.local_class("y.api.Lib").unwrap().to_string(), "y@1");
    assert_eq!(y.local_class("y.impl.LibImpl").unwrap().to_string(), "y@1");
    assert!(y.remote_packages().is_empty());

    assert_eq!(config.main_class_of("x"), Some("x.Main"));
    assert_eq!(
        config.dump(),
        "configuration roots: x@1\n\
         context +x {\n\
         \x20 module x@1\n\
         \x20 class x.Main -> x@1\n\
         \x20 remote y.api -> +y\n\
         \x20 main x -> x.Main\n\
         }\n\
         context +y {\n\
         \x20 module y@1\n\
         \x20 class y.api.Lib -> y@1\n\
         \x20 class y.impl.LibImpl -> y@1\n\
         }\n"
    );

    let paths = configure_paths(&resolution).unwrap();
    let px = paths.context("+x").unwrap();
    assert_eq!(px.local_path().len(), 1);
    assert!(px.remote_contexts().contains("+y"));
    let py = paths.context("+y").unwrap();
    assert!(py.remote_contexts().is_empty());
}

#[test]
fn diamond_settles_on_shared_version() {
    init_tracing();
    let catalog = Fixtures::diamond();
    let resolution = resolve(&catalog, &roots(&["x@1"])).unwrap();

    assert_eq!(resolution.module("z").unwrap().id().to_string(), "z@4");

    let config = configure(&resolution).unwrap();
    let names: Vec<&str> = config.contexts().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["+w", "+x", "+y", "+z"]);
}

#[test]
fn diamond_with_disjoint_constraints_fails() {
    init_tracing();
    let catalog = Fixtures::diamond_conflict();
    let err = resolve(&catalog, &roots(&["x@1"])).unwrap_err();
    assert!(
        matches!(
            err,
            ResolveError::VersionConflict { .. } | ResolveError::ModuleNotFound { .. }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn local_chain_merges_into_one_context() {
    init_tracing();
    let catalog = Fixtures::local_cluster();
    let resolution = resolve(&catalog, &roots(&["x@1"])).unwrap();
    let config = configure(&resolution).unwrap();

    let names: Vec<&str> = config.contexts().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["+lc+ll+lr+lx", "+x"]);

    let merged = config.context("+lc+ll+lr+lx").unwrap();
    let members: Vec<String> = merged.module_ids().iter().map(ToString::to_string).collect();
    assert_eq!(members, ["lc@1", "ll@1", "lr@1", "lx@1"]);
    assert_eq!(merged.local_class("lc.Center").unwrap().to_string(), "lc@1");
    assert_eq!(merged.local_class("lx.Deep").unwrap().to_string(), "lx@1");

    let paths = configure_paths(&resolution).unwrap();
    let merged_path = paths.context("+lc+ll+lr+lx").unwrap();
    let chain: Vec<String> = merged_path
        .local_path()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(chain, ["ll@1", "lc@1", "lx@1", "lr@1"]);
    assert!(merged_path.remote_contexts().is_empty());

    // The outside root points at the merged context, and only at it.
    let x = paths.context("+x").unwrap();
    let remotes: Vec<&str> = x.remote_contexts().iter().map(String::as_str).collect();
    assert_eq!(remotes, ["+lc+ll+lr+lx"]);
    assert_eq!(
        paths.dump(),
        "configuration roots: x@1\n\
         context +lc+ll+lr+lx {\n\
         \x20 path ll@1 lc@1 lx@1 lr@1\n\
         }\n\
         context +x {\n\
         \x20 path x@1\n\
         \x20 remote +lc+ll+lr+lx\n\
         }\n"
    );
}

#[test]
fn failing_service_provider_leaves_consumer_alone() {
    init_tracing();
    let catalog = Fixtures::service_rollback();
    let resolution = resolve(&catalog, &roots(&["x@1"])).unwrap();

    assert_eq!(resolution.len(), 1);
    assert!(!resolution.contains("y"));
    assert!(resolution.service_bindings().is_empty());

    let config = configure(&resolution).unwrap();
    let names: Vec<&str> = config.contexts().iter().map(|c| c.name()).collect();
    assert_eq!(names, ["+x"]);
}

#[test]
fn optional_edge_does_not_bypass_permits() {
    init_tracing();
    let catalog = Fixtures::permits_optional();
    let err = resolve(&catalog, &roots(&["z@1"])).unwrap_err();
    match err {
        ResolveError::PermitsViolation { view, dependent } => {
            assert_eq!(view.to_string(), "x@1");
            assert_eq!(dependent.to_string(), "z@1");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn service_bindings_attach_to_provider_context() {
    init_tracing();
    let mut catalog = tessera_catalog::MemoryCatalog::new();
    catalog
        .install_all(
            [
                tessera_model::ModuleInfoBuilder::new("app@1").requires_service("spi.Codec"),
                tessera_model::ModuleInfoBuilder::new("codecs@1")
                    .provides_service("spi.Codec", "codecs.Utf8")
                    .provides_service("spi.Codec", "codecs.Ascii"),
            ]
            .map(|b| b.build().unwrap()),
        )
        .unwrap();

    let resolution = resolve(&catalog, &roots(&["app@1"])).unwrap();
    let config = configure(&resolution).unwrap();

    let app = config.context("+app").unwrap();
    assert!(app.services().is_empty());

    let codecs = config.context("+codecs").unwrap();
    let impls: Vec<&str> = codecs.services()["spi.Codec"]
        .iter()
        .map(|b| b.implementation.as_ref())
        .collect();
    assert_eq!(impls, ["codecs.Utf8", "codecs.Ascii"]);
}

#[test]
fn multiple_roots_resolve_left_to_right() {
    init_tracing();
    let catalog = Fixtures::diamond();
    let resolution = resolve(&catalog, &roots(&["y@2", "w@4"])).unwrap();

    let order: Vec<String> = resolution
        .modules()
        .iter()
        .map(|m| m.id().to_string())
        .collect();
    // y's z@>=3 edge picks z@9 first; w's z@<=4 forces the rollback to z@4.
    assert_eq!(order, ["y@2", "z@4", "w@4"]);
}
