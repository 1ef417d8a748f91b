//! Pre-built catalogs for resolver scenarios.

use tessera_catalog::MemoryCatalog;
use tessera_model::{ModuleInfo, ModuleInfoBuilder};

/// Pre-built test fixtures for common scenarios.
#[derive(Debug)]
pub struct Fixtures;

fn catalog(modules: impl IntoIterator<Item = ModuleInfo>) -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.install_all(modules).expect("fixture installs");
    catalog
}

impl Fixtures {
    /// A root requiring one library: `x@1 requires y@1`.
    #[must_use]
    pub fn trivial() -> MemoryCatalog {
        catalog([
            ModuleInfoBuilder::new("x@1")
                .requires("y@1")
                .public_class("x.Main")
                .main_class("x.Main")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("y@1")
                .exports("y.api")
                .public_class("y.api.Lib")
                .internal_class("y.impl.LibImpl")
                .build()
                .unwrap(),
        ])
    }

    /// A version diamond that resolves: `x@1` needs `y@2` and `w@4`, which
    /// constrain `z` to `>=3` and `<=4` out of `{3, 4, 9}`.
    #[must_use]
    pub fn diamond() -> MemoryCatalog {
        catalog([
            ModuleInfoBuilder::new("x@1")
                .requires("y@2")
                .requires("w@4")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("y@2").requires("z@>=3").build().unwrap(),
            ModuleInfoBuilder::new("w@4").requires("z@<=4").build().unwrap(),
            ModuleInfoBuilder::new("z@3").build().unwrap(),
            ModuleInfoBuilder::new("z@4").build().unwrap(),
            ModuleInfoBuilder::new("z@9").build().unwrap(),
        ])
    }

    /// The same diamond with disjoint constraints (`<=3` vs `>=4`), which
    /// cannot resolve.
    #[must_use]
    pub fn diamond_conflict() -> MemoryCatalog {
        catalog([
            ModuleInfoBuilder::new("x@1")
                .requires("y@2")
                .requires("w@4")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("y@2").requires("z@<=3").build().unwrap(),
            ModuleInfoBuilder::new("w@4").requires("z@>=4").build().unwrap(),
            ModuleInfoBuilder::new("z@3").build().unwrap(),
            ModuleInfoBuilder::new("z@4").build().unwrap(),
            ModuleInfoBuilder::new("z@9").build().unwrap(),
        ])
    }

    /// A cluster of `requires local` modules gated by permits, reached from
    /// a root outside the cluster:
    /// `ll` and `lr` both require `lc` locally, `lc` requires `lx` locally.
    #[must_use]
    pub fn local_cluster() -> MemoryCatalog {
        catalog([
            ModuleInfoBuilder::new("x@1")
                .requires("ll@1")
                .requires("lr@1")
                .public_class("x.Main")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("ll@1")
                .requires_local("lc@1")
                .public_class("ll.Left")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("lr@1")
                .requires_local("lc@1")
                .public_class("lr.Right")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("lc@1")
                .permits("ll")
                .permits("lr")
                .requires_local("lx@1")
                .public_class("lc.Center")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("lx@1")
                .permits("lc")
                .internal_class("lx.Deep")
                .build()
                .unwrap(),
        ])
    }

    /// A consumer with an optional service dependence whose only provider
    /// has an unresolvable module dependence: the provider must be rolled
    /// back and the consumer left alone.
    #[must_use]
    pub fn service_rollback() -> MemoryCatalog {
        catalog([
            ModuleInfoBuilder::new("x@1")
                .requires_optional_service("S")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("y@1")
                .requires("a@1")
                .requires_service("t")
                .provides_service("S", "syImpl")
                .build()
                .unwrap(),
        ])
    }

    /// A permits violation reached through an optional edge:
    /// `z` requires `y` and optionally `x`; `y` requires `x`; `x` permits
    /// only `y`. The optional edge from `z` to `x` must fail, not be
    /// silently dropped.
    #[must_use]
    pub fn permits_optional() -> MemoryCatalog {
        catalog([
            ModuleInfoBuilder::new("z@1")
                .requires("y@1")
                .requires_optional("x@1")
                .build()
                .unwrap(),
            ModuleInfoBuilder::new("y@1").requires("x@1").build().unwrap(),
            ModuleInfoBuilder::new("x@1").permits("y").build().unwrap(),
        ])
    }

    /// A layered catalog for benchmarks: `depth` layers of `width` modules,
    /// every module requiring all modules of the next layer, two versions
    /// each.
    #[must_use]
    pub fn layered(width: usize, depth: usize) -> MemoryCatalog {
        let mut modules = Vec::new();
        for layer in 0..depth {
            for slot in 0..width {
                for version in [1, 2] {
                    let mut builder =
                        ModuleInfoBuilder::new(&format!("m{layer}x{slot}@{version}"));
                    if layer + 1 < depth {
                        for next in 0..width {
                            builder = builder.requires(&format!("m{}x{next}", layer + 1));
                        }
                    }
                    builder = builder
                        .exports(&format!("m{layer}x{slot}.api"))
                        .public_class(&format!("m{layer}x{slot}.api.Entry{version}"));
                    modules.push(builder.build().unwrap());
                }
            }
        }
        catalog(modules)
    }
}
