//! In-memory catalog.

use crate::{Catalog, CatalogError, ServiceProvider};
use ahash::AHashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tessera_core::{ModuleId, ModuleIdQuery, Version};
use tessera_model::ModuleInfo;
use tracing::debug;

/// An entry in the name index: one module supplying a name, with the version
/// it supplies under that name.
#[derive(Debug, Clone)]
struct Supplier {
    module: ModuleId,
    version: Option<Version>,
}

/// A catalog held entirely in memory.
///
/// Modules are installed up front and the catalog is read-only afterwards.
/// Installation validates the catalog-level invariants: no two modules share
/// an id, and no name (module, view, or alias) is supplied by two distinct
/// modules.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    modules: AHashMap<ModuleId, Arc<ModuleInfo>>,
    /// Name index, each entry list sorted by supplied version descending.
    suppliers: AHashMap<Arc<str>, Vec<Supplier>>,
    /// Service name to declared implementations, in installation order.
    providers: AHashMap<Arc<str>, Vec<ServiceProvider>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install one module's metadata.
    pub fn install(&mut self, info: ModuleInfo) -> Result<(), CatalogError> {
        if self.modules.contains_key(info.id()) {
            return Err(CatalogError::DuplicateModule {
                id: info.id().clone(),
            });
        }

        let supplied = info.supplied_names();

        // A name may be supplied by several versions of one module, never by
        // two distinct modules.
        for name in &supplied {
            if let Some(entries) = self.suppliers.get(name.name.as_ref()) {
                if let Some(other) = entries.iter().find(|s| s.module.name() != info.name()) {
                    return Err(CatalogError::DuplicateAlias {
                        name: name.name.to_string(),
                        existing: other.module.clone(),
                        candidate: info.id().clone(),
                    });
                }
            }
        }

        let info = Arc::new(info);
        for name in supplied {
            let entries = self.suppliers.entry(Arc::clone(&name.name)).or_default();
            entries.push(Supplier {
                module: info.id().clone(),
                version: name.version,
            });
            entries.sort_by(compare_suppliers);
        }

        for view in info.views() {
            for (service, impls) in view.services() {
                let providers = self.providers.entry(Arc::clone(service)).or_default();
                for implementation in impls {
                    providers.push(ServiceProvider {
                        module: info.id().clone(),
                        implementation: Arc::clone(implementation),
                    });
                }
            }
        }

        debug!(module = %info.id(), "installed module");
        self.modules.insert(info.id().clone(), info);
        Ok(())
    }

    /// Install a batch of modules, stopping at the first failure.
    pub fn install_all(
        &mut self,
        modules: impl IntoIterator<Item = ModuleInfo>,
    ) -> Result<(), CatalogError> {
        for info in modules {
            self.install(info)?;
        }
        Ok(())
    }

    /// Number of installed modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Highest supplied version first; absent versions last; ties broken by
/// module id so the order is total.
fn compare_suppliers(a: &Supplier, b: &Supplier) -> Ordering {
    b.version
        .cmp(&a.version)
        .then_with(|| b.module.cmp(&a.module))
}

impl Catalog for MemoryCatalog {
    fn find_module_ids(&self, name: &str) -> Vec<ModuleId> {
        self.suppliers
            .get(name)
            .map(|entries| entries.iter().map(|s| s.module.clone()).collect())
            .unwrap_or_default()
    }

    fn find_matching(&self, query: &ModuleIdQuery) -> Vec<ModuleId> {
        self.suppliers
            .get(query.name())
            .map(|entries| {
                entries
                    .iter()
                    .filter(|s| query.version_query().matches_optional(s.version.as_ref()))
                    .map(|s| s.module.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read_module_info(&self, id: &ModuleId) -> Option<Arc<ModuleInfo>> {
        self.modules.get(id).cloned()
    }

    fn gather_providers(&self, service: &str) -> Vec<ServiceProvider> {
        self.providers.get(service).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tessera_model::ModuleInfoBuilder;

    fn module(id: &str) -> ModuleInfo {
        ModuleInfoBuilder::new(id).build().unwrap()
    }

    #[test]
    fn finds_versions_highest_first() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install_all([module("z@3"), module("z@9"), module("z@4")])
            .unwrap();

        let ids: Vec<String> = catalog
            .find_module_ids("z")
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, ["z@9", "z@4", "z@3"]);
    }

    #[test]
    fn find_matching_filters_by_query() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install_all([module("z@3"), module("z@9"), module("z@4")])
            .unwrap();

        let query = ModuleIdQuery::parse("z@<=4").unwrap();
        let ids: Vec<String> = catalog
            .find_matching(&query)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, ["z@4", "z@3"]);

        let latest = catalog.find_latest(&query).unwrap();
        assert_eq!(latest.to_string(), "z@4");
    }

    #[test]
    fn alias_matches_under_its_own_version() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install(
                ModuleInfoBuilder::new("foo@2")
                    .alias("foo-legacy@1")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let by_alias = catalog.find_matching(&ModuleIdQuery::parse("foo-legacy@1").unwrap());
        assert_eq!(by_alias.len(), 1);
        assert_eq!(by_alias[0].to_string(), "foo@2");

        // The alias version, not the module version, is what the query sees.
        let wrong = catalog.find_matching(&ModuleIdQuery::parse("foo-legacy@2").unwrap());
        assert!(wrong.is_empty());
    }

    #[test]
    fn view_names_are_candidates() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install(
                ModuleInfoBuilder::new("m@5")
                    .view("m.api", |v| v.exports("m.api"))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let ids = catalog.find_module_ids("m.api");
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].to_string(), "m@5");
    }

    #[test]
    fn rejects_duplicate_module_id() {
        let mut catalog = MemoryCatalog::new();
        catalog.install(module("x@1")).unwrap();
        let err = catalog.install(module("x@1")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateModule { .. }));
    }

    #[test]
    fn allows_multiple_versions_of_one_module() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install_all([module("x@1"), module("x@2")])
            .unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn rejects_alias_supplied_by_two_modules() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install(
                ModuleInfoBuilder::new("a@1")
                    .alias("shared@1")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let err = catalog
            .install(
                ModuleInfoBuilder::new("b@1")
                    .alias("shared@2")
                    .build()
                    .unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateAlias { .. }));
    }

    #[test]
    fn rejects_module_name_colliding_with_foreign_view() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install(
                ModuleInfoBuilder::new("a@1")
                    .view("a.api", |v| v)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let err = catalog.install(module("a.api@1")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateAlias { .. }));
    }

    #[test]
    fn gathers_providers_across_views() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .install(
                ModuleInfoBuilder::new("y@1")
                    .provides_service("app.Spi", "y.Impl")
                    .view("y.more", |v| v.provides_service("app.Spi", "y.More"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        catalog
            .install(
                ModuleInfoBuilder::new("w@1")
                    .provides_service("app.Spi", "w.Impl")
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let providers = catalog.gather_providers("app.Spi");
        let shown: Vec<(String, String)> = providers
            .iter()
            .map(|p| (p.module.to_string(), p.implementation.to_string()))
            .collect();
        assert_eq!(
            shown,
            [
                ("y@1".to_string(), "y.Impl".to_string()),
                ("y@1".to_string(), "y.More".to_string()),
                ("w@1".to_string(), "w.Impl".to_string()),
            ]
        );
        assert!(catalog.gather_providers("app.Other").is_empty());
    }
}
