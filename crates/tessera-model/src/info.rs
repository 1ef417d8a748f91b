//! Module metadata.

use crate::dependence::{ServiceDependence, ViewDependence};
use crate::view::ModuleView;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tessera_core::{ModuleId, Version};

/// The immutable description of one installed module.
///
/// Produced by [`crate::ModuleInfoBuilder`] (or a catalog reading installed
/// metadata) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub(crate) id: ModuleId,
    /// All views; the default view is first.
    pub(crate) views: Vec<ModuleView>,
    pub(crate) requires: SmallVec<[ViewDependence; 8]>,
    pub(crate) requires_services: SmallVec<[ServiceDependence; 4]>,
    pub(crate) public_classes: BTreeSet<Arc<str>>,
    pub(crate) internal_classes: BTreeSet<Arc<str>>,
}

/// One name a module answers to, with the version it supplies under that
/// name and the view that supplies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppliedName {
    /// The supplied name (module, view, or alias name).
    pub name: Arc<str>,
    /// The version offered under that name. For module and view names this
    /// is the module's version; for aliases, the alias's declared version.
    pub version: Option<Version>,
    /// The name of the view that supplies this name.
    pub view: Arc<str>,
}

impl ModuleInfo {
    /// The module's id.
    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// The module's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// The module's version.
    #[must_use]
    pub fn version(&self) -> Option<&Version> {
        self.id.version()
    }

    /// The default view; its id equals the module's id.
    #[must_use]
    pub fn default_view(&self) -> &ModuleView {
        &self.views[0]
    }

    /// All views, default first.
    #[must_use]
    pub fn views(&self) -> &[ModuleView] {
        &self.views
    }

    /// Look up a view by its name.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<&ModuleView> {
        self.views.iter().find(|v| v.name() == name)
    }

    /// Module dependences, in declaration order.
    #[must_use]
    pub fn requires(&self) -> &[ViewDependence] {
        &self.requires
    }

    /// Service dependences, in declaration order.
    #[must_use]
    pub fn requires_services(&self) -> &[ServiceDependence] {
        &self.requires_services
    }

    /// Public (exported) class names.
    #[must_use]
    pub fn public_classes(&self) -> &BTreeSet<Arc<str>> {
        &self.public_classes
    }

    /// Internal class names.
    #[must_use]
    pub fn internal_classes(&self) -> &BTreeSet<Arc<str>> {
        &self.internal_classes
    }

    /// All classes the module carries, public then internal.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<str>> {
        self.public_classes.iter().chain(self.internal_classes.iter())
    }

    /// Every name this module answers to: its own name, the names of its
    /// views, and the names of its aliases.
    #[must_use]
    pub fn supplied_names(&self) -> Vec<SuppliedName> {
        let mut names = Vec::new();
        for view in &self.views {
            let view_name: Arc<str> = view.id.name_arc();
            names.push(SuppliedName {
                name: view.id.name_arc(),
                version: view.id.version().cloned(),
                view: Arc::clone(&view_name),
            });
            for alias in &view.aliases {
                names.push(SuppliedName {
                    name: alias.name_arc(),
                    version: alias.version().cloned(),
                    view: Arc::clone(&view_name),
                });
            }
        }
        names
    }

    /// The view supplying `name`, with the version supplied under it.
    #[must_use]
    pub fn view_supplying(&self, name: &str) -> Option<(&ModuleView, Option<&Version>)> {
        for view in &self.views {
            if view.name() == name {
                return Some((view, view.id.version()));
            }
            for alias in &view.aliases {
                if alias.name() == name {
                    return Some((view, alias.version()));
                }
            }
        }
        None
    }

    /// Implementations of `service` declared by any view, in view order then
    /// declaration order.
    pub fn provisions_of(&self, service: &str) -> impl Iterator<Item = &Arc<str>> {
        self.views
            .iter()
            .filter_map(move |v| v.services.get(service))
            .flatten()
    }

    /// Whether any view provides `service`.
    #[must_use]
    pub fn provides(&self, service: &str) -> bool {
        self.views.iter().any(|v| v.services.contains_key(service))
    }
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ModuleInfoBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn supplied_names_cover_module_views_and_aliases() {
        let info = ModuleInfoBuilder::new("foo@2")
            .alias("foo-legacy@1")
            .view("foo.ext", |v| v.alias("foo-extra@2"))
            .build()
            .unwrap();

        let names: Vec<String> = info
            .supplied_names()
            .iter()
            .map(|n| n.name.to_string())
            .collect();
        assert_eq!(names, ["foo", "foo-legacy", "foo.ext", "foo-extra"]);
    }

    #[test]
    fn view_supplying_resolves_alias_version() {
        let info = ModuleInfoBuilder::new("foo@2")
            .alias("foo-legacy@1")
            .build()
            .unwrap();

        let (view, version) = info.view_supplying("foo-legacy").unwrap();
        assert_eq!(view.name(), "foo");
        assert_eq!(version.unwrap().to_string(), "1");

        let (_, own) = info.view_supplying("foo").unwrap();
        assert_eq!(own.unwrap().to_string(), "2");
    }

    #[test]
    fn provisions_follow_view_order() {
        let info = ModuleInfoBuilder::new("p@1")
            .provides_service("app.Spi", "p.First")
            .view("p.more", |v| v.provides_service("app.Spi", "p.Second"))
            .build()
            .unwrap();

        let impls: Vec<String> = info
            .provisions_of("app.Spi")
            .map(ToString::to_string)
            .collect();
        assert_eq!(impls, ["p.First", "p.Second"]);
        assert!(info.provides("app.Spi"));
        assert!(!info.provides("app.Other"));
    }
}
