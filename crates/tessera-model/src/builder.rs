//! Builder for [`ModuleInfo`] values.
//!
//! The builder is the in-process source of module metadata: callers chain
//! declarations in source order and `build()` validates the model invariants
//! before producing an immutable [`ModuleInfo`].

use crate::dependence::{Modifiers, ServiceDependence, ViewDependence};
use crate::info::ModuleInfo;
use crate::view::ModuleView;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tessera_core::{ModuleId, ModuleIdQuery, ParseError, is_valid_module_name};

/// Errors raised while building module metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An id, query, or name failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A view was declared with the module's own name.
    #[error("module {module} declares itself as a view")]
    SelfView {
        /// The offending module.
        module: ModuleId,
    },

    /// Two views or aliases of one module share a name.
    #[error("module {module} supplies the name {name:?} more than once")]
    DuplicateName {
        /// The declaring module.
        module: ModuleId,
        /// The duplicated name.
        name: String,
    },

    /// A class name was not a dotted identifier sequence.
    #[error("invalid class name: {name:?}")]
    InvalidClassName {
        /// The offending name.
        name: String,
    },

    /// An exported package name was not a dotted identifier sequence.
    #[error("invalid package name: {name:?}")]
    InvalidPackageName {
        /// The offending name.
        name: String,
    },

    /// A service interface name was not a dotted identifier sequence.
    #[error("invalid service name: {name:?}")]
    InvalidServiceName {
        /// The offending name.
        name: String,
    },
}

#[derive(Debug, Clone, Default)]
struct ViewParts {
    aliases: Vec<String>,
    exports: Vec<String>,
    permits: Vec<String>,
    services: Vec<(String, String)>,
    main_class: Option<String>,
}

/// Accumulates the declarations of one named view.
#[derive(Debug, Clone, Default)]
pub struct ViewBuilder {
    parts: ViewParts,
}

impl ViewBuilder {
    /// Add an alternate id under which this view can be requested.
    #[must_use]
    pub fn alias(mut self, id: &str) -> Self {
        self.parts.aliases.push(id.to_string());
        self
    }

    /// Export a package from this view.
    #[must_use]
    pub fn exports(mut self, package: &str) -> Self {
        self.parts.exports.push(package.to_string());
        self
    }

    /// Permit a module to require this view.
    #[must_use]
    pub fn permits(mut self, module: &str) -> Self {
        self.parts.permits.push(module.to_string());
        self
    }

    /// Declare a service implementation provided by this view.
    #[must_use]
    pub fn provides_service(mut self, service: &str, implementation: &str) -> Self {
        self.parts
            .services
            .push((service.to_string(), implementation.to_string()));
        self
    }

    /// Declare the view's main class.
    #[must_use]
    pub fn main_class(mut self, class: &str) -> Self {
        self.parts.main_class = Some(class.to_string());
        self
    }
}

/// Chained builder producing a validated [`ModuleInfo`].
///
/// # Examples
///
/// ```
/// use tessera_model::ModuleInfoBuilder;
///
/// let info = ModuleInfoBuilder::new("x@1")
///     .requires("y@1")
///     .requires_local("lc")
///     .exports("x.api")
///     .public_class("x.api.Main")
///     .build()
///     .unwrap();
/// assert_eq!(info.name(), "x");
/// assert_eq!(info.requires().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ModuleInfoBuilder {
    id: String,
    requires: Vec<(Modifiers, String)>,
    requires_services: Vec<(bool, String)>,
    default_view: ViewParts,
    views: Vec<(String, ViewParts)>,
    public_classes: Vec<String>,
    internal_classes: Vec<String>,
}

impl ModuleInfoBuilder {
    /// Start building the module identified by `id` (`name` or `name@version`).
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            requires: Vec::new(),
            requires_services: Vec::new(),
            default_view: ViewParts::default(),
            views: Vec::new(),
            public_classes: Vec::new(),
            internal_classes: Vec::new(),
        }
    }

    /// Declare a module dependence with explicit modifiers.
    #[must_use]
    pub fn requires_with(mut self, modifiers: Modifiers, query: &str) -> Self {
        self.requires.push((modifiers, query.to_string()));
        self
    }

    /// Declare a plain module dependence.
    #[must_use]
    pub fn requires(self, query: &str) -> Self {
        self.requires_with(Modifiers::NONE, query)
    }

    /// Declare a `requires public` dependence.
    #[must_use]
    pub fn requires_public(self, query: &str) -> Self {
        self.requires_with(Modifiers::PUBLIC, query)
    }

    /// Declare a `requires optional` dependence.
    #[must_use]
    pub fn requires_optional(self, query: &str) -> Self {
        self.requires_with(Modifiers::OPTIONAL, query)
    }

    /// Declare a `requires local` dependence.
    #[must_use]
    pub fn requires_local(self, query: &str) -> Self {
        self.requires_with(Modifiers::LOCAL, query)
    }

    /// Declare a `requires service` dependence.
    #[must_use]
    pub fn requires_service(mut self, service: &str) -> Self {
        self.requires_services.push((false, service.to_string()));
        self
    }

    /// Declare a `requires optional service` dependence.
    #[must_use]
    pub fn requires_optional_service(mut self, service: &str) -> Self {
        self.requires_services.push((true, service.to_string()));
        self
    }

    /// Add an alias to the default view.
    #[must_use]
    pub fn alias(mut self, id: &str) -> Self {
        self.default_view.aliases.push(id.to_string());
        self
    }

    /// Export a package from the default view.
    #[must_use]
    pub fn exports(mut self, package: &str) -> Self {
        self.default_view.exports.push(package.to_string());
        self
    }

    /// Permit a module to require the default view.
    #[must_use]
    pub fn permits(mut self, module: &str) -> Self {
        self.default_view.permits.push(module.to_string());
        self
    }

    /// Declare a service implementation provided by the default view.
    #[must_use]
    pub fn provides_service(mut self, service: &str, implementation: &str) -> Self {
        self.default_view
            .services
            .push((service.to_string(), implementation.to_string()));
        self
    }

    /// Declare the default view's main class.
    #[must_use]
    pub fn main_class(mut self, class: &str) -> Self {
        self.default_view.main_class = Some(class.to_string());
        self
    }

    /// Declare an additional named view.
    #[must_use]
    pub fn view(mut self, name: &str, f: impl FnOnce(ViewBuilder) -> ViewBuilder) -> Self {
        let built = f(ViewBuilder::default());
        self.views.push((name.to_string(), built.parts));
        self
    }

    /// Add a public (exported) class.
    #[must_use]
    pub fn public_class(mut self, class: &str) -> Self {
        self.public_classes.push(class.to_string());
        self
    }

    /// Add an internal class.
    #[must_use]
    pub fn internal_class(mut self, class: &str) -> Self {
        self.internal_classes.push(class.to_string());
        self
    }

    /// Validate all declarations and produce the module metadata.
    pub fn build(self) -> Result<ModuleInfo, ModelError> {
        let id = ModuleId::parse(&self.id)?;

        let mut requires: SmallVec<[ViewDependence; 8]> = SmallVec::new();
        for (modifiers, query) in &self.requires {
            requires.push(ViewDependence::new(
                *modifiers,
                ModuleIdQuery::parse(query)?,
            ));
        }

        let mut requires_services: SmallVec<[ServiceDependence; 4]> = SmallVec::new();
        for (optional, service) in &self.requires_services {
            requires_services.push(ServiceDependence::new(
                *optional,
                validate_service(service)?,
            ));
        }

        let mut views = Vec::with_capacity(1 + self.views.len());
        views.push(make_view(id.clone(), &self.default_view)?);
        for (name, parts) in &self.views {
            if name == id.name() {
                return Err(ModelError::SelfView { module: id });
            }
            let view_id = ModuleId::new(name, id.version().cloned())?;
            views.push(make_view(view_id, parts)?);
        }

        // Every name the module supplies must be unique within the module.
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for view in &views {
            for name in std::iter::once(view.id.name())
                .chain(view.aliases.iter().map(ModuleId::name))
            {
                if !seen.insert(name) {
                    return Err(ModelError::DuplicateName {
                        module: id,
                        name: name.to_string(),
                    });
                }
            }
        }

        let public_classes = validate_classes(&self.public_classes)?;
        let internal_classes = validate_classes(&self.internal_classes)?;

        Ok(ModuleInfo {
            id,
            views,
            requires,
            requires_services,
            public_classes,
            internal_classes,
        })
    }
}

fn make_view(id: ModuleId, parts: &ViewParts) -> Result<ModuleView, ModelError> {
    let mut aliases = Vec::with_capacity(parts.aliases.len());
    for alias in &parts.aliases {
        aliases.push(ModuleId::parse(alias)?);
    }

    let mut exports = BTreeSet::new();
    for package in &parts.exports {
        if !is_valid_module_name(package) {
            return Err(ModelError::InvalidPackageName {
                name: package.clone(),
            });
        }
        exports.insert(Arc::from(package.as_str()));
    }

    let mut permits = BTreeSet::new();
    for module in &parts.permits {
        if !is_valid_module_name(module) {
            return Err(ModelError::Parse(ParseError::InvalidModuleName {
                input: module.clone(),
            }));
        }
        permits.insert(Arc::from(module.as_str()));
    }

    // Service provisions keep declaration order per service; repeated
    // implementations collapse to the first occurrence.
    let mut services: BTreeMap<Arc<str>, Vec<Arc<str>>> = BTreeMap::new();
    for (service, implementation) in &parts.services {
        let service = validate_service(service)?;
        let implementation = validate_class(implementation)?;
        let impls = services.entry(service).or_default();
        if !impls.contains(&implementation) {
            impls.push(implementation);
        }
    }

    let main_class = match &parts.main_class {
        Some(class) => Some(validate_class(class)?),
        None => None,
    };

    Ok(ModuleView {
        id,
        aliases,
        exports,
        permits,
        services,
        main_class,
    })
}

fn validate_class(name: &str) -> Result<Arc<str>, ModelError> {
    if !is_valid_module_name(name) {
        return Err(ModelError::InvalidClassName {
            name: name.to_string(),
        });
    }
    Ok(Arc::from(name))
}

fn validate_service(name: &str) -> Result<Arc<str>, ModelError> {
    if !is_valid_module_name(name) {
        return Err(ModelError::InvalidServiceName {
            name: name.to_string(),
        });
    }
    Ok(Arc::from(name))
}

fn validate_classes(names: &[String]) -> Result<BTreeSet<Arc<str>>, ModelError> {
    let mut set = BTreeSet::new();
    for name in names {
        set.insert(validate_class(name)?);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_full_module() {
        let info = ModuleInfoBuilder::new("acme.app@2.1")
            .requires("acme.lib@>=1")
            .requires_public("acme.api@2")
            .requires_optional("acme.extras")
            .requires_local("acme.native")
            .requires_service("acme.spi.Codec")
            .exports("acme.app")
            .permits("acme.tools")
            .alias("acme.app-compat@1")
            .provides_service("acme.spi.Codec", "acme.app.DefaultCodec")
            .main_class("acme.app.Main")
            .public_class("acme.app.Main")
            .internal_class("acme.app.Helper")
            .view("acme.app.devel", |v| {
                v.exports("acme.app.devel").permits("acme.testkit")
            })
            .build()
            .unwrap();

        assert_eq!(info.id().to_string(), "acme.app@2.1");
        assert_eq!(info.views().len(), 2);
        assert_eq!(info.default_view().name(), "acme.app");
        assert_eq!(info.requires().len(), 4);
        assert_eq!(info.requires_services().len(), 1);
        assert_eq!(info.default_view().main_class(), Some("acme.app.Main"));
    }

    #[test]
    fn named_views_share_the_module_version() {
        let info = ModuleInfoBuilder::new("m@3")
            .view("m.extra", |v| v)
            .build()
            .unwrap();
        let view = info.view("m.extra").unwrap();
        assert_eq!(view.id().version().unwrap().to_string(), "3");
    }

    #[test]
    fn rejects_self_view() {
        let err = ModuleInfoBuilder::new("m@1")
            .view("m", |v| v)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::SelfView { .. }));
    }

    #[test]
    fn rejects_duplicate_view_names() {
        let err = ModuleInfoBuilder::new("m@1")
            .view("m.a", |v| v)
            .view("m.a", |v| v)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateName { .. }));
    }

    #[test]
    fn rejects_alias_shadowing_a_view() {
        let err = ModuleInfoBuilder::new("m@1")
            .alias("m.a@1")
            .view("m.a", |v| v)
            .build()
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateName { .. }));
    }

    #[test]
    fn rejects_bad_names() {
        assert!(ModuleInfoBuilder::new("m@1").exports("1bad").build().is_err());
        assert!(
            ModuleInfoBuilder::new("m@1")
                .public_class("not a class")
                .build()
                .is_err()
        );
        assert!(ModuleInfoBuilder::new("@1").build().is_err());
    }

    #[test]
    fn repeated_service_implementation_collapses() {
        let info = ModuleInfoBuilder::new("m@1")
            .provides_service("app.Spi", "m.A")
            .provides_service("app.Spi", "m.B")
            .provides_service("app.Spi", "m.A")
            .build()
            .unwrap();
        let impls: Vec<String> = info
            .provisions_of("app.Spi")
            .map(ToString::to_string)
            .collect();
        assert_eq!(impls, ["m.A", "m.B"]);
    }
}
