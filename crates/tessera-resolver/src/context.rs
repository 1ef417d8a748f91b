//! Configurations and their contexts.
//!
//! A context is a set of modules merged by `requires local`, forming one
//! class-visibility scope. The installed-modules flavour ([`Context`])
//! carries class routing: which module defines each local class, and which
//! context exports each remotely-visible package. The source-compilation
//! flavour ([`PathContext`]) carries the ordered local module path and the
//! set of remote contexts instead.
//!
//! Both flavours share [`Configuration`], which is immutable once built and
//! compares by value.

use crate::types::ServiceBinding;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tessera_core::{ModuleId, ModuleIdQuery};

/// A context's canonical name: `"+"` followed by its sorted view names
/// joined by `"+"`.
#[must_use]
pub(crate) fn context_name(views: &BTreeSet<Arc<str>>) -> String {
    let mut name = String::new();
    for view in views {
        name.push('+');
        name.push_str(view);
    }
    name
}

/// Common surface of the two context flavours.
pub trait ConfiguredContext: fmt::Display {
    /// The context's canonical name.
    fn name(&self) -> &str;
    /// Names of all views exposed by member modules.
    fn view_names(&self) -> &BTreeSet<Arc<str>>;
    /// Ids of the member modules.
    fn module_ids(&self) -> &BTreeSet<ModuleId>;
}

/// An installed-modules context with class-visibility maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Context {
    pub(crate) name: String,
    pub(crate) modules: BTreeSet<ModuleId>,
    pub(crate) views: BTreeSet<Arc<str>>,
    /// Class name to the member module defining it.
    pub(crate) local_classes: BTreeMap<Arc<str>, ModuleId>,
    /// Package name to the name of the context exporting it.
    pub(crate) remote_packages: BTreeMap<Arc<str>, String>,
    /// Services provided by member modules.
    pub(crate) services: BTreeMap<Arc<str>, Vec<ServiceBinding>>,
    /// View name to declared main class.
    pub(crate) main_classes: BTreeMap<Arc<str>, Arc<str>>,
}

impl Context {
    /// The module defining a class local to this context.
    #[must_use]
    pub fn local_class(&self, class: &str) -> Option<&ModuleId> {
        self.local_classes.get(class)
    }

    /// The full local-class map.
    #[must_use]
    pub fn local_classes(&self) -> &BTreeMap<Arc<str>, ModuleId> {
        &self.local_classes
    }

    /// The context exporting a package visible from this context.
    #[must_use]
    pub fn remote_package(&self, package: &str) -> Option<&str> {
        self.remote_packages.get(package).map(String::as_str)
    }

    /// The full remote-package map.
    #[must_use]
    pub fn remote_packages(&self) -> &BTreeMap<Arc<str>, String> {
        &self.remote_packages
    }

    /// Service bindings hosted by this context's members.
    #[must_use]
    pub fn services(&self) -> &BTreeMap<Arc<str>, Vec<ServiceBinding>> {
        &self.services
    }

    /// The main class a view of this context declares, if any.
    #[must_use]
    pub fn main_class(&self, view: &str) -> Option<&str> {
        self.main_classes.get(view).map(AsRef::as_ref)
    }
}

impl ConfiguredContext for Context {
    fn name(&self) -> &str {
        &self.name
    }

    fn view_names(&self) -> &BTreeSet<Arc<str>> {
        &self.views
    }

    fn module_ids(&self) -> &BTreeSet<ModuleId> {
        &self.modules
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "context {} {{", self.name)?;
        for module in &self.modules {
            writeln!(f, "  module {module}")?;
        }
        for (class, module) in &self.local_classes {
            writeln!(f, "  class {class} -> {module}")?;
        }
        for (package, context) in &self.remote_packages {
            writeln!(f, "  remote {package} -> {context}")?;
        }
        for (service, bindings) in &self.services {
            for binding in bindings {
                writeln!(
                    f,
                    "  service {service} <- {}/{}",
                    binding.provider, binding.implementation
                )?;
            }
        }
        for (view, class) in &self.main_classes {
            writeln!(f, "  main {view} -> {class}")?;
        }
        write!(f, "}}")
    }
}

/// A source-compilation context with the ordered local path and remote
/// context links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathContext {
    pub(crate) name: String,
    pub(crate) modules: BTreeSet<ModuleId>,
    pub(crate) views: BTreeSet<Arc<str>>,
    /// Member modules in `requires local` chain order, duplicates collapsed.
    pub(crate) local_path: Vec<ModuleId>,
    /// Names of contexts referred to by non-local dependences.
    pub(crate) remote_contexts: BTreeSet<String>,
}

impl PathContext {
    /// Member modules in `requires local` chain order.
    #[must_use]
    pub fn local_path(&self) -> &[ModuleId] {
        &self.local_path
    }

    /// Names of the contexts this one links to.
    #[must_use]
    pub fn remote_contexts(&self) -> &BTreeSet<String> {
        &self.remote_contexts
    }
}

impl ConfiguredContext for PathContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn view_names(&self) -> &BTreeSet<Arc<str>> {
        &self.views
    }

    fn module_ids(&self) -> &BTreeSet<ModuleId> {
        &self.modules
    }
}

impl fmt::Display for PathContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "context {} {{", self.name)?;
        if !self.local_path.is_empty() {
            write!(f, "  path")?;
            for module in &self.local_path {
                write!(f, " {module}")?;
            }
            writeln!(f)?;
        }
        for context in &self.remote_contexts {
            writeln!(f, "  remote {context}")?;
        }
        write!(f, "}}")
    }
}

/// The immutable output of the configurator: contexts plus a view-name
/// lookup, value-comparable against expected configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration<C> {
    roots: Vec<ModuleIdQuery>,
    /// Contexts sorted by name.
    contexts: Vec<C>,
    /// View name to index into `contexts`.
    by_view: BTreeMap<Arc<str>, usize>,
}

impl<C: ConfiguredContext> Configuration<C> {
    pub(crate) fn new(roots: Vec<ModuleIdQuery>, mut contexts: Vec<C>) -> Self {
        contexts.sort_by(|a, b| a.name().cmp(b.name()));
        let mut by_view = BTreeMap::new();
        for (index, context) in contexts.iter().enumerate() {
            for view in context.view_names() {
                by_view.insert(Arc::clone(view), index);
            }
        }
        Self {
            roots,
            contexts,
            by_view,
        }
    }

    /// The root queries this configuration satisfies.
    #[must_use]
    pub fn roots(&self) -> &[ModuleIdQuery] {
        &self.roots
    }

    /// All contexts, sorted by name.
    #[must_use]
    pub fn contexts(&self) -> &[C] {
        &self.contexts
    }

    /// Look up a context by its canonical name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&C> {
        self.contexts.iter().find(|c| c.name() == name)
    }

    /// The context exposing the given view.
    #[must_use]
    pub fn context_for_view(&self, view: &str) -> Option<&C> {
        self.by_view.get(view).map(|&i| &self.contexts[i])
    }

    /// Render the diagnostic listing.
    #[must_use]
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl Configuration<Context> {
    /// The main class behind a view, if its context declares one.
    #[must_use]
    pub fn main_class_of(&self, view: &str) -> Option<&str> {
        self.context_for_view(view)?.main_class(view)
    }
}

impl<C: ConfiguredContext> fmt::Display for Configuration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration roots:")?;
        for root in &self.roots {
            write!(f, " {root}")?;
        }
        writeln!(f)?;
        for context in &self.contexts {
            writeln!(f, "{context}")?;
        }
        Ok(())
    }
}
