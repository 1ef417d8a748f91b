//! Resolution results and resolver errors.

use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tessera_core::{ModuleId, ModuleIdQuery, Version};
use tessera_model::{ModuleInfo, ViewDependence};
use thiserror::Error;

/// What a resolved name is bound to: the supplying module, the view that
/// supplies the name, and the version supplied under it.
#[derive(Debug, Clone)]
pub struct Binding {
    /// The module chosen for the name.
    pub module: Arc<ModuleInfo>,
    /// Name of the view supplying the bound name.
    pub view: Arc<str>,
    /// Version supplied under the bound name (the alias version when the
    /// name is an alias, the module version otherwise).
    pub version: Option<Version>,
}

/// One service implementation selected during the service pass.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ServiceBinding {
    /// The provider module.
    pub provider: ModuleId,
    /// The implementation class.
    pub implementation: Arc<str>,
}

/// The intermediate output of resolution: a consistent choice of modules for
/// the root queries, plus the service bindings layered on top.
///
/// Every name a chosen module supplies (its own, its views', its aliases')
/// is bound, so later queries against any of those names can be checked
/// against the same choice.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub(crate) roots: Vec<ModuleIdQuery>,
    /// Chosen modules, in selection order (roots first, dependences behind
    /// their first dependent).
    pub(crate) modules: Vec<Arc<ModuleInfo>>,
    pub(crate) bindings: AHashMap<Arc<str>, Binding>,
    pub(crate) services: BTreeMap<Arc<str>, Vec<ServiceBinding>>,
}

impl Resolution {
    /// The root queries this resolution was built from.
    #[must_use]
    pub fn roots(&self) -> &[ModuleIdQuery] {
        &self.roots
    }

    /// The chosen modules, in selection order.
    #[must_use]
    pub fn modules(&self) -> &[Arc<ModuleInfo>] {
        &self.modules
    }

    /// Number of chosen modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module was chosen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// The binding for a name, if the name was bound.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Whether a name is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The module supplying a name, if the name was bound.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Arc<ModuleInfo>> {
        self.bindings.get(name).map(|b| &b.module)
    }

    /// Service bindings: interface name to selected implementations, in
    /// provider order.
    #[must_use]
    pub fn service_bindings(&self) -> &BTreeMap<Arc<str>, Vec<ServiceBinding>> {
        &self.services
    }

    /// The binding satisfying a dependence: present for the dependence's
    /// name and version-compatible with its query.
    #[must_use]
    pub fn satisfied(&self, dependence: &ViewDependence) -> Option<&Binding> {
        let binding = self.bindings.get(dependence.query.name())?;
        dependence
            .query
            .version_query()
            .matches_optional(binding.version.as_ref())
            .then_some(binding)
    }
}

fn format_chain(chain: &[ModuleId]) -> String {
    if chain.is_empty() {
        return "the root queries".to_string();
    }
    let mut out = String::new();
    for (i, id) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "{id}");
    }
    out
}

/// Errors raised by the resolver and configurator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No catalog candidate satisfied a non-optional query.
    #[error("module not found: {query} (required by {})", format_chain(.required_by))]
    ModuleNotFound {
        /// The unsatisfied query.
        query: ModuleIdQuery,
        /// Dependent chain from the root inward.
        required_by: Vec<ModuleId>,
    },

    /// An already-chosen module failed a later non-optional query.
    #[error(
        "version conflict: {query} cannot be satisfied by already-chosen {chosen} (required by {})",
        format_chain(.required_by)
    )]
    VersionConflict {
        /// The conflicting query.
        query: ModuleIdQuery,
        /// The module already chosen for the queried name.
        chosen: ModuleId,
        /// Dependent chain from the root inward.
        required_by: Vec<ModuleId>,
    },

    /// A dependence reached a view whose `permits` does not list the
    /// dependent.
    #[error("module {dependent} is not permitted to require {view}")]
    PermitsViolation {
        /// The view that refused the dependent.
        view: ModuleId,
        /// The refused dependent.
        dependent: ModuleId,
    },

    /// Two distinct modules supplied the same name during candidate
    /// enumeration.
    #[error("name {name:?} is supplied by both {first} and {second}")]
    DuplicateAlias {
        /// The contested name.
        name: String,
        /// The module already bound under the name.
        first: ModuleId,
        /// The module that also supplies it.
        second: ModuleId,
    },

    /// Two modules in one context carry the same class.
    #[error("duplicate class {class:?} in modules {first} and {second}")]
    DuplicateClass {
        /// The duplicated class name.
        class: String,
        /// The module first seen carrying the class.
        first: ModuleId,
        /// The module also carrying it.
        second: ModuleId,
    },

    /// One context imports the same package from two different contexts.
    #[error(
        "package {package:?} is exported to context {context} by both {first} and {second}"
    )]
    DuplicateExportedPackage {
        /// The duplicated package.
        package: String,
        /// The importing context.
        context: String,
        /// The context first seen exporting the package.
        first: String,
        /// The context also exporting it.
        second: String,
    },

    /// A re-export chain closed on itself.
    #[error("module dependence cycle involving {}", format_chain(.members))]
    Cycle {
        /// The modules on the cycle.
        members: Vec<ModuleId>,
    },

    /// The backtracking limit was exhausted.
    #[error("resolution abandoned after {limit} backtracking steps")]
    BacktrackLimit {
        /// The configured limit.
        limit: u64,
    },
}

impl ResolveError {
    /// Whether this is a `permits` violation. Permits violations are
    /// structural: trying other candidates or dropping optional edges cannot
    /// repair them, so the resolver propagates them out of backtracking.
    #[must_use]
    pub fn is_permits_violation(&self) -> bool {
        matches!(self, Self::PermitsViolation { .. })
    }

    /// Depth of the dependent chain carried by the error, used to keep the
    /// deepest cause when several candidates fail.
    #[must_use]
    pub(crate) fn depth(&self) -> usize {
        match self {
            Self::ModuleNotFound { required_by, .. }
            | Self::VersionConflict { required_by, .. } => required_by.len(),
            _ => 0,
        }
    }
}
