//! Module views.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tessera_core::ModuleId;

/// One exported facade of a module.
///
/// Every module has a default view whose id equals the module's own id; it
/// may declare further named views, all sharing the module's version. A view
/// carries the exported packages, the `permits` list restricting who may
/// require it, alternate ids (aliases) under which it can be requested, the
/// services it provides, and an optional main class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleView {
    pub(crate) id: ModuleId,
    pub(crate) aliases: Vec<ModuleId>,
    pub(crate) exports: BTreeSet<Arc<str>>,
    pub(crate) permits: BTreeSet<Arc<str>>,
    pub(crate) services: BTreeMap<Arc<str>, Vec<Arc<str>>>,
    pub(crate) main_class: Option<Arc<str>>,
}

impl ModuleView {
    /// The view's id. For the default view this equals the module's id.
    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    /// The view's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Alternate ids under which this view can be requested.
    #[must_use]
    pub fn aliases(&self) -> &[ModuleId] {
        &self.aliases
    }

    /// Exported package names.
    #[must_use]
    pub fn exports(&self) -> &BTreeSet<Arc<str>> {
        &self.exports
    }

    /// Names of modules allowed to require this view.
    ///
    /// An empty set places no restriction.
    #[must_use]
    pub fn permits(&self) -> &BTreeSet<Arc<str>> {
        &self.permits
    }

    /// Service provisions: interface name to implementation classes, in
    /// declaration order.
    #[must_use]
    pub fn services(&self) -> &BTreeMap<Arc<str>, Vec<Arc<str>>> {
        &self.services
    }

    /// The main class, if the view declares one.
    #[must_use]
    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Whether a module named `dependent` may require this view.
    #[must_use]
    pub fn admits(&self, dependent: &str) -> bool {
        self.permits.is_empty() || self.permits.contains(dependent)
    }
}
