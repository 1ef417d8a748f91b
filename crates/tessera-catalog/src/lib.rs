//! Catalog contract for the Tessera module system.
//!
//! A catalog is the read-only source of installed module metadata consumed by
//! the resolver. Lookups are name-based: a name may be supplied by a module
//! itself, by one of its named views, or by an alias, and candidates are
//! returned highest-version-first so repeated resolutions over the same
//! catalog are deterministic.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod memory;

pub use memory::MemoryCatalog;

use std::sync::Arc;
use tessera_core::{ModuleId, ModuleIdQuery};
use tessera_model::ModuleInfo;
use thiserror::Error;

/// One declared service implementation: the module that carries it and the
/// implementation class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProvider {
    /// The declaring module.
    pub module: ModuleId,
    /// The implementation class.
    pub implementation: Arc<str>,
}

/// Errors raised when installing module metadata into a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A module with the same id is already installed.
    #[error("module {id} is already installed")]
    DuplicateModule {
        /// The duplicated id.
        id: ModuleId,
    },

    /// Two distinct modules supply the same name (via module, view, or alias
    /// names).
    #[error("name {name:?} is supplied by both {existing} and {candidate}")]
    DuplicateAlias {
        /// The contested name.
        name: String,
        /// The module already supplying the name.
        existing: ModuleId,
        /// The module attempting to supply it as well.
        candidate: ModuleId,
    },
}

/// Read-only access to installed module metadata.
///
/// Implementations must be deterministic: repeated calls return the same
/// results in the same order. Candidate lists are ordered by the version
/// supplied under the queried name, highest first.
pub trait Catalog {
    /// Ids of every installed module supplying `name` (as its own name, a
    /// view name, or an alias name), highest supplied version first.
    fn find_module_ids(&self, name: &str) -> Vec<ModuleId>;

    /// Like [`Catalog::find_module_ids`], restricted to modules whose version
    /// under the queried name satisfies the query.
    fn find_matching(&self, query: &ModuleIdQuery) -> Vec<ModuleId> {
        self.find_module_ids(query.name())
            .into_iter()
            .filter(|id| {
                self.read_module_info(id)
                    .and_then(|info| {
                        info.view_supplying(query.name())
                            .map(|(_, version)| query.version_query().matches_optional(version))
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// The greatest satisfying candidate, if any.
    fn find_latest(&self, query: &ModuleIdQuery) -> Option<ModuleId> {
        self.find_matching(query).into_iter().next()
    }

    /// The metadata of the module with exactly the given id.
    fn read_module_info(&self, id: &ModuleId) -> Option<Arc<ModuleInfo>>;

    /// Every declared implementation of `service`, across all modules and
    /// views, in installation order.
    fn gather_providers(&self, service: &str) -> Vec<ServiceProvider>;
}
