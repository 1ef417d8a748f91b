//! Backtracking module resolver and configurator for the Tessera module
//! system.
//!
//! Given a [`Catalog`](tessera_catalog::Catalog) of installed module
//! definitions and a list of root [`ModuleIdQuery`]s, the resolver selects
//! one module version per logical name such that every non-optional
//! dependence is satisfied, every version constraint holds, and every
//! `permits` restriction is honored; a second pass binds service providers.
//! The configurator then partitions the resolution into contexts and
//! produces an immutable, value-comparable [`Configuration`].
//!
//! ```
//! use tessera_catalog::MemoryCatalog;
//! use tessera_core::ModuleIdQuery;
//! use tessera_model::ModuleInfoBuilder;
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog
//!     .install(ModuleInfoBuilder::new("x@1").requires("y@1").build().unwrap())
//!     .unwrap();
//! catalog
//!     .install(ModuleInfoBuilder::new("y@1").exports("y.api").build().unwrap())
//!     .unwrap();
//!
//! let roots = [ModuleIdQuery::parse("x@1").unwrap()];
//! let resolution = tessera_resolver::resolve(&catalog, &roots).unwrap();
//! let configuration = tessera_resolver::configure(&resolution).unwrap();
//! assert_eq!(configuration.contexts().len(), 2);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod configure;
mod context;
mod resolver;
mod service;
mod types;

pub use configure::{configure, configure_paths};
pub use context::{Configuration, ConfiguredContext, Context, PathContext};
pub use resolver::{Resolver, ResolverConfig, ResolverStats};
pub use types::{Binding, Resolution, ResolveError, ServiceBinding};

use tessera_catalog::Catalog;
use tessera_core::ModuleIdQuery;

/// Resolve the root queries with a default-configured [`Resolver`].
pub fn resolve(
    catalog: &dyn Catalog,
    roots: &[ModuleIdQuery],
) -> Result<Resolution, ResolveError> {
    Resolver::default().resolve(catalog, roots)
}
