//! The service pass: a second fixed-point over `requires service`.
//!
//! Starting from a completed module pass, every required service is offered
//! the providers the catalog knows about. Each provider not already resolved
//! is attempted as a synthetic root inside a journal mark; failures of any
//! kind roll the attempt back and the provider is simply not bound. Modules
//! joining the resolution may require further services, so the pass repeats
//! until the service set stabilizes.

use crate::resolver::{Edge, Engine, ResolverStats};
use crate::types::{ResolveError, ServiceBinding};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use std::sync::Arc;
use tessera_core::{ModuleId, ModuleIdQuery};
use tessera_model::ModuleInfo;
use tracing::{debug, trace};

impl Engine<'_> {
    /// Bind providers for every service required by the resolved modules,
    /// repeating until no new service dependences appear.
    pub(crate) fn resolve_services(&mut self) -> Result<(), ResolveError> {
        let mut processed: AHashSet<Arc<str>> = AHashSet::new();
        loop {
            let mut wanted: Vec<Arc<str>> = Vec::new();
            for module in &self.modules {
                for dep in module.requires_services() {
                    if !processed.contains(&dep.service) && !wanted.contains(&dep.service) {
                        wanted.push(Arc::clone(&dep.service));
                    }
                }
            }
            if wanted.is_empty() {
                return Ok(());
            }
            for service in wanted {
                processed.insert(Arc::clone(&service));
                self.bind_service(&service)?;
            }
        }
    }

    /// Try every provider of one service. At most one version per provider
    /// module name joins the resolution, highest version preferred.
    fn bind_service(&mut self, service: &Arc<str>) -> Result<(), ResolveError> {
        let providers = self.catalog.gather_providers(service);
        trace!(service = %service, declared = providers.len(), "binding service");

        // Group candidate ids by provider module name, keeping the catalog's
        // provider order across names and version-descending order within.
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut by_name: AHashMap<Arc<str>, Vec<ModuleId>> = AHashMap::new();
        for provider in &providers {
            let name = provider.module.name_arc();
            let versions = by_name.entry(Arc::clone(&name)).or_insert_with(|| {
                names.push(Arc::clone(&name));
                Vec::new()
            });
            if !versions.contains(&provider.module) {
                versions.push(provider.module.clone());
            }
        }

        for name in names {
            ResolverStats::bump(&self.stats.providers_considered);
            let mut versions = by_name.remove(&name).unwrap_or_default();
            versions.sort_by(|a, b| b.version().cmp(&a.version()));

            // A provider already in the resolution keeps its chosen version;
            // whatever that version provides is bound, nothing else.
            if let Some(binding) = self.chosen.get(name.as_ref()) {
                let module = Arc::clone(&binding.module);
                self.record_service(service, &module);
                continue;
            }

            for candidate in versions {
                let mark = self.mark();
                let root = Edge::root(ModuleIdQuery::from(candidate.clone()));
                match self.run(VecDeque::from([root])) {
                    Ok(()) => {
                        if let Some(binding) = self.chosen.get(name.as_ref()) {
                            let module = Arc::clone(&binding.module);
                            self.record_service(service, &module);
                        }
                        break;
                    }
                    Err(err @ ResolveError::BacktrackLimit { .. }) => return Err(err),
                    Err(err) => {
                        debug!(
                            service = %service,
                            provider = %candidate,
                            error = %err,
                            "service provider rolled back"
                        );
                        ResolverStats::bump(&self.stats.providers_rolled_back);
                        self.rollback_to(mark);
                    }
                }
            }
        }
        Ok(())
    }

    /// Record the provider's declared implementations of `service`.
    fn record_service(&mut self, service: &Arc<str>, module: &Arc<ModuleInfo>) {
        let entries = self.services.entry(Arc::clone(service)).or_default();
        for implementation in module.provisions_of(service) {
            let binding = ServiceBinding {
                provider: module.id().clone(),
                implementation: Arc::clone(implementation),
            };
            if !entries.contains(&binding) {
                entries.push(binding);
            }
        }
    }
}
