//! The module-pass resolver.
//!
//! Resolution explores the dependence graph with an explicit worklist.
//! Whenever a name is unbound and the catalog offers candidates, the engine
//! opens a choice frame recording the remaining candidates, the pending
//! worklist, and an undo-journal mark. A downstream contradiction unwinds to
//! the most recent frame with untried candidates, restores the journalled
//! state, and continues with the next candidate; an optional edge whose
//! candidates are all exhausted is abandoned instead of failing.
//!
//! Choosing a module binds every name it supplies (its own, its views', its
//! aliases'), so any later edge against one of those names is checked against
//! the same choice.

use crate::types::{Binding, Resolution, ResolveError, ServiceBinding};
use ahash::AHashMap;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tessera_catalog::Catalog;
use tessera_core::{ModuleId, ModuleIdQuery};
use tessera_model::{Modifiers, ModuleInfo, ModuleView};
use tracing::{debug, trace};

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Name of the module that is universally permitted as a dependent,
    /// regardless of `permits` lists. `None` enforces permits everywhere.
    pub base_module: Option<Arc<str>>,
    /// Upper bound on backtracking steps per resolution.
    pub max_backtracks: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_module: Some(Arc::from("base")),
            max_backtracks: 100_000,
        }
    }
}

/// Resolver statistics for monitoring and tests.
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Candidate modules entered.
    pub candidates_tried: AtomicU64,
    /// Backtracking steps taken.
    pub backtracks: AtomicU64,
    /// Candidate lookups against the catalog.
    pub catalog_queries: AtomicU64,
    /// Service provider modules considered.
    pub providers_considered: AtomicU64,
    /// Service provider attempts rolled back.
    pub providers_rolled_back: AtomicU64,
}

impl ResolverStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// The module resolver.
#[derive(Debug, Default)]
pub struct Resolver {
    config: ResolverConfig,
    stats: ResolverStats,
}

impl Resolver {
    /// Create a resolver with the given configuration.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            stats: ResolverStats::default(),
        }
    }

    /// Resolver statistics, accumulated across calls.
    #[must_use]
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Resolve the root queries against the catalog: the module pass
    /// followed by the service pass.
    pub fn resolve(
        &self,
        catalog: &dyn Catalog,
        roots: &[ModuleIdQuery],
    ) -> Result<Resolution, ResolveError> {
        let mut engine = Engine::new(catalog, &self.config, &self.stats);

        let worklist: VecDeque<Edge> = roots.iter().cloned().map(Edge::root).collect();
        engine.run(worklist)?;
        debug!(modules = engine.modules.len(), "module pass complete");

        engine.resolve_services()?;
        debug!(
            modules = engine.modules.len(),
            services = engine.services.len(),
            "service pass complete"
        );

        Ok(engine.into_resolution(roots.to_vec()))
    }
}

/// A pending dependence edge on the worklist.
#[derive(Debug, Clone)]
pub(crate) struct Edge {
    modifiers: Modifiers,
    query: ModuleIdQuery,
    /// Dependent chain from the root inward; empty for synthetic roots.
    chain: Vec<ModuleId>,
}

impl Edge {
    /// A synthetic root edge: no modifiers, no dependent.
    pub(crate) fn root(query: ModuleIdQuery) -> Self {
        Self {
            modifiers: Modifiers::NONE,
            query,
            chain: Vec::new(),
        }
    }
}

/// One open choice point.
#[derive(Debug)]
struct Frame {
    edge: Edge,
    /// Candidates not yet tried.
    candidates: VecDeque<ModuleId>,
    /// The worklist as it stood after popping the edge.
    worklist: VecDeque<Edge>,
    /// Journal mark taken before the first candidate was entered.
    mark: usize,
}

/// Undo-journal record.
#[derive(Debug)]
enum Undo {
    Unbind(Arc<str>),
    PopModule,
}

/// Mutable resolution state shared by the module and service passes.
pub(crate) struct Engine<'a> {
    pub(crate) catalog: &'a dyn Catalog,
    config: &'a ResolverConfig,
    pub(crate) stats: &'a ResolverStats,
    pub(crate) chosen: AHashMap<Arc<str>, Binding>,
    pub(crate) modules: Vec<Arc<ModuleInfo>>,
    journal: Vec<Undo>,
    pub(crate) services: BTreeMap<Arc<str>, Vec<ServiceBinding>>,
    backtracks: u64,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(
        catalog: &'a dyn Catalog,
        config: &'a ResolverConfig,
        stats: &'a ResolverStats,
    ) -> Self {
        Self {
            catalog,
            config,
            stats,
            chosen: AHashMap::new(),
            modules: Vec::new(),
            journal: Vec::new(),
            services: BTreeMap::new(),
            backtracks: 0,
        }
    }

    pub(crate) fn into_resolution(self, roots: Vec<ModuleIdQuery>) -> Resolution {
        Resolution {
            roots,
            modules: self.modules,
            bindings: self.chosen,
            services: self.services,
        }
    }

    /// Current journal position, for later rollback.
    pub(crate) fn mark(&self) -> usize {
        self.journal.len()
    }

    /// Undo every journalled mutation past `mark`.
    pub(crate) fn rollback_to(&mut self, mark: usize) {
        while self.journal.len() > mark {
            match self.journal.pop() {
                Some(Undo::Unbind(name)) => {
                    self.chosen.remove(&name);
                }
                Some(Undo::PopModule) => {
                    self.modules.pop();
                }
                None => break,
            }
        }
    }

    /// Drive the worklist to completion, backtracking on contradiction.
    pub(crate) fn run(&mut self, mut worklist: VecDeque<Edge>) -> Result<(), ResolveError> {
        let mut frames: Vec<Frame> = Vec::new();
        loop {
            let Some(edge) = worklist.pop_front() else {
                return Ok(());
            };
            if let Err(err) = self.step(&edge, &mut worklist, &mut frames) {
                self.backtrack(err, &mut worklist, &mut frames)?;
            }
        }
    }

    /// Process one edge: verify it against an existing binding, or open a
    /// choice frame and enter the first candidate.
    fn step(
        &mut self,
        edge: &Edge,
        worklist: &mut VecDeque<Edge>,
        frames: &mut Vec<Frame>,
    ) -> Result<(), ResolveError> {
        let name = edge.query.name();

        if let Some(binding) = self.chosen.get(name) {
            if !edge
                .query
                .version_query()
                .matches_optional(binding.version.as_ref())
            {
                if edge.modifiers.optional {
                    trace!(query = %edge.query, chosen = %binding.module.id(), "optional edge unsatisfied by existing choice");
                    return Ok(());
                }
                return Err(ResolveError::VersionConflict {
                    query: edge.query.clone(),
                    chosen: binding.module.id().clone(),
                    required_by: edge.chain.clone(),
                });
            }
            let view = binding
                .module
                .view(&binding.view)
                .unwrap_or_else(|| binding.module.default_view());
            self.check_permits(view, edge)?;
            trace!(query = %edge.query, chosen = %binding.module.id(), "edge satisfied by existing choice");
            return Ok(());
        }

        ResolverStats::bump(&self.stats.catalog_queries);
        let candidates: VecDeque<ModuleId> = self.catalog.find_matching(&edge.query).into();
        if candidates.is_empty() {
            if edge.modifiers.optional {
                trace!(query = %edge.query, "optional edge has no candidates");
                return Ok(());
            }
            return Err(ResolveError::ModuleNotFound {
                query: edge.query.clone(),
                required_by: edge.chain.clone(),
            });
        }

        let mut frame = Frame {
            edge: edge.clone(),
            candidates,
            worklist: worklist.clone(),
            mark: self.mark(),
        };
        let first = frame.candidates.pop_front().expect("non-empty candidates");
        frames.push(frame);
        self.enter_candidate(&first, edge, worklist)
    }

    /// Bind a candidate module and queue its dependences.
    fn enter_candidate(
        &mut self,
        id: &ModuleId,
        edge: &Edge,
        worklist: &mut VecDeque<Edge>,
    ) -> Result<(), ResolveError> {
        ResolverStats::bump(&self.stats.candidates_tried);

        let Some(info) = self.catalog.read_module_info(id) else {
            // The catalog listed a candidate it cannot read back.
            return Err(ResolveError::ModuleNotFound {
                query: edge.query.clone(),
                required_by: edge.chain.clone(),
            });
        };
        let Some((view, _)) = info.view_supplying(edge.query.name()) else {
            return Err(ResolveError::ModuleNotFound {
                query: edge.query.clone(),
                required_by: edge.chain.clone(),
            });
        };
        self.check_permits(view, edge)?;

        self.bind(&info, &edge.chain)?;
        trace!(module = %info.id(), query = %edge.query, "candidate selected");

        let mut chain = edge.chain.clone();
        chain.push(info.id().clone());

        // Non-optional dependences resolve first; optional ones last.
        let ordered = info
            .requires()
            .iter()
            .filter(|d| !d.modifiers.optional)
            .chain(info.requires().iter().filter(|d| d.modifiers.optional));
        let block: Vec<Edge> = ordered
            .map(|d| Edge {
                modifiers: d.modifiers,
                query: d.query.clone(),
                chain: chain.clone(),
            })
            .collect();
        for child in block.into_iter().rev() {
            worklist.push_front(child);
        }
        Ok(())
    }

    /// Bind every name the module supplies, journalling each binding.
    fn bind(&mut self, info: &Arc<ModuleInfo>, chain: &[ModuleId]) -> Result<(), ResolveError> {
        for supplied in info.supplied_names() {
            if let Some(existing) = self.chosen.get(&supplied.name) {
                // Another module (or version) already owns this name; the
                // candidate cannot join.
                let err = if existing.module.name() == info.name() {
                    ResolveError::VersionConflict {
                        query: ModuleIdQuery::from(info.id().clone()),
                        chosen: existing.module.id().clone(),
                        required_by: chain.to_vec(),
                    }
                } else {
                    ResolveError::DuplicateAlias {
                        name: supplied.name.to_string(),
                        first: existing.module.id().clone(),
                        second: info.id().clone(),
                    }
                };
                return Err(err);
            }
            self.chosen.insert(
                Arc::clone(&supplied.name),
                Binding {
                    module: Arc::clone(info),
                    view: supplied.view,
                    version: supplied.version,
                },
            );
            self.journal.push(Undo::Unbind(supplied.name));
        }
        self.modules.push(Arc::clone(info));
        self.journal.push(Undo::PopModule);
        Ok(())
    }

    /// Enforce the dependee view's `permits` against the edge's dependent.
    ///
    /// Synthetic roots have no dependent and are always admitted, as is the
    /// configured base module.
    fn check_permits(&self, view: &ModuleView, edge: &Edge) -> Result<(), ResolveError> {
        let Some(dependent) = edge.chain.last() else {
            return Ok(());
        };
        if view.admits(dependent.name()) {
            return Ok(());
        }
        if let Some(base) = &self.config.base_module {
            if **base == *dependent.name() {
                return Ok(());
            }
        }
        Err(ResolveError::PermitsViolation {
            view: view.id().clone(),
            dependent: dependent.clone(),
        })
    }

    /// Unwind to the nearest frame with untried candidates; failing that,
    /// abandon optional edges; failing that, surface the deepest cause.
    fn backtrack(
        &mut self,
        mut err: ResolveError,
        worklist: &mut VecDeque<Edge>,
        frames: &mut Vec<Frame>,
    ) -> Result<(), ResolveError> {
        // A permits violation cannot be repaired by trying other candidates
        // or dropping optional edges.
        if err.is_permits_violation() {
            return Err(err);
        }

        loop {
            let Some(mut frame) = frames.pop() else {
                return Err(err);
            };

            self.backtracks += 1;
            ResolverStats::bump(&self.stats.backtracks);
            if self.backtracks > self.config.max_backtracks {
                return Err(ResolveError::BacktrackLimit {
                    limit: self.config.max_backtracks,
                });
            }

            self.rollback_to(frame.mark);
            worklist.clone_from(&frame.worklist);

            if let Some(next) = frame.candidates.pop_front() {
                let edge = frame.edge.clone();
                trace!(query = %edge.query, candidate = %next, "backtracking to next candidate");
                frames.push(frame);
                match self.enter_candidate(&next, &edge, worklist) {
                    Ok(()) => return Ok(()),
                    Err(e) if e.is_permits_violation() => return Err(e),
                    Err(e) => {
                        err = deeper(err, e);
                        continue;
                    }
                }
            }

            if frame.edge.modifiers.optional {
                trace!(query = %frame.edge.query, "optional edge abandoned after rollback");
                return Ok(());
            }
            // Keep unwinding with the deepest cause seen so far.
        }
    }
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("modules", &self.modules.len())
            .field("bound_names", &self.chosen.len())
            .field("journal", &self.journal.len())
            .finish_non_exhaustive()
    }
}

fn deeper(a: ResolveError, b: ResolveError) -> ResolveError {
    if b.depth() >= a.depth() { b } else { a }
}
