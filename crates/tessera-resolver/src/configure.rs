//! The configurator: from a resolution to a configuration.
//!
//! Resolved modules are partitioned into contexts over the satisfied
//! `requires local` edges (permits were already enforced during resolution).
//! The installed-modules flavour then computes each context's local-class
//! map and remote-package map, where `requires public` re-exports apply
//! transitively; the source-compilation flavour computes the ordered local
//! path and the remote context links instead.

use crate::context::{Configuration, Context, PathContext, context_name};
use crate::types::{Resolution, ResolveError, ServiceBinding};
use ahash::AHashMap;
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tessera_core::ModuleId;
use tessera_model::ModuleInfo;
use tracing::debug;

/// The context partition shared by both configuration flavours.
struct Partition<'r> {
    /// Module name to index into the resolution's module list.
    module_index: AHashMap<&'r str, usize>,
    /// Module index to group index.
    group_of: Vec<usize>,
    /// Group members, in resolution order.
    groups: Vec<Vec<usize>>,
    /// Group names.
    names: Vec<String>,
    /// Exposed view names per group.
    views: Vec<BTreeSet<Arc<str>>>,
}

fn partition(resolution: &Resolution) -> Partition<'_> {
    let modules = resolution.modules();
    let n = modules.len();

    let mut module_index: AHashMap<&str, usize> = AHashMap::with_capacity(n);
    for (i, module) in modules.iter().enumerate() {
        module_index.insert(module.name(), i);
    }

    // Connected components over satisfied local edges.
    let mut union = UnionFind::<usize>::new(n);
    for (i, module) in modules.iter().enumerate() {
        for dep in module.requires() {
            if !dep.modifiers.local {
                continue;
            }
            if let Some(binding) = resolution.satisfied(dep) {
                if let Some(&j) = module_index.get(binding.module.name()) {
                    union.union(i, j);
                }
            }
        }
    }

    let labels = union.into_labeling();
    let mut group_ids: AHashMap<usize, usize> = AHashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of = vec![0; n];
    for (i, &rep) in labels.iter().enumerate() {
        let group = *group_ids.entry(rep).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(i);
        group_of[i] = group;
    }

    let mut names = Vec::with_capacity(groups.len());
    let mut views = Vec::with_capacity(groups.len());
    for members in &groups {
        let mut group_views: BTreeSet<Arc<str>> = BTreeSet::new();
        for &i in members {
            for view in modules[i].views() {
                group_views.insert(view.id().name_arc());
            }
        }
        names.push(context_name(&group_views));
        views.push(group_views);
    }

    debug!(modules = n, contexts = groups.len(), "partitioned contexts");
    Partition {
        module_index,
        group_of,
        groups,
        names,
        views,
    }
}

/// The packages a module makes visible through one of its views: the view's
/// own exports plus, transitively, everything re-exported via `requires
/// public` dependences.
fn export_closure(
    resolution: &Resolution,
    memo: &mut AHashMap<(Arc<str>, Arc<str>), Arc<BTreeSet<Arc<str>>>>,
    visiting: &mut Vec<ModuleId>,
    module: &Arc<ModuleInfo>,
    view_name: &Arc<str>,
) -> Result<Arc<BTreeSet<Arc<str>>>, ResolveError> {
    let key = (module.id().name_arc(), Arc::clone(view_name));
    if let Some(cached) = memo.get(&key) {
        return Ok(Arc::clone(cached));
    }
    if visiting.iter().any(|id| id.name() == module.name()) {
        let mut members = visiting.clone();
        members.push(module.id().clone());
        return Err(ResolveError::Cycle { members });
    }
    visiting.push(module.id().clone());

    let view = module
        .view(view_name)
        .unwrap_or_else(|| module.default_view());
    let mut packages: BTreeSet<Arc<str>> = view.exports().clone();
    for dep in module.requires() {
        if !dep.modifiers.public {
            continue;
        }
        if let Some(binding) = resolution.satisfied(dep) {
            let dependee = Arc::clone(&binding.module);
            let dependee_view = Arc::clone(&binding.view);
            let nested = export_closure(resolution, memo, visiting, &dependee, &dependee_view)?;
            packages.extend(nested.iter().cloned());
        }
    }

    visiting.pop();
    let packages = Arc::new(packages);
    memo.insert(key, Arc::clone(&packages));
    Ok(packages)
}

/// Build the installed-modules configuration.
pub fn configure(resolution: &Resolution) -> Result<Configuration<Context>, ResolveError> {
    let part = partition(resolution);
    let modules = resolution.modules();
    let mut memo = AHashMap::new();

    let mut contexts = Vec::with_capacity(part.groups.len());
    for (g, members) in part.groups.iter().enumerate() {
        let mut ids: BTreeSet<ModuleId> = BTreeSet::new();
        let mut local_classes: BTreeMap<Arc<str>, ModuleId> = BTreeMap::new();
        let mut main_classes: BTreeMap<Arc<str>, Arc<str>> = BTreeMap::new();

        for &i in members {
            let module = &modules[i];
            ids.insert(module.id().clone());

            for class in module.classes() {
                match local_classes.get(class) {
                    Some(existing) if existing != module.id() => {
                        return Err(ResolveError::DuplicateClass {
                            class: class.to_string(),
                            first: existing.clone(),
                            second: module.id().clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        local_classes.insert(Arc::clone(class), module.id().clone());
                    }
                }
            }

            for view in module.views() {
                if let Some(main) = view.main_class() {
                    main_classes.insert(view.id().name_arc(), Arc::from(main));
                }
            }
        }

        let mut remote_packages: BTreeMap<Arc<str>, String> = BTreeMap::new();
        for &i in members {
            let module = &modules[i];
            for dep in module.requires() {
                if dep.modifiers.local {
                    continue;
                }
                let Some(binding) = resolution.satisfied(dep) else {
                    continue;
                };
                let Some(&j) = part.module_index.get(binding.module.name()) else {
                    continue;
                };
                let target = part.group_of[j];
                if target == g {
                    continue;
                }
                let dependee = Arc::clone(&binding.module);
                let dependee_view = Arc::clone(&binding.view);
                let exports = export_closure(
                    resolution,
                    &mut memo,
                    &mut Vec::new(),
                    &dependee,
                    &dependee_view,
                )?;
                for package in exports.iter() {
                    match remote_packages.get(package) {
                        Some(existing) if *existing != part.names[target] => {
                            return Err(ResolveError::DuplicateExportedPackage {
                                package: package.to_string(),
                                context: part.names[g].clone(),
                                first: existing.clone(),
                                second: part.names[target].clone(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            remote_packages
                                .insert(Arc::clone(package), part.names[target].clone());
                        }
                    }
                }
            }
        }

        // Service bindings live with their provider's context.
        let mut services: BTreeMap<Arc<str>, Vec<ServiceBinding>> = BTreeMap::new();
        for (service, bindings) in resolution.service_bindings() {
            for binding in bindings {
                if let Some(&j) = part.module_index.get(binding.provider.name()) {
                    if part.group_of[j] == g {
                        services
                            .entry(Arc::clone(service))
                            .or_default()
                            .push(binding.clone());
                    }
                }
            }
        }

        contexts.push(Context {
            name: part.names[g].clone(),
            modules: ids,
            views: part.views[g].clone(),
            local_classes,
            remote_packages,
            services,
            main_classes,
        });
    }

    Ok(Configuration::new(resolution.roots().to_vec(), contexts))
}

/// Build the source-compilation configuration.
pub fn configure_paths(
    resolution: &Resolution,
) -> Result<Configuration<PathContext>, ResolveError> {
    let part = partition(resolution);
    let modules = resolution.modules();

    let mut contexts = Vec::with_capacity(part.groups.len());
    for (g, members) in part.groups.iter().enumerate() {
        let mut ids: BTreeSet<ModuleId> = BTreeSet::new();
        for &i in members {
            ids.insert(modules[i].id().clone());
        }

        // Local path: pre-order walk along local dependences in declaration
        // order, starting from each member in resolution order.
        let mut on_path = vec![false; modules.len()];
        let mut local_path: Vec<ModuleId> = Vec::new();
        for &i in members {
            push_local_chain(resolution, &part, g, i, &mut on_path, &mut local_path);
        }

        let mut remote_contexts: BTreeSet<String> = BTreeSet::new();
        for &i in members {
            for dep in modules[i].requires() {
                if dep.modifiers.local {
                    continue;
                }
                let Some(binding) = resolution.satisfied(dep) else {
                    continue;
                };
                let Some(&j) = part.module_index.get(binding.module.name()) else {
                    continue;
                };
                let target = part.group_of[j];
                if target != g {
                    remote_contexts.insert(part.names[target].clone());
                }
            }
        }

        contexts.push(PathContext {
            name: part.names[g].clone(),
            modules: ids,
            views: part.views[g].clone(),
            local_path,
            remote_contexts,
        });
    }

    Ok(Configuration::new(resolution.roots().to_vec(), contexts))
}

fn push_local_chain(
    resolution: &Resolution,
    part: &Partition<'_>,
    group: usize,
    index: usize,
    on_path: &mut [bool],
    path: &mut Vec<ModuleId>,
) {
    if on_path[index] {
        return;
    }
    on_path[index] = true;

    let module = &resolution.modules()[index];
    path.push(module.id().clone());
    for dep in module.requires() {
        if !dep.modifiers.local {
            continue;
        }
        let Some(binding) = resolution.satisfied(dep) else {
            continue;
        };
        let Some(&j) = part.module_index.get(binding.module.name()) else {
            continue;
        };
        if part.group_of[j] == group {
            push_local_chain(resolution, part, group, j, on_path, path);
        }
    }
}
