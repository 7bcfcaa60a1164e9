//! Config synthesizer for viewmill
//!
//! The synthesizer turns an ordered [`FragmentSet`] into the flat mapping
//! `"module/type" -> normalized options` that the registry validates and
//! serves. Synthesis is a pure function of the fragments plus the
//! filesystem state of the referenced assets.
//!
//! # Directives
//!
//! Module entries may carry two reserved keys, removed before view types
//! are finalized:
//! - `@inherits = "<module>"` merges another module's views underneath this
//!   module's own (own keys win).
//! - `@path = "<dir>"` overrides the base directory used to resolve
//!   relative asset paths, which otherwise is the fragment file's
//!   directory.
//!
//! Any other `@`-prefixed key is a configuration error.
//!
//! # Order
//!
//! Fragments merge in set order, later fragments winning per colliding leaf
//! key. Inheritance resolves on the merged maps, parents before children,
//! so `a <- b <- c` chains inherit transitively. The output preserves
//! module first-appearance order, then view-type order within a module.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::ViewmillError;
use crate::fragments::FragmentSet;
use crate::options::{self, KEY_ASSETS, KEY_MODULE, KEY_TYPE};

/// Reserved prefix marking directive keys inside module entries.
pub const DIRECTIVE_PREFIX: char = '@';
/// Directive naming the module to inherit views from.
pub const DIRECTIVE_INHERITS: &str = "@inherits";
/// Directive overriding the asset resolution base directory.
pub const DIRECTIVE_PATH: &str = "@path";

/// One module entry from one fragment, directives separated from view data.
#[derive(Debug, Clone)]
struct ModuleRecord {
    module_id: String,
    inherits: Option<String>,
    base_dir: PathBuf,
    views: Map<String, Value>,
    source: PathBuf,
}

/// Synthesize the fragment set into `"module/type" -> normalized options`
/// pairs, in registry insertion order.
pub fn synthesize(fragments: &FragmentSet) -> Result<Vec<(String, Map<String, Value>)>> {
    let mut records = collect(fragments)?;

    for record in &mut records {
        resolve_assets(record)?;
    }

    let (order, mut modules) = merge_records(records);
    resolve_inheritance(&order, &mut modules)?;

    let views = unwind(&order, modules);
    debug!("Synthesized {} view definitions", views.len());
    Ok(views)
}

/// Step 1: split every module entry into a [`ModuleRecord`], rejecting
/// unknown directives.
fn collect(fragments: &FragmentSet) -> Result<Vec<ModuleRecord>> {
    let mut records = Vec::new();

    for fragment in fragments.iter() {
        let fragment_dir = fragment.source.parent().unwrap_or(Path::new(".")).to_path_buf();

        for (module_id, entry) in &fragment.modules {
            // Fragment parsing guarantees module entries are objects.
            let entry = entry.as_object().cloned().unwrap_or_default();

            let mut inherits = None;
            let mut base_dir = fragment_dir.clone();
            let mut views = Map::new();

            for (key, value) in entry {
                if !key.starts_with(DIRECTIVE_PREFIX) {
                    if !value.is_object() {
                        return Err(ViewmillError::FragmentParseError {
                            file: fragment.source.display().to_string(),
                            reason: format!(
                                "view entry '{key}' in module '{module_id}' must be a table"
                            ),
                        }
                        .into());
                    }
                    views.insert(key, value);
                    continue;
                }

                match key.as_str() {
                    DIRECTIVE_INHERITS => {
                        inherits = Some(directive_string(&key, &value, module_id, fragment)?);
                    }
                    DIRECTIVE_PATH => {
                        let dir =
                            PathBuf::from(directive_string(&key, &value, module_id, fragment)?);
                        base_dir =
                            if dir.is_absolute() { dir } else { fragment_dir.join(dir) };
                    }
                    _ => {
                        return Err(ViewmillError::UnknownDirective {
                            directive: key,
                            module: module_id.clone(),
                            fragment: fragment.source.display().to_string(),
                        }
                        .into());
                    }
                }
            }

            records.push(ModuleRecord {
                module_id: module_id.clone(),
                inherits,
                base_dir,
                views,
                source: fragment.source.clone(),
            });
        }
    }

    Ok(records)
}

fn directive_string(
    key: &str,
    value: &Value,
    module_id: &str,
    fragment: &crate::fragments::Fragment,
) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ViewmillError::ConfigError {
                message: format!(
                    "directive '{key}' of module '{module_id}' in {} must be a string",
                    fragment.source.display()
                ),
            }
            .into()
        })
}

/// Step 2: rewrite relative asset paths against the record's base
/// directory, requiring them to exist.
fn resolve_assets(record: &mut ModuleRecord) -> Result<()> {
    let base_dir = record.base_dir.clone();
    let module_id = record.module_id.clone();
    let source = record.source.clone();

    for options in record.views.values_mut() {
        let Some(assets) = options.get_mut(KEY_ASSETS).and_then(Value::as_object_mut) else {
            continue;
        };

        for kind in ["css", "js"] {
            let Some(list) = assets.get_mut(kind).and_then(Value::as_array_mut) else {
                continue;
            };

            for entry in list {
                let path_slot = match entry {
                    Value::String(_) => entry,
                    Value::Array(pair) => match pair.first_mut() {
                        Some(slot) => slot,
                        None => continue,
                    },
                    _ => continue,
                };

                let Value::String(raw) = path_slot else { continue };
                if Path::new(raw.as_str()).is_absolute() {
                    continue;
                }

                let resolved = base_dir.join(raw.as_str()).canonicalize().map_err(|_| {
                    ViewmillError::AssetNotFound {
                        path: raw.clone(),
                        module: module_id.clone(),
                        fragment: source.display().to_string(),
                    }
                })?;
                *path_slot = Value::String(resolved.display().to_string());
            }
        }
    }

    Ok(())
}

/// Step 3: merge same-module records in fragment order, later record wins
/// per leaf key. Returns module ids in first-appearance order.
fn merge_records(
    records: Vec<ModuleRecord>,
) -> (Vec<String>, HashMap<String, (Option<String>, Map<String, Value>)>) {
    let mut order = Vec::new();
    let mut modules: HashMap<String, (Option<String>, Map<String, Value>)> = HashMap::new();

    for record in records {
        match modules.get_mut(&record.module_id) {
            Some((inherits, views)) => {
                *views = options::merge_maps(views, &record.views);
                if record.inherits.is_some() {
                    *inherits = record.inherits;
                }
            }
            None => {
                order.push(record.module_id.clone());
                modules.insert(record.module_id, (record.inherits, record.views));
            }
        }
    }

    (order, modules)
}

/// Step 4: apply `@inherits` on the merged maps, parents before children.
fn resolve_inheritance(
    order: &[String],
    modules: &mut HashMap<String, (Option<String>, Map<String, Value>)>,
) -> Result<()> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut indices: HashMap<String, NodeIndex> = HashMap::new();

    for module_id in order {
        indices.insert(module_id.clone(), graph.add_node(module_id.clone()));
    }
    for module_id in order {
        let Some(target) = modules[module_id].0.clone() else { continue };
        let Some(&target_idx) = indices.get(&target) else {
            return Err(ViewmillError::MissingInheritanceTarget {
                module: module_id.clone(),
                target,
            }
            .into());
        };
        graph.add_edge(indices[module_id], target_idx, ());
    }

    let sorted = toposort(&graph, None).map_err(|cycle| {
        let start = graph[cycle.node_id()].clone();
        let mut chain = vec![start.clone()];
        let mut current = start.clone();
        while let Some(target) = modules[&current].0.clone() {
            chain.push(target.clone());
            if target == start {
                break;
            }
            current = target;
        }
        ViewmillError::CyclicInheritance { chain: chain.join(" -> ") }
    })?;

    // Toposort puts children before their inheritance target; walk it in
    // reverse so parents are final when children merge them in.
    for idx in sorted.into_iter().rev() {
        let module_id = graph[idx].clone();
        let Some(target) = modules[&module_id].0.clone() else { continue };

        debug!("Module '{module_id}' inherits views from '{target}'");
        let parent_views = modules[&target].1.clone();
        let entry = modules
            .get_mut(&module_id)
            .context("inheritance target disappeared during resolution")?;
        entry.1 = options::merge_maps(&parent_views, &entry.1);
    }

    Ok(())
}

/// Step 5: flatten to `"module/type"` keys, injecting `module` and `type`
/// and normalizing each definition.
fn unwind(
    order: &[String],
    mut modules: HashMap<String, (Option<String>, Map<String, Value>)>,
) -> Vec<(String, Map<String, Value>)> {
    let mut views = Vec::new();

    for module_id in order {
        let Some((_, module_views)) = modules.remove(module_id) else { continue };

        for (view_type, value) in module_views {
            let mut raw = value.as_object().cloned().unwrap_or_default();
            raw.entry(KEY_MODULE.to_string())
                .or_insert_with(|| Value::String(module_id.clone()));
            raw.entry(KEY_TYPE.to_string())
                .or_insert_with(|| Value::String(view_type.clone()));

            views.push((format!("{module_id}/{view_type}"), options::normalize(&raw)));
        }
    }

    views
}
