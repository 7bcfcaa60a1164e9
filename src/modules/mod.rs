//! Module hierarchy for viewmill
//!
//! Modules are the owners of views: every definition id is
//! `<module>/<type>` and template resolution walks the owning module's
//! ancestor chain. The hierarchy is declared in `viewmill.toml` (see
//! [`crate::config::ModuleConfig`]) and materialized here as a
//! [`ModuleGraph`] of [`ModuleDescriptor`] entries with validated parent
//! links.
//!
//! # Identifier Forms
//!
//! Module ids may be dotted (`contents.articles`). Two derived forms are
//! used elsewhere:
//! - [`flat_id`] replaces dots with underscores, used to key site-registry
//!   entries (`contents_articles.limits.list`).
//! - [`normalize_identifier`] lowercases and hyphenates, used in CSS class
//!   and template file names (`contents-articles`).

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use anyhow::Result;

use crate::config::ProjectConfig;
use crate::core::ViewmillError;

/// One module in the hierarchy, with its directory anchored to the project
/// root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Module identifier, possibly dotted.
    pub id: String,
    /// Identifier of the parent module, if any.
    pub parent: Option<String>,
    /// Absolute directory of the module.
    pub path: PathBuf,
    /// Human-readable title; falls back to the id when absent.
    pub title: Option<String>,
}

impl ModuleDescriptor {
    /// Title to display for this module.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// The validated module hierarchy.
///
/// Parent links are guaranteed to reference declared modules and to form a
/// forest (no cycles), so ancestor iteration always terminates.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    descriptors: BTreeMap<String, ModuleDescriptor>,
}

impl ModuleGraph {
    /// Build the graph from a loaded project configuration.
    ///
    /// Fails with [`ViewmillError::CyclicInheritance`] when the declared
    /// parent links contain a cycle.
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        let mut descriptors = BTreeMap::new();
        for (id, module) in &config.modules {
            descriptors.insert(
                id.clone(),
                ModuleDescriptor {
                    id: id.clone(),
                    parent: module.parent.clone(),
                    path: config.resolve_path(&module.path),
                    title: module.title.clone(),
                },
            );
        }

        let graph = Self { descriptors };
        graph.detect_cycles()?;
        Ok(graph)
    }

    /// Build a graph directly from descriptors. Used by hosts that manage
    /// modules themselves.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let descriptors = descriptors.into_iter().map(|d| (d.id.clone(), d)).collect();
        let graph = Self { descriptors };
        graph.detect_cycles()?;
        Ok(graph)
    }

    /// Whether a module is declared.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.descriptors.contains_key(id)
    }

    /// Look up a descriptor.
    pub fn get(&self, id: &str) -> Result<&ModuleDescriptor> {
        self.descriptors
            .get(id)
            .ok_or_else(|| ViewmillError::ModuleNotFound { id: id.to_string() }.into())
    }

    /// Descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.descriptors.values()
    }

    /// Number of declared modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no modules are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The module and its ancestors, nearest first.
    ///
    /// Parent links pointing at undeclared modules end the chain silently;
    /// configuration validation reports those separately. A visited-set
    /// guard keeps the walk finite even on graphs built before cycle
    /// detection ran.
    pub fn ancestry(&self, id: &str) -> Result<Vec<&ModuleDescriptor>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(self.get(id)?);

        while let Some(descriptor) = current {
            if !visited.insert(descriptor.id.as_str()) {
                let mut cycle: Vec<_> =
                    chain.iter().map(|d: &&ModuleDescriptor| d.id.clone()).collect();
                cycle.push(descriptor.id.clone());
                return Err(ViewmillError::CyclicInheritance { chain: cycle.join(" -> ") }.into());
            }
            chain.push(descriptor);
            current = descriptor
                .parent
                .as_deref()
                .and_then(|parent| self.descriptors.get(parent));
        }

        Ok(chain)
    }

    /// Reject parent links that form a cycle, reporting the full chain.
    fn detect_cycles(&self) -> Result<()> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

        for id in self.descriptors.keys() {
            indices.insert(id, graph.add_node(id));
        }
        for descriptor in self.descriptors.values() {
            if let Some(parent) = &descriptor.parent
                && let Some(&parent_idx) = indices.get(parent.as_str())
            {
                graph.add_edge(indices[descriptor.id.as_str()], parent_idx, ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            let start = graph[cycle.node_id()].to_string();
            let mut chain = vec![start.clone()];
            let mut current = &start;
            loop {
                let parent = match self
                    .descriptors
                    .get(current)
                    .and_then(|d| d.parent.as_ref())
                {
                    Some(parent) => parent,
                    None => break,
                };
                chain.push(parent.clone());
                if *parent == start {
                    break;
                }
                current = parent;
            }
            return Err(ViewmillError::CyclicInheritance { chain: chain.join(" -> ") }.into());
        }

        Ok(())
    }
}

/// Lowercase, hyphen-separated form of an identifier, for CSS classes and
/// template file names. Runs of non-alphanumeric characters collapse into a
/// single hyphen.
#[must_use]
pub fn normalize_identifier(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut pending_hyphen = false;
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Dots replaced with underscores; the form used to key site-registry
/// entries.
#[must_use]
pub fn flat_id(id: &str) -> String {
    id.replace('.', "_")
}
