//! Template resolution for viewmill
//!
//! Given a view definition, the resolver locates the physical template to
//! render through a deterministic cascade over the owning module's ancestor
//! chain and the configured search roots. The walk is pure candidate
//! generation plus filesystem existence probes; the first hit wins.
//!
//! # Candidate Basenames
//!
//! The view id is split on `/`; the leading module segment and trailing
//! type segment are dropped. Every suffix of the remaining segments, from
//! longest to empty, joined with `--` and suffixed with the type, forms a
//! basename; the bare type comes last. For `blog/category/list`:
//!
//! ```text
//! category--list
//! list
//! ```
//!
//! # Directory Cascade
//!
//! For each descriptor from the owning module up its parent chain, and for
//! each basename:
//!
//! 1. `<root>/templates/views/<descriptor id>--<basename>` for every
//!    search root (descriptor id normalized as in CSS classes);
//! 2. `<descriptor dir>/templates/<basename>`;
//! 3. `<descriptor dir>/views/<basename>`.
//!
//! After the chain is exhausted, each basename is tried unqualified under
//! every search root's `templates/views/` directory. Each candidate is
//! probed with the `.tera` extension first, then `.html`.

pub mod engine;

pub use engine::{TemplateEngine, TeraEngine};

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, trace};

use crate::modules::{normalize_identifier, ModuleGraph};

/// Template extensions probed for each candidate, in preference order.
pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["tera", "html"];

/// Locates view templates over a module graph and a set of search roots.
#[derive(Debug, Clone)]
pub struct TemplateResolver<'a> {
    graph: &'a ModuleGraph,
    search_roots: Vec<PathBuf>,
}

impl<'a> TemplateResolver<'a> {
    /// Create a resolver. `search_roots` are consulted in the given order.
    #[must_use]
    pub fn new(graph: &'a ModuleGraph, search_roots: Vec<PathBuf>) -> Self {
        Self { graph, search_roots }
    }

    /// Resolve the template for a view, or `None` when no candidate
    /// exists. The caller decides whether that is fatal.
    pub fn resolve(
        &self,
        view_id: &str,
        type_: &str,
        module_id: &str,
    ) -> Result<Option<PathBuf>> {
        for candidate in self.candidates(view_id, type_, module_id)? {
            for extension in TEMPLATE_EXTENSIONS {
                let pathname = append_extension(&candidate, extension);
                trace!("Probing template {}", pathname.display());
                if pathname.is_file() {
                    debug!("Resolved template {} for '{view_id}'", pathname.display());
                    return Ok(Some(pathname));
                }
            }
        }

        debug!("No template found for '{view_id}'");
        Ok(None)
    }

    /// Candidate template paths in probe order, without extensions.
    ///
    /// A module id without a descriptor contributes no module-chain
    /// candidates; the unqualified search-root fallback still applies.
    pub fn candidates(
        &self,
        view_id: &str,
        type_: &str,
        module_id: &str,
    ) -> Result<Vec<PathBuf>> {
        let basenames = template_basenames(view_id, type_);
        let mut candidates = Vec::new();

        let chain = if self.graph.contains(module_id) {
            self.graph.ancestry(module_id)?
        } else {
            debug!("Module '{module_id}' has no descriptor; using global fallback only");
            Vec::new()
        };

        for descriptor in &chain {
            let qualified = normalize_identifier(&descriptor.id);
            for basename in &basenames {
                for root in &self.search_roots {
                    candidates
                        .push(root.join("templates/views").join(format!("{qualified}--{basename}")));
                }
                candidates.push(descriptor.path.join("templates").join(basename));
                candidates.push(descriptor.path.join("views").join(basename));
            }
        }

        for basename in &basenames {
            for root in &self.search_roots {
                candidates.push(root.join("templates/views").join(basename));
            }
        }

        Ok(candidates)
    }

    /// Every path the resolver would probe, extensions included. Used for
    /// diagnostics when no template is found.
    pub fn tried(&self, view_id: &str, type_: &str, module_id: &str) -> Result<Vec<String>> {
        let mut tried = Vec::new();
        for candidate in self.candidates(view_id, type_, module_id)? {
            for extension in TEMPLATE_EXTENSIONS {
                tried.push(append_extension(&candidate, extension).display().to_string());
            }
        }
        Ok(tried)
    }
}

/// Append `.{extension}` textually. `Path::with_extension` would replace
/// anything after a dot already present in the basename.
fn append_extension(path: &std::path::Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Candidate basenames for a view id, longest to shortest, deduplicated.
#[must_use]
pub fn template_basenames(view_id: &str, type_: &str) -> Vec<String> {
    let mut segments: Vec<&str> = view_id.split('/').collect();
    if segments.len() > 1 {
        segments.remove(0);
    }
    if segments.last() == Some(&type_) {
        segments.pop();
    }

    let mut basenames = Vec::new();
    for start in 0..segments.len() {
        basenames.push(format!("{}--{type_}", segments[start..].join("--")));
    }
    basenames.push(type_.to_string());
    basenames.dedup();
    basenames
}
