//! Fragment loading and discovery for viewmill
//!
//! A *fragment* is one `views.toml` file contributing partial view
//! definitions for one or more modules. Fragments are merged by the
//! synthesizer in discovery order, so the [`FragmentSet`] preserves the
//! order in which fragments were loaded: module directories first (in
//! module-id order), then the configured search roots (in declaration
//! order).
//!
//! # Fragment File Format
//!
//! ```toml
//! # modules/articles/views.toml
//! "@inherits" = "contents"
//!
//! [list]
//! title = "Article list"
//! renders = "many"
//!
//! [list.assets]
//! css = ["css/articles.css"]
//! ```
//!
//! Top-level keys that are not directives (`@inherits`, `@path`) are view
//! types. The module a fragment belongs to is determined by where it was
//! discovered, so a file under `modules/articles/` contributes to the
//! `articles` module. Fragments found under search roots declare their
//! module explicitly with a `[<module>.<type>]` nesting level instead.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ProjectConfig;
use crate::core::ViewmillError;

/// Name of the view fragment files discovered by [`FragmentSet::discover`].
pub const FRAGMENT_FILE: &str = "views.toml";

/// One parsed fragment: a source path and the per-module view mappings it
/// contributes.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Path of the `views.toml` file this fragment was parsed from. Relative
    /// asset paths inside the fragment resolve against its parent directory.
    pub source: PathBuf,
    /// Module id -> mapping of view-type (and directives) to raw options.
    pub modules: Map<String, Value>,
}

impl Fragment {
    /// Parse fragment content that already carries its module nesting level,
    /// i.e. top-level keys are module ids.
    pub fn from_toml_str(source: &Path, content: &str) -> Result<Self> {
        let table: toml::Value =
            toml::from_str(content).map_err(|e| ViewmillError::FragmentParseError {
                file: source.display().to_string(),
                reason: e.to_string(),
            })?;

        let value = serde_json::to_value(table)
            .with_context(|| format!("converting fragment {}", source.display()))?;

        let Value::Object(modules) = value else {
            return Err(ViewmillError::FragmentParseError {
                file: source.display().to_string(),
                reason: "fragment root must be a table".to_string(),
            }
            .into());
        };

        for (module_id, entry) in &modules {
            if !entry.is_object() {
                return Err(ViewmillError::FragmentParseError {
                    file: source.display().to_string(),
                    reason: format!("module entry '{module_id}' must be a table"),
                }
                .into());
            }
        }

        Ok(Self { source: source.to_path_buf(), modules })
    }

    /// Parse fragment content belonging to a single known module, i.e.
    /// top-level keys are view types. The content is wrapped under
    /// `module_id` so every fragment exposes the same shape downstream.
    pub fn from_toml_str_for_module(
        source: &Path,
        module_id: &str,
        content: &str,
    ) -> Result<Self> {
        let table: toml::Value =
            toml::from_str(content).map_err(|e| ViewmillError::FragmentParseError {
                file: source.display().to_string(),
                reason: e.to_string(),
            })?;

        let views = serde_json::to_value(table)
            .with_context(|| format!("converting fragment {}", source.display()))?;

        if !views.is_object() {
            return Err(ViewmillError::FragmentParseError {
                file: source.display().to_string(),
                reason: "fragment root must be a table".to_string(),
            }
            .into());
        }

        let mut modules = Map::new();
        modules.insert(module_id.to_string(), views);

        Ok(Self { source: source.to_path_buf(), modules })
    }
}

/// Ordered collection of fragments, in merge order.
///
/// Later fragments win over earlier ones when the synthesizer merges
/// colliding keys, so discovery order is part of the contract: module
/// directories contribute first, then search roots.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    fragments: Vec<Fragment>,
}

impl FragmentSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-parsed fragment.
    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Load a fragment file whose top-level keys are module ids.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fragment file {}", path.display()))?;
        self.push(Fragment::from_toml_str(path, &content)?);
        Ok(())
    }

    /// Load a fragment file for a specific module (top-level keys are view
    /// types).
    pub fn load_module_file(&mut self, path: &Path, module_id: &str) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fragment file {}", path.display()))?;
        self.push(Fragment::from_toml_str_for_module(path, module_id, &content)?);
        Ok(())
    }

    /// Fragments in merge order.
    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Number of fragments loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the set holds no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Discover and load every `views.toml` reachable from the project.
    ///
    /// # Discovery Order
    ///
    /// 1. Each declared module directory, in module-id order. The file
    ///    `<module dir>/views.toml` contributes views for that module.
    /// 2. Each search root, in declaration order, walked recursively with
    ///    entries sorted by file name. Files here carry their own module
    ///    nesting level.
    ///
    /// A file reached through both a module directory and a search root is
    /// loaded once, at its first position.
    pub fn discover(config: &ProjectConfig) -> Result<Self> {
        let mut set = Self::new();
        let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

        for (module_id, module) in &config.modules {
            let candidate = config.resolve_path(&module.path).join(FRAGMENT_FILE);
            if candidate.is_file() && seen.insert(candidate.clone()) {
                debug!("Loading module fragment {} ({})", candidate.display(), module_id);
                set.load_module_file(&candidate, module_id)?;
            }
        }

        for root in config.absolute_search_roots() {
            if !root.is_dir() {
                debug!("Skipping missing search root {}", root.display());
                continue;
            }

            for entry in WalkDir::new(&root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.file_name().is_some_and(|name| name == FRAGMENT_FILE)
                    && seen.insert(path.to_path_buf())
                {
                    debug!("Loading fragment {}", path.display());
                    set.load_file(path)?;
                }
            }
        }

        debug!("Discovered {} fragments", set.len());
        Ok(set)
    }
}

impl IntoIterator for FragmentSet {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}
