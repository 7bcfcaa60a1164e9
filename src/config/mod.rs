//! Project configuration for viewmill
//!
//! viewmill is configured through a single `viewmill.toml` file at the project
//! root. The file declares engine switches, the search roots used by template
//! resolution and fragment discovery, and the module hierarchy that views
//! belong to.
//!
//! # Project File (`viewmill.toml`)
//!
//! ```toml
//! [engine]
//! cache-views = true
//! dev-mode = false
//!
//! search-roots = ["protected/all"]
//!
//! [modules.contents]
//! path = "modules/contents"
//! title = "Contents"
//!
//! [modules.articles]
//! parent = "contents"
//! path = "modules/articles"
//! title = "Articles"
//! ```
//!
//! # Discovery
//!
//! Like most manifest-driven tools, viewmill searches for `viewmill.toml` in
//! the current directory and walks up the directory tree until it finds one,
//! so commands can be run from any subdirectory of a project.
//!
//! # Cache Location
//!
//! Definition snapshots are stored under `<project>/.viewmill/cache` unless
//! the `VIEWMILL_CACHE_DIR` environment variable overrides the location
//! (essential for testing).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::ViewmillError;

/// Name of the project file searched for by [`find_project`].
pub const PROJECT_FILE: &str = "viewmill.toml";

/// Engine switches controlling caching and diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// Persist the synthesized definition registry across process runs.
    #[serde(default)]
    pub cache_views: bool,
    /// Annotate rendered views with resolution diagnostics.
    #[serde(default)]
    pub dev_mode: bool,
}

/// Declaration of one module in the project hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Identifier of the parent module, if any.
    #[serde(default)]
    pub parent: Option<String>,
    /// Directory of the module, relative to the project root.
    pub path: PathBuf,
    /// Human-readable title.
    #[serde(default)]
    pub title: Option<String>,
}

/// The parsed `viewmill.toml` project file.
///
/// Use [`ProjectConfig::load`] to read a specific file or [`find_project`] to
/// discover one from the current working directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Engine switches.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Application search roots, relative to the project root. Both template
    /// resolution and fragment discovery consult these in declaration order.
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,

    /// Module hierarchy, keyed by module identifier.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,

    /// Directory containing the project file. Not part of the TOML.
    #[serde(skip)]
    pub project_dir: PathBuf,
}

impl ProjectConfig {
    /// Load and validate a project file.
    ///
    /// Relative paths in the configuration stay relative; use
    /// [`ProjectConfig::resolve_path`] to anchor them to the project root.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading project file {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ViewmillError::ProjectParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
            .with_context(|| format!("Invalid TOML syntax in project file: {}", path.display()))?;

        config.project_dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Project path has no parent directory"))?
            .to_path_buf();

        config.validate()?;

        Ok(config)
    }

    /// Check referential integrity of the module table.
    ///
    /// Every declared `parent` must itself be a declared module. Cycle
    /// detection is deferred to the module graph, which walks parent chains
    /// with a visited-set guard.
    pub fn validate(&self) -> Result<()> {
        for (id, module) in &self.modules {
            if let Some(parent) = &module.parent {
                if !self.modules.contains_key(parent) {
                    return Err(ViewmillError::ConfigError {
                        message: format!("module '{id}' declares unknown parent '{parent}'"),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Anchor a configured relative path to the project root.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    /// Search roots as absolute paths, in declaration order.
    #[must_use]
    pub fn absolute_search_roots(&self) -> Vec<PathBuf> {
        self.search_roots.iter().map(|root| self.resolve_path(root)).collect()
    }

    /// Directory where definition snapshots are stored.
    ///
    /// # Location Priority
    ///
    /// 1. `VIEWMILL_CACHE_DIR` environment variable (if set)
    /// 2. `<project>/.viewmill/cache`
    ///
    /// The directory is created if it doesn't exist.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        // Environment override first (essential for testing)
        let cache_dir = if let Ok(dir) = std::env::var("VIEWMILL_CACHE_DIR") {
            PathBuf::from(dir)
        } else {
            self.project_dir.join(".viewmill").join("cache")
        };

        if !cache_dir.exists() {
            std::fs::create_dir_all(&cache_dir)
                .with_context(|| format!("creating cache directory {}", cache_dir.display()))?;
        }

        Ok(cache_dir)
    }
}

/// Find the project file by searching up from the current directory.
///
/// # Search Algorithm
///
/// 1. Look for `viewmill.toml` in the current directory
/// 2. If not found, move to the parent directory
/// 3. Repeat until found or the filesystem root is reached
pub fn find_project() -> Result<PathBuf> {
    let current =
        std::env::current_dir().context("Cannot determine current working directory")?;
    find_project_from(current)
}

/// Find the project file by searching up from a specific starting directory.
pub fn find_project_from(start: PathBuf) -> Result<PathBuf> {
    let mut dir = start.as_path();

    loop {
        let candidate = dir.join(PROJECT_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(ViewmillError::ProjectNotFound.into()),
        }
    }
}

/// Find the project file using an explicit directory or directory search.
///
/// An explicit directory must contain `viewmill.toml` directly; without one,
/// the walk-up search from the current directory applies.
pub fn find_project_with_optional(explicit_dir: Option<PathBuf>) -> Result<PathBuf> {
    match explicit_dir {
        Some(dir) => {
            let candidate = dir.join(PROJECT_FILE);
            if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(ViewmillError::ProjectNotFound.into())
            }
        }
        None => find_project(),
    }
}
