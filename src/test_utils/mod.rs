//! Test utilities for viewmill
//!
//! This module provides helpers for writing tests against real on-disk
//! projects: a temporary-directory project builder and one-time logging
//! initialization.
//!
//! # Test Isolation
//!
//! Every [`ProjectFixture`] owns its own temporary directory, so tests never
//! share state through the filesystem. Cache-sensitive tests should also set
//! `VIEWMILL_CACHE_DIR` to a path inside the fixture to keep snapshots out of
//! the user's home directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use viewmill::test_utils::ProjectFixture;
//!
//! let fixture = ProjectFixture::new().unwrap()
//!     .module("contents").unwrap()
//!     .fragment("contents", "[contents.list]\ntitle = \"Records\"\nrenders = \"many\"\n")
//!     .unwrap();
//!
//! let registry = fixture.registry().unwrap();
//! assert!(registry.contains("contents/list"));
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{ProjectConfig, PROJECT_FILE};
use crate::fragments::FRAGMENT_FILE;
use crate::registry::ViewRegistry;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once regardless of how many times it's
/// called. Respects the `RUST_LOG` environment variable if set, or uses the
/// provided level; with neither, logging stays off.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

#[derive(Debug, Clone)]
struct ModuleDecl {
    id: String,
    parent: Option<String>,
    path: String,
    title: Option<String>,
}

/// A complete viewmill project rooted in a temporary directory.
///
/// The builder methods rewrite `viewmill.toml` after every declaration, so
/// the on-disk project is always loadable, even half-built. Module
/// directories and search roots are created as they are declared.
#[derive(Debug)]
pub struct ProjectFixture {
    temp: TempDir,
    cache_views: bool,
    dev_mode: bool,
    search_roots: Vec<String>,
    modules: Vec<ModuleDecl>,
}

impl ProjectFixture {
    /// Create an empty project with a valid `viewmill.toml`.
    pub fn new() -> Result<Self> {
        let fixture = Self {
            temp: TempDir::new().context("Failed to create temporary directory")?,
            cache_views: false,
            dev_mode: false,
            search_roots: Vec::new(),
            modules: Vec::new(),
        };
        fixture.write_project_file()?;
        Ok(fixture)
    }

    /// Toggle the `cache-views` engine switch.
    pub fn cache_views(mut self, on: bool) -> Result<Self> {
        self.cache_views = on;
        self.write_project_file()?;
        Ok(self)
    }

    /// Toggle the `dev-mode` engine switch.
    pub fn dev_mode(mut self, on: bool) -> Result<Self> {
        self.dev_mode = on;
        self.write_project_file()?;
        Ok(self)
    }

    /// Declare a search root and create its directory.
    pub fn search_root(mut self, root: &str) -> Result<Self> {
        fs::create_dir_all(self.temp.path().join(root))
            .with_context(|| format!("Failed to create search root {root}"))?;
        self.search_roots.push(root.to_string());
        self.write_project_file()?;
        Ok(self)
    }

    /// Declare a module at `modules/<id>` with no parent and no title.
    pub fn module(self, id: &str) -> Result<Self> {
        self.module_with(id, None, None)
    }

    /// Declare a module with an explicit parent and title.
    ///
    /// The module directory is created at `modules/<id>`.
    pub fn module_with(
        mut self,
        id: &str,
        parent: Option<&str>,
        title: Option<&str>,
    ) -> Result<Self> {
        let path = format!("modules/{id}");
        fs::create_dir_all(self.temp.path().join(&path))
            .with_context(|| format!("Failed to create module directory {path}"))?;
        self.modules.push(ModuleDecl {
            id: id.to_string(),
            parent: parent.map(String::from),
            path,
            title: title.map(String::from),
        });
        self.write_project_file()?;
        Ok(self)
    }

    /// Write the `views.toml` fragment of a declared module.
    pub fn fragment(self, module: &str, content: &str) -> Result<Self> {
        let decl = self
            .modules
            .iter()
            .find(|decl| decl.id == module)
            .with_context(|| format!("Module {module} is not declared"))?;
        let path = self.temp.path().join(&decl.path).join(FRAGMENT_FILE);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write fragment {}", path.display()))?;
        Ok(self)
    }

    /// Write an arbitrary file relative to the project root, creating
    /// parent directories as needed. Template files go through here.
    pub fn file(self, relative: &str, content: &str) -> Result<Self> {
        let path = self.temp.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(self)
    }

    /// Root directory of the project.
    pub fn project_dir(&self) -> &Path {
        self.temp.path()
    }

    /// Path of the project file.
    pub fn project_file(&self) -> PathBuf {
        self.temp.path().join(PROJECT_FILE)
    }

    /// Resolve a path relative to the project root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    /// Load the project configuration from disk.
    pub fn config(&self) -> Result<ProjectConfig> {
        ProjectConfig::load(&self.project_file())
    }

    /// Build the view registry the way the CLI does, honoring the cache
    /// settings of the project.
    pub fn registry(&self) -> Result<ViewRegistry> {
        let config = self.config()?;
        crate::cli::common::build_registry(&config)
    }

    fn write_project_file(&self) -> Result<()> {
        let mut content = String::new();
        content.push_str("[engine]\n");
        content.push_str(&format!("cache-views = {}\n", self.cache_views));
        content.push_str(&format!("dev-mode = {}\n", self.dev_mode));

        if !self.search_roots.is_empty() {
            let roots: Vec<String> = self
                .search_roots
                .iter()
                .map(|root| format!("\"{root}\""))
                .collect();
            content.push_str(&format!("\nsearch-roots = [{}]\n", roots.join(", ")));
        }

        for decl in &self.modules {
            content.push_str(&format!("\n[modules.{}]\n", decl.id));
            if let Some(parent) = &decl.parent {
                content.push_str(&format!("parent = \"{parent}\"\n"));
            }
            content.push_str(&format!("path = \"{}\"\n", decl.path));
            if let Some(title) = &decl.title {
                content.push_str(&format!("title = \"{title}\"\n"));
            }
        }

        fs::write(self.project_file(), content).context("Failed to write project file")
    }
}
