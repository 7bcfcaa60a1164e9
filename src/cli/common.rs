//! Shared helpers for CLI commands
//!
//! Every command starts the same way: locate the project file, load the
//! configuration, and usually build the registry. The helpers here keep
//! that wiring in one place so the commands stay focused on their output.

use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;

use crate::cache::ViewCacheManager;
use crate::config::{find_project_with_optional, ProjectConfig};
use crate::registry::{RegistryBuilder, ViewRegistry};

/// Output format for commands that support structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors.
    Text,
    /// Structured JSON for automation.
    Json,
}

/// Locate and load the project configuration.
///
/// `project` is the `--project` override; without it the project file is
/// searched from the current directory upward.
pub fn load_config(project: Option<PathBuf>) -> Result<ProjectConfig> {
    let path = find_project_with_optional(project)?;
    ProjectConfig::load(&path)
}

/// Build the view registry for a project, honoring its cache settings.
///
/// The snapshot store only participates when `cache-views` is enabled in
/// the project file and the operator has not written the disabled marker.
pub fn build_registry(config: &ProjectConfig) -> Result<ViewRegistry> {
    let mut builder = RegistryBuilder::new(config.clone());

    if config.engine.cache_views {
        let manager = ViewCacheManager::new(config.cache_dir()?);
        if manager.is_enabled() {
            builder = builder.with_snapshot_store(Box::new(manager.store().clone()));
        }
    }

    builder.build()
}
