//! Manage the view definition snapshot cache
//!
//! `viewmill cache` exposes the operator surface of the snapshot store:
//! inspect the persisted snapshot, drop it, and pause or resume caching
//! without editing the project file.
//!
//! # Examples
//!
//! ```bash
//! viewmill cache status
//! viewmill cache clean
//! viewmill cache disable    # writes the marker and drops the snapshot
//! viewmill cache enable
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::cache::ViewCacheManager;

use super::common::{load_config, OutputFormat};

/// Arguments for the `cache` command.
#[derive(Debug, Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: CacheSubcommand,
}

#[derive(Debug, Subcommand)]
enum CacheSubcommand {
    /// Show snapshot presence, size, checksum and freshness.
    Status {
        /// Output format: text or json.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Remove the snapshot; the next build re-synthesizes.
    Clean,
    /// Resume snapshot reads and writes.
    Enable,
    /// Pause caching and drop the current snapshot.
    Disable,
}

impl CacheCommand {
    /// Run the cache operation.
    pub fn execute(self, project: Option<PathBuf>) -> Result<()> {
        let config = load_config(project)?;
        let manager = ViewCacheManager::new(config.cache_dir()?);

        match self.command {
            CacheSubcommand::Status { format } => {
                let stat = manager.stat()?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&stat)?);
                    }
                    OutputFormat::Text => {
                        println!("Snapshot: {}", manager.store().snapshot_path().display());
                        println!("  Present: {}", if stat.present { "yes" } else { "no" });
                        println!("  Enabled: {}", if stat.enabled { "yes" } else { "no" });
                        if stat.present {
                            println!("  Size: {} bytes", stat.size);
                            if let Some(checksum) = &stat.checksum {
                                println!("  Checksum: {checksum}");
                            }
                            if let Some(modified) = stat.modified {
                                println!("  Modified: {modified}");
                            }
                        }
                    }
                }
            }
            CacheSubcommand::Clean => {
                manager.clear()?;
                println!("{} Snapshot removed", "✓".green());
            }
            CacheSubcommand::Enable => {
                manager.enable()?;
                println!("{} View caching enabled", "✓".green());
            }
            CacheSubcommand::Disable => {
                manager.disable()?;
                println!("{} View caching disabled", "✓".green());
            }
        }

        Ok(())
    }
}
