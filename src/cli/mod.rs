//! Command-line interface for viewmill
//!
//! Each command lives in its own module with its own argument structure and
//! execution logic:
//!
//! - `validate` - Validate the project file and every view definition
//! - `list` - List synthesized view definitions
//! - `cache` - Manage the definition snapshot cache
//! - `template` - Show how a view's template resolves
//!
//! # Global Options
//!
//! All commands support:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--project <DIR>` - Directory containing `viewmill.toml`, instead of
//!   searching upward from the current directory
//!
//! # Example
//!
//! ```bash
//! viewmill validate
//! viewmill --project sites/main list --format json
//! viewmill template articles/list --candidates
//! ```

mod cache;
pub mod common;
mod list;
mod template;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use common::OutputFormat;

/// Top-level CLI for viewmill.
///
/// Handles the global flags and delegates to the subcommands. Logging is
/// initialized once per execution from `--verbose`/`--quiet`, with
/// `RUST_LOG` taking precedence when set.
#[derive(Parser)]
#[command(
    name = "viewmill",
    about = "Resolve, validate and inspect view definitions",
    version,
    long_about = "viewmill synthesizes view definitions from configuration fragments, \
                  validates them, and resolves the templates they render through."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory containing viewmill.toml.
    ///
    /// Without this option the project file is searched from the current
    /// directory upward.
    #[arg(short, long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Validate the project file and every synthesized view definition.
    Validate(validate::ValidateCommand),

    /// List the view definitions of the project.
    List(list::ListCommand),

    /// Manage the definition snapshot cache.
    Cache(cache::CacheCommand),

    /// Show how a view's template resolves.
    Template(template::TemplateCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        match self.command {
            Commands::Validate(cmd) => cmd.execute(self.project),
            Commands::List(cmd) => cmd.execute(self.project),
            Commands::Cache(cmd) => cmd.execute(self.project),
            Commands::Template(cmd) => cmd.execute(self.project),
        }
    }

    fn init_logging(&self) {
        let filter = if self.quiet {
            EnvFilter::new("error")
        } else if self.verbose {
            EnvFilter::new("debug")
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new("warn")
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
