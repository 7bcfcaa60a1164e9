//! viewmill CLI entry point
//!
//! Handles command-line argument parsing, error display, and command
//! execution. The commands themselves live in [`viewmill::cli`]:
//! - `validate` - Validate the project file and every view definition
//! - `list` - List synthesized view definitions
//! - `cache` - Manage the definition snapshot cache
//! - `template` - Show how a view's template resolves

use anyhow::Result;
use clap::Parser;
use viewmill::cli;
use viewmill::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            // Convert to user-friendly error with context and suggestions
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
