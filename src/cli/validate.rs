//! Validate the project file and every synthesized view definition
//!
//! `viewmill validate` runs the full build path without touching the cache:
//! project file, module graph, fragment discovery, synthesis, and definition
//! validation. Anything the registry build would reject is reported here,
//! which makes the command suitable as a pre-deploy check.
//!
//! # Examples
//!
//! ```bash
//! viewmill validate
//! viewmill validate --format json
//! viewmill --project sites/main validate
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;

use crate::fragments::FragmentSet;
use crate::modules::ModuleGraph;
use crate::registry::ViewRegistry;
use crate::synthesizer::synthesize;

use super::common::{load_config, OutputFormat};

/// Arguments for the `validate` command.
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Output format: text or json.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ValidateCommand {
    /// Run the validation.
    pub fn execute(self, project: Option<PathBuf>) -> Result<()> {
        let config = load_config(project)?;
        let graph = ModuleGraph::from_config(&config)?;
        let fragments = FragmentSet::discover(&config)?;
        let views = synthesize(&fragments)?;
        let registry = ViewRegistry::from_views(views)?;

        // Views can name modules the project file never declares; they
        // still render through the global template fallback, but it is
        // usually an oversight worth surfacing.
        let undeclared: Vec<&str> = registry
            .iter()
            .filter(|view| !graph.contains(&view.module))
            .map(|view| view.id.as_str())
            .collect();

        match self.format {
            OutputFormat::Json => {
                let report = json!({
                    "valid": true,
                    "modules": graph.len(),
                    "fragments": fragments.len(),
                    "views": registry.ids().collect::<Vec<_>>(),
                    "undeclared_modules": undeclared,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                println!("{} Project file is valid", "✓".green());
                println!("  Modules: {}", graph.len());
                println!("  Fragments: {}", fragments.len());
                println!("  Views: {}", registry.len());

                if !undeclared.is_empty() {
                    println!(
                        "{} {} view(s) belong to modules missing from the project file:",
                        "⚠".yellow(),
                        undeclared.len()
                    );
                    for id in undeclared {
                        println!("  - {id}");
                    }
                }
            }
        }

        Ok(())
    }
}
