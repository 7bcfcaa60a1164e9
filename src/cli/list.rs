//! List the view definitions of a project
//!
//! `viewmill list` builds the registry (reading the snapshot when caching
//! is enabled) and prints every definition in registry order. The table
//! format is for humans, the JSON format for automation.
//!
//! # Examples
//!
//! ```bash
//! viewmill list
//! viewmill list --module articles
//! viewmill list --format json
//! ```

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::registry::ViewDefinition;

use super::common::{build_registry, load_config, OutputFormat};

/// Arguments for the `list` command.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only list views of this module.
    #[arg(long)]
    pub module: Option<String>,

    /// Output format: table or json.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ListCommand {
    /// Run the listing.
    pub fn execute(self, project: Option<PathBuf>) -> Result<()> {
        let config = load_config(project)?;
        let registry = build_registry(&config)?;

        let views: Vec<&ViewDefinition> = registry
            .iter()
            .filter(|view| {
                self.module.as_deref().is_none_or(|module| view.module == module)
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&views)?);
            }
            OutputFormat::Text => {
                if views.is_empty() {
                    println!("No views defined");
                    return Ok(());
                }

                let id_width = views.iter().map(|view| view.id.len()).max().unwrap_or(2).max(2);
                let module_width =
                    views.iter().map(|view| view.module.len()).max().unwrap_or(6).max(6);
                let type_width =
                    views.iter().map(|view| view.type_.len()).max().unwrap_or(4).max(4);

                // Width formatting counts the escape codes of colored
                // strings, so the header stays plain.
                println!(
                    "{:<id_width$}  {:<module_width$}  {:<type_width$}  {:<7}  TITLE",
                    "ID", "MODULE", "TYPE", "RENDERS",
                );
                for view in views {
                    println!(
                        "{:<id_width$}  {:<module_width$}  {:<type_width$}  {:<7}  {}",
                        view.id,
                        view.module,
                        view.type_,
                        view.renders.as_str(),
                        view.title,
                    );
                }
            }
        }

        Ok(())
    }
}
