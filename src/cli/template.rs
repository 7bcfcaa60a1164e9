//! Show how a view's template resolves
//!
//! `viewmill template <view-id>` runs the template cascade for one view and
//! prints the winning path. With `--candidates` every probed path is listed
//! in order, marking the hit; when nothing resolves the command fails with
//! the full tried list, exactly as a render would.
//!
//! # Examples
//!
//! ```bash
//! viewmill template articles/list
//! viewmill template articles/list --candidates
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::core::ViewmillError;
use crate::modules::ModuleGraph;
use crate::templates::TemplateResolver;

use super::common::{build_registry, load_config};

/// Arguments for the `template` command.
#[derive(Debug, Args)]
pub struct TemplateCommand {
    /// Identifier of the view, e.g. `articles/list`.
    pub view_id: String,

    /// List every candidate path in probe order.
    #[arg(long)]
    pub candidates: bool,
}

impl TemplateCommand {
    /// Run the resolution.
    pub fn execute(self, project: Option<PathBuf>) -> Result<()> {
        let config = load_config(project)?;
        let graph = ModuleGraph::from_config(&config)?;
        let registry = build_registry(&config)?;
        let view = registry.get(&self.view_id)?;

        let resolver = TemplateResolver::new(&graph, config.absolute_search_roots());
        let resolved = resolver.resolve(&view.id, &view.type_, &view.module)?;

        if self.candidates {
            for tried in resolver.tried(&view.id, &view.type_, &view.module)? {
                let hit = resolved
                    .as_ref()
                    .is_some_and(|path| path.display().to_string() == tried);
                if hit {
                    println!("{} {tried}", "✓".green());
                } else {
                    println!("  {tried}");
                }
            }
        }

        match resolved {
            Some(path) => {
                if !self.candidates {
                    println!("{}", path.display());
                }
                Ok(())
            }
            None => Err(ViewmillError::TemplateNotFound {
                id: view.id.clone(),
                tried: resolver.tried(&view.id, &view.type_, &view.module)?,
            }
            .into()),
        }
    }
}
