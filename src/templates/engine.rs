//! Template execution engine
//!
//! The resolver hands the pipeline a path; this module turns it into HTML.
//! `.tera` templates are executed with the view's bound variables, `.html`
//! files pass through untouched (static markup needs no engine run).

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tera::Tera;

use crate::core::ViewmillError;

/// Executes a resolved template with the view's variable scope.
pub trait TemplateEngine {
    /// Render the template at `path` with `variables` bound at top level.
    fn render(&self, path: &Path, variables: &Value) -> Result<String>;
}

/// The default engine: Tera for `.tera` templates, raw passthrough for
/// everything else.
#[derive(Debug, Clone, Default)]
pub struct TeraEngine;

impl TeraEngine {
    /// Create the engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for TeraEngine {
    fn render(&self, path: &Path, variables: &Value) -> Result<String> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))?;

        if path.extension().is_none_or(|ext| ext != "tera") {
            return Ok(content);
        }

        let context = tera::Context::from_value(variables.clone())
            .map_err(ViewmillError::TemplateError)
            .with_context(|| format!("binding variables for {}", path.display()))?;

        Tera::one_off(&content, &context, false)
            .map_err(ViewmillError::TemplateError)
            .with_context(|| format!("rendering template {}", path.display()))
    }
}
