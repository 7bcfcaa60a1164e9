//! viewmill - view definition resolution engine
//!
//! viewmill collects view definitions from configuration fragments scattered
//! across a modular project, merges and validates them into a read-only
//! registry, and renders them through a deterministic template cascade.
//!
//! # Architecture Overview
//!
//! The engine follows a synthesize/validate/render model:
//! - `views.toml` fragments contribute raw definition mappings per module
//! - the synthesizer merges fragments (last wins), applies `@inherits`
//!   chains, and normalizes every definition
//! - the registry validates required properties and becomes immutable
//! - a render walks a fixed pipeline: access check, assets, provider fetch,
//!   template resolution, outer wrap
//!
//! ## Key Properties
//!
//! - **Deterministic**: fragment order, inheritance and template cascade are
//!   fully ordered; the same inputs always produce the same registry
//! - **Read-only registry**: definitions cannot change after the build;
//!   hosts cache the synthesized set as a JSON snapshot
//! - **Host-agnostic rendering**: pages, assets, access control, data
//!   providers and site metadata come in through traits
//!
//! # Core Modules
//!
//! ## Definition Pipeline
//! - [`config`] - Project file (`viewmill.toml`) loading and validation
//! - [`fragments`] - `views.toml` discovery and parsing
//! - [`synthesizer`] - Fragment merging, directives, inheritance
//! - [`registry`] - Validated, read-only definition registry
//! - [`cache`] - Snapshot persistence and the operator cache surface
//!
//! ## Rendering
//! - [`modules`] - Module descriptor graph and identifier conventions
//! - [`templates`] - Template cascade resolution and execution
//! - [`render`] - The view render pipeline and its host-side traits
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`core`] - Error types and user-facing error contexts
//! - [`options`] - Raw option model, normalizer and merge rules
//!
//! # Project File Format (viewmill.toml)
//!
//! ```toml
//! [engine]
//! cache-views = true
//! dev-mode = false
//!
//! search-roots = ["all"]
//!
//! [modules.contents]
//! path = "modules/contents"
//!
//! [modules.articles]
//! parent = "contents"
//! path = "modules/articles"
//! title = "Articles"
//! ```
//!
//! # Fragment Format (views.toml)
//!
//! ```toml
//! [articles]
//! "@inherits" = "contents"
//!
//! [articles.list]
//! title = "Articles"
//! renders = "many"
//! provider = "auto"
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod fragments;
pub mod modules;
pub mod options;
pub mod registry;
pub mod render;
pub mod synthesizer;
pub mod templates;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
