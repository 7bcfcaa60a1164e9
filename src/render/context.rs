//! Host-side context traits for the render pipeline
//!
//! The pipeline never talks to a concrete host. Everything it needs from the
//! surrounding application comes in through the traits here: the page being
//! rendered ([`Page`]), the asset collection point ([`AssetSink`]), the site
//! metadata and translation store ([`SiteRegistry`]), and the access
//! predicate table ([`AccessRegistry`]).
//!
//! Each trait ships with a simple in-memory implementation so hosts without
//! their own infrastructure (and the CLI) can render without writing glue.

use serde_json::Value;
use std::collections::HashMap;

use crate::options::Conditions;
use crate::registry::ViewDefinition;

/// The page a view renders into.
pub trait Page {
    /// Variables extracted from the request URL, highest-precedence
    /// condition layer together with the definition's locked conditions.
    fn url_variables(&self) -> Conditions;

    /// Name of the page template, when the page has one. The outer
    /// container element is only emitted for `.html` page templates.
    fn template(&self) -> Option<String>;
}

/// A [`Page`] with fixed variables and template name.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    /// URL variables exposed through [`Page::url_variables`].
    pub url_variables: Conditions,
    /// Template name exposed through [`Page::template`].
    pub template: Option<String>,
}

impl Page for StaticPage {
    fn url_variables(&self) -> Conditions {
        self.url_variables.clone()
    }

    fn template(&self) -> Option<String> {
        self.template.clone()
    }
}

/// Collects the stylesheets and scripts a render attaches to the page.
pub trait AssetSink {
    /// Attach a stylesheet. Lower priorities attach first.
    fn add_css(&mut self, path: &str, priority: i64);

    /// Attach a script. Lower priorities attach first.
    fn add_js(&mut self, path: &str, priority: i64);
}

/// An [`AssetSink`] that records attachments in order.
#[derive(Debug, Clone, Default)]
pub struct CollectedAssets {
    /// `(path, priority)` pairs in attachment order.
    pub css: Vec<(String, i64)>,
    /// `(path, priority)` pairs in attachment order.
    pub js: Vec<(String, i64)>,
}

impl AssetSink for CollectedAssets {
    fn add_css(&mut self, path: &str, priority: i64) {
        self.css.push((path.to_string(), priority));
    }

    fn add_js(&mut self, path: &str, priority: i64) {
        self.js.push((path.to_string(), priority));
    }
}

/// Site-wide metadata and translations.
///
/// Meta keys follow the flat-module convention, for example
/// `"contents_articles.limits.list"` or `"contents_articles.placeholder"`.
pub trait SiteRegistry {
    /// Look up a site meta value.
    fn meta(&self, key: &str) -> Option<Value>;

    /// Translate `key` within `scope`, or `None` when no translation
    /// exists.
    fn translate(&self, key: &str, scope: &str) -> Option<String>;
}

/// A [`SiteRegistry`] over in-memory maps. Translation keys are stored as
/// `"<scope>:<key>"`.
#[derive(Debug, Clone, Default)]
pub struct MemorySiteRegistry {
    metas: HashMap<String, Value>,
    translations: HashMap<String, String>,
}

impl MemorySiteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a site meta value.
    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) {
        self.metas.insert(key.into(), value);
    }

    /// Register a translation for `key` within `scope`.
    pub fn set_translation(
        &mut self,
        scope: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.translations.insert(format!("{}:{}", scope.into(), key.into()), text.into());
    }
}

impl SiteRegistry for MemorySiteRegistry {
    fn meta(&self, key: &str) -> Option<Value> {
        self.metas.get(key).cloned()
    }

    fn translate(&self, key: &str, scope: &str) -> Option<String> {
        self.translations.get(&format!("{scope}:{key}")).cloned()
    }
}

/// Named access predicates guarding view renders.
///
/// A definition's `access_callback` names a predicate registered here. The
/// pipeline treats `Some(false)` as a denial and `None` (unknown name) as a
/// configuration error.
pub trait AccessRegistry {
    /// Evaluate the named predicate against the view, or `None` when no
    /// predicate is registered under `name`.
    fn evaluate(&self, name: &str, view: &ViewDefinition) -> Option<bool>;
}

/// Boxed access predicate.
pub type AccessPredicate = Box<dyn Fn(&ViewDefinition) -> bool + Send + Sync>;

/// An [`AccessRegistry`] over a name-to-predicate table.
#[derive(Default)]
pub struct AccessTable {
    predicates: HashMap<String, AccessPredicate>,
}

impl AccessTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a predicate under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&ViewDefinition) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Box::new(predicate));
    }
}

impl std::fmt::Debug for AccessTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTable")
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AccessRegistry for AccessTable {
    fn evaluate(&self, name: &str, view: &ViewDefinition) -> Option<bool> {
        self.predicates.get(name).map(|predicate| predicate(view))
    }
}
