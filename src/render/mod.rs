//! View render pipeline
//!
//! [`View`] turns a registry definition into HTML through a fixed, linear
//! pipeline:
//!
//! 1. access check against the host's [`AccessRegistry`];
//! 2. asset registration with the page-level [`AssetSink`];
//! 3. data resolution through the [`ProviderRegistry`], when the definition
//!    configures a provider;
//! 4. empty short-circuit: a one/many view with no data skips the template
//!    and renders a placeholder instead;
//! 5. template resolution and execution;
//! 6. outer wrap in a container element carrying the view's identity;
//! 7. the render-completed hook.
//!
//! Every host dependency comes in through [`RenderEnvironment`]; the
//! pipeline itself holds no state between renders.

pub mod conditions;
pub mod context;
pub mod element;
pub mod hooks;
pub mod provider;

pub use conditions::ConditionResolver;
pub use context::{
    AccessRegistry, AccessTable, AssetSink, CollectedAssets, MemorySiteRegistry, Page,
    SiteRegistry, StaticPage,
};
pub use element::Element;
pub use hooks::ViewHooks;
pub use provider::{Fetched, ProviderFactory, ProviderRegistry, RecordSet, ViewProvider};

use anyhow::Result;
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::ViewmillError;
use crate::modules::{flat_id, normalize_identifier, ModuleGraph};
use crate::options::{Conditions, Renders};
use crate::registry::ViewDefinition;
use crate::templates::{TemplateEngine, TemplateResolver};

use conditions::{limit_of, page_of, CONDITION_LIMIT};
use element::escape_text;

/// Everything a render needs from the host.
pub struct RenderEnvironment<'a> {
    /// Module descriptors, for ancestor class chains and template lookup.
    pub graph: &'a ModuleGraph,
    /// Template resolver over the graph and the project search roots.
    pub templates: TemplateResolver<'a>,
    /// Template execution engine.
    pub engine: &'a dyn TemplateEngine,
    /// Site metadata and translations.
    pub site: &'a dyn SiteRegistry,
    /// Access predicates.
    pub access: &'a dyn AccessRegistry,
    /// Data provider factories.
    pub providers: &'a ProviderRegistry,
    /// Installed pipeline hooks.
    pub hooks: &'a ViewHooks,
    /// When set, rendered output is prefixed with a comment listing every
    /// template candidate that was considered.
    pub dev_mode: bool,
}

/// The resolved data a template renders, with the conditions that produced
/// it.
struct ResolvedData {
    data: Value,
    count: u64,
    conditions: Conditions,
}

impl ResolvedData {
    fn is_empty(&self) -> bool {
        match &self.data {
            Value::Null => true,
            Value::Array(records) => records.is_empty(),
            _ => false,
        }
    }
}

/// A single view render over a definition and an environment.
pub struct View<'a> {
    definition: &'a ViewDefinition,
    env: &'a RenderEnvironment<'a>,
}

impl<'a> View<'a> {
    /// Create a render for a definition.
    #[must_use]
    pub fn new(definition: &'a ViewDefinition, env: &'a RenderEnvironment<'a>) -> Self {
        Self { definition, env }
    }

    /// The definition being rendered.
    #[must_use]
    pub fn definition(&self) -> &ViewDefinition {
        self.definition
    }

    /// Run the pipeline and produce the final HTML.
    pub fn render(
        &self,
        page: &dyn Page,
        user_conditions: &Conditions,
        assets: &mut dyn AssetSink,
    ) -> Result<String> {
        debug!("Rendering view '{}'", self.definition.id);

        self.validate_access()?;
        self.register_assets(assets);

        let data = self.provide(page, user_conditions)?;
        let empty = data.as_ref().is_some_and(ResolvedData::is_empty)
            && self.definition.renders != Renders::Other;

        let (inner, template_path) = if empty {
            let placeholder = self.empty_placeholder();
            (self.env.hooks.apply_rescue(placeholder, self.definition), None)
        } else {
            let resolved = self.env.templates.resolve(
                &self.definition.id,
                &self.definition.type_,
                &self.definition.module,
            )?;
            let Some(path) = resolved else {
                return Err(ViewmillError::TemplateNotFound {
                    id: self.definition.id.clone(),
                    tried: self.tried()?,
                }
                .into());
            };
            let variables = self.bind(page, data.as_ref())?;
            let html = self.execute_template(&path, &variables)?;
            (html, Some(path))
        };

        let html = self.wrap(inner, template_path.as_deref(), empty, page)?;
        Ok(self.env.hooks.apply_render_completed(html, self.definition))
    }

    /// Evaluate the definition's access predicate, if one is configured.
    fn validate_access(&self) -> Result<()> {
        let Some(name) = &self.definition.access_callback else {
            return Ok(());
        };

        match self.env.access.evaluate(name, self.definition) {
            Some(true) => Ok(()),
            Some(false) => {
                Err(ViewmillError::AccessDenied { id: self.definition.id.clone() }.into())
            }
            None => Err(ViewmillError::ConfigError {
                message: format!(
                    "unknown access predicate '{name}' for view '{}'",
                    self.definition.id
                ),
            }
            .into()),
        }
    }

    fn register_assets(&self, sink: &mut dyn AssetSink) {
        for asset in &self.definition.assets.css {
            sink.add_css(&asset.path, asset.priority);
        }
        for asset in &self.definition.assets.js {
            sink.add_js(&asset.path, asset.priority);
        }
    }

    /// Fetch the view's data when a provider is configured.
    fn provide(&self, page: &dyn Page, user: &Conditions) -> Result<Option<ResolvedData>> {
        let Some(spec) = &self.definition.provider else {
            return Ok(None);
        };

        let resolver = ConditionResolver::new(self.definition, self.env.site);
        let mut conditions = resolver.effective(page, user);
        conditions = self.env.hooks.apply_alter_conditions(conditions, self.definition);

        // A single-record view always fetches exactly one, whatever the
        // condition layers came up with.
        if self.definition.renders == Renders::One {
            conditions.insert(CONDITION_LIMIT.to_string(), json!(1));
        }

        let provider = self.env.providers.resolve(spec, &self.definition.module)?;
        let fetched = provider.fetch(&conditions)?;
        debug!(
            "Provider for '{}' returned {}",
            self.definition.id,
            if fetched.is_empty() { "no records" } else { "records" }
        );

        let (mut records, count) = match fetched {
            Fetched::Records(set) => {
                let count = set.total_count;
                (set.records, count)
            }
            Fetched::Empty => (Vec::new(), 0),
        };

        if !records.is_empty() {
            records = self.env.hooks.apply_record_hooks(records, self.definition);
        }

        let data = match self.definition.renders {
            Renders::One => records.into_iter().next().unwrap_or(Value::Null),
            Renders::Many | Renders::Other => Value::Array(records),
        };

        Ok(Some(ResolvedData { data, count, conditions }))
    }

    /// The placeholder markup for a view whose provider returned nothing.
    ///
    /// Falls through site metas, then the scoped `empty_view` translation,
    /// then a built-in alert naming the sources that were tried.
    fn empty_placeholder(&self) -> String {
        let flat = flat_id(&self.definition.module);
        let scoped_meta = format!("{flat}.{}.placeholder", self.definition.type_);
        let module_meta = format!("{flat}.placeholder");
        let scope = format!("{flat}.{}", self.definition.type_);

        for key in [&scoped_meta, &module_meta] {
            if let Some(Value::String(placeholder)) = self.env.site.meta(key) {
                return placeholder;
            }
        }

        if let Some(placeholder) = self.env.site.translate("empty_view", &scope) {
            return placeholder;
        }

        format!(
            "<div class=\"alert undismissable\">The view <q>{}</q> returned no result. \
             The following sources were tried: site meta <code>{}</code>, site meta \
             <code>{}</code>, translation <code>empty_view</code> in scope \
             <code>{}</code>.</div>",
            escape_text(&self.definition.id),
            escape_text(&scoped_meta),
            escape_text(&module_meta),
            escape_text(&scope)
        )
    }

    /// The variable scope bound into the template engine.
    fn bind(&self, page: &dyn Page, data: Option<&ResolvedData>) -> Result<Value> {
        let mut view = self.definition.raw.clone();
        view.insert("id".to_string(), json!(self.definition.id));

        let module = if self.env.graph.contains(&self.definition.module) {
            let descriptor = self.env.graph.get(&self.definition.module)?;
            json!({"id": descriptor.id, "title": descriptor.display_title()})
        } else {
            json!({"id": self.definition.module})
        };

        let mut scope = Map::new();
        scope.insert("view".to_string(), Value::Object(view));
        scope.insert("module".to_string(), module);
        scope.insert(
            "page".to_string(),
            json!({
                "url_variables": page.url_variables(),
                "template": page.template(),
            }),
        );

        if let Some(data) = data {
            let resolver = ConditionResolver::new(self.definition, self.env.site);
            let with = resolver.filter_conditions(&data.conditions, page);
            scope.insert("data".to_string(), data.data.clone());
            scope.insert(
                "range".to_string(),
                json!({
                    "count": data.count,
                    "limit": limit_of(&data.conditions),
                    "page": page_of(&data.conditions),
                    "with": with,
                }),
            );
        }

        Ok(Value::Object(scope))
    }

    /// Execute the template, converting configuration errors raised during
    /// execution into an inline alert instead of failing the render.
    fn execute_template(&self, path: &Path, variables: &Value) -> Result<String> {
        match self.env.engine.render(path, variables) {
            Ok(html) => Ok(html),
            Err(err) => {
                let config_message = err.chain().find_map(|cause| {
                    match cause.downcast_ref::<ViewmillError>() {
                        Some(ViewmillError::ConfigError { message }) => Some(message.clone()),
                        _ => None,
                    }
                });

                let Some(message) = config_message else {
                    return Err(err);
                };

                warn!(
                    "Configuration error while rendering '{}': {message}",
                    self.definition.id
                );
                let alert = Element::div()
                    .add_class("alert")
                    .attribute("id", format!("alert-{}", Uuid::new_v4()))
                    .inner_html(escape_text(&message));
                Ok(alert.render())
            }
        }
    }

    /// Wrap the rendered markup in the container element.
    ///
    /// The container is only emitted when the page template is an `.html`
    /// one; other page kinds receive the inner markup as is.
    fn wrap(
        &self,
        inner: String,
        template_path: Option<&Path>,
        empty: bool,
        page: &dyn Page,
    ) -> Result<String> {
        let type_class = normalize_identifier(&self.definition.type_);
        let mut element = Element::div()
            .add_class("view")
            .add_class(format!("view--{type_class}"));

        let ancestors: Vec<String> = if self.env.graph.contains(&self.definition.module) {
            self.env
                .graph
                .ancestry(&self.definition.module)?
                .iter()
                .map(|descriptor| descriptor.id.clone())
                .collect()
        } else {
            vec![self.definition.module.clone()]
        };
        for ancestor in &ancestors {
            element = element
                .add_class(format!("view--{}--{type_class}", normalize_identifier(ancestor)));
        }
        if empty {
            element = element.add_class("empty");
        }

        element = element
            .attribute("id", format!("view-{}", normalize_identifier(&self.definition.id)))
            .attribute("data-constructor", &self.definition.module);
        if let Some(path) = template_path {
            element = element.attribute("data-template-path", path.display().to_string());
        }

        element = element.inner_html(inner.clone());
        element = self.env.hooks.apply_alter_element(element, self.definition);

        let wrapped = page.template().is_some_and(|name| name.ends_with(".html"));
        let mut html = if wrapped { element.render() } else { inner };

        if self.env.dev_mode {
            let mut comment =
                format!("<!-- Possible templates for view \"{}\":\n\n", self.definition.id);
            for candidate in self.tried()? {
                comment.push_str(&candidate);
                comment.push('\n');
            }
            comment.push_str("-->\n");
            html = comment + &html;
        }

        Ok(html)
    }

    fn tried(&self) -> Result<Vec<String>> {
        self.env.templates.tried(
            &self.definition.id,
            &self.definition.type_,
            &self.definition.module,
        )
    }
}
