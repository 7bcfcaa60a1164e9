//! Full render stack tests
//!
//! Build complete on-disk projects and run the render pipeline end to end:
//! registry, module graph, template resolution, Tera execution, condition
//! layering and the outer wrap, all against real files.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::{json, Value};

use viewmill::core::ViewmillError;
use viewmill::modules::ModuleGraph;
use viewmill::options::Conditions;
use viewmill::render::{
    AccessTable, CollectedAssets, Fetched, MemorySiteRegistry, ProviderFactory, ProviderRegistry,
    RecordSet, RenderEnvironment, StaticPage, View, ViewHooks, ViewProvider,
};
use viewmill::templates::{TemplateResolver, TeraEngine};
use viewmill::test_utils::ProjectFixture;

struct FixedProvider(Vec<Value>);

impl ViewProvider for FixedProvider {
    fn fetch(&self, conditions: &Conditions) -> Result<Fetched> {
        if self.0.is_empty() {
            return Ok(Fetched::Empty);
        }
        Ok(Fetched::Records(RecordSet {
            records: self.0.clone(),
            total_count: self.0.len() as u64,
            limit: None,
            page: 0,
            conditions: conditions.clone(),
        }))
    }
}

struct FixedFactory(Vec<Value>);

impl ProviderFactory for FixedFactory {
    fn create(&self) -> Box<dyn ViewProvider> {
        Box::new(FixedProvider(self.0.clone()))
    }
}

/// Captures the conditions the pipeline hands to the provider.
struct RecordingFactory {
    seen: Arc<Mutex<Option<Conditions>>>,
}

impl ProviderFactory for RecordingFactory {
    fn create(&self) -> Box<dyn ViewProvider> {
        Box::new(RecordingProvider { seen: self.seen.clone() })
    }
}

struct RecordingProvider {
    seen: Arc<Mutex<Option<Conditions>>>,
}

impl ViewProvider for RecordingProvider {
    fn fetch(&self, conditions: &Conditions) -> Result<Fetched> {
        *self.seen.lock().unwrap() = Some(conditions.clone());
        Ok(Fetched::Records(RecordSet {
            records: vec![json!({"name": "Ada"})],
            total_count: 1,
            limit: None,
            page: 0,
            conditions: conditions.clone(),
        }))
    }
}

fn articles_project(fragment: &str) -> ProjectFixture {
    ProjectFixture::new()
        .unwrap()
        .module_with("articles", None, Some("Articles"))
        .unwrap()
        .fragment("articles", fragment)
        .unwrap()
}

#[test]
fn test_many_view_renders_records_and_wraps() {
    let fixture = articles_project(
        "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\nprovider = \"auto\"\n",
    )
    .file(
        "modules/articles/templates/list.tera",
        "<ul>{% for record in data %}<li>{{ record.name }}</li>{% endfor %}</ul>",
    )
    .unwrap();

    let config = fixture.config().unwrap();
    let graph = ModuleGraph::from_config(&config).unwrap();
    let registry = fixture.registry().unwrap();

    let engine = TeraEngine::new();
    let site = MemorySiteRegistry::new();
    let access = AccessTable::new();
    let mut providers = ProviderRegistry::new();
    providers.register(
        "articles",
        Box::new(FixedFactory(vec![json!({"name": "Ada"}), json!({"name": "Grace"})])),
    );
    let hooks = ViewHooks::new();

    let env = RenderEnvironment {
        graph: &graph,
        templates: TemplateResolver::new(&graph, config.absolute_search_roots()),
        engine: &engine,
        site: &site,
        access: &access,
        providers: &providers,
        hooks: &hooks,
        dev_mode: false,
    };

    let page = StaticPage { template: Some("page.html".into()), ..Default::default() };
    let mut assets = CollectedAssets::default();

    let view = View::new(registry.get("articles/list").unwrap(), &env);
    let html = view.render(&page, &Conditions::new(), &mut assets).unwrap();

    assert!(html.contains("<li>Ada</li>"));
    assert!(html.contains("<li>Grace</li>"));
    assert!(html.contains("view--list"));
    assert!(html.contains("id=\"view-articles-list\""));
}

#[test]
fn test_empty_many_view_uses_site_placeholder() {
    let fixture = articles_project(
        "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\nprovider = \"auto\"\n",
    );

    let config = fixture.config().unwrap();
    let graph = ModuleGraph::from_config(&config).unwrap();
    let registry = fixture.registry().unwrap();

    let engine = TeraEngine::new();
    let mut site = MemorySiteRegistry::new();
    site.set_meta("articles.list.placeholder", json!("Nothing published yet"));
    let access = AccessTable::new();
    let mut providers = ProviderRegistry::new();
    providers.register("articles", Box::new(FixedFactory(Vec::new())));
    let hooks = ViewHooks::new();

    let env = RenderEnvironment {
        graph: &graph,
        templates: TemplateResolver::new(&graph, config.absolute_search_roots()),
        engine: &engine,
        site: &site,
        access: &access,
        providers: &providers,
        hooks: &hooks,
        dev_mode: false,
    };

    let page = StaticPage { template: Some("page.html".into()), ..Default::default() };
    let mut assets = CollectedAssets::default();

    // No template exists anywhere; the placeholder path must not need one.
    let view = View::new(registry.get("articles/list").unwrap(), &env);
    let html = view.render(&page, &Conditions::new(), &mut assets).unwrap();

    assert!(html.contains("Nothing published yet"));
    assert!(html.contains("empty"));
}

#[test]
fn test_declared_assets_reach_the_sink() {
    let fixture = articles_project(
        "[articles.list]\n\
         title = \"Articles\"\n\
         renders = \"many\"\n\
         provider = \"auto\"\n\
         \n\
         [articles.list.assets]\n\
         css = [\"style/list.css\"]\n\
         js = [[\"behavior/list.js\", 10]]\n",
    )
    .file("modules/articles/style/list.css", "/* */")
    .unwrap()
    .file("modules/articles/behavior/list.js", "// ")
    .unwrap()
    .file(
        "modules/articles/templates/list.tera",
        "{{ data | length }} records",
    )
    .unwrap();

    let config = fixture.config().unwrap();
    let graph = ModuleGraph::from_config(&config).unwrap();
    let registry = fixture.registry().unwrap();

    let engine = TeraEngine::new();
    let site = MemorySiteRegistry::new();
    let access = AccessTable::new();
    let mut providers = ProviderRegistry::new();
    providers.register("articles", Box::new(FixedFactory(vec![json!({"name": "Ada"})])));
    let hooks = ViewHooks::new();

    let env = RenderEnvironment {
        graph: &graph,
        templates: TemplateResolver::new(&graph, config.absolute_search_roots()),
        engine: &engine,
        site: &site,
        access: &access,
        providers: &providers,
        hooks: &hooks,
        dev_mode: false,
    };

    let page = StaticPage::default();
    let mut assets = CollectedAssets::default();

    let view = View::new(registry.get("articles/list").unwrap(), &env);
    view.render(&page, &Conditions::new(), &mut assets).unwrap();

    assert_eq!(assets.css.len(), 1);
    assert!(assets.css[0].0.ends_with("list.css"));
    assert_eq!(assets.css[0].1, 0);
    assert_eq!(assets.js.len(), 1);
    assert!(assets.js[0].0.ends_with("list.js"));
    assert_eq!(assets.js[0].1, 10);
}

#[test]
fn test_condition_layers_reach_the_provider() {
    let fixture = articles_project(
        "[articles.list]\n\
         title = \"Articles\"\n\
         renders = \"many\"\n\
         provider = \"auto\"\n\
         \n\
         [articles.list.default_conditions]\n\
         category = \"news\"\n",
    )
    .file(
        "modules/articles/templates/list.tera",
        "{{ data | length }} records",
    )
    .unwrap();

    let config = fixture.config().unwrap();
    let graph = ModuleGraph::from_config(&config).unwrap();
    let registry = fixture.registry().unwrap();

    let engine = TeraEngine::new();
    let site = MemorySiteRegistry::new();
    let access = AccessTable::new();
    let seen = Arc::new(Mutex::new(None));
    let mut providers = ProviderRegistry::new();
    providers.register("articles", Box::new(RecordingFactory { seen: seen.clone() }));
    let hooks = ViewHooks::new();

    let env = RenderEnvironment {
        graph: &graph,
        templates: TemplateResolver::new(&graph, config.absolute_search_roots()),
        engine: &engine,
        site: &site,
        access: &access,
        providers: &providers,
        hooks: &hooks,
        dev_mode: false,
    };

    let page = StaticPage::default();
    let mut assets = CollectedAssets::default();

    let mut user = Conditions::new();
    user.insert("category".to_string(), json!("sports"));
    user.insert("page".to_string(), json!(2));
    user.insert("theme".to_string(), json!("dark")); // not in the allow-list

    let view = View::new(registry.get("articles/list").unwrap(), &env);
    view.render(&page, &user, &mut assets).unwrap();

    let conditions = seen.lock().unwrap().clone().unwrap();
    assert_eq!(conditions.get("category"), Some(&json!("sports")));
    assert_eq!(conditions.get("page"), Some(&json!(2)));
    assert!(!conditions.contains_key("theme"));
}

#[test]
fn test_denied_access_stops_the_pipeline() {
    let fixture = articles_project(
        "[articles.list]\n\
         title = \"Articles\"\n\
         renders = \"many\"\n\
         access_callback = \"members_only\"\n",
    );

    let config = fixture.config().unwrap();
    let graph = ModuleGraph::from_config(&config).unwrap();
    let registry = fixture.registry().unwrap();

    let engine = TeraEngine::new();
    let site = MemorySiteRegistry::new();
    let mut access = AccessTable::new();
    access.register("members_only", |_view| false);
    let providers = ProviderRegistry::new();
    let hooks = ViewHooks::new();

    let env = RenderEnvironment {
        graph: &graph,
        templates: TemplateResolver::new(&graph, config.absolute_search_roots()),
        engine: &engine,
        site: &site,
        access: &access,
        providers: &providers,
        hooks: &hooks,
        dev_mode: false,
    };

    let page = StaticPage::default();
    let mut assets = CollectedAssets::default();

    let view = View::new(registry.get("articles/list").unwrap(), &env);
    let err = view.render(&page, &Conditions::new(), &mut assets).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewmillError>(),
        Some(ViewmillError::AccessDenied { id }) if id == "articles/list"
    ));
}

#[test]
fn test_template_miss_reports_every_candidate() {
    let fixture = articles_project(
        "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\nprovider = \"auto\"\n",
    );

    let config = fixture.config().unwrap();
    let graph = ModuleGraph::from_config(&config).unwrap();
    let registry = fixture.registry().unwrap();

    let engine = TeraEngine::new();
    let site = MemorySiteRegistry::new();
    let access = AccessTable::new();
    let mut providers = ProviderRegistry::new();
    providers.register("articles", Box::new(FixedFactory(vec![json!({"name": "Ada"})])));
    let hooks = ViewHooks::new();

    let env = RenderEnvironment {
        graph: &graph,
        templates: TemplateResolver::new(&graph, config.absolute_search_roots()),
        engine: &engine,
        site: &site,
        access: &access,
        providers: &providers,
        hooks: &hooks,
        dev_mode: false,
    };

    let page = StaticPage::default();
    let mut assets = CollectedAssets::default();

    let view = View::new(registry.get("articles/list").unwrap(), &env);
    let err = view.render(&page, &Conditions::new(), &mut assets).unwrap_err();

    let Some(ViewmillError::TemplateNotFound { id, tried }) = err.downcast_ref::<ViewmillError>()
    else {
        panic!("expected TemplateNotFound, got {err:#}");
    };
    assert_eq!(id, "articles/list");
    assert!(tried.iter().any(|path| path.ends_with("list.tera")));
    assert!(tried.iter().any(|path| path.ends_with("list.html")));
}
