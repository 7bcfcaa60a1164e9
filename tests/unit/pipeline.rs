//! Definition pipeline tests
//!
//! Drive fragment discovery, synthesis and registry validation over real
//! projects built with [`ProjectFixture`].

use serde_json::Map;

use viewmill::core::ViewmillError;
use viewmill::options::Renders;
use viewmill::test_utils::ProjectFixture;

/// Module fragments load before search-root fragments, so a search-root
/// override wins per colliding leaf key while the rest survives.
#[test]
fn test_search_root_fragment_overrides_module_fragment() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"From module\"\nrenders = \"many\"\n",
        )
        .unwrap()
        .search_root("all")
        .unwrap()
        .file("all/views.toml", "[articles.list]\ntitle = \"From root\"\n")
        .unwrap();

    let registry = fixture.registry().unwrap();
    let view = registry.get("articles/list").unwrap();
    assert_eq!(view.title, "From root");
    assert_eq!(view.renders, Renders::Many);
}

/// `@inherits` works across fragment files, not only within one.
#[test]
fn test_inheritance_spans_fragments() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("contents")
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "contents",
            "[contents.list]\ntitle = \"Records\"\nrenders = \"many\"\n",
        )
        .unwrap()
        .fragment(
            "articles",
            "[articles]\n\"@inherits\" = \"contents\"\n\n[articles.list]\ntitle = \"Articles\"\n",
        )
        .unwrap();

    let registry = fixture.registry().unwrap();

    let inherited = registry.get("articles/list").unwrap();
    assert_eq!(inherited.title, "Articles");
    assert_eq!(inherited.renders, Renders::Many);

    // The parent keeps its own definition untouched.
    assert_eq!(registry.get("contents/list").unwrap().title, "Records");
}

#[test]
fn test_missing_title_fails_validation() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment("articles", "[articles.list]\nrenders = \"many\"\n")
        .unwrap();

    let err = fixture.registry().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewmillError>(),
        Some(ViewmillError::ValidationError { id, property })
            if id == "articles/list" && property == "title"
    ));
}

#[test]
fn test_missing_renders_fails_validation() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment("articles", "[articles.list]\ntitle = \"Articles\"\n")
        .unwrap();

    let err = fixture.registry().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewmillError>(),
        Some(ViewmillError::ValidationError { property, .. }) if property == "renders"
    ));
}

#[test]
fn test_registry_rejects_writes_after_build() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap();

    let mut registry = fixture.registry().unwrap();

    let err = registry.insert("articles/home", Map::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewmillError>(),
        Some(ViewmillError::WriteNotAllowed { id }) if id == "articles/home"
    ));

    let err = registry.remove("articles/list").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ViewmillError>(),
        Some(ViewmillError::WriteNotAllowed { id }) if id == "articles/list"
    ));

    // The failed writes left the registry untouched.
    assert!(registry.contains("articles/list"));
    assert!(!registry.contains("articles/home"));
}

/// Search-root fragments may contribute views for modules the project file
/// never declares; they synthesize and validate like any other.
#[test]
fn test_search_root_fragment_introduces_undeclared_module() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .search_root("all")
        .unwrap()
        .file(
            "all/views.toml",
            "[pages.home]\ntitle = \"Home\"\nrenders = \"one\"\n",
        )
        .unwrap();

    let registry = fixture.registry().unwrap();
    let view = registry.get("pages/home").unwrap();
    assert_eq!(view.module, "pages");
    assert_eq!(view.renders, Renders::One);
}

/// Modules are discovered in declaration-map order, so registry order is
/// stable regardless of the order the project file lists them in.
#[test]
fn test_registry_order_is_deterministic() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("zeta")
        .unwrap()
        .module("alpha")
        .unwrap()
        .fragment("zeta", "[zeta.home]\ntitle = \"Z\"\nrenders = \"one\"\n")
        .unwrap()
        .fragment("alpha", "[alpha.home]\ntitle = \"A\"\nrenders = \"one\"\n")
        .unwrap();

    let registry = fixture.registry().unwrap();
    let ids: Vec<&str> = registry.ids().collect();
    assert_eq!(ids, ["alpha/home", "zeta/home"]);
}
