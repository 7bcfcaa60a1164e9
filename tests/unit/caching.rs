//! Snapshot cache tests
//!
//! Cover the full operator surface: snapshots persisting across builds,
//! stale reads until cleared, and the disable marker pausing the cache.

use serial_test::serial;

use viewmill::cache::ViewCacheManager;
use viewmill::test_utils::ProjectFixture;

fn cached_fixture(title: &str) -> ProjectFixture {
    ProjectFixture::new()
        .unwrap()
        .cache_views(true)
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            &format!("[articles.list]\ntitle = \"{title}\"\nrenders = \"many\"\n"),
        )
        .unwrap()
}

#[test]
#[serial]
fn test_snapshot_persists_and_serves_stale_reads() {
    let fixture = cached_fixture("First");

    let registry = fixture.registry().unwrap();
    assert_eq!(registry.get("articles/list").unwrap().title, "First");

    let config = fixture.config().unwrap();
    let manager = ViewCacheManager::new(config.cache_dir().unwrap());
    assert!(manager.store().snapshot_path().is_file());

    // The snapshot, not the fragment, is authoritative until cleared.
    let fixture = fixture
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Second\"\nrenders = \"many\"\n",
        )
        .unwrap();
    let registry = fixture.registry().unwrap();
    assert_eq!(registry.get("articles/list").unwrap().title, "First");
}

#[test]
#[serial]
fn test_clear_forces_fresh_synthesis() {
    let fixture = cached_fixture("First");
    fixture.registry().unwrap();

    let fixture = fixture
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Second\"\nrenders = \"many\"\n",
        )
        .unwrap();

    let config = fixture.config().unwrap();
    let manager = ViewCacheManager::new(config.cache_dir().unwrap());
    manager.clear().unwrap();

    let registry = fixture.registry().unwrap();
    assert_eq!(registry.get("articles/list").unwrap().title, "Second");
}

#[test]
#[serial]
fn test_disable_pauses_caching_until_enabled() {
    let fixture = cached_fixture("First");
    let config = fixture.config().unwrap();
    let manager = ViewCacheManager::new(config.cache_dir().unwrap());

    manager.disable().unwrap();
    assert!(!manager.is_enabled());

    fixture.registry().unwrap();
    assert!(!manager.store().snapshot_path().is_file());

    manager.enable().unwrap();
    assert!(manager.is_enabled());

    fixture.registry().unwrap();
    assert!(manager.store().snapshot_path().is_file());
}

#[test]
#[serial]
fn test_caching_off_by_default() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap();

    fixture.registry().unwrap();

    let config = fixture.config().unwrap();
    let manager = ViewCacheManager::new(config.cache_dir().unwrap());
    assert!(!manager.store().snapshot_path().is_file());
}

#[test]
#[serial]
fn test_cache_dir_env_override() {
    let fixture = ProjectFixture::new().unwrap();
    let override_dir = fixture.path("elsewhere");

    unsafe { std::env::set_var("VIEWMILL_CACHE_DIR", &override_dir) };
    let cache_dir = fixture.config().unwrap().cache_dir();
    unsafe { std::env::remove_var("VIEWMILL_CACHE_DIR") };

    assert_eq!(cache_dir.unwrap(), override_dir);
}
