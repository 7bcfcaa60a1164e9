//! `viewmill cache` tests

use predicates::prelude::*;

use viewmill::test_utils::ProjectFixture;

use crate::common::viewmill_in;

fn cached_project() -> ProjectFixture {
    ProjectFixture::new()
        .unwrap()
        .cache_views(true)
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap()
}

#[test]
fn test_cache_status_before_any_build() {
    let fixture = cached_project();

    viewmill_in(fixture.project_dir())
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Present: no")
                .and(predicate::str::contains("Enabled: yes")),
        );
}

#[test]
fn test_cache_fills_on_list_and_clean_removes_it() {
    let fixture = cached_project();

    // A registry build populates the snapshot.
    viewmill_in(fixture.project_dir()).arg("list").assert().success();

    viewmill_in(fixture.project_dir())
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Present: yes").and(predicate::str::contains("Size:")));

    viewmill_in(fixture.project_dir())
        .args(["cache", "clean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshot removed"));

    viewmill_in(fixture.project_dir())
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Present: no"));
}

#[test]
fn test_cache_disable_enable_cycle() {
    let fixture = cached_project();

    viewmill_in(fixture.project_dir())
        .args(["cache", "disable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("View caching disabled"));

    // Disabled caching means builds leave no snapshot behind.
    viewmill_in(fixture.project_dir()).arg("list").assert().success();

    viewmill_in(fixture.project_dir())
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Enabled: no")
                .and(predicate::str::contains("Present: no")),
        );

    viewmill_in(fixture.project_dir())
        .args(["cache", "enable"])
        .assert()
        .success()
        .stdout(predicate::str::contains("View caching enabled"));

    viewmill_in(fixture.project_dir()).arg("list").assert().success();

    viewmill_in(fixture.project_dir())
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Present: yes"));
}

#[test]
fn test_cache_status_json() {
    let fixture = cached_project();

    let output = viewmill_in(fixture.project_dir())
        .args(["cache", "status", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stat: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(stat["present"], serde_json::json!(false));
    assert_eq!(stat["enabled"], serde_json::json!(true));
}
