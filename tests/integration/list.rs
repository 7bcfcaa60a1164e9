//! `viewmill list` tests

use predicates::prelude::*;

use viewmill::test_utils::ProjectFixture;

use crate::common::viewmill_in;

fn two_module_project() -> ProjectFixture {
    ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .module("contents")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap()
        .fragment(
            "contents",
            "[contents.home]\ntitle = \"Home\"\nrenders = \"one\"\n",
        )
        .unwrap()
}

#[test]
fn test_list_table_shows_every_view() {
    let fixture = two_module_project();

    viewmill_in(fixture.project_dir())
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ID")
                .and(predicate::str::contains("articles/list"))
                .and(predicate::str::contains("contents/home"))
                .and(predicate::str::contains("many"))
                .and(predicate::str::contains("Articles")),
        );
}

#[test]
fn test_list_module_filter() {
    let fixture = two_module_project();

    viewmill_in(fixture.project_dir())
        .args(["list", "--module", "articles"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("articles/list")
                .and(predicate::str::contains("contents/home").not()),
        );
}

#[test]
fn test_list_json_is_machine_readable() {
    let fixture = two_module_project();

    let output = viewmill_in(fixture.project_dir())
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let views: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let views = views.as_array().unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0]["id"], serde_json::json!("articles/list"));
    assert_eq!(views[0]["renders"], serde_json::json!("many"));
    assert_eq!(views[1]["id"], serde_json::json!("contents/home"));
}

#[test]
fn test_list_empty_project() {
    let fixture = ProjectFixture::new().unwrap();

    viewmill_in(fixture.project_dir())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No views defined"));
}
