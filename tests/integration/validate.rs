//! `viewmill validate` tests

use predicates::prelude::*;

use viewmill::test_utils::ProjectFixture;

use crate::common::viewmill_in;

fn basic_project() -> ProjectFixture {
    ProjectFixture::new()
        .unwrap()
        .module_with("articles", None, Some("Articles"))
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap()
}

#[test]
fn test_validate_valid_project() {
    let fixture = basic_project();

    viewmill_in(fixture.project_dir())
        .arg("validate")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Project file is valid")
                .and(predicate::str::contains("Modules: 1"))
                .and(predicate::str::contains("Views: 1")),
        );
}

#[test]
fn test_validate_json_report() {
    let fixture = basic_project();

    let output = viewmill_in(fixture.project_dir())
        .args(["validate", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], serde_json::json!(true));
    assert_eq!(report["views"][0], serde_json::json!("articles/list"));
    assert!(report["undeclared_modules"].as_array().unwrap().is_empty());
}

#[test]
fn test_validate_warns_about_undeclared_modules() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .search_root("all")
        .unwrap()
        .file(
            "all/views.toml",
            "[pages.home]\ntitle = \"Home\"\nrenders = \"one\"\n",
        )
        .unwrap();

    viewmill_in(fixture.project_dir())
        .arg("validate")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("missing from the project file")
                .and(predicate::str::contains("pages/home")),
        );
}

#[test]
fn test_validate_fails_on_missing_title() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment("articles", "[articles.list]\nrenders = \"many\"\n")
        .unwrap();

    viewmill_in(fixture.project_dir())
        .arg("validate")
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("articles/list")
                .and(predicate::str::contains("title")),
        );
}

#[test]
fn test_validate_fails_without_project_file() {
    let temp = tempfile::TempDir::new().unwrap();

    viewmill_in(temp.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("viewmill.toml"));
}
