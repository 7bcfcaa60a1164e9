//! `viewmill template` tests

use predicates::prelude::*;

use viewmill::test_utils::ProjectFixture;

use crate::common::viewmill_in;

fn project_with_template() -> ProjectFixture {
    ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap()
        .file("modules/articles/templates/list.tera", "{{ view.title }}")
        .unwrap()
}

#[test]
fn test_template_prints_winning_path() {
    let fixture = project_with_template();

    viewmill_in(fixture.project_dir())
        .args(["template", "articles/list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list.tera"));
}

#[test]
fn test_template_candidates_marks_the_hit() {
    let fixture = project_with_template();

    viewmill_in(fixture.project_dir())
        .args(["template", "articles/list", "--candidates"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("✓")
                .and(predicate::str::contains("list.tera"))
                .and(predicate::str::contains("list.html")),
        );
}

#[test]
fn test_template_miss_fails_with_tried_paths() {
    let fixture = ProjectFixture::new()
        .unwrap()
        .module("articles")
        .unwrap()
        .fragment(
            "articles",
            "[articles.list]\ntitle = \"Articles\"\nrenders = \"many\"\n",
        )
        .unwrap();

    viewmill_in(fixture.project_dir())
        .args(["template", "articles/list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No template found"));
}

#[test]
fn test_template_unknown_view_fails() {
    let fixture = project_with_template();

    viewmill_in(fixture.project_dir())
        .args(["template", "ghost/list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not defined"));
}
