//! Shared helpers for the test suites
//!
//! The binary tests build on [`viewmill::test_utils::ProjectFixture`] for
//! on-disk projects and run the compiled `viewmill` binary through
//! `assert_cmd`.

use assert_cmd::Command;

/// A `viewmill` command pointed at nothing yet; callers add arguments.
pub fn viewmill_cmd() -> Command {
    Command::cargo_bin("viewmill").expect("viewmill binary should be built")
}

/// A `viewmill` command with `--project` already set.
pub fn viewmill_in(project: &std::path::Path) -> Command {
    let mut cmd = viewmill_cmd();
    cmd.arg("--project").arg(project);
    cmd
}
