use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn qtree_help_works() {
    Command::cargo_bin("qtree")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("prerequisite"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["init", "category", "tree", "quest", "link"];

    for cmd in subcommands {
        Command::cargo_bin("qtree")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn uninitialized_root_points_at_init() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("qtree")
        .expect("binary")
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(dir.path())
        .args(["quest", "ls"])
        .assert()
        .code(2)
        .stderr(contains("not initialized"))
        .stderr(contains("qtree init"));
}
