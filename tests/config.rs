use std::fs;
use std::path::PathBuf;

use qtree::config::{Config, CONFIG_FILE};
use qtree::storage::Storage;

#[test]
fn load_from_root_defaults_on_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "layout = 123").expect("write invalid config");

    let cfg = Config::load_from_root(dir.path());
    assert_eq!(cfg.layout.node_radius, 40.0);
    assert_eq!(cfg.quests.default_title, "New Quest");
}

#[test]
fn load_from_root_defaults_on_bad_padding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let content = r#"
[layout]
padding = -5.0
"#;
    fs::write(dir.path().join(CONFIG_FILE), content.trim()).expect("write config");

    let cfg = Config::load_from_root(dir.path());
    assert_eq!(cfg.layout.padding, 20.0);
}

#[test]
fn partial_config_keeps_other_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[quests]\ndefault_x = 64.0\n").expect("write config");

    let cfg = Config::load_from_root(dir.path());
    assert_eq!(cfg.quests.default_x, 64.0);
    assert_eq!(cfg.quests.default_title, "New Quest");
    assert_eq!(cfg.layout.iterations, 4);
}

#[test]
fn store_dir_is_resolved_against_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(CONFIG_FILE), "[store]\ndir = \"state/qtree\"\n")
        .expect("write config");

    let cfg = Config::load_from_root(dir.path());
    assert_eq!(cfg.store.dir, Some(PathBuf::from("state/qtree")));

    let storage = Storage::for_root(dir.path(), &cfg);
    assert_eq!(storage.data_dir(), dir.path().join("state/qtree"));
    assert!(storage.init().expect("init"));
    assert!(dir.path().join("state/qtree/store.json").exists());
}
