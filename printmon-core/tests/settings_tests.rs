//! Settings loading and discovery tests.
//!
//! Each test gets an isolated `TempDir`; the real working directory and
//! config directory are never consulted.

use std::fs;
use std::path::PathBuf;

use printmon_core::{ConfigError, Settings};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn partial_file_overrides_only_named_fields() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "printmon.yaml",
        "client:\n  base_url: http://printer.local:8080\nform:\n  code: B777\n",
    );

    let settings = Settings::load(&path).expect("load");
    assert_eq!(settings.client.base_url, "http://printer.local:8080");
    assert_eq!(settings.client.timeout_secs, 10);
    assert_eq!(settings.form.code, "B777");
    assert_eq!(settings.form.header, "Bem-vindo");
    assert_eq!(settings.server.stop_timeout_secs, 5);
}

#[test]
fn summary_rules_load_from_yaml() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "printmon.yaml",
        "summaries:\n  success:\n    - pattern: READY\n      summary: Ready to print\n  failure: []\n",
    );

    let settings = Settings::load(&path).expect("load");
    assert_eq!(settings.summaries.success.len(), 1);
    assert!(settings.summaries.failure.is_empty());
    let summaries = settings.summaries.summarize("printer READY");
    assert_eq!(summaries[0].text, "Ready to print");
}

#[test]
fn empty_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "printmon.yaml", "");
    assert_eq!(Settings::load(&path).expect("load"), Settings::default());
}

#[test]
fn malformed_yaml_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "printmon.yaml", "client: [unclosed\n");

    let err = Settings::load(&path).expect_err("should fail");
    match err {
        ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected Parse error, got {other:?}"),
    }
}

#[test]
fn explicit_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");
    let err = Settings::discover_at(Some(&missing), dir.path(), None).expect_err("should fail");
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn discovery_prefers_working_directory_file() {
    let cwd = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();
    write(&cwd, "printmon.yaml", "form:\n  code: LOCAL\n");
    write(&config_home, "printmon/config.yaml", "form:\n  code: USER\n");

    let (settings, source) =
        Settings::discover_at(None, cwd.path(), Some(config_home.path())).expect("discover");
    assert_eq!(settings.form.code, "LOCAL");
    assert_eq!(source, Some(cwd.path().join("printmon.yaml")));
}

#[test]
fn discovery_falls_back_to_config_dir_then_defaults() {
    let cwd = TempDir::new().unwrap();
    let config_home = TempDir::new().unwrap();

    let (settings, source) =
        Settings::discover_at(None, cwd.path(), Some(config_home.path())).expect("discover");
    assert_eq!(settings, Settings::default());
    assert!(source.is_none());

    write(&config_home, "printmon/config.yaml", "form:\n  code: USER\n");
    let (settings, _) =
        Settings::discover_at(None, cwd.path(), Some(config_home.path())).expect("discover");
    assert_eq!(settings.form.code, "USER");
}
