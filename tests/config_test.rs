//! Integration tests for Settings config loading with layered precedence.
//!
//! The global file is passed explicitly via `Settings::load_from` so the tests
//! never read the real XDG config of the machine they run on.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use compass_admin::application::ApplicationError;
use compass_admin::config::Settings;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_no_files_when_loading_then_compiled_defaults() {
    let settings = Settings::load_from(None, None).expect("load settings");

    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8000);
    assert!(settings.data_file.ends_with("compass.json"));
}

#[test]
fn given_global_and_explicit_file_when_loading_then_explicit_wins() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let global = write(
        &temp,
        "global.toml",
        r#"
data_file = "/srv/compass/global.json"

[server]
host = "0.0.0.0"
port = 9000
"#,
    );
    let local = write(
        &temp,
        "local.toml",
        r#"
[server]
port = 9100
"#,
    );

    // Act
    let settings = Settings::load_from(Some(&global), Some(&local)).expect("load settings");

    // Assert: host and data_file come from global, port from the explicit file
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 9100);
    assert_eq!(settings.data_file, PathBuf::from("/srv/compass/global.json"));
}

#[test]
fn given_tilde_in_data_file_when_loading_then_expanded() {
    let temp = TempDir::new().unwrap();
    let local = write(&temp, "local.toml", r#"data_file = "~/compass/data.json""#);

    let settings = Settings::load_from(None, Some(&local)).expect("load settings");

    assert!(!settings.data_file.to_string_lossy().starts_with('~'));
    assert!(settings.data_file.ends_with("compass/data.json"));
}

#[test]
fn given_missing_explicit_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();

    let result = Settings::load_from(None, Some(&temp.path().join("nope.toml")));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_malformed_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let local = write(&temp, "local.toml", "[server\nport = ");

    let result = Settings::load_from(None, Some(&local));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_settings_when_rendering_toml_then_round_trips() {
    let settings = Settings::load_from(None, None).unwrap();

    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, settings);
}
