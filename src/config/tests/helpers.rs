//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use ortho_config::MergeComposer;
use rstest::fixture;

use crate::config::AppConfig;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        helper = "/opt/bin/docker-machine"
        machine = "staging"
        require_client_cert = false
        resolve_version_via_probe = false
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        machine = "dev"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.helper.is_none(), "helper should be None");
    assert!(config.machine.is_none(), "machine should be None");
    assert!(
        config.require_client_cert,
        "require_client_cert should be true"
    );
    assert!(
        config.resolve_version_via_probe,
        "resolve_version_via_probe should be true"
    );
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "helper": "file-helper",
            "machine": "file-machine"
        }),
        None,
    );

    composer.push_environment(json!({
        "machine": "env-machine"
    }));

    Ok(composer)
}
