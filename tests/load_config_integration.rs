//! Integration tests for the `load_config()` public API.
//!
//! These read the real process environment, so every test clears the
//! `MACHINE_CLIENT_*` variables and runs under `#[serial]`.

use std::io::Write;

use camino::Utf8PathBuf;
use machine_client::config::{CONFIG_PATH_ENV_VAR, Cli, Commands, env_var_names, load_config};
use machine_client::error::{ConfigError, MachineClientError};
use serial_test::serial;
use tempfile::NamedTempFile;

/// Clears all `MACHINE_CLIENT_*` variables that affect configuration loading.
fn clear_machine_client_env() {
    for var in env_var_names().into_iter().chain([CONFIG_PATH_ENV_VAR]) {
        // SAFETY: tests touching the environment run serially via `#[serial]`.
        unsafe {
            std::env::remove_var(var);
        }
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: tests touching the environment run serially via `#[serial]`.
    unsafe {
        std::env::set_var(key, value);
    }
}

const fn cli_with_config(config_path: Option<Utf8PathBuf>) -> Cli {
    Cli {
        command: Commands::Config,
        config: config_path,
        helper: None,
        machine: None,
        no_client_cert: false,
        helper_version: false,
    }
}

fn temp_config_file(content: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

fn utf8_path(file: &NamedTempFile) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("temp path should be UTF-8")
}

#[test]
#[serial]
fn explicit_file_and_environment_are_layered() {
    clear_machine_client_env();
    let file = temp_config_file("helper = \"file-helper\"\nmachine = \"file-machine\"\n")
        .expect("config file should be written");
    set_env("MACHINE_CLIENT_MACHINE", "env-machine");
    set_env("MACHINE_CLIENT_REQUIRE_CLIENT_CERT", "false");

    let config = load_config(&cli_with_config(Some(utf8_path(&file))))
        .expect("load_config should succeed");
    clear_machine_client_env();

    assert_eq!(config.helper.as_deref(), Some("file-helper"));
    assert_eq!(config.machine.as_deref(), Some("env-machine"));
    assert!(!config.require_client_cert);
    assert!(config.resolve_version_via_probe);
}

#[test]
#[serial]
fn config_path_variable_selects_the_file() {
    clear_machine_client_env();
    let file = temp_config_file("resolve_version_via_probe = false\n")
        .expect("config file should be written");
    set_env(CONFIG_PATH_ENV_VAR, utf8_path(&file).as_str());

    let config = load_config(&cli_with_config(None)).expect("load_config should succeed");
    clear_machine_client_env();

    assert!(!config.resolve_version_via_probe);
}

#[test]
#[serial]
fn invalid_boolean_in_environment_is_rejected() {
    clear_machine_client_env();
    let file = temp_config_file("").expect("config file should be written");
    set_env("MACHINE_CLIENT_RESOLVE_VERSION_VIA_PROBE", "sometimes");

    let result = load_config(&cli_with_config(Some(utf8_path(&file))));
    clear_machine_client_env();

    assert!(matches!(
        result,
        Err(MachineClientError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
#[serial]
fn cli_flags_override_environment() {
    clear_machine_client_env();
    let file = temp_config_file("").expect("config file should be written");
    set_env("MACHINE_CLIENT_HELPER", "env-helper");
    let cli = Cli {
        helper: Some(String::from("cli-helper")),
        no_client_cert: true,
        ..cli_with_config(Some(utf8_path(&file)))
    };

    let config = load_config(&cli).expect("load_config should succeed");
    clear_machine_client_env();

    assert_eq!(config.helper.as_deref(), Some("cli-helper"));
    assert!(!config.require_client_cert);
    assert_eq!(config.factory_options().helper, "cli-helper");
}
