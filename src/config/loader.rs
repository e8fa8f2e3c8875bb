//! Configuration loading with layered precedence.
//!
//! Layers are composed (lowest to highest): application defaults,
//! configuration file, environment variables, command-line arguments.
//!
//! `MergeComposer` is driven by hand rather than through the derived
//! `OrthoConfig::load()` because the `Cli` struct owns subcommand dispatch,
//! and because typed environment variables must fail fast. Figment's
//! environment provider would silently drop `MACHINE_CLIENT_REQUIRE_CLIENT_CERT=maybe`;
//! this loader reports it.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::{DefaultEnv, Env};
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV_VAR: &str = "MACHINE_CLIENT_CONFIG_PATH";

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`). Invalid values return an error.
    Bool,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    /// The environment variable name (e.g., `MACHINE_CLIENT_HELPER`).
    env_var: &'static str,
    /// The `AppConfig` field it sets.
    field: &'static str,
    /// The expected value type.
    var_type: EnvVarType,
}

/// Table of all environment variables and the fields they set.
const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "MACHINE_CLIENT_HELPER",
        field: "helper",
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "MACHINE_CLIENT_MACHINE",
        field: "machine",
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "MACHINE_CLIENT_REQUIRE_CLIENT_CERT",
        field: "require_client_cert",
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "MACHINE_CLIENT_RESOLVE_VERSION_VIA_PROBE",
        field: "resolve_version_via_probe",
        var_type: EnvVarType::Bool,
    },
];

/// Returns the list of environment variable names recognised by the config loader.
///
/// Tests use this to clear every `MACHINE_CLIENT_*` variable without keeping a
/// second list in sync.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Load a configuration file and push it to the composer.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Load configuration with full layer precedence from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - `--config` names a file that does not exist
/// - a configuration file cannot be read or parsed
/// - a typed environment variable holds an invalid value
/// - the merged layers do not form a valid `AppConfig`
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    load_config_with_env(cli, &DefaultEnv::new())
}

/// Load configuration reading environment variables through `env`.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env(cli: &Cli, env: &impl Env) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(path) = resolve_config_path(cli)? {
        load_config_file(&path, &mut composer)?;
    }

    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;

    Ok(config)
}

/// An explicit `--config` must exist; otherwise discovery picks the first
/// existing candidate, if any.
fn resolve_config_path(cli: &Cli) -> Result<Option<Utf8PathBuf>> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.clone().into_std_path_buf(),
            }
            .into());
        }
        return Ok(Some(path.clone()));
    }

    let discovery = ConfigDiscovery::builder("machine-client")
        .env_var(CONFIG_PATH_ENV_VAR)
        .config_file_name("config.toml")
        .dotfile_name(".machine-client.toml")
        .build();
    Ok(discovery
        .candidates()
        .into_iter()
        .filter(|p| p.exists())
        .find_map(|p| Utf8PathBuf::try_from(p).ok()))
}

/// Collect `MACHINE_CLIENT_*` variables into a JSON object.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if a boolean variable is not
/// `true` or `false`.
fn collect_env_vars(env: &impl Env) -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = env.string(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Bool => match raw_value.parse::<bool>() {
                Ok(b) => Value::Bool(b),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected bool (true/false), got '{raw_value}'"),
                    }
                    .into());
                }
            },
        };

        root.insert(spec.field.to_owned(), json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Build a JSON value containing CLI overrides.
///
/// Boolean flags only ever switch a behaviour off, so an absent flag leaves
/// lower layers in charge.
fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(helper) = &cli.helper {
        overrides.insert("helper".to_owned(), Value::String(helper.clone()));
    }
    if let Some(machine) = &cli.machine {
        overrides.insert("machine".to_owned(), Value::String(machine.clone()));
    }
    if cli.no_client_cert {
        overrides.insert("require_client_cert".to_owned(), Value::Bool(false));
    }
    if cli.helper_version {
        overrides.insert("resolve_version_via_probe".to_owned(), Value::Bool(false));
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}
