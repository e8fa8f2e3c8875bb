//! Configuration data types for machine-client.

use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};

use crate::engine::FactoryOptions;
use crate::machine::DEFAULT_HELPER;

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path specified via `MACHINE_CLIENT_CONFIG_PATH` environment variable
/// 2. `.machine-client.toml` in the current working directory
/// 3. `.machine-client.toml` in the home directory
/// 4. `~/.config/machine-client/config.toml` (XDG default)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "MACHINE_CLIENT",
    post_merge_hook,
    discovery(
        app_name = "machine-client",
        env_var = "MACHINE_CLIENT_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".machine-client.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Helper executable; `docker-machine` when unset.
    pub helper: Option<String>,

    /// Machine to query instead of the helper's active machine.
    pub machine: Option<String>,

    /// Load and present the client certificate and key.
    #[ortho_config(skip_cli)]
    pub require_client_cert: bool,

    /// Probe the engine's `/version` endpoint rather than asking the helper.
    #[ortho_config(skip_cli)]
    pub resolve_version_via_probe: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            helper: None,
            machine: None,
            require_client_cert: true,
            resolve_version_via_probe: true,
        }
    }
}

impl AppConfig {
    /// The factory options described by this configuration.
    #[must_use]
    pub fn factory_options(&self) -> FactoryOptions {
        FactoryOptions {
            require_client_cert: self.require_client_cert,
            resolve_version_via_probe: self.resolve_version_via_probe,
            helper: self
                .helper
                .clone()
                .unwrap_or_else(|| String::from(DEFAULT_HELPER)),
            machine: self.machine.clone(),
        }
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        // Blank names mean "not set" whichever layer supplied them.
        if self.helper.as_deref().is_some_and(|h| h.trim().is_empty()) {
            self.helper = None;
        }
        if self.machine.as_deref().is_some_and(|m| m.trim().is_empty()) {
            self.machine = None;
        }
        Ok(())
    }
}
