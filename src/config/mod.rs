//! Configuration system for machine-client.
//!
//! Configuration loading and precedence merging is handled by the
//! `ortho_config` crate. CLI flags override environment variables, which
//! override configuration files, which override defaults.
//!
//! The configuration file is expected at `~/.config/machine-client/config.toml`
//! by default.
//!
//! # Example Configuration
//!
//! ```toml
//! helper = "docker-machine"
//! machine = "staging"
//! require_client_cert = true
//! resolve_version_via_probe = false
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Commands};
pub use loader::{CONFIG_PATH_ENV_VAR, env_var_names, load_config, load_config_with_env};
pub use types::AppConfig;
