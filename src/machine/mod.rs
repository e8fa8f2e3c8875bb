//! Connection parameter discovery through `docker-machine`.
//!
//! The helper is asked for its `config` (and, when the caller does not probe
//! the engine, its `version`). Output is parsed into a
//! [`RemoteEndpointConfig`]. Any failure to run the helper is reported as
//! [`DiscoveryError::HelperUnavailable`]; the caller decides what absence
//! means.

mod parser;
mod runner;

use camino::Utf8PathBuf;

use crate::error::DiscoveryError;

pub use parser::{parse_config_output, scrub_value};
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};

/// Default helper executable.
pub const DEFAULT_HELPER: &str = "docker-machine";

/// Machine name used for the version query when none is configured.
const DEFAULT_MACHINE: &str = "default";

/// Connection parameters reported by the helper.
///
/// Every field comes from helper output; missing entries stay empty and are
/// not validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteEndpointConfig {
    /// Engine address, for example `tcp://192.0.2.10:2376`.
    pub url: String,
    /// Whether the helper asked for TLS verification.
    ///
    /// Read but never consulted: see [`crate::tls::TLS_VERIFY_ALWAYS_ENFORCED`].
    pub tls_verify: bool,
    /// Certificate authority PEM file.
    pub ca_cert_path: Utf8PathBuf,
    /// Client certificate PEM file.
    pub cert_path: Utf8PathBuf,
    /// Client private key PEM file.
    pub key_path: Utf8PathBuf,
    /// Version reported by `<helper> version`, when it was queried.
    pub api_version: Option<String>,
}

/// Receives non-fatal diagnostics raised while parsing helper output.
pub trait DiagnosticSink {
    /// Called with the full line of an entry whose key is not recognised.
    fn unknown_key(&self, line: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str),
{
    fn unknown_key(&self, line: &str) {
        self(line);
    }
}

/// Reports diagnostics as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn unknown_key(&self, line: &str) {
        tracing::warn!(line, "unknown helper config entry");
    }
}

/// The helper executable and the machine it is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helper {
    program: String,
    machine: Option<String>,
}

impl Default for Helper {
    fn default() -> Self {
        Self::new(DEFAULT_HELPER)
    }
}

impl Helper {
    /// Creates a helper that queries the active machine.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            machine: None,
        }
    }

    /// Targets a named machine instead of the active one.
    #[must_use]
    pub fn with_machine(mut self, machine: Option<String>) -> Self {
        self.machine = machine.filter(|name| !name.is_empty());
        self
    }

    /// The helper executable name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for the configuration query.
    #[must_use]
    pub fn config_args(&self) -> Vec<&str> {
        let mut args = vec!["config"];
        args.extend(self.machine.as_deref());
        args
    }

    /// Arguments for the version query.
    #[must_use]
    pub fn version_args(&self) -> Vec<&str> {
        vec!["version", self.machine.as_deref().unwrap_or(DEFAULT_MACHINE)]
    }
}

/// Ask the helper for the engine connection parameters.
///
/// Runs `<helper> config` and parses the output. When `query_version` is set,
/// also runs `<helper> version default` and records its first line as the API
/// version; empty output yields an empty version.
///
/// # Errors
///
/// Returns [`DiscoveryError::HelperUnavailable`] if either invocation cannot
/// be started or exits unsuccessfully.
pub fn discover_config(
    runner: &dyn CommandRunner,
    helper: &Helper,
    query_version: bool,
    sink: &dyn DiagnosticSink,
) -> Result<RemoteEndpointConfig, DiscoveryError> {
    let config_output = run_helper(runner, helper, &helper.config_args())?;
    let config = parse_config_output(&config_output, sink);

    if !query_version {
        return Ok(config);
    }

    let version_output = run_helper(runner, helper, &helper.version_args())?;
    Ok(RemoteEndpointConfig {
        api_version: Some(first_line(&version_output)),
        ..config
    })
}

fn run_helper(
    runner: &dyn CommandRunner,
    helper: &Helper,
    args: &[&str],
) -> Result<String, DiscoveryError> {
    let output = runner
        .run(helper.program(), args)
        .map_err(|error| DiscoveryError::HelperUnavailable {
            helper: helper.program().to_owned(),
            message: error.to_string(),
        })?;

    if !output.success {
        let status = output
            .code
            .map_or_else(|| String::from("a signal"), |code| format!("code {code}"));
        return Err(DiscoveryError::HelperUnavailable {
            helper: helper.program().to_owned(),
            message: format!("'{}' exited with {status}", args.join(" ")),
        });
    }

    Ok(output.stdout)
}

fn first_line(output: &str) -> String {
    output.lines().next().map(str::trim).unwrap_or_default().to_owned()
}
