//! Semantic error types for machine-client.
//!
//! Each stage of client construction owns a `thiserror` enum so callers can
//! tell a missing helper apart from broken trust material or an unreachable
//! engine. Opaque errors (`eyre::Report`) are reserved for the binary.

use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while asking the helper process for connection parameters.
///
/// The client factory absorbs every variant of this enum and defers to the
/// fallback constructor instead of surfacing it.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The helper could not be started or exited unsuccessfully.
    #[error("helper '{helper}' is unavailable: {message}")]
    HelperUnavailable {
        /// The helper executable name.
        helper: String,
        /// A description of the failure.
        message: String,
    },
}

/// Errors raised while building the TLS trust configuration.
#[derive(Debug, Error)]
pub enum TrustError {
    /// The certificate authority file could not be read.
    #[error("failed to read CA certificate '{path}': {message}")]
    CertRead {
        /// The CA certificate path.
        path: Utf8PathBuf,
        /// A description of the read failure.
        message: String,
    },

    /// The certificate authority file held no appendable PEM certificate.
    #[error("no certificates appended from '{path}', refusing to use system roots only")]
    CertAppend {
        /// The CA certificate path.
        path: Utf8PathBuf,
    },

    /// The client certificate and key could not be loaded as a pair.
    #[error("failed to load client key pair ('{cert_path}', '{key_path}'): {message}")]
    KeyPair {
        /// The client certificate path.
        cert_path: Utf8PathBuf,
        /// The client private key path.
        key_path: Utf8PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// The TLS provider rejected the client configuration.
    #[error("failed to configure TLS: {message}")]
    TlsSetup {
        /// A description of the failure.
        message: String,
    },
}

/// Errors raised while resolving the API version or building the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote API version could not be determined.
    #[error("could not determine ApiVersion from '{url}': {message}")]
    VersionProbe {
        /// The probed URL.
        url: String,
        /// A description of the failure.
        message: String,
    },

    /// The engine client could not be constructed.
    #[error("failed to construct engine client: {message}")]
    Construction {
        /// A description of the failure.
        message: String,
    },

    /// Failed to connect to the container engine named by the environment.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The engine did not answer a ping.
    #[error("container engine health check failed: {message}")]
    HealthCheckFailed {
        /// A description of the health check failure.
        message: String,
    },

    /// Failed to create the runtime backing a synchronous call.
    #[error("failed to create async runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the runtime creation failure.
        message: String,
    },

    /// A blocking call was made from inside an async runtime.
    #[error("{operation} blocks and cannot run inside an async runtime, use {operation}_async")]
    NestedRuntime {
        /// The blocking operation that was called.
        operation: &'static str,
    },
}

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Top-level error type for machine-client.
///
/// Aggregates the stage errors into one type. The binary converts it into an
/// `eyre::Report` for human-readable output.
#[derive(Debug, Error)]
pub enum MachineClientError {
    /// The helper process could not provide a configuration.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The TLS trust configuration could not be built.
    #[error(transparent)]
    Trust(#[from] TrustError),

    /// The API version or client handle could not be produced.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The application configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A specialised `Result` type for machine-client operations.
pub type Result<T> = std::result::Result<T, MachineClientError>;
