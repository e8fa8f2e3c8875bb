//! Final client construction for a discovered engine.

use bollard::{API_DEFAULT_VERSION, ClientVersion, Docker};
use camino::Utf8PathBuf;

use crate::engine::connection::{connect_over_tls, https_address};
use crate::error::ClientError;
use crate::tls::TrustConfig;

/// Everything needed to build the client once discovery and trust succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Engine address as reported by the helper.
    pub url: String,
    /// Resolved API version; empty means the client default.
    pub api_version: String,
    /// Certificate authority PEM file.
    pub ca_cert_path: Utf8PathBuf,
    /// Client certificate PEM file, as reported.
    pub cert_path: Utf8PathBuf,
    /// Client private key PEM file, as reported.
    pub key_path: Utf8PathBuf,
}

/// Builds the engine client handle for a resolved endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait ClientConnector {
    /// Construct the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Construction`] if the client cannot be built.
    fn connect(&self, endpoint: &ResolvedEndpoint, trust: &TrustConfig)
    -> Result<Docker, ClientError>;
}

/// Connects over HTTPS through the trust configuration's rustls client.
///
/// The handshake uses exactly the roots and client identity held by the
/// [`TrustConfig`]; the endpoint's PEM paths are not read again.
#[derive(Debug, Clone, Copy, Default)]
pub struct BollardTlsConnector;

impl ClientConnector for BollardTlsConnector {
    fn connect(
        &self,
        endpoint: &ResolvedEndpoint,
        trust: &TrustConfig,
    ) -> Result<Docker, ClientError> {
        let version = parse_client_version(&endpoint.api_version);
        let address = https_address(&endpoint.url);
        tracing::debug!(
            address,
            client_identity = trust.has_client_identity(),
            "building TLS client for discovered engine"
        );
        connect_over_tls(&address, trust, &version)
    }
}

/// Parse the leading `major.minor` of an API version.
///
/// A leading `v` and any parts after the minor version are ignored, so
/// `18.09.0` reads as 18.9. Empty input means the client default, as does
/// anything unparseable, which is logged at warn level.
#[must_use]
pub fn parse_client_version(version: &str) -> ClientVersion {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return default_client_version();
    }

    leading_major_minor(trimmed).unwrap_or_else(|| {
        tracing::warn!(
            version = trimmed,
            "unrecognised API version, using the client default"
        );
        default_client_version()
    })
}

fn leading_major_minor(version: &str) -> Option<ClientVersion> {
    let numeric = version.strip_prefix('v').unwrap_or(version);
    let mut parts = numeric.split('.');
    let major_version = parts.next()?.parse().ok()?;
    let minor_version = parts.next()?.parse().ok()?;
    Some(ClientVersion {
        major_version,
        minor_version,
    })
}

const fn default_client_version() -> ClientVersion {
    ClientVersion {
        major_version: API_DEFAULT_VERSION.major_version,
        minor_version: API_DEFAULT_VERSION.minor_version,
    }
}
