//! TLS trust configuration for helper-discovered engines.
//!
//! The trust store starts from the platform roots and is augmented with the
//! machine's certificate authority. When mutual authentication is required the
//! client certificate and key are attached as the client identity.

mod pem;

use std::sync::Arc;

use camino::Utf8Path;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};

use crate::error::TrustError;

/// Server certificate verification is always enforced.
///
/// The helper's `tlsverify` flag is parsed into
/// [`RemoteEndpointConfig::tls_verify`](crate::machine::RemoteEndpointConfig::tls_verify)
/// but never used to relax verification.
pub const TLS_VERIFY_ALWAYS_ENFORCED: bool = true;

/// Trust material for connecting to a discovered engine.
#[derive(Debug, Clone)]
pub struct TrustConfig {
    roots: RootCertStore,
    appended_ca_certificates: usize,
    has_client_identity: bool,
    client_config: Arc<ClientConfig>,
}

impl TrustConfig {
    /// The augmented root store (platform roots plus the machine CA).
    #[must_use]
    pub const fn roots(&self) -> &RootCertStore {
        &self.roots
    }

    /// Number of certificates appended from the CA file.
    #[must_use]
    pub const fn appended_ca_certificates(&self) -> usize {
        self.appended_ca_certificates
    }

    /// Whether a client certificate is presented during the handshake.
    #[must_use]
    pub const fn has_client_identity(&self) -> bool {
        self.has_client_identity
    }

    /// The rustls client configuration carrying roots and identity.
    #[must_use]
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.client_config)
    }
}

/// Build a trust configuration from PEM files.
///
/// `identity` holds the client certificate and key paths; pass `None` for
/// CA-only trust.
///
/// # Errors
///
/// Returns [`TrustError::CertRead`] if the CA file cannot be read,
/// [`TrustError::CertAppend`] if it contains no usable certificate and
/// [`TrustError::KeyPair`] if the client certificate or key is unreadable,
/// malformed or mismatched.
pub fn build_trust_config(
    ca_cert_path: &Utf8Path,
    identity: Option<(&Utf8Path, &Utf8Path)>,
) -> Result<TrustConfig, TrustError> {
    let mut roots = platform_roots();

    let ca_pem = pem::read_file(ca_cert_path).map_err(|error| TrustError::CertRead {
        path: ca_cert_path.to_owned(),
        message: error.to_string(),
    })?;
    let (appended, _ignored) = roots.add_parsable_certificates(pem::parse_ca_certificates(&ca_pem));
    if appended == 0 {
        return Err(TrustError::CertAppend {
            path: ca_cert_path.to_owned(),
        });
    }

    let builder = ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|error| TrustError::TlsSetup {
            message: error.to_string(),
        })?
        .with_root_certificates(roots.clone());

    let client_config = match identity {
        Some((cert_path, key_path)) => {
            let (chain, key) = pem::load_identity(cert_path, key_path)?;
            builder
                .with_client_auth_cert(chain, key)
                .map_err(|error| TrustError::KeyPair {
                    cert_path: cert_path.to_owned(),
                    key_path: key_path.to_owned(),
                    message: error.to_string(),
                })?
        }
        None => builder.with_no_client_auth(),
    };

    Ok(TrustConfig {
        roots,
        appended_ca_certificates: appended,
        has_client_identity: identity.is_some(),
        client_config: Arc::new(client_config),
    })
}

/// The process default provider, or ring when none is installed.
fn crypto_provider() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()))
}

/// Platform roots, or an empty store when they cannot be loaded.
fn platform_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        tracing::debug!(%error, "skipping unreadable platform trust store entry");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    tracing::debug!(added, ignored, "loaded platform trust store");
    roots
}
