//! HTTPS transport driven by a prebuilt trust configuration.
//!
//! Bollard's custom transport hook receives every request; the hyper client
//! behind it performs the TLS handshake with the roots and client identity
//! held by a [`TrustConfig`], so no PEM file is read a second time.

use std::sync::Arc;

use bollard::{BollardRequest, ClientVersion, Docker};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use super::CONNECTION_TIMEOUT_SECS;
use crate::error::ClientError;
use crate::tls::TrustConfig;

/// Rewrite an engine address to the `https` scheme.
///
/// `tcp://`, `http://` and `https://` prefixes are replaced; a bare
/// `host:port` gains the scheme.
pub(crate) fn https_address(address: &str) -> String {
    let authority = ["tcp://", "http://", "https://"]
        .iter()
        .find_map(|scheme| address.strip_prefix(scheme))
        .unwrap_or(address);
    format!("https://{authority}")
}

/// Build a client for `address` whose connections use `trust`.
///
/// Nothing is contacted until the first request.
///
/// # Errors
///
/// Returns `ClientError::Construction` if Bollard rejects the transport.
pub(crate) fn connect_over_tls(
    address: &str,
    trust: &TrustConfig,
    version: &ClientVersion,
) -> Result<Docker, ClientError> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    let https = HttpsConnector::from((http, trust.client_config()));

    let mut builder = Client::builder(TokioExecutor::new());
    builder.pool_max_idle_per_host(0);
    let shared_client = Arc::new(builder.build(https));

    Docker::connect_with_custom_transport(
        move |request: BollardRequest| {
            let client = Arc::clone(&shared_client);
            async move {
                client
                    .request(request)
                    .await
                    .map_err(bollard::errors::Error::from)
            }
        },
        Some(address),
        CONNECTION_TIMEOUT_SECS,
        version,
    )
    .map_err(|error| ClientError::Construction {
        message: format!("{address}: {error}"),
    })
}
