//! API version probing over the trust-configured transport.

use std::future::Future;
use std::pin::Pin;

use rustls::ClientConfig;
use serde_json::Value;

use crate::error::ClientError;
use crate::tls::TrustConfig;

/// Field of the `/version` response holding the API version.
const API_VERSION_FIELD: &str = "ApiVersion";

/// Boxed future type for async trait methods.
///
/// This type alias enables `mockall::automock` compatibility and trait object
/// usage for the async method of [`VersionProbe`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves the remote engine's API version.
#[cfg_attr(test, mockall::automock)]
pub trait VersionProbe {
    /// Ask the engine at `url` for its API version.
    ///
    /// The returned future owns everything it needs from `url` and `trust`
    /// and does not borrow the probe.
    ///
    /// # Errors
    ///
    /// The future resolves to [`ClientError::VersionProbe`] if the version
    /// cannot be determined.
    fn probe(
        &self,
        url: &str,
        trust: &TrustConfig,
    ) -> BoxFuture<'static, Result<String, ClientError>>;
}

/// Probes `GET /version` over HTTPS with a single request.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpsVersionProbe;

impl VersionProbe for HttpsVersionProbe {
    fn probe(
        &self,
        url: &str,
        trust: &TrustConfig,
    ) -> BoxFuture<'static, Result<String, ClientError>> {
        let target = probe_url(url);
        let tls = trust.client_config();
        Box::pin(async move {
            let version = fetch_api_version(&target, tls.as_ref().clone()).await?;
            tracing::debug!(url = %target, version, "probed engine API version");
            Ok(version)
        })
    }
}

/// The version endpoint for an engine address.
///
/// A leading `tcp` scheme is rewritten to `https`; any other address is used
/// as is.
#[must_use]
pub fn probe_url(url: &str) -> String {
    let base = url
        .strip_prefix("tcp")
        .map_or_else(|| url.to_owned(), |rest| format!("https{rest}"));
    format!("{base}/version")
}

/// Extract the `ApiVersion` string from a `/version` response body.
///
/// # Errors
///
/// Returns a description of the problem if the body is not JSON or the field
/// is missing or not a string.
pub fn extract_api_version(body: &[u8]) -> Result<String, String> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|error| format!("{error}: {}", String::from_utf8_lossy(body)))?;
    value
        .get(API_VERSION_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| format!("no string {API_VERSION_FIELD} in {value}"))
}

async fn fetch_api_version(target: &str, tls: ClientConfig) -> Result<String, ClientError> {
    let probe_error = |message: String| ClientError::VersionProbe {
        url: target.to_owned(),
        message,
    };

    let client = reqwest::Client::builder()
        .use_preconfigured_tls(tls)
        .build()
        .map_err(|error| probe_error(error.to_string()))?;
    let response = client
        .get(target)
        .send()
        .await
        .map_err(|error| probe_error(error.to_string()))?;
    let body = response
        .bytes()
        .await
        .map_err(|error| probe_error(error.to_string()))?;

    extract_api_version(&body).map_err(probe_error)
}
