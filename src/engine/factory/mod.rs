//! Helper-aware engine client construction.
//!
//! [`ClientFactory`] runs one linear procedure per call:
//!
//! 1. Discover the endpoint through the helper. If the helper is missing or
//!    fails, the fallback constructor's result is returned untouched.
//! 2. Build the TLS trust configuration. Failures are terminal.
//! 3. Resolve the API version, by probing `/version` or from the helper.
//! 4. Construct the client.
//!
//! Nothing is retried and nothing outlives the call. Discovery and trust
//! building block briefly on the helper process and PEM reads; only the probe
//! awaits the network. [`ClientFactory::create_client_with_async`] runs the
//! procedure inside an existing runtime, and
//! [`ClientFactory::create_client_with`] drives it on a dedicated one.

mod connector;
mod probe;

use bollard::Docker;

use crate::engine::connection::block_on;
use crate::error::Result;
use crate::machine::{
    CommandRunner, DEFAULT_HELPER, DiagnosticSink, Helper, SystemCommandRunner,
    TracingDiagnostics, discover_config,
};
use crate::tls::build_trust_config;

pub use connector::{BollardTlsConnector, ClientConnector, ResolvedEndpoint, parse_client_version};
pub use probe::{BoxFuture, HttpsVersionProbe, VersionProbe, extract_api_version, probe_url};

#[cfg(test)]
pub(crate) use connector::MockClientConnector;
#[cfg(test)]
pub(crate) use probe::MockVersionProbe;

/// Selects which of the construction steps run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Load and present the client certificate and key.
    pub require_client_cert: bool,
    /// Probe the engine's `/version` endpoint instead of asking the helper.
    pub resolve_version_via_probe: bool,
    /// Helper executable name.
    pub helper: String,
    /// Machine to query; `None` uses the helper's active machine.
    pub machine: Option<String>,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            require_client_cert: true,
            resolve_version_via_probe: true,
            helper: String::from(DEFAULT_HELPER),
            machine: None,
        }
    }
}

/// Builds engine clients from helper-reported connection parameters.
pub struct ClientFactory {
    options: FactoryOptions,
    runner: Box<dyn CommandRunner + Send + Sync>,
    diagnostics: Box<dyn DiagnosticSink + Send + Sync>,
    probe: Box<dyn VersionProbe + Send + Sync>,
    connector: Box<dyn ClientConnector + Send + Sync>,
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::new(FactoryOptions::default())
    }
}

impl ClientFactory {
    /// Creates a factory that spawns the real helper and probes over HTTPS.
    #[must_use]
    pub fn new(options: FactoryOptions) -> Self {
        Self {
            options,
            runner: Box::new(SystemCommandRunner),
            diagnostics: Box::new(TracingDiagnostics),
            probe: Box::new(HttpsVersionProbe),
            connector: Box::new(BollardTlsConnector),
        }
    }

    /// Replaces the helper process runner.
    #[must_use]
    pub fn with_runner(mut self, runner: impl CommandRunner + Send + Sync + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Replaces the sink receiving unknown-key diagnostics.
    #[must_use]
    pub fn with_diagnostics(
        mut self,
        diagnostics: impl DiagnosticSink + Send + Sync + 'static,
    ) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Replaces the API version probe.
    #[must_use]
    pub fn with_probe(mut self, probe: impl VersionProbe + Send + Sync + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Replaces the final client connector.
    #[must_use]
    pub fn with_connector(
        mut self,
        connector: impl ClientConnector + Send + Sync + 'static,
    ) -> Self {
        self.connector = Box::new(connector);
        self
    }

    /// The options this factory was built with.
    #[must_use]
    pub const fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// Build a client, deferring to `fallback` when the helper is unavailable
    /// (async version).
    ///
    /// The fallback's result is returned exactly as produced. Once the helper
    /// has answered, every failure is returned as an error and the fallback is
    /// not consulted.
    ///
    /// # Errors
    ///
    /// Returns `TrustError` variants when the certificate material is
    /// unusable, `ClientError::VersionProbe` when the probe fails, and
    /// `ClientError::Construction` when the client cannot be built.
    pub async fn create_client_with_async<F>(&self, fallback: F) -> Result<Docker>
    where
        F: FnOnce() -> Result<Docker>,
    {
        let helper = Helper::new(self.options.helper.as_str())
            .with_machine(self.options.machine.clone());
        let query_version = !self.options.resolve_version_via_probe;

        let discovered = match discover_config(
            self.runner.as_ref(),
            &helper,
            query_version,
            self.diagnostics.as_ref(),
        ) {
            Ok(discovered) => discovered,
            Err(error) => {
                tracing::debug!(%error, "helper unavailable, using fallback client");
                return fallback();
            }
        };

        let identity = self
            .options
            .require_client_cert
            .then(|| (discovered.cert_path.as_path(), discovered.key_path.as_path()));
        let trust = build_trust_config(&discovered.ca_cert_path, identity)?;

        let api_version = if self.options.resolve_version_via_probe {
            self.probe.probe(&discovered.url, &trust).await?
        } else {
            discovered.api_version.unwrap_or_default()
        };

        let endpoint = ResolvedEndpoint {
            url: discovered.url,
            api_version,
            ca_cert_path: discovered.ca_cert_path,
            cert_path: discovered.cert_path,
            key_path: discovered.key_path,
        };
        let docker = self.connector.connect(&endpoint, &trust)?;
        Ok(docker)
    }

    /// Build a client, deferring to `fallback` when the helper is unavailable.
    ///
    /// Creates a dedicated tokio runtime; use
    /// [`Self::create_client_with_async`] when already in an async context.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NestedRuntime` when called inside a runtime,
    /// otherwise as [`Self::create_client_with_async`].
    pub fn create_client_with<F>(&self, fallback: F) -> Result<Docker>
    where
        F: FnOnce() -> Result<Docker>,
    {
        block_on("create_client_with", self.create_client_with_async(fallback))?
    }
}

/// Build a client through `docker-machine`, falling back to `fallback`.
///
/// # Errors
///
/// See [`ClientFactory::create_client_with`].
pub fn create_client<F>(fallback: F) -> Result<Docker>
where
    F: FnOnce() -> Result<Docker>,
{
    ClientFactory::default().create_client_with(fallback)
}

/// Build a client through `docker-machine`, falling back to the environment.
///
/// When the helper is unavailable the client is built from `DOCKER_HOST`,
/// `CONTAINER_HOST`, `PODMAN_HOST` or the platform default socket.
///
/// # Errors
///
/// See [`ClientFactory::create_client_with`].
pub fn create_client_env_fallback() -> Result<Docker> {
    create_client(super::EnvironmentConnector::connect_from_env)
}

/// Build a client through `docker-machine`, falling back to `fallback`
/// (async version).
///
/// # Errors
///
/// See [`ClientFactory::create_client_with_async`].
pub async fn create_client_async<F>(fallback: F) -> Result<Docker>
where
    F: FnOnce() -> Result<Docker>,
{
    ClientFactory::default()
        .create_client_with_async(fallback)
        .await
}

/// Build a client through `docker-machine`, falling back to the environment
/// (async version).
///
/// # Errors
///
/// See [`ClientFactory::create_client_with_async`].
pub async fn create_client_env_fallback_async() -> Result<Docker> {
    create_client_async(super::EnvironmentConnector::connect_from_env).await
}
