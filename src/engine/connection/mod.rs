//! Environment-based engine connection.
//!
//! This is the built-in fallback used when no helper is available. The socket
//! endpoint is resolved from the environment and the platform default, then
//! connected with the Bollard library. TCP endpoints switch to TLS when
//! `DOCKER_TLS_VERIFY` or `DOCKER_CERT_PATH` is set, and `DOCKER_API_VERSION`
//! pins the client version.

mod health_check;
mod tls_transport;

use bollard::{ClientVersion, Docker};
use camino::{Utf8Path, Utf8PathBuf};

pub(crate) use health_check::block_on;
pub(crate) use tls_transport::{connect_over_tls, https_address};

use crate::engine::parse_client_version;
use crate::error::{ClientError, MachineClientError};
use crate::tls::build_trust_config;

/// Environment variable names checked in fallback order.
const FALLBACK_ENV_VARS: &[&str] = &["DOCKER_HOST", "CONTAINER_HOST", "PODMAN_HOST"];

/// Requests TLS for TCP endpoints when non-empty.
const TLS_VERIFY_ENV_VAR: &str = "DOCKER_TLS_VERIFY";

/// Directory holding `ca.pem`, `cert.pem` and `key.pem`.
const CERT_PATH_ENV_VAR: &str = "DOCKER_CERT_PATH";

/// Client API version override.
const API_VERSION_ENV_VAR: &str = "DOCKER_API_VERSION";

/// Home directory variables consulted for the default `.docker` directory.
const HOME_ENV_VARS: &[&str] = &["HOME", "USERPROFILE"];

/// Connection timeout in seconds for Docker/Podman API connections.
pub(crate) const CONNECTION_TIMEOUT_SECS: u64 = 120;

/// Timeout in seconds for health check operations.
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;

/// Default socket path for Unix platforms.
#[cfg(unix)]
const DEFAULT_SOCKET: &str = "unix:///var/run/docker.sock";

/// Default socket path for Windows platforms.
#[cfg(windows)]
const DEFAULT_SOCKET: &str = "npipe:////./pipe/docker_engine";

/// Resolves container engine socket endpoints from environment variables.
///
/// # Type Parameters
///
/// * `E` - An environment provider implementing the `mockable::Env` trait,
///   allowing for testable environment variable access.
///
/// # Example
///
/// ```ignore
/// use mockable::DefaultEnv;
/// use machine_client::engine::SocketResolver;
///
/// let env = DefaultEnv::new();
/// let resolver = SocketResolver::new(&env);
///
/// if let Some(socket) = resolver.resolve_from_env() {
///     println!("Found socket: {}", socket);
/// }
/// ```
pub struct SocketResolver<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> SocketResolver<'a, E> {
    /// Creates a new socket resolver with the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Resolves the socket endpoint from fallback environment variables.
    ///
    /// Checks `DOCKER_HOST`, `CONTAINER_HOST` and `PODMAN_HOST` in that order.
    /// Returns `None` if no variable is set or all are empty.
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        FALLBACK_ENV_VARS
            .iter()
            .filter_map(|var_name| self.env.string(var_name))
            .find(|value| !value.is_empty())
    }

    /// Returns the platform default socket path.
    #[must_use]
    pub const fn default_socket() -> &'static str {
        DEFAULT_SOCKET
    }

    /// Certificate directory for TCP endpoints, if TLS is requested.
    ///
    /// TLS is requested when `DOCKER_TLS_VERIFY` or `DOCKER_CERT_PATH` is
    /// non-empty. The directory is `DOCKER_CERT_PATH`, else `~/.docker`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConnectionFailed` if TLS is requested but neither
    /// `DOCKER_CERT_PATH` nor a home directory is set.
    pub fn tls_cert_dir(&self) -> Result<Option<Utf8PathBuf>, ClientError> {
        let verify = self.non_empty(TLS_VERIFY_ENV_VAR).is_some();
        if let Some(cert_path) = self.non_empty(CERT_PATH_ENV_VAR) {
            return Ok(Some(Utf8PathBuf::from(cert_path)));
        }
        if !verify {
            return Ok(None);
        }
        HOME_ENV_VARS
            .iter()
            .find_map(|var_name| self.non_empty(var_name))
            .map(|home| Some(Utf8Path::new(&home).join(".docker")))
            .ok_or_else(|| ClientError::ConnectionFailed {
                message: format!(
                    "{TLS_VERIFY_ENV_VAR} is set but no certificate directory is known, \
                     set {CERT_PATH_ENV_VAR} or HOME"
                ),
            })
    }

    /// Client API version from `DOCKER_API_VERSION`, else the client default.
    #[must_use]
    pub fn api_version(&self) -> ClientVersion {
        parse_client_version(&self.non_empty(API_VERSION_ENV_VAR).unwrap_or_default())
    }

    fn non_empty(&self, var_name: &str) -> Option<String> {
        self.env.string(var_name).filter(|value| !value.is_empty())
    }
}

/// Classifies socket endpoint types for connection handling.
enum SocketType {
    /// Unix socket or Windows named pipe with explicit scheme.
    Socket,
    /// HTTP, HTTPS, or TCP endpoint (TCP is rewritten to HTTP).
    Http,
    /// Bare path without scheme prefix.
    BarePath,
}

impl SocketType {
    fn is_socket_scheme(socket: &str) -> bool {
        socket.starts_with("unix://") || socket.starts_with("npipe://")
    }

    fn is_http_scheme(socket: &str) -> bool {
        socket.starts_with("tcp://")
            || socket.starts_with("http://")
            || socket.starts_with("https://")
    }

    fn classify(socket: &str) -> Self {
        match (Self::is_socket_scheme(socket), Self::is_http_scheme(socket)) {
            (true, _) => Self::Socket,
            (_, true) => Self::Http,
            _ => Self::BarePath,
        }
    }
}

/// Connects to the engine named by the environment.
///
/// Supports Unix sockets, Windows named pipes, plain HTTP endpoints and, when
/// the environment carries certificates, TLS endpoints.
pub struct EnvironmentConnector;

impl EnvironmentConnector {
    /// Connect to the container engine at the specified socket path.
    ///
    /// Supported formats:
    /// - Unix sockets: `unix:///path/to/socket`
    /// - Windows named pipes: `npipe:////./pipe/name`
    /// - TCP: `tcp://host:port` (treated as HTTP)
    /// - HTTP and HTTPS URLs
    /// - Bare paths: `//` or `\\` prefixes are named pipes, anything else
    ///   is a Unix socket.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConnectionFailed` if Bollard rejects the endpoint.
    pub fn connect(socket: &str) -> Result<Docker, ClientError> {
        Self::connect_with_version(socket, bollard::API_DEFAULT_VERSION)
    }

    /// Connect without TLS, speaking the given API version.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConnectionFailed` if Bollard rejects the endpoint.
    pub fn connect_with_version(
        socket: &str,
        version: &ClientVersion,
    ) -> Result<Docker, ClientError> {
        let connection = match SocketType::classify(socket) {
            SocketType::Socket => {
                Docker::connect_with_socket(socket, CONNECTION_TIMEOUT_SECS, version)
            }
            SocketType::Http => {
                let http_socket = if socket.starts_with("tcp://") {
                    socket.replacen("tcp://", "http://", 1)
                } else {
                    socket.to_owned()
                };
                Docker::connect_with_http(&http_socket, CONNECTION_TIMEOUT_SECS, version)
            }
            SocketType::BarePath => Docker::connect_with_socket(
                &Self::normalize_bare_path(socket),
                CONNECTION_TIMEOUT_SECS,
                version,
            ),
        };

        connection.map_err(|e| ClientError::ConnectionFailed {
            message: format!("{socket}: {e}"),
        })
    }

    /// Connect over TLS with the `ca.pem`, `cert.pem` and `key.pem` found in
    /// `cert_dir`.
    ///
    /// The server certificate is always verified.
    ///
    /// # Errors
    ///
    /// Returns `TrustError` variants if the certificate material is unusable
    /// and `ClientError::Construction` if the client cannot be built.
    pub fn connect_with_certs(
        socket: &str,
        cert_dir: &Utf8Path,
        version: &ClientVersion,
    ) -> Result<Docker, MachineClientError> {
        let ca = cert_dir.join("ca.pem");
        let cert = cert_dir.join("cert.pem");
        let key = cert_dir.join("key.pem");
        let trust = build_trust_config(&ca, Some((&cert, &key)))?;
        Ok(connect_over_tls(&https_address(socket), &trust, version)?)
    }

    /// Prefix a bare socket path with the scheme its syntax implies.
    fn normalize_bare_path(path: &str) -> String {
        if path.starts_with("\\\\") || path.starts_with("//") {
            format!("npipe://{path}")
        } else {
            format!("unix://{path}")
        }
    }

    /// Resolves the socket endpoint without establishing a connection.
    ///
    /// Resolution order:
    /// 1. `DOCKER_HOST`, `CONTAINER_HOST`, `PODMAN_HOST` (via resolver)
    /// 2. Platform default socket
    #[must_use]
    pub fn resolve_socket<E: mockable::Env>(resolver: &SocketResolver<'_, E>) -> String {
        resolver
            .resolve_from_env()
            .unwrap_or_else(|| SocketResolver::<E>::default_socket().to_owned())
    }

    /// Connect using the socket, TLS material and API version resolved
    /// through `resolver`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError` variants if TLS is requested and the certificate
    /// material is unusable, and `ClientError::ConnectionFailed` if the
    /// connection cannot be established.
    pub fn connect_with_resolver<E: mockable::Env>(
        resolver: &SocketResolver<'_, E>,
    ) -> Result<Docker, MachineClientError> {
        let socket = Self::resolve_socket(resolver);
        let version = resolver.api_version();
        let cert_dir = match SocketType::classify(&socket) {
            SocketType::Http => resolver.tls_cert_dir()?,
            SocketType::Socket | SocketType::BarePath => None,
        };

        cert_dir.map_or_else(
            || {
                tracing::debug!(socket, "connecting to engine from environment");
                Ok(Self::connect_with_version(&socket, &version)?)
            },
            |dir| {
                tracing::debug!(
                    socket,
                    cert_dir = %dir,
                    "connecting to engine from environment over TLS"
                );
                Self::connect_with_certs(&socket, &dir, &version)
            },
        )
    }

    /// Connect to the engine named by the process environment.
    ///
    /// This is the fallback constructor used by
    /// [`create_client_env_fallback`](crate::engine::create_client_env_fallback).
    ///
    /// # Errors
    ///
    /// See [`Self::connect_with_resolver`].
    pub fn connect_from_env() -> Result<Docker, MachineClientError> {
        let env = mockable::DefaultEnv::new();
        let resolver = SocketResolver::new(&env);
        Self::connect_with_resolver(&resolver)
    }
}
