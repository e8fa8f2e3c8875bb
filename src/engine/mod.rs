//! Container engine client construction.
//!
//! The [`ClientFactory`] builds a TLS client for an engine discovered through
//! `docker-machine`. When the helper is not available it defers to a fallback
//! constructor; the built-in one ([`EnvironmentConnector`]) resolves the
//! engine socket through:
//!
//! 1. `DOCKER_HOST` environment variable
//! 2. `CONTAINER_HOST` environment variable
//! 3. `PODMAN_HOST` environment variable
//! 4. Platform default (`/var/run/docker.sock` on Unix)
//!
//! TCP endpoints use TLS when `DOCKER_TLS_VERIFY` or `DOCKER_CERT_PATH` is
//! set.

mod connection;
mod factory;

pub use connection::{EnvironmentConnector, SocketResolver};
pub use factory::{
    BollardTlsConnector, BoxFuture, ClientConnector, ClientFactory, FactoryOptions,
    HttpsVersionProbe, ResolvedEndpoint, VersionProbe, create_client, create_client_async,
    create_client_env_fallback, create_client_env_fallback_async, extract_api_version,
    parse_client_version, probe_url,
};
