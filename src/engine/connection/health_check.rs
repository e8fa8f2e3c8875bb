//! Engine health checks.
//!
//! A freshly built client has not talked to the engine yet; these helpers
//! send a ping or a version query to confirm the engine answers.

use std::time::Duration;

use bollard::Docker;

use super::{EnvironmentConnector, HEALTH_CHECK_TIMEOUT_SECS};
use crate::error::ClientError;

impl EnvironmentConnector {
    /// Verify the container engine is responsive (async version).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::HealthCheckFailed` if the engine does not answer
    /// the ping or does not answer within the timeout.
    pub async fn health_check_async(docker: &Docker) -> Result<(), ClientError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, docker.ping())
            .await
            .map_err(|_| ClientError::HealthCheckFailed {
                message: format!("timed out after {HEALTH_CHECK_TIMEOUT_SECS} seconds"),
            })?
            .map_err(|e| ClientError::HealthCheckFailed {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Verify the container engine is responsive.
    ///
    /// Creates a dedicated tokio runtime; use [`Self::health_check_async`]
    /// when already in an async context.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NestedRuntime` when called inside a runtime,
    /// `ClientError::RuntimeCreationFailed` if the runtime cannot be created,
    /// and `ClientError::HealthCheckFailed` if the ping fails.
    pub fn health_check(docker: &Docker) -> Result<(), ClientError> {
        block_on("health_check", Self::health_check_async(docker))?
    }

    /// Ask the engine for its version, formatted as `<version> (API <api>)`
    /// (async version).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConnectionFailed` if the query fails or times out.
    pub async fn engine_version_async(docker: &Docker) -> Result<String, ClientError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);
        let version = tokio::time::timeout(timeout, docker.version())
            .await
            .map_err(|_| ClientError::ConnectionFailed {
                message: format!("version query timed out after {HEALTH_CHECK_TIMEOUT_SECS} seconds"),
            })?
            .map_err(|e| ClientError::ConnectionFailed {
                message: e.to_string(),
            })?;

        Ok(format!(
            "{} (API {})",
            version.version.as_deref().unwrap_or("unknown"),
            version.api_version.as_deref().unwrap_or("unknown")
        ))
    }

    /// Ask the engine for its version, formatted as `<version> (API <api>)`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NestedRuntime` when called inside a runtime,
    /// `ClientError::RuntimeCreationFailed` if the runtime cannot be created,
    /// and `ClientError::ConnectionFailed` if the query fails.
    pub fn engine_version(docker: &Docker) -> Result<String, ClientError> {
        block_on("engine_version", Self::engine_version_async(docker))?
    }
}

/// Drive `future` to completion on a dedicated current-thread runtime.
///
/// Blocking inside a running runtime is refused with
/// `ClientError::NestedRuntime` rather than left to panic.
pub(crate) fn block_on<F: Future>(
    operation: &'static str,
    future: F,
) -> Result<F::Output, ClientError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ClientError::NestedRuntime { operation });
    }
    Ok(create_runtime()?.block_on(future))
}

/// Create a single-threaded tokio runtime for synchronous operations.
fn create_runtime() -> Result<tokio::runtime::Runtime, ClientError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ClientError::RuntimeCreationFailed {
            message: e.to_string(),
        })
}
