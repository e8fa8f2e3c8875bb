//! Container engine clients for hosts managed by `docker-machine`.
//!
//! `machine-client` asks the `docker-machine` helper where the active engine
//! lives and which certificates it uses, builds a TLS trust configuration from
//! that material, resolves the engine's API version, and hands back a
//! [`bollard::Docker`] client. When the helper is not installed or cannot
//! answer, a caller-supplied fallback constructor is used instead.
//!
//! # Modules
//!
//! - [`config`]: Layered configuration (CLI > env > file > defaults)
//! - [`engine`]: Client factory and environment-based fallback connection
//! - [`error`]: Semantic error types for the application
//! - [`machine`]: Helper invocation and output parsing
//! - [`tls`]: Trust configuration from PEM material

pub mod config;
pub mod engine;
pub mod error;
pub mod machine;
pub mod tls;
