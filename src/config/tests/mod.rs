//! Unit tests for machine-client configuration.
//!
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - `AppConfig` defaults, serialisation and option mapping
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence tests
//! - [`loader_tests`] - `load_config_with_env` against files and a mocked environment

mod helpers;
