//! Behavioural step helpers for client factory scenarios.

mod assertions;
mod state;
mod steps;

pub use state::{ClientFactoryState, client_factory_state};
