//! Scenario state for client factory BDD tests.

use std::sync::{Arc, Mutex};

use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

/// Convenience alias for step outcomes.
pub type StepResult<T> = Result<T, String>;

/// Values recorded by a fake during the `When` step.
pub type Recorded = Arc<Mutex<Vec<String>>>;

/// Outcome of a client request.
#[derive(Clone, Debug)]
pub enum FactoryOutcome {
    /// A client handle was returned.
    Client,
    /// The factory returned an error.
    Failed {
        /// The `Debug` representation of the error, naming its variant.
        debug: String,
    },
}

/// State shared across client factory scenarios.
#[derive(Default, ScenarioState)]
pub struct ClientFactoryState {
    /// Whether the helper executable can be started.
    pub(crate) helper_missing: Slot<bool>,
    /// Engine address printed by the helper.
    pub(crate) helper_url: Slot<String>,
    /// Fixture file reported as the CA certificate.
    pub(crate) ca_fixture: Slot<String>,
    /// An extra line in the helper's `config` output.
    pub(crate) extra_line: Slot<String>,
    /// Version printed by `<helper> version`; switches off the probe.
    pub(crate) helper_version: Slot<String>,
    /// Version answered by the probe.
    pub(crate) probe_version: Slot<String>,
    /// URLs the probe was asked for.
    pub(crate) probed_urls: Slot<Recorded>,
    /// API versions the connector was asked to build for.
    pub(crate) connected_versions: Slot<Recorded>,
    /// Lines reported to the diagnostic sink.
    pub(crate) unknown_lines: Slot<Recorded>,
    /// Whether the fallback constructor ran.
    pub(crate) fallback_used: Slot<bool>,
    /// Outcome of the most recent request.
    pub(crate) outcome: Slot<FactoryOutcome>,
}

/// Fixture providing fresh state for each scenario.
#[rstest::fixture]
pub fn client_factory_state() -> ClientFactoryState {
    let state = ClientFactoryState::default();
    state.ca_fixture.set(String::from("ca.pem"));
    state.probed_urls.set(Recorded::default());
    state.connected_versions.set(Recorded::default());
    state.unknown_lines.set(Recorded::default());
    state
}
