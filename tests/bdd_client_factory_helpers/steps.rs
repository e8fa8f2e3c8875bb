//! Given and When step definitions for client factory BDD tests.

use std::cell::Cell;
use std::io;

use bollard::Docker;
use machine_client::engine::{
    BoxFuture, ClientConnector, ClientFactory, EnvironmentConnector, FactoryOptions,
    ResolvedEndpoint, VersionProbe, probe_url,
};
use machine_client::error::ClientError;
use machine_client::machine::CommandOutput;
use machine_client::tls::TrustConfig;
use rstest_bdd_macros::{given, when};

use super::state::{ClientFactoryState, FactoryOutcome, Recorded, StepResult};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Probe answering a fixed version and recording the URL it would fetch.
struct RecordingProbe {
    version: Option<String>,
    urls: Recorded,
}

impl VersionProbe for RecordingProbe {
    fn probe(
        &self,
        url: &str,
        _trust: &TrustConfig,
    ) -> BoxFuture<'static, Result<String, ClientError>> {
        let target = probe_url(url);
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(target.clone());
        }
        let answer = self.version.clone().ok_or_else(|| ClientError::VersionProbe {
            url: target,
            message: String::from("no engine in this scenario"),
        });
        Box::pin(async move { answer })
    }
}

/// Connector recording the API version and returning an unconnected client.
struct RecordingConnector {
    versions: Recorded,
}

impl ClientConnector for RecordingConnector {
    fn connect(
        &self,
        endpoint: &ResolvedEndpoint,
        _trust: &TrustConfig,
    ) -> Result<Docker, ClientError> {
        if let Ok(mut versions) = self.versions.lock() {
            versions.push(endpoint.api_version.clone());
        }
        EnvironmentConnector::connect(&endpoint.url)
    }
}

fn recorded(slot: Option<Recorded>, name: &str) -> StepResult<Recorded> {
    slot.ok_or_else(|| format!("{name} should be initialised"))
}

/// The helper's `config` output for the current scenario.
fn config_output(state: &ClientFactoryState) -> StepResult<String> {
    let url = state
        .helper_url
        .get()
        .ok_or_else(|| String::from("helper_url should be set"))?;
    let ca = state
        .ca_fixture
        .get()
        .ok_or_else(|| String::from("ca_fixture should be set"))?;
    let extra = state
        .extra_line
        .get()
        .map(|line| format!("{line}\n"))
        .unwrap_or_default();
    Ok(format!(
        "{extra}-H={url}\n--tlsverify\n--tlscacert=\"{FIXTURES}/{ca}\"\n\
         --tlscert=\"{FIXTURES}/cert.pem\"\n--tlskey=\"{FIXTURES}/key.pem\"\n"
    ))
}

#[given("the helper is not installed")]
#[expect(
    clippy::unnecessary_wraps,
    reason = "rstest-bdd step functions must return StepResult"
)]
fn helper_not_installed(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    client_factory_state.helper_missing.set(true);
    Ok(())
}

#[given("the helper reports the engine at {url}")]
#[expect(
    clippy::unnecessary_wraps,
    reason = "rstest-bdd step functions must return StepResult"
)]
fn helper_reports_engine(client_factory_state: &ClientFactoryState, url: String) -> StepResult<()> {
    client_factory_state.helper_url.set(url);
    Ok(())
}

#[given("the reported CA file holds no certificates")]
#[expect(
    clippy::unnecessary_wraps,
    reason = "rstest-bdd step functions must return StepResult"
)]
fn ca_holds_no_certificates(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    // The key fixture is valid PEM without a single certificate block.
    client_factory_state.ca_fixture.set(String::from("key.pem"));
    Ok(())
}

#[given("the helper output contains the line {line}")]
#[expect(
    clippy::unnecessary_wraps,
    reason = "rstest-bdd step functions must return StepResult"
)]
fn helper_output_contains(
    client_factory_state: &ClientFactoryState,
    line: String,
) -> StepResult<()> {
    client_factory_state.extra_line.set(line);
    Ok(())
}

#[given("the engine reports API version {version}")]
#[expect(
    clippy::unnecessary_wraps,
    reason = "rstest-bdd step functions must return StepResult"
)]
fn engine_reports_version(
    client_factory_state: &ClientFactoryState,
    version: String,
) -> StepResult<()> {
    client_factory_state.probe_version.set(version);
    Ok(())
}

#[given("the helper reports API version {version}")]
#[expect(
    clippy::unnecessary_wraps,
    reason = "rstest-bdd step functions must return StepResult"
)]
fn helper_reports_version(
    client_factory_state: &ClientFactoryState,
    version: String,
) -> StepResult<()> {
    client_factory_state.helper_version.set(version);
    Ok(())
}

#[when("a client is requested")]
fn client_is_requested(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    let state = client_factory_state;
    let helper_version = state.helper_version.get();
    let options = FactoryOptions {
        resolve_version_via_probe: helper_version.is_none(),
        ..FactoryOptions::default()
    };

    let missing = state.helper_missing.get().unwrap_or(false);
    let output = if missing {
        String::new()
    } else {
        config_output(state)?
    };
    let version_output = helper_version.unwrap_or_default();
    let runner = move |_program: &str, args: &[&str]| -> io::Result<CommandOutput> {
        if missing {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not installed"));
        }
        if args.first() == Some(&"version") {
            Ok(CommandOutput::success(version_output.clone()))
        } else {
            Ok(CommandOutput::success(output.clone()))
        }
    };

    let unknown_lines = recorded(state.unknown_lines.get(), "unknown_lines")?;
    let factory = ClientFactory::new(options)
        .with_runner(runner)
        .with_diagnostics(move |line: &str| {
            if let Ok(mut lines) = unknown_lines.lock() {
                lines.push(line.to_owned());
            }
        })
        .with_probe(RecordingProbe {
            version: state.probe_version.get(),
            urls: recorded(state.probed_urls.get(), "probed_urls")?,
        })
        .with_connector(RecordingConnector {
            versions: recorded(state.connected_versions.get(), "connected_versions")?,
        });

    let fallback_used = Cell::new(false);
    let result = factory.create_client_with(|| {
        fallback_used.set(true);
        Ok(EnvironmentConnector::connect("tcp://127.0.0.1:2375")?)
    });

    state.fallback_used.set(fallback_used.get());
    state.outcome.set(match result {
        Ok(_) => FactoryOutcome::Client,
        Err(error) => FactoryOutcome::Failed {
            debug: format!("{error:?}"),
        },
    });
    Ok(())
}
