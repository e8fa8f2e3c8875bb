//! Then step definitions for client factory BDD tests.

use rstest_bdd_macros::then;

use super::state::{ClientFactoryState, FactoryOutcome, Recorded, StepResult};

fn get_outcome(state: &ClientFactoryState) -> StepResult<FactoryOutcome> {
    state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

fn snapshot(slot: Option<Recorded>, name: &str) -> StepResult<Vec<String>> {
    let recorded = slot.ok_or_else(|| format!("{name} should be initialised"))?;
    let values = recorded
        .lock()
        .map_err(|_| format!("{name} mutex poisoned"))?
        .clone();
    Ok(values)
}

#[then("a client is returned")]
fn client_is_returned(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    match get_outcome(client_factory_state)? {
        FactoryOutcome::Client => Ok(()),
        FactoryOutcome::Failed { debug } => Err(format!("expected a client, got: {debug}")),
    }
}

#[then("the request fails with a certificate append error")]
fn request_fails_with_cert_append(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    match get_outcome(client_factory_state)? {
        FactoryOutcome::Client => Err(String::from("expected the request to fail")),
        FactoryOutcome::Failed { debug } if debug.contains("CertAppend") => Ok(()),
        FactoryOutcome::Failed { debug } => Err(format!("expected CertAppend, got: {debug}")),
    }
}

#[then("the fallback constructor was used")]
fn fallback_was_used(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    if client_factory_state.fallback_used.get() == Some(true) {
        Ok(())
    } else {
        Err(String::from("expected the fallback constructor to run"))
    }
}

#[then("the fallback constructor was not used")]
fn fallback_was_not_used(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    if client_factory_state.fallback_used.get() == Some(false) {
        Ok(())
    } else {
        Err(String::from("expected the fallback constructor not to run"))
    }
}

#[then("no version probe was made")]
fn no_version_probe(client_factory_state: &ClientFactoryState) -> StepResult<()> {
    let urls = snapshot(client_factory_state.probed_urls.get(), "probed_urls")?;
    if urls.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no probe, got: {urls:?}"))
    }
}

#[then("the version probe targeted {url}")]
fn probe_targeted(client_factory_state: &ClientFactoryState, url: String) -> StepResult<()> {
    let urls = snapshot(client_factory_state.probed_urls.get(), "probed_urls")?;
    if urls == [url.clone()] {
        Ok(())
    } else {
        Err(format!("expected a single probe of {url}, got: {urls:?}"))
    }
}

#[then("the client was built for API version {version}")]
fn client_built_for_version(
    client_factory_state: &ClientFactoryState,
    version: String,
) -> StepResult<()> {
    let versions = snapshot(
        client_factory_state.connected_versions.get(),
        "connected_versions",
    )?;
    if versions == [version.clone()] {
        Ok(())
    } else {
        Err(format!("expected API version {version}, got: {versions:?}"))
    }
}

#[then("the line {line} was reported as unknown")]
fn line_reported_unknown(client_factory_state: &ClientFactoryState, line: String) -> StepResult<()> {
    let lines = snapshot(client_factory_state.unknown_lines.get(), "unknown_lines")?;
    if lines == [line.clone()] {
        Ok(())
    } else {
        Err(format!("expected only '{line}' to be reported, got: {lines:?}"))
    }
}
