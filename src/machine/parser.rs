//! Parsing of `docker-machine config` output.
//!
//! The helper prints one flag per line, for example:
//!
//! ```text
//! --tlsverify
//! --tlscacert="/home/u/.docker/machine/certs/ca.pem"
//! -H=tcp://192.0.2.10:2376
//! ```

use camino::Utf8PathBuf;

use super::{DiagnosticSink, RemoteEndpointConfig};

/// Parse helper output into a [`RemoteEndpointConfig`].
///
/// Leading dashes are ignored, so `--tlsverify` and `tlsverify` are the same
/// entry. Blank lines and lines without `=` are skipped. Unrecognised keys are
/// passed to `sink` and otherwise ignored. Parsing never fails.
#[must_use]
pub fn parse_config_output(output: &str, sink: &dyn DiagnosticSink) -> RemoteEndpointConfig {
    let mut config = RemoteEndpointConfig::default();

    for raw_line in output.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        let entry = line.trim_start_matches('-');
        if entry.trim().is_empty() {
            continue;
        }

        match entry.split_once('=') {
            None if entry == "tlsverify" => config.tls_verify = true,
            None => {}
            Some(("tlsverify", _)) => config.tls_verify = true,
            Some(("tlscacert", value)) => config.ca_cert_path = scrub_path(value),
            Some(("tlscert", value)) => config.cert_path = scrub_path(value),
            Some(("tlskey", value)) => config.key_path = scrub_path(value),
            Some(("H", value)) => config.url = scrub_value(value),
            Some(_) => sink.unknown_key(line),
        }
    }

    config
}

/// Strip one layer of surrounding double quotes and unescape backslashes.
#[must_use]
pub fn scrub_value(value: &str) -> String {
    let unquoted_start = value.strip_prefix('"').unwrap_or(value);
    let unquoted = unquoted_start.strip_suffix('"').unwrap_or(unquoted_start);
    unquoted.replace("\\\\", "\\")
}

fn scrub_path(value: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(scrub_value(value))
}
