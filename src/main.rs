//! `machine-client` application entry point.
//!
//! Uses `eyre` for opaque error handling at the application boundary,
//! converting domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/machine-client/config.toml` or path from
//!    `MACHINE_CLIENT_CONFIG_PATH`)
//! 3. Environment variables (`MACHINE_CLIENT_*`)
//! 4. Command-line arguments

use bollard::Docker;
use clap::Parser;
use eyre::{Report, Result as EyreResult};
use machine_client::config::{AppConfig, Cli, Commands, load_config};
use machine_client::engine::{ClientFactory, EnvironmentConnector};
use machine_client::error::Result as MachineClientResult;
use machine_client::machine::{
    Helper, RemoteEndpointConfig, SystemCommandRunner, TracingDiagnostics, discover_config,
};

/// Application entry point.
fn main() -> EyreResult<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli).map_err(Report::from)?;

    run(cli.command, &config).map_err(Report::from)
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Execute the CLI command, returning domain-specific errors.
fn run(command: Commands, config: &AppConfig) -> MachineClientResult<()> {
    match command {
        Commands::Config => show_endpoint(config),
        Commands::Version => show_engine_version(config),
        Commands::Ping => ping_engine(config),
    }
}

/// Print the endpoint the helper reports.
fn show_endpoint(config: &AppConfig) -> MachineClientResult<()> {
    let options = config.factory_options();
    let helper = Helper::new(options.helper).with_machine(options.machine);
    let endpoint = discover_config(
        &SystemCommandRunner,
        &helper,
        !options.resolve_version_via_probe,
        &TracingDiagnostics,
    )?;

    print_endpoint(&endpoint);
    Ok(())
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_endpoint(endpoint: &RemoteEndpointConfig) {
    println!("url:        {}", endpoint.url);
    println!("tlsverify:  {}", endpoint.tls_verify);
    println!("tlscacert:  {}", endpoint.ca_cert_path);
    println!("tlscert:    {}", endpoint.cert_path);
    println!("tlskey:     {}", endpoint.key_path);
    if let Some(version) = &endpoint.api_version {
        println!("apiversion: {version}");
    }
}

/// Build a client and print the engine version.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn show_engine_version(config: &AppConfig) -> MachineClientResult<()> {
    let docker = build_client(config)?;
    let version = EnvironmentConnector::engine_version(&docker)?;
    println!("{version}");
    Ok(())
}

/// Build a client and ping the engine.
#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn ping_engine(config: &AppConfig) -> MachineClientResult<()> {
    let docker = build_client(config)?;
    EnvironmentConnector::health_check(&docker)?;
    println!("engine is responsive");
    Ok(())
}

fn build_client(config: &AppConfig) -> MachineClientResult<Docker> {
    ClientFactory::new(config.factory_options())
        .create_client_with(EnvironmentConnector::connect_from_env)
}
