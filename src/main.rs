//! Binary entry point for the `vra-guest` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use vra_guest::{
    ExecutionMode, ExtraDisk, GuestError, GuestOrchestrator, GuestReport, GuestRequest, VraClient,
    VraConfig, VraError,
};

mod cli;

use cli::{Cli, ProvisionCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Vra(#[from] VraError),
    #[error(transparent)]
    Guest(#[from] GuestError<VraError>),
    #[error("failed to write result: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(report) => match write_report(io::stdout(), &report) {
            Ok(()) => 0,
            Err(err) => {
                report_error(&err);
                1
            }
        },
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<GuestReport, CliError> {
    match cli {
        Cli::Provision(command) => provision(command).await,
    }
}

async fn provision(args: ProvisionCommand) -> Result<GuestReport, CliError> {
    let request = guest_request(&args)?;

    let mut config =
        VraConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    apply_overrides(&mut config, &args);
    config
        .validate()
        .map_err(|err| CliError::Config(err.to_string()))?;

    let client = VraClient::connect(&config).await?;
    let mode = if args.check {
        ExecutionMode::Check
    } else {
        ExecutionMode::Apply
    };
    let orchestrator = GuestOrchestrator::new(client)
        .with_poll_interval(config.poll_interval())
        .with_wait_timeout(config.wait_timeout());
    Ok(orchestrator.ensure(&request, mode).await?)
}

fn guest_request(args: &ProvisionCommand) -> Result<GuestRequest, CliError> {
    let extra_disks = args
        .extra_disks
        .iter()
        .map(|raw| raw.parse::<ExtraDisk>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| CliError::InvalidArgument(err.to_string()))?;

    GuestRequest::builder()
        .blueprint_instance_id(&args.blueprint_instance_id)
        .blueprint_name(&args.blueprint_name)
        .cpu(args.cpu)
        .memory(args.memory)
        .hostname(&args.hostname)
        .network_adapter(&args.network_adapter)
        .extra_disks(extra_disks)
        .build()
        .map_err(|err| CliError::InvalidArgument(err.to_string()))
}

fn apply_overrides(config: &mut VraConfig, args: &ProvisionCommand) {
    if let Some(hostname) = &args.vra_hostname {
        config.hostname.clone_from(hostname);
    }
    if let Some(username) = &args.vra_username {
        config.username.clone_from(username);
    }
    if let Some(tenant) = &args.vra_tenant {
        config.tenant.clone_from(tenant);
    }
    if let Some(timeout) = args.wait_timeout {
        config.wait_timeout_secs = timeout;
    }
    if let Some(interval) = args.poll_interval {
        config.poll_interval_secs = interval;
    }
    if args.insecure_skip_tls_verify {
        config.insecure_skip_tls_verify = true;
    }
}

fn write_report(mut target: impl Write, report: &GuestReport) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string(report).map_err(|err| CliError::Output(err.to_string()))?;
    writeln!(target, "{rendered}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
