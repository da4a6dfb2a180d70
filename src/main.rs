mod cli;
mod signal;

use clap::Parser;
use cli::{Cli, Commands};
use sitepush::api::{SiteClient, validate_api_access};
use sitepush::config::Context;
use sitepush::observability;
use sitepush::outputs::{ActionOutputs, WorkflowCommands};
use sitepush::uploader::Uploader;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::info;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> ExitCode {
    observability::init_tracing();

    let cli = Cli::parse();
    let mut outputs = WorkflowCommands::from_env();

    let cancel = CancellationToken::new();
    signal::cancel_on_signal(cancel.clone());

    let outcome = match cli.command {
        Commands::Upload(args) => upload(args.config, &mut outputs, cancel).await,
        Commands::Probe(args) => probe(args.config).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            outputs.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn upload(
    config_path: Option<PathBuf>,
    outputs: &mut dyn ActionOutputs,
    cancel: CancellationToken,
) -> Result<(), AnyError> {
    let context = Context::load(config_path)?;
    observability::log_build(&context.build);

    let mut uploader = Uploader::from_context(context, cancel)?;
    uploader.run_to_completion(outputs).await?;
    Ok(())
}

async fn probe(config_path: Option<PathBuf>) -> Result<(), AnyError> {
    let context = Context::load(config_path)?;
    observability::log_build(&context.build);

    let client = SiteClient::new(&context.config)?;
    validate_api_access(&client).await?;

    info!(site_id = %context.config.site_id, "Token can access site");
    Ok(())
}
