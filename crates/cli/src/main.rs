mod cli;
mod commands;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pdbw_client::{ClientConfig, FileStore, Session};

use crate::cli::Cli;
use crate::commands::App;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore errors if missing).
    dotenvy::dotenv().ok();

    // Initialise tracing on stderr so command output stays on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdbw=info,pdbw_client=info,pdbw_views=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(state_file) = cli.state_file {
        config.state_file = state_file;
    }
    tracing::debug!(api_url = %config.api_url, state_file = %config.state_file.display(), "Configuration loaded");

    let session = Arc::new(Session::new(FileStore::open(&config.state_file)?));
    let app = App::new(config, session, cli.json)?;
    app.run(cli.command).await
}
