mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_samples=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Commands::Scan => {
            cli::scan_docs(&config)?;
        }
        Commands::Test {
            language,
            format,
            output,
            timeout,
            no_save,
        } => {
            let failed = cli::test_samples(&config, &language, format, output, timeout, no_save).await?;
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Versions {
            tech,
            output,
            no_save,
        } => {
            cli::check_versions(&config, tech, &output, no_save).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
