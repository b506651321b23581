//! Recap CLI entry point.

use anyhow::Result;
use clap::Parser;
use recap::cli::{commands, Cli, Commands};
use recap::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("recap={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Analyze {
            input,
            backend,
            analysis,
            output_dir,
            format,
            skip_preflight,
        } => {
            commands::run_analyze(
                input,
                backend,
                analysis,
                output_dir.as_deref(),
                format.as_deref(),
                *skip_preflight,
                settings,
            )
            .await?;
        }

        Commands::Transcribe {
            input,
            output_dir,
            model,
            language,
            force,
        } => {
            commands::run_transcribe(
                input,
                output_dir.as_deref(),
                model.as_deref(),
                language.as_deref(),
                *force,
                settings,
            )
            .await?;
        }

        Commands::Format {
            input,
            backend,
            output_dir,
            skip_preflight,
        } => {
            commands::run_format(input, backend, output_dir.as_deref(), *skip_preflight, settings)
                .await?;
        }

        Commands::Pull { backend } => {
            commands::run_pull(backend, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
