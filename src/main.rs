//! Talkbook CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use talkbook::cli::commands::{self, InitOptions, UpdateOptions};
use talkbook::cli::{Cli, Commands};
use talkbook::config::Settings;
use talkbook::orchestrator::Stage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(PathBuf::from);

    // Load configuration
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging; -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("talkbook={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Execute command
    match cli.command {
        Commands::Init {
            series,
            playlist,
            title,
            yes,
        } => {
            let options = InitOptions {
                series,
                playlist,
                title,
                yes,
            };
            commands::run_init(&options, settings, config_path)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::List => {
            commands::run_list(&settings)?;
        }

        Commands::Discover(args) => {
            commands::run_stage(&args.series, Stage::Discover, settings).await?;
        }

        Commands::Fetch {
            series,
            videos,
            limit,
        } => {
            commands::run_fetch(&series.series, videos, limit, settings).await?;
        }

        Commands::Enrich(args) => {
            commands::run_stage(&args.series, Stage::Enrich, settings).await?;
        }

        Commands::Ingest { series, overwrite } => {
            commands::run_ingest(&series.series, overwrite, settings).await?;
        }

        Commands::Polish { series, file } => {
            commands::run_polish(&series.series, file.as_deref(), settings).await?;
        }

        Commands::Build(args) => {
            commands::run_stage(&args.series, Stage::Build, settings).await?;
        }

        Commands::Export { series, formats } => {
            commands::run_export(&series.series, &formats, settings).await?;
        }

        Commands::Update {
            series,
            skip,
            only,
            videos,
            limit,
            overwrite,
        } => {
            let update = UpdateOptions {
                skip,
                only,
                videos,
                limit,
                overwrite,
            };
            commands::run_update(&series.series, update, settings).await?;
        }

        Commands::Transcript { input, output } => {
            commands::run_transcript(&input, output, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
