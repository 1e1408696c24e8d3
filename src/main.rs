//! PersonaLearn CLI entry point.

use anyhow::Result;
use clap::Parser;
use personalearn::cli::{commands, Cli, Commands};
use personalearn::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // -v flags win over general.log_level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("personalearn={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    std::fs::create_dir_all(settings.cache_dir())?;

    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Recommend { video, points, at } => {
            commands::run_recommend(video, points.clone(), at, settings).await?;
        }

        Commands::Transcribe { video, output } => {
            commands::run_transcribe(video, output.clone(), settings).await?;
        }

        Commands::Excerpt { video, start, end } => {
            commands::run_excerpt(video, *start, *end, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, &config_path)?;
        }
    }

    Ok(())
}
