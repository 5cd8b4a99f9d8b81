/// Segue TV - headless crossfading channel player
use clap::{Parser, Subcommand};
use segue_tv::{ChannelRunner, EventOutput, TvConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "segue-tv")]
#[command(about = "Crossfading channel player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the configured channel
    Play {
        /// Configuration file path
        #[arg(short, long, env = "SEGUE_CONFIG")]
        config: Option<PathBuf>,
        /// Initial volume (0-100)
        #[arg(long)]
        volume: Option<u8>,
        /// Stop at the end of the channel instead of wrapping around
        #[arg(long)]
        no_loop: bool,
        /// Print manager events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Load and validate the configuration
    CheckConfig {
        /// Configuration file path
        #[arg(short, long, env = "SEGUE_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segue_tv=info,segue_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            volume,
            no_loop,
            json,
        } => {
            let mut config = TvConfig::load(config.as_deref())?;
            if let Some(volume) = volume {
                config.playback.volume = volume;
            }
            if no_loop {
                config.playback.loop_queue = false;
            }
            let output = if json {
                EventOutput::Json
            } else {
                EventOutput::Log
            };
            play(config, output).await?;
        }
        Commands::CheckConfig { config } => {
            check_config(config)?;
        }
    }

    Ok(())
}

async fn play(config: TvConfig, output: EventOutput) -> anyhow::Result<()> {
    tracing::info!("Starting Segue TV");
    tracing::info!("Tick interval: {:?}", config.runtime.tick_interval());
    tracing::info!("Crossfade length: {:?}", config.playback.fade_length());

    let mut runner = ChannelRunner::new(config, output)?;
    let summary = runner
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!(
        "Stopped after {} ticks ({} events, {} crossfades)",
        summary.ticks,
        summary.events,
        summary.crossfades
    );
    Ok(())
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = TvConfig::load(path.as_deref())?;
    config.validate()?;

    println!("Configuration OK");
    println!("  Channel tracks: {}", config.channel.tracks.len());
    println!("  Crossfade: {:?}", config.playback.fade_length());
    println!("  Prepare window: {:?}", config.playback.prepare_window());
    println!("  Loop: {}", config.playback.loop_queue);
    Ok(())
}
