//! piste CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP API
//! - `chat`    — Ask the assistant from the terminal
//! - `status`  — Show configuration and assistant mode
//! - `doctor`  — Diagnose configuration and remote connectivity
//! - `onboard` — Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "piste",
    about = "piste — fencing-education companion backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file to use instead of ~/.piste/config.toml
    #[arg(short, long, global = true, env = "PISTE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the fencing assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// What the user is watching, e.g. "2024奥运会男子佩剑决赛"
        #[arg(long, default_value = "")]
        video_context: String,

        /// Answer from built-in knowledge only
        #[arg(long)]
        local: bool,
    },

    /// Show configuration and assistant status
    Status,

    /// Diagnose configuration and remote connectivity
    Doctor,

    /// Write a default config file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Chat {
            message,
            video_context,
            local,
        } => commands::chat::run(config_path, message, &video_context, local).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Onboard => commands::onboard::run(config_path).await?,
    }

    Ok(())
}
