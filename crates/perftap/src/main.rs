//! Perftap - live performance-counter telemetry
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! perftap
//! perftap --config perftap.toml --port 7000 --interval 5
//!
//! # List the categories of the local machine
//! perftap categories
//!
//! # Stream live samples from a running server
//! perftap tail --categories '^Memory$'
//! ```

mod cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use perftap_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Perftap - live performance-counter telemetry
#[derive(Parser, Debug)]
#[command(name = "perftap")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),

    /// List the counter categories available on a host
    Categories(cmd::categories::CategoriesArgs),

    /// Stream live samples from a running server
    Tail(cmd::tail::TailArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(mut args)) => {
            // CLI global --config overrides subcommand config if both specified
            if args.config.is_none() && cli.config.is_some() {
                args.config = cli.config;
            }
            let (level, format) =
                resolve_logging(cli.log_level.as_deref(), args.config.as_deref());
            init_logging(&level, format)?;
            cmd::serve::run(args, cli.log_level).await
        }
        Some(Command::Categories(args)) => {
            // Categories doesn't need logging - just outputs to stdout
            cmd::categories::run(args)
        }
        Some(Command::Tail(args)) => {
            // Tail initializes its own logging
            cmd::tail::run(args).await
        }
        // No subcommand = run server (default behavior)
        None => {
            let (level, format) = resolve_logging(cli.log_level.as_deref(), cli.config.as_deref());
            init_logging(&level, format)?;
            let args = cmd::serve::ServeArgs {
                config: cli.config,
                ..Default::default()
            };
            cmd::serve::run(args, cli.log_level).await
        }
    }
}

/// Resolve log level and format: CLI flag > config file > default "info"
fn resolve_logging(cli_level: Option<&str>, config_path: Option<&Path>) -> (String, LogFormat) {
    let config = config_path
        .filter(|path| path.exists())
        .and_then(|path| Config::from_file(path).ok());

    let format = config
        .as_ref()
        .map(|c| c.log.format)
        .unwrap_or_default();

    // CLI flag takes precedence
    if let Some(level) = cli_level {
        return (level.to_string(), format);
    }

    let level = config
        .map(|c| c.log.level.as_str().to_string())
        .unwrap_or_else(|| "info".to_string());
    (level, format)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init(),
    }

    Ok(())
}
