//! Tail command - reference client for the subscriber protocol
//!
//! Connects to a running perftap server, sets the requested filters,
//! starts the stream and prints one line per decoded sample.

mod client;
mod output;

use std::io::IsTerminal;

use anyhow::Result;
use clap::Args;
use tracing_subscriber::EnvFilter;

use perftap_protocol::{FilterField, WireDecoder, WireLine};
use perftap_tap::{BUS_CLOSED_REPLY, ILLEGAL_PATTERN_REPLY};

use client::TailClient;

/// Tail command arguments
#[derive(Args, Debug)]
pub struct TailArgs {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7000")]
    address: String,

    /// Host name regex
    #[arg(long, value_name = "REGEX")]
    hosts: Option<String>,

    /// Category name regex
    #[arg(long, value_name = "REGEX")]
    categories: Option<String>,

    /// Counter name regex
    #[arg(long, value_name = "REGEX")]
    counters: Option<String>,

    /// Instance name regex
    #[arg(long, value_name = "REGEX")]
    instances: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose output (show protocol replies)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress connection messages)
    #[arg(short, long)]
    quiet: bool,
}

impl TailArgs {
    fn patterns(&self) -> impl Iterator<Item = (FilterField, &str)> {
        [
            (FilterField::Hosts, &self.hosts),
            (FilterField::Categories, &self.categories),
            (FilterField::Counters, &self.counters),
            (FilterField::Instances, &self.instances),
        ]
        .into_iter()
        .filter_map(|(field, pattern)| pattern.as_deref().map(|p| (field, p)))
    }
}

/// Run the tail command
pub async fn run(args: TailArgs) -> Result<()> {
    // Set up logging for tail command
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    // Enable color only if: stdout is TTY AND --no-color not set
    let use_color = std::io::stdout().is_terminal() && !args.no_color;
    let formatter = output::Formatter::new(use_color);

    tracing::info!(address = %args.address, "connecting to server");
    let mut client = TailClient::connect(&args.address).await?;

    for (field, pattern) in args.patterns() {
        client.set_pattern(field, pattern).await?;
    }
    client.send("start").await?;
    tracing::info!("streaming samples (Ctrl+C to stop)");

    let mut decoder = WireDecoder::new();
    loop {
        tokio::select! {
            result = client.recv() => {
                match result {
                    Ok(Some(line)) => handle_line(&line, &mut decoder, &formatter),
                    Ok(None) => {
                        tracing::info!("connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "receive error");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                client.send("quit").await?;
                break;
            }
        }
    }

    Ok(())
}

fn handle_line(line: &str, decoder: &mut WireDecoder, formatter: &output::Formatter) {
    if let Ok(WireLine::Info(message)) = WireLine::parse(line) {
        tracing::debug!(reply = %message, "server reply");
        match message.as_str() {
            ILLEGAL_PATTERN_REPLY => tracing::error!("server rejected a filter pattern"),
            BUS_CLOSED_REPLY => tracing::info!("server is shutting down"),
            _ => {}
        }
        return;
    }

    match decoder.feed(line) {
        Ok(Some(sample)) => formatter.print(&sample),
        Ok(None) => {}
        Err(e) => tracing::warn!(line, error = %e, "undecodable line"),
    }
}
