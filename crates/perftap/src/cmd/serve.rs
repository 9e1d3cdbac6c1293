//! Serve command - run the telemetry server
//!
//! Registers the configured categories on every host, then polls them at
//! the configured interval and streams the samples to every subscriber.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use regex::Regex;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use perftap_config::{Config, HostConfig, LogLevel};
use perftap_metrics::MetricsReporter;
use perftap_scheduler::PollScheduler;
use perftap_sources::{CounterSource, open_source, register_matching};
use perftap_tap::{BroadcastBus, TapServer};

/// Config files tried, in order, when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["perftap.toml", "configs/perftap.toml"];

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to perftap.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listening TCP port. Overrides config file.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Poll interval in seconds. Overrides config file.
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,
}

/// Run the serve command
pub async fn run(args: ServeArgs, log_level: Option<String>) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        config = %config_path,
        "perftap starting"
    );

    let config = load_config(args.config.as_deref())?;
    let config = apply_overrides(config, &args, log_level.as_deref())?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("perftap shutdown complete");
    Ok(())
}

/// Load the configuration file, or fall back to monitoring the local machine
fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    if let Some(path) = path {
        // User explicitly provided config path - must exist
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for path in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if path.exists() {
            info!(config = %path.display(), "using config file");
            return Config::from_file(&path).context("failed to load configuration");
        }
    }

    info!("no config file found, monitoring every category of localhost");
    Ok(Config {
        hosts: vec![HostConfig::all_categories("localhost")],
        ..Default::default()
    })
}

/// Apply command-line overrides and validate the result
fn apply_overrides(mut config: Config, args: &ServeArgs, log_level: Option<&str>) -> Result<Config> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(seconds) = args.interval {
        config.poll.interval = Duration::from_secs(seconds);
    }
    if let Some(level) = log_level {
        config.log.level = level
            .parse::<LogLevel>()
            .map_err(|e| anyhow::anyhow!(e))
            .context("invalid --log-level")?;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Open a source per host and register its matching categories
///
/// Hosts that cannot be opened or have nothing to register are dropped
/// with a warning.
fn open_sources(hosts: &[HostConfig]) -> Result<Vec<Box<dyn CounterSource>>> {
    let mut sources = Vec::with_capacity(hosts.len());

    for host in hosts {
        let mut source = match open_source(&host.name) {
            Ok(source) => source,
            Err(e) => {
                warn!(host = %host.name, error = %e, "host skipped");
                continue;
            }
        };

        let pattern = Regex::new(&host.categories)
            .with_context(|| format!("invalid categories pattern for host {}", host.name))?;
        let registered = register_matching(source.as_mut(), &pattern)
            .with_context(|| format!("failed to register categories on {}", host.name))?;

        if registered.is_empty() {
            warn!(host = %host.name, "{} has no suitable counters to monitor", host.name);
            continue;
        }

        info!(host = %host.name, categories = ?registered, "host registered");
        sources.push(source);
    }

    if sources.is_empty() {
        bail!("nothing to monitor");
    }
    Ok(sources)
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let sources = open_sources(&config.hosts)?;
    let host_count = sources.len();

    // Scheduler, reporter and signal share one token; the server gets its
    // own so it keeps running until the bus has closed every subscriber
    let cancel = CancellationToken::new();
    let server_cancel = CancellationToken::new();

    let bus = Arc::new(BroadcastBus::new());
    let server = TapServer::bind(config.server.clone(), Arc::clone(&bus))
        .await
        .context("failed to start subscriber server")?;
    let scheduler = PollScheduler::new(sources, Arc::clone(&bus), config.poll.interval);

    let metrics_task = start_metrics_reporter(&config, &server, &scheduler, &cancel);
    let server_task = tokio::spawn(server.run(server_cancel.clone()));
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    info!(
        port = config.server.port,
        interval = ?config.poll.interval,
        hosts = host_count,
        metrics_enabled = config.metrics.enabled,
        "perftap running"
    );

    wait_for_shutdown().await;

    info!("shutdown signal received, stopping server...");
    cancel.cancel();

    info!("waiting for poll scheduler to stop...");
    if let Err(e) = scheduler_task.await {
        warn!(error = %e, "scheduler task panicked during shutdown");
    }

    info!("closing subscriber connections...");
    bus.close().await;

    server_cancel.cancel();
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "subscriber server failed during shutdown"),
        Err(e) => warn!(error = %e, "subscriber server task panicked"),
    }

    if let Some(task) = metrics_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "metrics reporter task panicked");
    }

    Ok(())
}

/// Spawn the periodic metrics reporter if enabled
fn start_metrics_reporter(
    config: &Config,
    server: &TapServer,
    scheduler: &PollScheduler,
    cancel: &CancellationToken,
) -> Option<JoinHandle<()>> {
    if !config.metrics.enabled {
        info!("metrics reporting disabled");
        return None;
    }

    let mut builder = MetricsReporter::builder().config(config.metrics.clone());
    if config.metrics.include_tap {
        builder = builder.tap(server.metrics());
    }
    if config.metrics.include_poll {
        builder = builder.poll(scheduler.metrics());
    }

    Some(tokio::spawn(builder.build().run(cancel.clone())))
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
#[path = "serve_test.rs"]
mod tests;
