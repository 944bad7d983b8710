use std::path::Path;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use rarewatch_notify::{Announcement, DiscordNotifier, LogNotifier, Notifier};
use rarewatch_source::{EnrichingSource, ScraperCommand};

use crate::config::Config;
use crate::driver::{CycleReport, Driver};
use crate::error::{io_err, CycleError, DaemonError};
use crate::log_rotation::RotatingFile;

/// How `once` should treat the cycle it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnceMode {
    /// Fetch, persist, announce.
    Commit,
    /// Fetch and reconcile only.
    DryRun,
}

#[derive(Debug, Clone)]
pub enum OnceOutcome {
    Preview(Vec<Announcement>),
    Cycle(CycleReport),
}

/// Start the polling loop and block the current thread until ctrl-c.
///
/// With `log_only`, announcements go to the log instead of the chat channel.
pub fn start_blocking(config: Config, log_only: bool) -> Result<(), DaemonError> {
    init_tracing(config.debug, config.log_json, config.log_path.as_deref());
    let runtime = build_runtime()?;
    runtime.block_on(async move {
        let mut driver = build_driver(&config, log_only).await?;
        tracing::info!(
            artist = %config.artist,
            interval_secs = config.update_interval.as_secs(),
            state = %config.state_path.display(),
            "watching artist for updates",
        );

        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(4);
        let signal_handle = {
            let shutdown = shutdown_tx.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, shutting down");
                        let _ = shutdown.send(());
                    }
                    Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
                }
            })
        };

        let result = run(&mut driver, config.update_interval, shutdown_rx).await;
        signal_handle.abort();
        drop(shutdown_tx);
        result
    })
}

/// Run a single cycle and return what it did (or would do).
pub fn once_blocking(
    config: Config,
    mode: OnceMode,
    log_only: bool,
) -> Result<OnceOutcome, DaemonError> {
    init_tracing(config.debug, config.log_json, config.log_path.as_deref());
    let runtime = build_runtime()?;
    runtime.block_on(async move {
        // A dry run never announces, so it never needs chat credentials checked.
        let log_only = log_only || mode == OnceMode::DryRun;
        let mut driver = build_driver(&config, log_only).await?;
        match mode {
            OnceMode::DryRun => Ok(OnceOutcome::Preview(driver.preview().await?)),
            OnceMode::Commit => Ok(OnceOutcome::Cycle(driver.run_cycle().await?)),
        }
    })
}

/// Poll at `interval` until `shutdown` fires.
///
/// The first cycle starts immediately. Cycles never overlap: ticks that pass
/// while a cycle is still running are skipped. Shutdown during the fetch
/// abandons the cycle; once the fetch has returned the cycle is completed.
pub async fn run(
    driver: &mut Driver,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    driver.seed()?;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {}
        }

        tracing::info!(artist = %driver.artist(), "started update cycle");
        let fetched = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("shutdown requested during fetch; cycle abandoned");
                break;
            }
            fetched = driver.fetch() => fetched,
        };

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "fetch failed; skipping cycle");
                continue;
            }
        };

        match driver.apply(snapshot).await {
            Ok(report) => tracing::info!(
                fetched = report.fetched,
                announced = report.announced,
                failed = report.failed_notifications,
                "finished update cycle",
            ),
            Err(CycleError::Persist { source, report }) => tracing::error!(
                error = %source,
                announced = report.announced,
                "update cycle finished without persisting state",
            ),
            Err(err) => tracing::error!(error = %err, "update cycle failed"),
        }
    }

    Ok(())
}

async fn build_driver(config: &Config, log_only: bool) -> Result<Driver, DaemonError> {
    let source = EnrichingSource::new(ScraperCommand::new(config.scraper.clone()))
        .with_concurrency(config.fetch_concurrency);

    let notifier: Box<dyn Notifier> = if log_only {
        Box::new(LogNotifier)
    } else {
        Box::new(
            DiscordNotifier::new(config.discord_token.clone(), config.channel_id)
                .connect(config.server_id)
                .await?,
        )
    };

    Ok(Driver::new(
        Box::new(source),
        notifier,
        config.store(),
        config.artist.clone(),
    )
    .with_strategy(config.diff_strategy))
}

fn build_runtime() -> Result<tokio::runtime::Runtime, DaemonError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))
}

/// Install the global subscriber: stderr, plus `log_path` when given.
///
/// `RUST_LOG` wins over `debug`. The file always gets plain text without
/// ANSI colours; `json` only affects stderr.
pub fn init_tracing(debug: bool, json: bool, log_path: Option<&Path>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr = if json {
        fmt::layer().json().with_target(false).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file, file_error) = match log_path.map(|path| RotatingFile::open(path)) {
        Some(Ok(writer)) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(writer),
            ),
            None,
        ),
        Some(Err(err)) => (None, Some(err)),
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init();

    if let (Some(path), Some(err)) = (log_path, file_error) {
        tracing::warn!(
            path = %path.display(),
            error = %err,
            "log file unavailable; logging to stderr only",
        );
    }
}
