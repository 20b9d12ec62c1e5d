//! HostWatch - host resource monitor
//!
//! `hostwatch collect` samples the host into an append-only CSV log;
//! `hostwatch dashboard` charts the recent part of that log. The two run as
//! separate processes and share nothing but the log file.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use hostwatch::{
    cli::{Cli, Command},
    collector::Collector,
    config::Config,
    dashboard::{load_view, run_session, spawn_stdin_reader, Screen, Session, TerminalScreen},
    host::SysinfoHost,
    logging,
    metrics_log::MetricsLog,
};
use std::io::{self, IsTerminal};
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layer defaults, config file, environment and CLI args.
    let config = Config::load(&cli).context("failed to load configuration")?;

    match &cli.command {
        Command::Collect(_) => collect(config).await,
        Command::Dashboard(args) => dashboard(config, args.once).await,
    }
}

async fn collect(config: Config) -> Result<()> {
    logging::init_collector(&config.log_level, &config.collector.diagnostic_log)?;

    info!("HostWatch collector starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Metrics Log: {}", config.metrics_log.display());
    info!("Diagnostic Log: {}", config.collector.diagnostic_log.display());
    info!("Interval: {}s", config.collector.interval_seconds);
    info!("Disk Mount Point: {}", config.collector.disk_mount_point.display());
    info!("-------------------------------------------------------");

    let host = SysinfoHost::new(&config.collector.disk_mount_point)
        .context("cannot access host metrics")?;
    let collector = Collector::new(
        host,
        MetricsLog::new(&config.metrics_log),
        config.collector.interval(),
    );

    println!(
        "Collecting metrics every {} seconds. Press Ctrl+C to stop.",
        config.collector.interval_seconds
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let run = collector.run(shutdown_rx);
    tokio::pin!(run);

    let finished = tokio::select! {
        result = &mut run => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
    };
    let result = match finished {
        Some(result) => result,
        None => {
            info!("Shutdown signal received. Shutting down gracefully...");
            let _ = shutdown_tx.send(());
            run.await
        }
    };

    println!("Monitoring stopped.");
    result.context("collector stopped")?;
    Ok(())
}

async fn dashboard(config: Config, once: bool) -> Result<()> {
    logging::init_dashboard(&config.log_level)?;

    let log = MetricsLog::new(&config.metrics_log);
    let session = Session::new(config.dashboard.window_minutes, config.dashboard.refresh);
    let stdout = io::stdout();
    let clear = stdout.is_terminal() && !once;
    let mut screen = TerminalScreen::new(stdout).with_max_rows(config.dashboard.table_rows);
    if !clear {
        screen = screen.without_clear();
    }

    if once {
        let view = load_view(&log, &session, Local::now().naive_local());
        screen.show(&view, &session, None)?;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for Ctrl+C; use `q` to quit");
                // The sender stays alive, so the session never sees a shutdown.
                std::future::pending::<()>().await;
            }
        }
    });

    run_session(
        &log,
        &mut screen,
        session,
        spawn_stdin_reader(),
        shutdown_rx,
        || Local::now().naive_local(),
    )
    .await?;
    Ok(())
}
