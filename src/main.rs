use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use shelfwatch::alerts::AlertSet;
use shelfwatch::coordinator::ScanCoordinator;
use shelfwatch::events::{EventSink, MonitorEvent};
use shelfwatch::scheduler::CycleScheduler;
use shelfwatch::session::{ChromeSessionProvider, SessionProvider};
use shelfwatch::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "shelfwatch", version, about = "Marketplace seller inventory monitor")]
struct Cli {
    /// Run a single scan, print the result as JSON, and exit.
    #[arg(long)]
    once: bool,

    /// Directory holding the layered configuration files.
    #[arg(short, long, default_value = "config")]
    config_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shelfwatch=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_dir(&cli.config_dir).context("failed to load configuration")?;
    info!(
        "loaded {} admin account(s) and {} session(s)",
        config.admins.len(),
        config.sessions.len()
    );

    let provider = Arc::new(ChromeSessionProvider::new(&config.sessions));

    if cli.once {
        run_once(&config, provider).await
    } else {
        run_monitor(&config, provider).await
    }
}

/// One scan on the first configured session, result to stdout as JSON.
async fn run_once(config: &AppConfig, provider: Arc<dyn SessionProvider>) -> Result<()> {
    let coordinator = ScanCoordinator::new(config, EventSink::disabled());
    let alerts = Arc::new(Mutex::new(AlertSet::new()));

    let handle = provider.acquire(&config.sessions[0].id).await?;
    let outcome = coordinator
        .run(
            handle.page(),
            &config.admins,
            &alerts,
            &CancellationToken::new(),
        )
        .await;
    if let Err(e) = handle.release().await {
        warn!("could not release session: {}", e);
    }

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    info!("{}", result.summary().status_line());
    Ok(())
}

/// Continuous monitoring until ctrl-c.
async fn run_monitor(config: &AppConfig, provider: Arc<dyn SessionProvider>) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = EventSink::new(tx);
    let alerts = Arc::new(Mutex::new(AlertSet::new()));
    let scheduler = CycleScheduler::new(config, provider, alerts, sink);

    let consumer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            report(event);
        }
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            signal_cancel.cancel();
        }
    });

    let outcome = scheduler.run(cancel).await;
    consumer.abort();
    outcome?;
    Ok(())
}

fn report(event: MonitorEvent) {
    match event {
        MonitorEvent::Status(message) => info!("{}", message),
        MonitorEvent::Progress {
            current,
            total,
            label,
        } => info!("[{}/{}] {}", current, total, label),
        MonitorEvent::OutOfStockAlert {
            username,
            admin,
            profile_url,
        } => warn!(
            "ALERT: {} (via {}) has items listed again: {}",
            username, admin, profile_url
        ),
        MonitorEvent::Restocked {
            username,
            profile_url,
        } => info!("{} cleared their shop: {}", username, profile_url),
        MonitorEvent::Countdown { seconds_left } => {
            if seconds_left % 60 == 0 || seconds_left <= 5 {
                info!("next cycle in {}s", seconds_left);
            }
        }
        MonitorEvent::CycleFinished {
            cycle,
            total_sellers,
        } => info!("cycle {} finished, {} seller(s) checked", cycle, total_sellers),
        MonitorEvent::Fatal(message) => error!("fatal: {}", message),
    }
}
