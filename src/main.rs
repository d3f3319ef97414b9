mod api;
mod config;
mod events;
mod pipeline;
mod scheduler;
mod state;
mod storage;
mod trade;

use std::time::SystemTime;

use chrono::{Local, TimeZone, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use events::Event;
use pipeline::{AdmittedTrade, Pipeline};
use scheduler::{PollScheduler, HEARTBEAT_MS};
use state::{CatalogCache, RetentionCache};
use storage::{FileStorage, MemoryStorage, Storage};
use trade::Trade;

/// Empty `storage_dir` means run without persistence.
fn open_storage(dir: &str) -> Box<dyn Storage> {
    if dir.is_empty() {
        Box::new(MemoryStorage::new())
    } else {
        Box::new(FileStorage::new(dir))
    }
}

/// Pick up edits to the config file between cycles. Interval, thresholds and
/// TTLs apply on the next heartbeat without restarting the scheduler or
/// clearing cache state; storage dir and log level need a restart.
fn reload_if_changed(
    path: &str,
    last_mtime: &mut Option<SystemTime>,
    cfg: &mut Config,
    scheduler: &mut PollScheduler,
) {
    let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
        return;
    };
    if Some(modified) == *last_mtime {
        return;
    }
    *last_mtime = Some(modified);

    match Config::load(path) {
        Ok(new_cfg) => {
            if new_cfg.feed.poll_interval_ms != scheduler.interval_ms() {
                info!(
                    interval_ms = new_cfg.feed.poll_interval_ms,
                    "poll interval updated"
                );
                scheduler.set_interval(new_cfg.feed.poll_interval_ms);
            }
            *cfg = new_cfg;
        }
        Err(e) => warn!(error = %e, "config reload failed; keeping current settings"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let mut cfg = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("no usable config at {} ({}); using defaults", config_path, e);
            Config::default()
        }
    };
    let mut config_mtime = std::fs::metadata(&config_path)
        .and_then(|m| m.modified())
        .ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.general.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        poll_interval_ms = cfg.feed.poll_interval_ms,
        min_value = %cfg.watch.min_value,
        whale_value = %cfg.watch.whale_value,
        storage_dir = %cfg.general.storage_dir,
        "polywhale starting"
    );

    let history = RetentionCache::load(
        open_storage(&cfg.general.storage_dir),
        cfg.watch.retention_ttl_ms,
    );
    let catalog = CatalogCache::load(
        open_storage(&cfg.general.storage_dir),
        cfg.watch.catalog_ttl_ms,
    );
    let mut pipeline = Pipeline::new(history, catalog);

    // Drop anything that expired while we weren't running, then show what
    // survived, before the first fetch.
    let now_ms = Utc::now().timestamp_millis();
    if pipeline.history.evict_expired(now_ms) {
        pipeline.history.persist_if_dirty();
    }
    render_history(&pipeline.snapshot());

    let client = api::http_client()?;
    let mut scheduler = PollScheduler::new(cfg.feed.poll_interval_ms);

    // Immediate first cycle; the countdown starts after it.
    scheduler.begin_cycle(Utc::now().timestamp_millis());
    let admitted = pipeline
        .run_cycle(&client, &cfg.feed, &cfg.watch)
        .await;
    scheduler.finish_cycle();
    notify(&admitted);
    render_history(&pipeline.snapshot());

    let (tx, mut rx) = mpsc::channel::<Event>(16);

    let heartbeat_tx = tx.clone();
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_millis(HEARTBEAT_MS));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if heartbeat_tx.send(Event::Tick).await.is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        let _ = tx.send(Event::Shutdown).await;
    });

    while let Some(event) = rx.recv().await {
        match event {
            Event::Tick => {
                reload_if_changed(&config_path, &mut config_mtime, &mut cfg, &mut scheduler);

                let now_ms = Utc::now().timestamp_millis();
                if scheduler.should_start(now_ms) {
                    scheduler.begin_cycle(now_ms);
                    let admitted = pipeline
                        .run_cycle(&client, &cfg.feed, &cfg.watch)
                        .await;
                    scheduler.finish_cycle();
                    notify(&admitted);
                    render_history(&pipeline.snapshot());
                } else {
                    // Countdown/progress are display-only projections
                    trace!(
                        seconds_left = scheduler.seconds_left(now_ms),
                        progress = scheduler.progress(now_ms),
                        "waiting for next cycle"
                    );
                }
            }
            Event::Shutdown => {
                info!("shutting down");
                pipeline.history.persist_if_dirty();
                pipeline.catalog.persist_if_dirty();
                break;
            }
        }
    }

    Ok(())
}

/// Alert on each newly admitted trade, one line per fill.
fn notify(admitted: &[AdmittedTrade]) {
    for a in admitted {
        let when = Local
            .timestamp_opt(a.trade.timestamp, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| a.trade.timestamp.to_string());

        info!(
            tier = a.tier.label(),
            time = %when,
            side = %a.trade.side,
            value = %a.value,
            size = %a.trade.size,
            price = %a.trade.price,
            outcome = %a.outcome,
            market = a.trade.slug.as_deref().unwrap_or("unknown-market"),
            url = a.trade.event_url().as_deref().unwrap_or(""),
            trader = a.trade.name.as_deref().unwrap_or(""),
            "large trade"
        );
    }
}

/// Summarize the retained-history view after each cycle.
fn render_history(snapshot: &[Trade]) {
    if snapshot.is_empty() {
        info!("no large trades in the retention window");
        return;
    }
    info!(retained = snapshot.len(), "retention window");
    for t in snapshot.iter().take(12) {
        trace!(
            market = t.slug.as_deref().unwrap_or("unknown-market"),
            side = %t.side,
            size = %t.size,
            "retained"
        );
    }
}
