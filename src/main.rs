/// Next-match relay
///
/// What it does:
///   1. Serves GET /next-matches on RELAY_BIND (default 0.0.0.0:3001)
///   2. Per request: pulls every championship division's schedule from TBA
///   3. Returns each tracked team's soonest upcoming qualification match + stream link
///
/// Config: .env / environment (TBA_AUTH_KEY, TBA_BASE_URL, TBA_TIMEOUT_SECS,
/// RELAY_BIND, RELAY_LOG_DIR, DIVISION_<NAME>_URL)
///
/// Run:
///   cargo run --bin next-match-relay

use anyhow::{Context, Result};
use dotenv::dotenv;
use logger::{now_iso, EventLogger, RelayStartedEvent};
use next_match::{NextMatchAggregator, RelayConfig};
use relay_api::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cfg = RelayConfig::from_env().context("Invalid relay configuration")?;

    if cfg.tba_auth_key.is_none() {
        warn!("TBA_AUTH_KEY not set, TBA will reject match requests");
    }
    for division in &cfg.divisions {
        match division.event_key() {
            Ok(key) => info!("Division {:<10} -> {} ({})", division.name, key, division.stream),
            Err(e)  => warn!("{e}; /next-matches will fail until it is set"),
        }
    }
    info!("Tracking {} teams, TBA: {}", cfg.roster.len(), cfg.tba_base_url);

    let logger = EventLogger::new(&cfg.log_dir);
    let started = RelayStartedEvent {
        ts:            now_iso(),
        event:         "RELAY_STARTED",
        bind:          cfg.bind.to_string(),
        divisions:     cfg.divisions.len(),
        tracked_teams: cfg.roster.len(),
        auth_key_set:  cfg.tba_auth_key.is_some(),
    };
    if let Err(e) = logger.log(&started) {
        warn!("Log write failed: {e}");
    }

    let aggregator = NextMatchAggregator::from_config(&cfg);
    let app = build_router(AppState::new(aggregator, logger));

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    info!("Server running at http://{}", cfg.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler failed: {e}");
    }
}
