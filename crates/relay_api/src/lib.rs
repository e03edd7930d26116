//! HTTP surface of the relay.
//!
//!   GET /next-matches  -> { "<team>": { match, division, stream }, ... }
//!   GET /health        -> "ok"
//!
//! CORS is open to every origin. Failures never leak detail to the caller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use logger::{now_iso, EventLogger, NextMatchesFailedEvent, NextMatchesServedEvent};
use next_match::NextMatchAggregator;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

pub const FAILURE_MESSAGE: &str = "Failed to fetch next matches";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<NextMatchAggregator>,
    pub logger:     Arc<EventLogger>,
}

impl AppState {
    pub fn new(aggregator: NextMatchAggregator, logger: EventLogger) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            logger:     Arc::new(logger),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/next-matches", get(next_matches))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn next_matches(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    match state.aggregator.get_next_matches().await {
        Ok(next) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(teams = next.len(), elapsed_ms, "GET /next-matches");

            let ev = NextMatchesServedEvent {
                ts:               now_iso(),
                event:            "NEXT_MATCHES_SERVED",
                teams_with_match: next.len(),
                elapsed_ms,
            };
            if let Err(e) = state.logger.log(&ev) {
                warn!("Log write failed: {e}");
            }

            Json(next).into_response()
        }
        Err(e) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            error!(elapsed_ms, "GET /next-matches failed: {e:#}");

            let ev = NextMatchesFailedEvent {
                ts:         now_iso(),
                event:      "NEXT_MATCHES_FAILED",
                error:      format!("{e:#}"),
                elapsed_ms,
            };
            if let Err(e) = state.logger.log(&ev) {
                warn!("Log write failed: {e}");
            }

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": FAILURE_MESSAGE })),
            )
                .into_response()
        }
    }
}
