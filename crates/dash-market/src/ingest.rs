//! HTTP intake for engine callbacks.
//!
//! The engine adapter posts each callback as a `{type, data}` JSON body;
//! accepted events are queued for the bridge.
//!
//! - `POST /api/engine/events` - queue one engine event
//! - `GET  /api/health` - liveness and bridge counters

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use tracing::{debug, warn};

use dash_common::ApiResponse;

use crate::bridge::{BridgeStats, EngineEventSender};
use crate::snapshot::is_valid_symbol;
use crate::types::EngineEvent;

/// Shared state for ingest handlers.
#[derive(Clone)]
pub struct IngestState {
    pub events: EngineEventSender,
    pub stats: Arc<BridgeStats>,
}

impl IngestState {
    pub fn new(events: EngineEventSender, stats: Arc<BridgeStats>) -> Self {
        Self { events, stats }
    }
}

/// Health check body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub bridge_running: bool,
    pub events_handled: u64,
    pub envelopes_sent: u64,
}

/// POST /api/engine/events - Queue an engine event for the bridge.
async fn post_event(
    State(state): State<IngestState>,
    Json(event): Json<EngineEvent>,
) -> ApiResponse<String> {
    let kind = event.kind();
    if let EngineEvent::Tick(tick) = &event
        && !is_valid_symbol(&tick.symbol)
    {
        warn!(symbol = %tick.symbol, "Rejected tick with invalid symbol");
        return ApiResponse::fail("invalid symbol", kind.to_string());
    }

    match state.events.send(event).await {
        Ok(()) => {
            debug!(event = kind, "Engine event queued");
            ApiResponse::ok("accepted", kind.to_string())
        }
        Err(_) => {
            warn!(event = kind, "Engine event dropped: bridge is not running");
            ApiResponse::fail("bridge is not running", kind.to_string())
        }
    }
}

/// GET /api/health - Health check.
async fn health(State(state): State<IngestState>) -> Json<HealthResponse> {
    let stats = state.stats.snapshot();
    Json(HealthResponse {
        status: "ok",
        bridge_running: !state.events.is_closed(),
        events_handled: stats.events_handled,
        envelopes_sent: stats.envelopes_sent,
    })
}

/// Create the ingest router.
pub fn create_ingest_router(state: IngestState) -> Router {
    Router::new()
        .route("/api/engine/events", post(post_event))
        .route("/api/health", get(health))
        .with_state(state)
}
