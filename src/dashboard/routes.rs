//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`;
//! the `RwLock`s are the mutual-exclusion boundary the estimator itself
//! does not provide.

use axum::{
    extract::{Query as UrlQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::estimator::Estimator;
use crate::session::{SessionMetrics, SessionTracker};
use crate::types::{CrashcastError, Query};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub estimator: RwLock<Estimator>,
    pub session: RwLock<SessionTracker>,
    pub started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(estimator: Estimator) -> Self {
        Self {
            estimator: RwLock::new(estimator),
            session: RwLock::new(SessionTracker::new()),
            started_at: Utc::now(),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub model: String,
    pub rounds_recorded: u64,
    pub history_len: usize,
    pub history_capacity: usize,
    pub min_history: usize,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomePoint {
    pub multiplier: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub target: f64,
    pub stake: f64,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Map a domain error onto an HTTP response. `InsufficientHistory`
/// becomes the "gathering data" state the host renders instead of a
/// numeric estimate.
fn error_response(err: CrashcastError) -> Response {
    match err {
        CrashcastError::InvalidQuery(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": msg })),
        )
            .into_response(),
        CrashcastError::InsufficientHistory { have, need } => (
            StatusCode::CONFLICT,
            Json(json!({
                "status": "gathering_data",
                "have": have,
                "need": need,
            })),
        )
            .into_response(),
        CrashcastError::Model { name, message } => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": format!("model {name}: {message}") })),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": other.to_string() })),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let estimator = state.estimator.read().await;
    let session = state.session.read().await;

    Json(StatusResponse {
        status: "running".to_string(),
        model: estimator.model_name().to_string(),
        rounds_recorded: session.rounds_recorded(),
        history_len: estimator.history().len(),
        history_capacity: estimator.history().capacity(),
        min_history: estimator.config().min_history,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /api/history?limit=N — most recent outcomes, newest last.
pub async fn get_history(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<HistoryParams>,
) -> Json<Vec<OutcomePoint>> {
    let estimator = state.estimator.read().await;
    let limit = params.limit.unwrap_or(20);
    let recent = estimator
        .history()
        .recent(limit)
        .into_iter()
        .map(|o| OutcomePoint {
            multiplier: o.multiplier,
            observed_at: o.observed_at,
        })
        .collect();
    Json(recent)
}

/// GET /api/summary — rolling statistics, or the gathering-data state
/// while the history is below the prediction minimum.
pub async fn get_summary(State(state): State<AppState>) -> Response {
    let estimator = state.estimator.read().await;
    let cfg = estimator.config();

    if estimator.history().len() < cfg.min_history {
        return error_response(CrashcastError::InsufficientHistory {
            have: estimator.history().len(),
            need: cfg.min_history,
        });
    }

    // Summaries are target-relative; 2.0x is the conventional reference.
    match estimator.history().summary(cfg.summary_window, 2.0) {
        Some(summary) => Json(summary).into_response(),
        None => error_response(CrashcastError::InsufficientHistory {
            have: 0,
            need: cfg.min_history,
        }),
    }
}

/// GET /api/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Json<SessionMetrics> {
    let session = state.session.read().await;
    Json(session.snapshot())
}

/// POST /api/predict
pub async fn post_predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Response {
    let query = Query::new(req.target, req.stake);

    let prediction = {
        let estimator = state.estimator.read().await;
        match estimator.predict(&query) {
            Ok(p) => p,
            Err(e) => return error_response(e),
        }
    };

    state
        .session
        .write()
        .await
        .record_prediction(&query, &prediction);

    Json(prediction).into_response()
}

/// POST /api/reset — switch to a new game session.
pub async fn post_reset(State(state): State<AppState>) -> StatusCode {
    state.estimator.write().await.reset();
    state.session.write().await.reset();
    info!("Session reset via dashboard");
    StatusCode::OK
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
