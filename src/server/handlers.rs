//! HTTP route handlers

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::error::ApiError;
use crate::model::{LogFilter, LogRecord, LogSummary, NewLog};
use crate::registry::{FanoutRegistry, ProjectToken, TokenStats};
use crate::stats::FanoutStatsSnapshot;
use crate::storage::LogStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub registry: Arc<FanoutRegistry>,
    /// Cancelled on server shutdown; every live stream holds a child token
    pub shutdown: CancellationToken,
    /// Interval between SSE keep-alive comments
    pub keep_alive: Duration,
}

/// Body of GET /stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub totals: FanoutStatsSnapshot,
    /// Live viewers per token
    pub tokens: BTreeMap<String, TokenStats>,
}

/// Handle POST /logs
///
/// Persists the log, then fans it out to live viewers of its token. Fan-out
/// cannot fail the request.
pub async fn handle_create_log(
    State(state): State<AppState>,
    Json(log): Json<NewLog>,
) -> Result<Json<LogSummary>, ApiError> {
    if log.token.is_empty() {
        return Err(ApiError::BadRequest("token must not be empty".into()));
    }

    let record = state.store.insert(log);
    let token = ProjectToken::new(record.token.clone());
    let delivered = state.registry.notify_new_log(&token, &record);

    tracing::debug!(
        token = %token,
        log_id = record.id,
        viewers = delivered,
        "Log ingested"
    );

    Ok(Json(record.summary()))
}

/// Handle GET /logs
pub async fn handle_all_logs(State(state): State<AppState>) -> Json<Vec<LogRecord>> {
    Json(state.store.all())
}

/// Handle GET /logs/:token
pub async fn handle_project_logs(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(filter): Query<LogFilter>,
) -> Json<Vec<LogSummary>> {
    let logs = state
        .store
        .query(&token, &filter)
        .iter()
        .map(LogRecord::summary)
        .collect();
    Json(logs)
}

/// Handle GET /logs/:token/:id
pub async fn handle_log_detail(
    State(state): State<AppState>,
    Path((token, id)): Path<(String, u64)>,
) -> Result<Json<LogRecord>, ApiError> {
    state
        .store
        .get(&token, id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Log not found".into()))
}

/// Handle GET /stream/:token
///
/// Each event is one SSE `data:` frame holding the JSON log record. When the
/// client goes away axum drops the body stream, which unregisters the viewer.
pub async fn handle_live_stream(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let token = ProjectToken::new(token);
    let live = state.registry.listen(&token, state.shutdown.child_token());

    tracing::info!(
        token = %token,
        subscriber_id = live.handle().id,
        viewers = state.registry.subscriber_count(&token),
        "Live stream opened"
    );

    let events = live
        .into_stream()
        .map(|payload| Ok(Event::default().data(payload.as_str())));

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}

/// Handle GET /stats
pub async fn handle_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let tokens = state
        .registry
        .all_token_stats()
        .into_iter()
        .map(|(token, stats)| (token.as_str().to_owned(), stats))
        .collect();

    Json(StatsResponse {
        totals: state.registry.stats(),
        tokens,
    })
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> &'static str {
    "OK"
}
