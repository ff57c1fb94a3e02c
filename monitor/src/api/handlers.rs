use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use market::AnomalyReport;
use serde::Serialize;

use crate::api::state::AppState;
use crate::engine::EngineStatus;
use crate::error::ApiResult;
use crate::service::ResetAck;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: i64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Cross-sectional analysis of a freshly fetched batch.
pub async fn anomalies(State(state): State<AppState>) -> ApiResult<Json<AnomalyReport>> {
    let report = state.service.analyze_latest().await?;
    Ok(Json(report))
}

pub async fn stream_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.service.stream_status())
}

pub async fn stream_alerts(State(state): State<AppState>) -> Json<AnomalyReport> {
    Json(state.service.stream_report())
}

pub async fn stream_reset(State(state): State<AppState>) -> Json<ResetAck> {
    Json(state.service.reset())
}
