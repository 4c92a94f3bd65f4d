use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use paverly_core::analytics::AnalyticsEvent;
use paverly_db::repositories::{
    ActivityLog, ActivityLogRepository, AnalyticsOverview, AnalyticsRepository,
};

use crate::error::ApiError;

use super::{require_admin, AppState};

const DEFAULT_OVERVIEW_DAYS: i64 = 30;
const LOGS_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub session_id: String,
    pub event_type: String,
    #[serde(default)]
    pub event_data: serde_json::Value,
    #[serde(default)]
    pub step: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    #[serde(default)]
    pub days: Option<i64>,
}

/// Best-effort ingest: a storage failure is logged and the caller still
/// gets an ok, so a flaky sink can never degrade the wizard.
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Json<serde_json::Value> {
    let event = AnalyticsEvent {
        session_id: request.session_id,
        event_type: request.event_type,
        event_data: request.event_data,
        step: request.step,
        occurred_at: Utc::now(),
    };

    if let Err(error) = state.analytics().insert(event).await {
        warn!(error = %error, "dropping analytics event after insert failure");
    }
    Json(serde_json::json!({ "ok": true }))
}

pub async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<AnalyticsOverview>, ApiError> {
    require_admin(&state, &headers)?;

    let days = query.days.unwrap_or(DEFAULT_OVERVIEW_DAYS);
    Ok(Json(state.analytics().overview(days).await?))
}

pub async fn logs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.activity().recent(LOGS_LIMIT).await?))
}
