use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use paverly_core::domain::lead::{Lead, LeadId, LeadStatus, NewLead};
use paverly_db::repositories::{LeadFilter, LeadRepository};

use crate::error::ApiError;

use super::{require_admin, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadQuery {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: LeadStatus,
}

/// Public lead capture from the wizard and the embed page.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    let lead = NewLead {
        name: request.name,
        email: request.email,
        phone: request.phone,
        session_id: request.session_id,
        source: request.source.unwrap_or_else(|| "quote".to_string()),
    };
    lead.validate().map_err(|_| ApiError::bad_request("Name and email are required"))?;

    Ok(Json(state.leads().insert(lead).await?))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LeadQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    require_admin(&state, &headers)?;

    let filter =
        LeadFilter { source: query.source, status: query.status, limit: query.limit };
    Ok(Json(state.leads().list(filter).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;

    state.leads().update_status(&LeadId(id), request.status).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
