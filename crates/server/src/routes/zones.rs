use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use paverly_core::domain::pricing::{DeliveryZone, ZoneId};
use paverly_db::repositories::DeliveryZoneRepository;

use crate::error::ApiError;

use super::{require_admin, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ZoneQuery {
    /// `?all=true` includes inactive zones; admin only.
    #[serde(default)]
    pub all: bool,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ZoneQuery>,
) -> Result<Json<Vec<DeliveryZone>>, ApiError> {
    if query.all {
        require_admin(&state, &headers)?;
        return Ok(Json(state.zones().list(false).await?));
    }

    let zones = match state.zones().list(true).await {
        Ok(zones) if !zones.is_empty() => zones,
        Ok(_) => DeliveryZone::default_zones(),
        Err(error) => {
            warn!(error = %error, "zone read failed, serving built-in zones");
            DeliveryZone::default_zones()
        }
    };
    Ok(Json(zones))
}

pub async fn save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(zone): Json<DeliveryZone>,
) -> Result<Json<Vec<DeliveryZone>>, ApiError> {
    require_admin(&state, &headers)?;
    if zone.id.0.trim().is_empty() || zone.label.trim().is_empty() {
        return Err(ApiError::bad_request("zone requires an id and a label"));
    }
    if zone.fee.is_sign_negative() {
        return Err(ApiError::bad_request("zone fee must not be negative"));
    }

    let repository = state.zones();
    repository.upsert(zone).await?;
    Ok(Json(repository.list(false).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<DeliveryZone>>, ApiError> {
    require_admin(&state, &headers)?;

    let repository = state.zones();
    repository.delete(&ZoneId(id)).await?;
    Ok(Json(repository.list(false).await?))
}
