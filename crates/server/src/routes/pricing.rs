use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::warn;

use paverly_core::domain::pricing::PricingConfig;
use paverly_db::repositories::PricingConfigRepository;

use crate::error::ApiError;

use super::{require_admin, AppState};

/// Public pricing read. Falls back to the shipped defaults on a store
/// failure; the wizard treats whatever it receives as its session
/// snapshot.
pub async fn get_config(State(state): State<AppState>) -> Json<PricingConfig> {
    match state.pricing().load().await {
        Ok(config) => Json(config),
        Err(error) => {
            warn!(error = %error, "pricing read failed, serving defaults");
            Json(PricingConfig::default())
        }
    }
}

pub async fn save_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(config): Json<PricingConfig>,
) -> Result<Json<PricingConfig>, ApiError> {
    require_admin(&state, &headers)?;
    if config.labor_rate_per_sqft.is_sign_negative()
        || config.waste_percentage.is_sign_negative()
    {
        return Err(ApiError::bad_request("rates and percentages must not be negative"));
    }

    Ok(Json(state.pricing().save(config).await?))
}
