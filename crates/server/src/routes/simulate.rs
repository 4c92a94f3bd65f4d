use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use paverly_db::repositories::{ActivityLogRepository, LogStatus, NewActivityLog};
use paverly_vision::{InlineImage, SimulationRequest};

use crate::error::ApiError;

use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub original_image: String,
    pub paver_style: String,
    pub paver_texture: String,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub generated_image: String,
}

/// Stateless visualization endpoint mirroring the wizard's internal call:
/// photo + style + texture in, rendered image out. Every run lands in the
/// activity log with its duration.
pub async fn simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    if request.original_image.trim().is_empty()
        || request.paver_style.trim().is_empty()
        || request.paver_texture.trim().is_empty()
    {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let Some(vision) = state.vision.clone() else {
        log_simulation(
            &state,
            LogStatus::Error,
            serde_json::json!({
                "paver": request.paver_style,
                "error": "visualization service is not configured",
            }),
        )
        .await;
        return Err(ApiError::unavailable("visualization service is not configured"));
    };

    let started = Instant::now();
    let vision_request = SimulationRequest {
        original_image: InlineImage::from_data_url(&request.original_image)?,
        paver_style: request.paver_style.clone(),
        paver_texture: request.paver_texture,
        custom_prompt: request.custom_prompt,
    };

    match vision.generate(&vision_request).await {
        Ok(image) => {
            log_simulation(
                &state,
                LogStatus::Success,
                serde_json::json!({
                    "paver": request.paver_style,
                    "durationMs": started.elapsed().as_millis() as u64,
                }),
            )
            .await;
            Ok(Json(SimulateResponse { generated_image: image.to_data_url() }))
        }
        Err(error) => {
            log_simulation(
                &state,
                LogStatus::Error,
                serde_json::json!({
                    "paver": request.paver_style,
                    "error": error.to_string(),
                    "durationMs": started.elapsed().as_millis() as u64,
                }),
            )
            .await;
            Err(ApiError::from(error))
        }
    }
}

pub(crate) async fn log_simulation(
    state: &AppState,
    status: LogStatus,
    details: serde_json::Value,
) {
    let entry =
        NewActivityLog { action: "generate_simulation".to_string(), status, details };
    if let Err(error) = state.activity().append(entry).await {
        warn!(error = %error, "dropping activity log entry after append failure");
    }
}
