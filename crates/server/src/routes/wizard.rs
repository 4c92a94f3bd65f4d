use std::sync::MutexGuard;

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use paverly_core::analytics::{AnalyticsEvent, EventSink, EventType};
use paverly_core::domain::lead::NewLead;
use paverly_core::domain::pricing::{DeliveryZone, PricingConfig, ZoneId};
use paverly_core::domain::product::{ImageRef, ProductId, VariantId};
use paverly_core::errors::{ApplicationError, DomainError};
use paverly_core::wizard::{
    LeadContact, SimulationSpec, WizardAction, WizardEngine, WizardEvent, WizardState,
};
use paverly_db::repositories::{
    DeliveryZoneRepository, LeadRepository, LogStatus, PricingConfigRepository, ProductRepository,
};
use paverly_vision::{InlineImage, SimulationRequest};

use crate::error::ApiError;
use crate::routes::simulate::log_simulation;

use super::{AppState, WizardSessions};

/// Client-facing commands; the handler resolves catalog references and
/// maps each command onto a wizard event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardCommand {
    Start,
    SubmitPhotos {
        photos: Vec<String>,
    },
    SubmitMeasurements {
        width: Decimal,
        length: Decimal,
    },
    SubmitLead {
        name: String,
        email: String,
        #[serde(default)]
        phone: Option<String>,
    },
    SkipLead,
    SelectProduct {
        product_id: String,
    },
    SelectVariant {
        variant_id: String,
    },
    Generate,
    TryAnother,
    ApprovePhoto,
    ChooseZone {
        zone_id: String,
    },
    RequestLabor,
    Restart,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub state: WizardState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_error: Option<String>,
}

fn lock_sessions(sessions: &WizardSessions) -> MutexGuard<'_, std::collections::HashMap<Uuid, WizardState>> {
    match sessions.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Open a session against the current pricing/zone snapshot. Collaborator
/// read failures degrade to the shipped defaults; the wizard must always
/// be able to start.
pub async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let pricing = match state.pricing().load().await {
        Ok(pricing) => pricing,
        Err(error) => {
            warn!(error = %error, "pricing read failed, starting session with defaults");
            PricingConfig::default()
        }
    };
    let zones = match state.zones().list(true).await {
        Ok(zones) if !zones.is_empty() => zones,
        Ok(_) => DeliveryZone::default_zones(),
        Err(error) => {
            warn!(error = %error, "zone read failed, starting session with built-in zones");
            DeliveryZone::default_zones()
        }
    };

    let session_id = Uuid::new_v4();
    let wizard_state = WizardEngine.initial_state(pricing, zones);
    lock_sessions(&state.sessions).insert(session_id, wizard_state.clone());

    let sink = state.sink();
    let session = session_id.to_string();
    sink.emit(AnalyticsEvent::new(&session, EventType::SessionStarted, json!({}), None));
    sink.emit(AnalyticsEvent::new(&session, EventType::PageView, json!({ "page": "quote" }), None));

    Json(SessionResponse { session_id, state: wizard_state, simulation_error: None })
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let wizard_state = lock_sessions(&state.sessions)
        .get(&session_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("unknown wizard session"))?;
    Ok(Json(SessionResponse { session_id, state: wizard_state, simulation_error: None }))
}

pub async fn drop_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    lock_sessions(&state.sessions)
        .remove(&session_id)
        .ok_or_else(|| ApiError::not_found("unknown wizard session"))?;
    Ok(Json(json!({ "ok": true })))
}

/// Apply one command: translate it to a wizard event, run the reducer,
/// then execute the side effects it asked for (lead persistence, the
/// visualization call). The session lock is never held across a
/// collaborator call.
pub async fn apply_event(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(command): Json<WizardCommand>,
) -> Result<Json<SessionResponse>, ApiError> {
    let event = build_event(&state, &session_id, command).await?;
    let (mut wizard_state, actions) = apply_to_session(&state, &session_id, &event)?;

    let mut simulation_error = None;
    for action in actions {
        match action {
            WizardAction::PersistLead(lead) => {
                let lead = NewLead { session_id: Some(session_id.to_string()), ..lead };
                if let Err(error) = state.leads().insert(lead).await {
                    warn!(error = %error, "lead persistence failed, continuing the wizard");
                }
            }
            WizardAction::RequestVisualization(spec) => {
                let (outcome, error) = run_visualization(&state, spec).await;
                simulation_error = error;
                let (next_state, _) = apply_to_session(&state, &session_id, &outcome)?;
                wizard_state = next_state;
            }
            WizardAction::Track { .. } => {
                // Tracking actions are drained into the sink by the engine.
            }
        }
    }

    Ok(Json(SessionResponse { session_id, state: wizard_state, simulation_error }))
}

fn apply_to_session(
    state: &AppState,
    session_id: &Uuid,
    event: &WizardEvent,
) -> Result<(WizardState, Vec<WizardAction>), ApiError> {
    let sink = state.sink();
    let mut sessions = lock_sessions(&state.sessions);
    let current = sessions
        .get(session_id)
        .ok_or_else(|| ApiError::not_found("unknown wizard session"))?;

    let transition = WizardEngine
        .apply_with_sink(current, event, &sink, &session_id.to_string())
        .map_err(|error| {
            let application = ApplicationError::from(DomainError::from(error));
            ApiError::from(application.into_interface(session_id.to_string()))
        })?;
    sessions.insert(*session_id, transition.state.clone());
    Ok((transition.state, transition.actions))
}

async fn build_event(
    state: &AppState,
    session_id: &Uuid,
    command: WizardCommand,
) -> Result<WizardEvent, ApiError> {
    let event = match command {
        WizardCommand::Start => WizardEvent::Started,
        WizardCommand::SubmitPhotos { photos } => WizardEvent::PhotosSubmitted {
            photos: photos.into_iter().map(ImageRef).collect(),
        },
        WizardCommand::SubmitMeasurements { width, length } => {
            WizardEvent::MeasurementsSubmitted { width, length }
        }
        WizardCommand::SubmitLead { name, email, phone } => {
            WizardEvent::LeadSubmitted { contact: LeadContact { name, email, phone } }
        }
        WizardCommand::SkipLead => WizardEvent::LeadSkipped,
        WizardCommand::SelectProduct { product_id } => {
            let product = state
                .products()
                .find_by_id(&ProductId(product_id.clone()))
                .await?
                .ok_or_else(|| ApiError::not_found(format!("unknown product `{product_id}`")))?;
            WizardEvent::ProductSelected { product }
        }
        WizardCommand::SelectVariant { variant_id } => {
            let sessions = lock_sessions(&state.sessions);
            let session = sessions
                .get(session_id)
                .ok_or_else(|| ApiError::not_found("unknown wizard session"))?;
            let product = session
                .selected_product
                .as_ref()
                .ok_or_else(|| ApiError::bad_request("select a product before a color"))?;
            let variant = product
                .variant(&VariantId(variant_id.clone()))
                .cloned()
                .ok_or_else(|| ApiError::not_found(format!("unknown variant `{variant_id}`")))?;
            WizardEvent::VariantSelected { variant }
        }
        WizardCommand::Generate => WizardEvent::GenerateRequested,
        WizardCommand::TryAnother => WizardEvent::TryAnotherRequested,
        WizardCommand::ApprovePhoto => WizardEvent::PhotoApproved,
        WizardCommand::ChooseZone { zone_id } => {
            WizardEvent::ZoneChosen { zone_id: ZoneId(zone_id) }
        }
        WizardCommand::RequestLabor => WizardEvent::LaborRequested,
        WizardCommand::Restart => WizardEvent::Restarted,
    };
    Ok(event)
}

/// Drive the visualization collaborator for one request and convert its
/// outcome into the event the wizard expects. The generation token rides
/// along so a session restarted mid-call discards the result.
async fn run_visualization(
    state: &AppState,
    spec: SimulationSpec,
) -> (WizardEvent, Option<String>) {
    let generation = spec.generation;
    let result = match &state.vision {
        None => Err("visualization service is not configured".to_string()),
        Some(client) => match InlineImage::from_data_url(&spec.photo.0) {
            Err(error) => Err(error.to_string()),
            Ok(original_image) => {
                let request = SimulationRequest {
                    original_image,
                    paver_style: spec.paver_style.clone(),
                    paver_texture: spec.paver_texture_url.clone(),
                    custom_prompt: spec.custom_prompt.clone(),
                };
                client
                    .generate(&request)
                    .await
                    .map(|image| image.to_data_url())
                    .map_err(|error| error.to_string())
            }
        },
    };

    match result {
        Ok(data_url) => {
            log_simulation(
                state,
                LogStatus::Success,
                json!({ "paver": spec.paver_style }),
            )
            .await;
            (
                WizardEvent::SimulationSucceeded { generation, image: ImageRef(data_url) },
                None,
            )
        }
        Err(reason) => {
            log_simulation(
                state,
                LogStatus::Error,
                json!({ "paver": spec.paver_style, "error": reason }),
            )
            .await;
            (
                WizardEvent::SimulationFailed { generation, reason: reason.clone() },
                Some(reason),
            )
        }
    }
}
