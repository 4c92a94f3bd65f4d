use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use axum::Router;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use paverly_core::wizard::WizardState;
use paverly_db::repositories::{
    SqlActivityLogRepository, SqlAnalyticsRepository, SqlDeliveryZoneRepository,
    SqlLeadRepository, SqlPricingConfigRepository, SqlProductRepository,
};
use paverly_db::DbPool;
use paverly_vision::VisionClient;

use crate::error::ApiError;
use crate::sink::DbEventSink;

pub mod analytics;
pub mod leads;
pub mod pricing;
pub mod products;
pub mod simulate;
pub mod wizard;
pub mod zones;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Live wizard sessions, keyed by session id. Event application is
/// serialized per process under this lock; collaborator calls happen
/// outside it.
pub type WizardSessions = Arc<Mutex<HashMap<Uuid, WizardState>>>;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub vision: Option<Arc<dyn VisionClient>>,
    pub admin_password: Option<SecretString>,
    pub sessions: WizardSessions,
}

impl AppState {
    pub fn new(
        db_pool: DbPool,
        vision: Option<Arc<dyn VisionClient>>,
        admin_password: Option<SecretString>,
    ) -> Self {
        Self { db_pool, vision, admin_password, sessions: WizardSessions::default() }
    }

    pub fn sink(&self) -> DbEventSink {
        DbEventSink::new(self.db_pool.clone())
    }

    pub fn products(&self) -> SqlProductRepository {
        SqlProductRepository::new(self.db_pool.clone())
    }

    pub fn pricing(&self) -> SqlPricingConfigRepository {
        SqlPricingConfigRepository::new(self.db_pool.clone())
    }

    pub fn zones(&self) -> SqlDeliveryZoneRepository {
        SqlDeliveryZoneRepository::new(self.db_pool.clone())
    }

    pub fn leads(&self) -> SqlLeadRepository {
        SqlLeadRepository::new(self.db_pool.clone())
    }

    pub fn analytics(&self) -> SqlAnalyticsRepository {
        SqlAnalyticsRepository::new(self.db_pool.clone())
    }

    pub fn activity(&self) -> SqlActivityLogRepository {
        SqlActivityLogRepository::new(self.db_pool.clone())
    }
}

/// The admin surface is gated by one shared password; with no password
/// configured the surface stays closed.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(password) = &state.admin_password else {
        return Err(ApiError::unauthorized());
    };
    let provided = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if provided == password.expose_secret() {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/products", get(products::list).post(products::save))
        .route("/api/products/{id}", delete(products::remove))
        .route("/api/pricing", get(pricing::get_config).post(pricing::save_config))
        .route("/api/delivery-zones", get(zones::list).post(zones::save))
        .route("/api/delivery-zones/{id}", delete(zones::remove))
        .route("/api/leads", get(leads::list).post(leads::create))
        .route("/api/leads/{id}/status", put(leads::update_status))
        .route("/api/analytics", get(analytics::overview).post(analytics::ingest))
        .route("/api/logs", get(analytics::logs))
        .route("/api/simulate", post(simulate::simulate))
        .route("/api/wizard", post(wizard::create_session))
        .route("/api/wizard/{id}", get(wizard::get_session).delete(wizard::drop_session))
        .route("/api/wizard/{id}/events", post(wizard::apply_event))
        .with_state(state)
}
