use async_trait::async_trait;
use thiserror::Error;

use paverly_core::analytics::AnalyticsEvent;
use paverly_core::domain::lead::{Lead, LeadId, LeadStatus, NewLead};
use paverly_core::domain::pricing::{DeliveryZone, PricingConfig, ZoneId};
use paverly_core::domain::product::{Product, ProductId};

pub mod activity;
pub mod analytics;
pub mod lead;
pub mod memory;
pub mod pricing;
pub mod product;
pub mod zone;

pub use activity::{ActivityLog, LogStatus, NewActivityLog, SqlActivityLogRepository};
pub use analytics::{AnalyticsOverview, ProductCount, SimulationStats, SqlAnalyticsRepository};
pub use lead::SqlLeadRepository;
pub use memory::{
    InMemoryDeliveryZoneRepository, InMemoryLeadRepository, InMemoryPricingConfigRepository,
    InMemoryProductRepository,
};
pub use pricing::SqlPricingConfigRepository;
pub use product::SqlProductRepository;
pub use zone::SqlDeliveryZoneRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    pub(crate) fn decode(context: &str, error: impl std::fmt::Display) -> Self {
        Self::Decode(format!("{context}: {error}"))
    }
}

/// Decimal columns are stored as text; parse failures are decode errors
/// naming the offending column.
pub(crate) fn read_decimal(
    raw: &str,
    context: &str,
) -> Result<rust_decimal::Decimal, RepositoryError> {
    raw.parse::<rust_decimal::Decimal>()
        .map_err(|error| RepositoryError::decode(context, error))
}

pub(crate) fn read_optional_decimal(
    raw: Option<String>,
    context: &str,
) -> Result<Option<rust_decimal::Decimal>, RepositoryError> {
    raw.map(|value| read_decimal(&value, context)).transpose()
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn upsert(&self, product: Product) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PricingConfigRepository: Send + Sync {
    /// Falls back to `PricingConfig::default()` when no row has been saved.
    async fn load(&self) -> Result<PricingConfig, RepositoryError>;
    async fn save(&self, config: PricingConfig) -> Result<PricingConfig, RepositoryError>;
}

#[async_trait]
pub trait DeliveryZoneRepository: Send + Sync {
    /// Zones ordered by `sort_order`; `active_only` hides retired zones.
    async fn list(&self, active_only: bool) -> Result<Vec<DeliveryZone>, RepositoryError>;
    async fn upsert(&self, zone: DeliveryZone) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &ZoneId) -> Result<(), RepositoryError>;
}

#[derive(Clone, Debug, Default)]
pub struct LeadFilter {
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
    pub limit: Option<i64>,
}

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn insert(&self, lead: NewLead) -> Result<Lead, RepositoryError>;
    async fn list(&self, filter: LeadFilter) -> Result<Vec<Lead>, RepositoryError>;
    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn insert(&self, event: AnalyticsEvent) -> Result<(), RepositoryError>;
    async fn overview(&self, days_back: i64) -> Result<AnalyticsOverview, RepositoryError>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: NewActivityLog) -> Result<(), RepositoryError>;
    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>, RepositoryError>;
}
