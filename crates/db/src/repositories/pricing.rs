use sqlx::Row;

use paverly_core::domain::pricing::PricingConfig;

use super::{read_decimal, PricingConfigRepository, RepositoryError};
use crate::DbPool;

/// The pricing configuration is a single row with a fixed id; loading an
/// empty table yields the shipped defaults.
pub struct SqlPricingConfigRepository {
    pool: DbPool,
}

impl SqlPricingConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PricingConfigRepository for SqlPricingConfigRepository {
    async fn load(&self) -> Result<PricingConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT labor_rate_per_sqft, waste_percentage, owner_phone, owner_whatsapp,
                    require_lead_capture
             FROM pricing_config
             WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(PricingConfig::default());
        };

        Ok(PricingConfig {
            labor_rate_per_sqft: read_decimal(
                &row.try_get::<String, _>("labor_rate_per_sqft")?,
                "pricing_config.labor_rate_per_sqft",
            )?,
            waste_percentage: read_decimal(
                &row.try_get::<String, _>("waste_percentage")?,
                "pricing_config.waste_percentage",
            )?,
            owner_phone: row.try_get::<String, _>("owner_phone")?,
            owner_whatsapp: row.try_get::<String, _>("owner_whatsapp")?,
            require_lead_capture: row.try_get::<bool, _>("require_lead_capture")?,
        })
    }

    async fn save(&self, config: PricingConfig) -> Result<PricingConfig, RepositoryError> {
        sqlx::query(
            "INSERT INTO pricing_config
                 (id, labor_rate_per_sqft, waste_percentage, owner_phone, owner_whatsapp,
                  require_lead_capture)
             VALUES (1, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 labor_rate_per_sqft = excluded.labor_rate_per_sqft,
                 waste_percentage = excluded.waste_percentage,
                 owner_phone = excluded.owner_phone,
                 owner_whatsapp = excluded.owner_whatsapp,
                 require_lead_capture = excluded.require_lead_capture",
        )
        .bind(config.labor_rate_per_sqft.to_string())
        .bind(config.waste_percentage.to_string())
        .bind(&config.owner_phone)
        .bind(&config.owner_whatsapp)
        .bind(config.require_lead_capture)
        .execute(&self.pool)
        .await?;

        Ok(config)
    }
}
