use sqlx::Row;

use paverly_core::domain::pricing::{DeliveryZone, ZoneId};

use super::{read_decimal, DeliveryZoneRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDeliveryZoneRepository {
    pool: DbPool,
}

impl SqlDeliveryZoneRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<DeliveryZone, RepositoryError> {
        Ok(DeliveryZone {
            id: ZoneId(row.try_get::<String, _>("id")?),
            name: row.try_get::<String, _>("name")?,
            label: row.try_get::<String, _>("label")?,
            fee: read_decimal(&row.try_get::<String, _>("fee")?, "delivery_zones.fee")?,
            radius_description: row.try_get::<Option<String>, _>("radius_description")?,
            sort_order: row.try_get::<i32, _>("sort_order")?,
            active: row.try_get::<bool, _>("active")?,
        })
    }
}

#[async_trait::async_trait]
impl DeliveryZoneRepository for SqlDeliveryZoneRepository {
    async fn list(&self, active_only: bool) -> Result<Vec<DeliveryZone>, RepositoryError> {
        let query = if active_only {
            "SELECT id, name, label, fee, radius_description, sort_order, active
             FROM delivery_zones
             WHERE active = 1
             ORDER BY sort_order ASC"
        } else {
            "SELECT id, name, label, fee, radius_description, sort_order, active
             FROM delivery_zones
             ORDER BY sort_order ASC"
        };

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter().map(Self::decode_row).collect()
    }

    async fn upsert(&self, zone: DeliveryZone) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO delivery_zones
                 (id, name, label, fee, radius_description, sort_order, active)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (id) DO UPDATE SET
                 name = excluded.name,
                 label = excluded.label,
                 fee = excluded.fee,
                 radius_description = excluded.radius_description,
                 sort_order = excluded.sort_order,
                 active = excluded.active",
        )
        .bind(&zone.id.0)
        .bind(&zone.name)
        .bind(&zone.label)
        .bind(zone.fee.to_string())
        .bind(&zone.radius_description)
        .bind(zone.sort_order)
        .bind(zone.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &ZoneId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM delivery_zones WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
