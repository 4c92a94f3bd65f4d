use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::Row;
use uuid::Uuid;

use paverly_core::analytics::AnalyticsEvent;
use paverly_core::domain::lead::Lead;

use super::lead::SqlLeadRepository;
use super::{AnalyticsRepository, RepositoryError};
use crate::DbPool;

const RECENT_LEADS_LIMIT: i64 = 5;
const POPULAR_PRODUCTS_LIMIT: i64 = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationStats {
    pub success: i64,
    pub failed: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductCount {
    pub name: String,
    pub count: i64,
}

/// Dashboard rollup over a trailing window: session totals, the per-step
/// funnel, simulation outcomes, CTA clicks, product popularity, and the
/// freshest leads.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_sessions: i64,
    pub total_leads: i64,
    pub funnel: BTreeMap<String, i64>,
    pub simulation_stats: SimulationStats,
    pub cta_clicks: BTreeMap<String, i64>,
    pub popular_products: Vec<ProductCount>,
    pub recent_leads: Vec<Lead>,
}

pub struct SqlAnalyticsRepository {
    pool: DbPool,
}

impl SqlAnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AnalyticsRepository for SqlAnalyticsRepository {
    async fn insert(&self, event: AnalyticsEvent) -> Result<(), RepositoryError> {
        let event_data = serde_json::to_string(&event.event_data)
            .map_err(|error| RepositoryError::decode("analytics_events.event_data", error))?;

        sqlx::query(
            "INSERT INTO analytics_events (id, session_id, event_type, event_data, step, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&event.session_id)
        .bind(&event.event_type)
        .bind(event_data)
        .bind(&event.step)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn overview(&self, days_back: i64) -> Result<AnalyticsOverview, RepositoryError> {
        let cutoff = Utc::now() - Duration::days(days_back.max(0));

        let total_sessions = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT session_id) FROM analytics_events WHERE created_at >= ?",
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        let total_leads =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads WHERE created_at >= ?")
                .bind(cutoff)
                .fetch_one(&self.pool)
                .await?;

        let mut funnel = BTreeMap::new();
        let funnel_rows = sqlx::query(
            "SELECT step, COUNT(*) AS count
             FROM analytics_events
             WHERE event_type = 'step_entered' AND step IS NOT NULL AND created_at >= ?
             GROUP BY step",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        for row in &funnel_rows {
            funnel.insert(row.try_get::<String, _>("step")?, row.try_get::<i64, _>("count")?);
        }

        let simulation_count = |event_type: &'static str| {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM analytics_events WHERE event_type = ? AND created_at >= ?",
            )
            .bind(event_type)
            .bind(cutoff)
            .fetch_one(&self.pool)
        };
        let simulation_stats = SimulationStats {
            success: simulation_count("simulation_generated").await?,
            failed: simulation_count("simulation_failed").await?,
        };

        let mut cta_clicks = BTreeMap::new();
        let cta_rows = sqlx::query(
            "SELECT IFNULL(json_extract(event_data, '$.type'), 'unknown') AS cta,
                    COUNT(*) AS count
             FROM analytics_events
             WHERE event_type = 'cta_clicked' AND created_at >= ?
             GROUP BY cta",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;
        for row in &cta_rows {
            cta_clicks.insert(row.try_get::<String, _>("cta")?, row.try_get::<i64, _>("count")?);
        }

        let popular_rows = sqlx::query(
            "SELECT IFNULL(json_extract(event_data, '$.product'), 'Unknown') AS name,
                    COUNT(*) AS count
             FROM analytics_events
             WHERE event_type = 'product_selected' AND created_at >= ?
             GROUP BY name
             ORDER BY count DESC, name ASC
             LIMIT ?",
        )
        .bind(cutoff)
        .bind(POPULAR_PRODUCTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        let popular_products = popular_rows
            .iter()
            .map(|row| {
                Ok(ProductCount {
                    name: row.try_get::<String, _>("name")?,
                    count: row.try_get::<i64, _>("count")?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let recent_rows = sqlx::query(
            "SELECT id, name, email, phone, session_id, source, status, created_at
             FROM leads
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(RECENT_LEADS_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        let recent_leads = recent_rows
            .iter()
            .map(SqlLeadRepository::decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AnalyticsOverview {
            total_sessions,
            total_leads,
            funnel,
            simulation_stats,
            cta_clicks,
            popular_products,
            recent_leads,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use paverly_core::analytics::{AnalyticsEvent, EventType};
    use paverly_core::domain::lead::NewLead;

    use crate::repositories::{AnalyticsRepository, LeadRepository, SqlLeadRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    use super::SqlAnalyticsRepository;

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    fn step_entered(session: &str, step: &str) -> AnalyticsEvent {
        AnalyticsEvent::new(
            session,
            EventType::StepEntered,
            json!({ "step": step }),
            Some(step.to_string()),
        )
    }

    #[tokio::test]
    async fn overview_aggregates_sessions_funnel_and_outcomes() {
        let pool = pool().await;
        let repository = SqlAnalyticsRepository::new(pool.clone());

        for event in [
            step_entered("s-1", "photos"),
            step_entered("s-1", "measurements"),
            step_entered("s-2", "photos"),
            AnalyticsEvent::new(
                "s-1",
                EventType::SimulationGenerated,
                json!({ "product": "Union" }),
                None,
            ),
            AnalyticsEvent::new(
                "s-2",
                EventType::SimulationFailed,
                json!({ "error": "timeout" }),
                None,
            ),
            AnalyticsEvent::new(
                "s-1",
                EventType::ProductSelected,
                json!({ "product": "Union" }),
                None,
            ),
            AnalyticsEvent::new(
                "s-2",
                EventType::ProductSelected,
                json!({ "product": "Union" }),
                None,
            ),
            AnalyticsEvent::new(
                "s-2",
                EventType::CtaClicked,
                json!({ "type": "whatsapp" }),
                None,
            ),
        ] {
            repository.insert(event).await.expect("insert event");
        }

        let leads = SqlLeadRepository::new(pool);
        leads
            .insert(NewLead {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                phone: None,
                session_id: Some("s-1".to_string()),
                source: "quote".to_string(),
            })
            .await
            .expect("insert lead");

        let overview = repository.overview(30).await.expect("overview");
        assert_eq!(overview.total_sessions, 2);
        assert_eq!(overview.total_leads, 1);
        assert_eq!(overview.funnel.get("photos"), Some(&2));
        assert_eq!(overview.funnel.get("measurements"), Some(&1));
        assert_eq!(overview.simulation_stats.success, 1);
        assert_eq!(overview.simulation_stats.failed, 1);
        assert_eq!(overview.cta_clicks.get("whatsapp"), Some(&1));
        assert_eq!(overview.popular_products.len(), 1);
        assert_eq!(overview.popular_products[0].name, "Union");
        assert_eq!(overview.popular_products[0].count, 2);
        assert_eq!(overview.recent_leads.len(), 1);
    }

    #[tokio::test]
    async fn overview_is_empty_on_a_fresh_store() {
        let pool = pool().await;
        let repository = SqlAnalyticsRepository::new(pool);

        let overview = repository.overview(30).await.expect("overview");
        assert_eq!(overview.total_sessions, 0);
        assert!(overview.funnel.is_empty());
        assert!(overview.recent_leads.is_empty());
    }
}
