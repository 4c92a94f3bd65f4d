use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use paverly_core::domain::lead::{Lead, LeadId, LeadStatus, NewLead};

use super::{LeadFilter, LeadRepository, RepositoryError};
use crate::DbPool;

const DEFAULT_LIST_LIMIT: i64 = 100;

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
        let status = row
            .try_get::<String, _>("status")?
            .parse::<LeadStatus>()
            .map_err(|error| RepositoryError::decode("leads.status", error))?;

        Ok(Lead {
            id: LeadId(row.try_get::<String, _>("id")?),
            name: row.try_get::<String, _>("name")?,
            email: row.try_get::<String, _>("email")?,
            phone: row.try_get::<Option<String>, _>("phone")?,
            session_id: row.try_get::<Option<String>, _>("session_id")?,
            source: row.try_get::<String, _>("source")?,
            status,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn insert(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        let created = Lead {
            id: LeadId(Uuid::new_v4().to_string()),
            name: lead.name,
            email: lead.email,
            phone: lead.phone,
            session_id: lead.session_id,
            source: lead.source,
            status: LeadStatus::New,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO leads (id, name, email, phone, session_id, source, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&created.id.0)
        .bind(&created.name)
        .bind(&created.email)
        .bind(&created.phone)
        .bind(&created.session_id)
        .bind(&created.source)
        .bind(created.status.as_str())
        .bind(created.created_at)
        .execute(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list(&self, filter: LeadFilter) -> Result<Vec<Lead>, RepositoryError> {
        let mut builder = QueryBuilder::new(
            "SELECT id, name, email, phone, session_id, source, status, created_at FROM leads",
        );

        let mut first = true;
        if let Some(source) = &filter.source {
            builder.push(" WHERE source = ").push_bind(source.clone());
            first = false;
        }
        if let Some(status) = filter.status {
            builder.push(if first { " WHERE " } else { " AND " });
            builder.push("status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::decode_row).collect()
    }

    async fn update_status(
        &self,
        id: &LeadId,
        status: LeadStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE leads SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use paverly_core::domain::lead::{LeadStatus, NewLead};

    use crate::repositories::{LeadFilter, LeadRepository};
    use crate::{connect_with_settings, migrations};

    use super::SqlLeadRepository;

    fn new_lead(name: &str, source: &str) -> NewLead {
        NewLead {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            phone: None,
            session_id: Some("session-1".to_string()),
            source: source.to_string(),
        }
    }

    async fn repository() -> SqlLeadRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlLeadRepository::new(pool)
    }

    #[tokio::test]
    async fn inserted_leads_start_as_new() {
        let repository = repository().await;
        let lead = repository.insert(new_lead("ana", "quote")).await.expect("insert");
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.session_id.as_deref(), Some("session-1"));
    }

    #[tokio::test]
    async fn list_filters_by_source_and_status() {
        let repository = repository().await;
        repository.insert(new_lead("ana", "quote")).await.expect("insert");
        let embed = repository.insert(new_lead("bea", "embed")).await.expect("insert");
        repository
            .update_status(&embed.id, LeadStatus::Contacted)
            .await
            .expect("update status");

        let quote_only = repository
            .list(LeadFilter { source: Some("quote".to_string()), ..LeadFilter::default() })
            .await
            .expect("list by source");
        assert_eq!(quote_only.len(), 1);
        assert_eq!(quote_only[0].name, "ana");

        let contacted = repository
            .list(LeadFilter { status: Some(LeadStatus::Contacted), ..LeadFilter::default() })
            .await
            .expect("list by status");
        assert_eq!(contacted.len(), 1);
        assert_eq!(contacted[0].name, "bea");

        let limited = repository
            .list(LeadFilter { limit: Some(1), ..LeadFilter::default() })
            .await
            .expect("list limited");
        assert_eq!(limited.len(), 1);
    }
}
