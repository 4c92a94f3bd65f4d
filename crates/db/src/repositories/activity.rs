use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::{ActivityLogRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Operator-facing audit trail of collaborator calls (visualization runs,
/// admin saves). Read from the admin panel, capped at the newest entries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityLog {
    pub id: String,
    pub action: String,
    pub status: LogStatus,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewActivityLog {
    pub action: String,
    pub status: LogStatus,
    pub details: serde_json::Value,
}

pub struct SqlActivityLogRepository {
    pool: DbPool,
}

impl SqlActivityLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ActivityLogRepository for SqlActivityLogRepository {
    async fn append(&self, entry: NewActivityLog) -> Result<(), RepositoryError> {
        let details = serde_json::to_string(&entry.details)
            .map_err(|error| RepositoryError::decode("activity_logs.details", error))?;

        sqlx::query(
            "INSERT INTO activity_logs (id, action, status, details, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.action)
        .bind(entry.status.as_str())
        .bind(details)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, action, status, details, created_at
             FROM activity_logs
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status_raw = row.try_get::<String, _>("status")?;
                let status = match status_raw.as_str() {
                    "success" => LogStatus::Success,
                    "error" => LogStatus::Error,
                    other => {
                        return Err(RepositoryError::decode(
                            "activity_logs.status",
                            format!("unknown value `{other}`"),
                        ))
                    }
                };
                let details_raw = row.try_get::<Option<String>, _>("details")?;
                let details = details_raw
                    .map(|raw| serde_json::from_str(&raw))
                    .transpose()
                    .map_err(|error| RepositoryError::decode("activity_logs.details", error))?
                    .unwrap_or(serde_json::Value::Null);

                Ok(ActivityLog {
                    id: row.try_get::<String, _>("id")?,
                    action: row.try_get::<String, _>("action")?,
                    status,
                    details,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                })
            })
            .collect()
    }
}
