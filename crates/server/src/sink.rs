use tracing::warn;

use paverly_core::analytics::{AnalyticsEvent, EventSink};
use paverly_db::repositories::{AnalyticsRepository, SqlAnalyticsRepository};
use paverly_db::DbPool;

/// Persists funnel events off the request path. Inserts run on a spawned
/// task and failures are logged and dropped: analytics must never slow
/// down or fail the wizard.
#[derive(Clone)]
pub struct DbEventSink {
    pool: DbPool,
}

impl DbEventSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EventSink for DbEventSink {
    fn emit(&self, event: AnalyticsEvent) {
        let repository = SqlAnalyticsRepository::new(self.pool.clone());
        tokio::spawn(async move {
            if let Err(error) = repository.insert(event).await {
                warn!(error = %error, "dropping analytics event after insert failure");
            }
        });
    }
}
