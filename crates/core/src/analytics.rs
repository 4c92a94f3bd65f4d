use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of funnel event types emitted by the quote wizard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStarted,
    PageView,
    StepEntered,
    StepCompleted,
    PhotoUploaded,
    ProductSelected,
    SimulationGenerated,
    SimulationFailed,
    QuoteViewed,
    CtaClicked,
    LeadCaptured,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStarted => "session_started",
            Self::PageView => "page_view",
            Self::StepEntered => "step_entered",
            Self::StepCompleted => "step_completed",
            Self::PhotoUploaded => "photo_uploaded",
            Self::ProductSelected => "product_selected",
            Self::SimulationGenerated => "simulation_generated",
            Self::SimulationFailed => "simulation_failed",
            Self::QuoteViewed => "quote_viewed",
            Self::CtaClicked => "cta_clicked",
            Self::LeadCaptured => "lead_captured",
        }
    }
}

/// One funnel event, keyed by an opaque per-session token. Append-only;
/// ingest accepts arbitrary `event_type` strings so older clients never
/// break the sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub session_id: String,
    pub event_type: String,
    #[serde(default)]
    pub event_data: serde_json::Value,
    #[serde(default)]
    pub step: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(
        session_id: impl Into<String>,
        event_type: EventType,
        event_data: serde_json::Value,
        step: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            event_type: event_type.as_str().to_string(),
            event_data,
            step,
            occurred_at: Utc::now(),
        }
    }
}

/// Best-effort event sink. Implementations must swallow their own
/// failures: analytics never interrupts or delays the wizard.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: AnalyticsEvent) {}
}

#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl InMemoryEventSink {
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: AnalyticsEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AnalyticsEvent, EventSink, EventType, InMemoryEventSink};

    #[test]
    fn in_memory_sink_records_events_in_order() {
        let sink = InMemoryEventSink::default();
        sink.emit(AnalyticsEvent::new("s-1", EventType::SessionStarted, json!({}), None));
        sink.emit(AnalyticsEvent::new(
            "s-1",
            EventType::StepEntered,
            json!({"step": "photos"}),
            Some("photos".to_string()),
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "session_started");
        assert_eq!(events[1].step.as_deref(), Some("photos"));
    }

    #[test]
    fn event_type_serializes_as_snake_case() {
        let text = serde_json::to_string(&EventType::SimulationGenerated).expect("serialize");
        assert_eq!(text, "\"simulation_generated\"");
        assert_eq!(EventType::SimulationGenerated.as_str(), "simulation_generated");
    }
}
