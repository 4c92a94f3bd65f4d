use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::EventType;
use crate::domain::lead::NewLead;
use crate::domain::pricing::ZoneId;
use crate::domain::product::{ImageRef, Product, Variant};

/// Ordered steps of the quote wizard. One step is live at a time; steps
/// the machine has advanced past render as completed summaries.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    Welcome,
    Photos,
    Measurements,
    LeadCapture,
    PhotoProduct,
    PhotoSimulation,
    MaterialQuote,
    LaborQuote,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Photos => "photos",
            Self::Measurements => "measurements",
            Self::LeadCapture => "lead-capture",
            Self::PhotoProduct => "photo-product",
            Self::PhotoSimulation => "photo-simulation",
            Self::MaterialQuote => "material-quote",
            Self::LaborQuote => "labor-quote",
        }
    }
}

/// Per-photo record accumulated while the user works through the
/// product-select / simulate / approve loop. Session-local, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub photo: ImageRef,
    pub product: Option<Product>,
    pub variant: Option<Variant>,
    pub generated_image: Option<ImageRef>,
    pub done: bool,
}

impl PhotoEntry {
    pub fn pending(photo: ImageRef) -> Self {
        Self { photo, product: None, variant: None, generated_image: None, done: false }
    }
}

/// Contact details collected by the lead-capture step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeadContact {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Everything the visualization collaborator needs for one render. Tagged
/// with the generation token so a stale response can be recognized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSpec {
    pub generation: u64,
    pub photo: ImageRef,
    pub paver_style: String,
    pub paver_texture_url: String,
    pub custom_prompt: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WizardEvent {
    Started,
    PhotosSubmitted { photos: Vec<ImageRef> },
    MeasurementsSubmitted { width: Decimal, length: Decimal },
    LeadSubmitted { contact: LeadContact },
    LeadSkipped,
    ProductSelected { product: Product },
    VariantSelected { variant: Variant },
    GenerateRequested,
    SimulationSucceeded { generation: u64, image: ImageRef },
    SimulationFailed { generation: u64, reason: String },
    TryAnotherRequested,
    PhotoApproved,
    ZoneChosen { zone_id: ZoneId },
    LaborRequested,
    Restarted,
}

impl WizardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::PhotosSubmitted { .. } => "photos_submitted",
            Self::MeasurementsSubmitted { .. } => "measurements_submitted",
            Self::LeadSubmitted { .. } => "lead_submitted",
            Self::LeadSkipped => "lead_skipped",
            Self::ProductSelected { .. } => "product_selected",
            Self::VariantSelected { .. } => "variant_selected",
            Self::GenerateRequested => "generate_requested",
            Self::SimulationSucceeded { .. } => "simulation_succeeded",
            Self::SimulationFailed { .. } => "simulation_failed",
            Self::TryAnotherRequested => "try_another_requested",
            Self::PhotoApproved => "photo_approved",
            Self::ZoneChosen { .. } => "zone_chosen",
            Self::LaborRequested => "labor_requested",
            Self::Restarted => "restarted",
        }
    }
}

/// Side effects a transition asks its driver to perform. Analytics
/// tracking is best-effort; the other actions are the wizard's only
/// integration points.
#[derive(Clone, Debug, PartialEq)]
pub enum WizardAction {
    Track { event_type: EventType, data: serde_json::Value, step: Option<WizardStep> },
    PersistLead(NewLead),
    RequestVisualization(SimulationSpec),
}

impl WizardAction {
    pub(crate) fn step_completed(step: WizardStep) -> Self {
        Self::Track {
            event_type: EventType::StepCompleted,
            data: serde_json::json!({ "step": step.as_str() }),
            step: Some(step),
        }
    }

    pub(crate) fn step_entered(step: WizardStep) -> Self {
        Self::Track {
            event_type: EventType::StepEntered,
            data: serde_json::json!({ "step": step.as_str() }),
            step: Some(step),
        }
    }

    pub(crate) fn track(event_type: EventType, data: serde_json::Value) -> Self {
        Self::Track { event_type, data, step: None }
    }
}

#[cfg(test)]
mod tests {
    use super::WizardStep;

    #[test]
    fn step_identifiers_use_kebab_case() {
        assert_eq!(WizardStep::LeadCapture.as_str(), "lead-capture");
        assert_eq!(
            serde_json::to_string(&WizardStep::PhotoSimulation).expect("serialize"),
            "\"photo-simulation\""
        );
    }
}
