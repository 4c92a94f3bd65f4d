pub mod analytics;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod wizard;

pub use analytics::{AnalyticsEvent, EventSink, EventType, InMemoryEventSink, NoopEventSink};
pub use domain::lead::{Lead, LeadId, LeadStatus, NewLead};
pub use domain::pricing::{DeliveryZone, PricingConfig, ZoneId};
pub use domain::product::{ImageRef, ManufacturerId, Product, ProductId, Variant, VariantId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{
    calculate_full_quote, calculate_labor_quote, calculate_material_quote, format_currency,
    FullQuote, LaborQuote, MaterialQuote,
};
pub use wizard::{
    LeadContact, PhotoEntry, SimulationSpec, WizardAction, WizardEngine, WizardEvent, WizardState,
    WizardStep, WizardTransition, WizardTransitionError,
};
