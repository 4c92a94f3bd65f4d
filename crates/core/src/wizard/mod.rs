pub mod engine;
pub mod states;

pub use engine::{WizardEngine, WizardState, WizardTransition, WizardTransitionError};
pub use states::{
    LeadContact, PhotoEntry, SimulationSpec, WizardAction, WizardEvent, WizardStep,
};
