use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::{AnalyticsEvent, EventSink, EventType};
use crate::domain::lead::NewLead;
use crate::domain::pricing::{DeliveryZone, PricingConfig, ZoneId};
use crate::domain::product::{ImageRef, Product, Variant};
use crate::pricing::{calculate_labor_quote, calculate_material_quote, LaborQuote, MaterialQuote};
use crate::wizard::states::{
    LeadContact, PhotoEntry, SimulationSpec, WizardAction, WizardEvent, WizardStep,
};

/// Full wizard session state. Immutable per transition: `WizardEngine::apply`
/// returns a new record instead of mutating shared fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub step: WizardStep,
    pub completed: BTreeSet<WizardStep>,
    /// Pricing and zone snapshots taken at session start; admin edits made
    /// mid-session are not reflected until restart.
    pub pricing: PricingConfig,
    pub zones: Vec<DeliveryZone>,
    pub photos: Vec<ImageRef>,
    pub width: Decimal,
    pub length: Decimal,
    pub lead: Option<LeadContact>,
    pub entries: Vec<PhotoEntry>,
    pub photo_index: usize,
    pub selected_product: Option<Product>,
    pub selected_variant: Option<Variant>,
    pub generated_image: Option<ImageRef>,
    /// Monotonically increasing visualization token; responses carrying a
    /// different value are stale and must be discarded.
    pub generation: u64,
    pub selected_zone: Option<DeliveryZone>,
    pub material_quote: Option<MaterialQuote>,
    pub labor_quote: Option<LaborQuote>,
}

impl WizardState {
    pub fn new(pricing: PricingConfig, zones: Vec<DeliveryZone>) -> Self {
        let selected_zone = zones.first().cloned();
        Self {
            step: WizardStep::Welcome,
            completed: BTreeSet::new(),
            pricing,
            zones,
            photos: Vec::new(),
            width: Decimal::ZERO,
            length: Decimal::ZERO,
            lead: None,
            entries: Vec::new(),
            photo_index: 0,
            selected_product: None,
            selected_variant: None,
            generated_image: None,
            generation: 0,
            selected_zone,
            material_quote: None,
            labor_quote: None,
        }
    }

    pub fn total_sqft(&self) -> Decimal {
        self.width * self.length
    }

    pub fn current_entry(&self) -> Option<&PhotoEntry> {
        self.entries.get(self.photo_index)
    }

    /// Most recently completed photo entry; the material quote follows
    /// this entry's product/variant when the delivery zone changes.
    pub fn last_done_entry(&self) -> Option<&PhotoEntry> {
        self.entries.iter().rev().find(|entry| entry.done)
    }

    fn reset_selection(&mut self) {
        self.selected_product = None;
        self.selected_variant = None;
        self.generated_image = None;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WizardTransition {
    pub state: WizardState,
    pub actions: Vec<WizardAction>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum WizardTransitionError {
    #[error("event `{event}` is not valid in step `{}`", step.as_str())]
    InvalidTransition { step: WizardStep, event: &'static str },
    #[error("at least one photo is required before continuing")]
    PhotosRequired,
    #[error("both dimensions must be positive (got width {width}, length {length})")]
    MeasurementsRequired { width: Decimal, length: Decimal },
    #[error("a product and color must be selected for the current photo")]
    SelectionRequired,
    #[error("a generated visualization is required before approving this photo")]
    RenderRequired,
    #[error("no photo is awaiting product selection")]
    NoActivePhoto,
    #[error("unknown delivery zone `{}`", id.0)]
    UnknownZone { id: ZoneId },
}

/// Pure reducer over wizard state. Drivers execute the returned actions
/// (analytics emission, lead persistence, visualization calls) and feed
/// collaborator results back in as events.
#[derive(Clone, Copy, Debug, Default)]
pub struct WizardEngine;

impl WizardEngine {
    pub fn initial_state(
        &self,
        pricing: PricingConfig,
        zones: Vec<DeliveryZone>,
    ) -> WizardState {
        WizardState::new(pricing, zones)
    }

    pub fn apply(
        &self,
        state: &WizardState,
        event: &WizardEvent,
    ) -> Result<WizardTransition, WizardTransitionError> {
        transition(state, event)
    }

    /// Apply an event and emit its tracking actions into `sink`, tagged
    /// with `session_id`. Non-tracking actions stay on the transition for
    /// the caller. Rejected events emit nothing.
    pub fn apply_with_sink<S>(
        &self,
        state: &WizardState,
        event: &WizardEvent,
        sink: &S,
        session_id: &str,
    ) -> Result<WizardTransition, WizardTransitionError>
    where
        S: EventSink,
    {
        let transition = self.apply(state, event)?;
        let mut remaining = Vec::with_capacity(transition.actions.len());
        for action in transition.actions {
            match action {
                WizardAction::Track { event_type, data, step } => sink.emit(AnalyticsEvent::new(
                    session_id,
                    event_type,
                    data,
                    step.map(|step| step.as_str().to_string()),
                )),
                other => remaining.push(other),
            }
        }
        Ok(WizardTransition { state: transition.state, actions: remaining })
    }
}

fn transition(
    state: &WizardState,
    event: &WizardEvent,
) -> Result<WizardTransition, WizardTransitionError> {
    use WizardStep::{
        LaborQuote, LeadCapture, MaterialQuote, Measurements, PhotoProduct, PhotoSimulation,
        Photos, Welcome,
    };

    let mut next = state.clone();
    let mut actions = Vec::new();

    // Visualization responses are matched on the generation token first:
    // a response for any other generation (superseded request, restart
    // mid-flight) is discarded without touching state.
    match event {
        WizardEvent::SimulationSucceeded { generation, .. }
        | WizardEvent::SimulationFailed { generation, .. }
            if *generation != state.generation || state.step != PhotoSimulation =>
        {
            return Ok(WizardTransition { state: next, actions });
        }
        WizardEvent::Restarted => {
            let mut fresh = WizardState::new(state.pricing.clone(), state.zones.clone());
            fresh.generation = state.generation + 1;
            return Ok(WizardTransition { state: fresh, actions });
        }
        _ => {}
    }

    match (state.step, event) {
        (Welcome, WizardEvent::Started) => {
            advance(&mut next, &mut actions, Photos);
        }

        (Photos, WizardEvent::PhotosSubmitted { photos }) => {
            if photos.is_empty() {
                return Err(WizardTransitionError::PhotosRequired);
            }
            next.photos = photos.clone();
            advance(&mut next, &mut actions, Measurements);
        }

        (Measurements, WizardEvent::MeasurementsSubmitted { width, length }) => {
            if *width <= Decimal::ZERO || *length <= Decimal::ZERO {
                return Err(WizardTransitionError::MeasurementsRequired {
                    width: *width,
                    length: *length,
                });
            }
            next.width = *width;
            next.length = *length;
            next.entries =
                next.photos.iter().cloned().map(PhotoEntry::pending).collect();
            next.photo_index = 0;
            next.reset_selection();
            actions.push(WizardAction::track(
                EventType::PhotoUploaded,
                serde_json::json!({ "count": next.entries.len() }),
            ));
            if next.pricing.require_lead_capture {
                advance(&mut next, &mut actions, LeadCapture);
            } else {
                advance(&mut next, &mut actions, PhotoProduct);
            }
        }

        (LeadCapture, WizardEvent::LeadSubmitted { contact }) => {
            next.lead = Some(contact.clone());
            actions.push(WizardAction::track(
                EventType::LeadCaptured,
                serde_json::json!({ "source": "quote" }),
            ));
            actions.push(WizardAction::PersistLead(NewLead {
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
                session_id: None,
                source: "quote".to_string(),
            }));
            advance(&mut next, &mut actions, PhotoProduct);
        }

        (LeadCapture, WizardEvent::LeadSkipped) => {
            advance(&mut next, &mut actions, PhotoProduct);
        }

        (PhotoProduct, WizardEvent::ProductSelected { product }) => {
            next.selected_variant = product.default_variant().cloned();
            actions.push(WizardAction::track(
                EventType::ProductSelected,
                serde_json::json!({ "product": product.name }),
            ));
            next.selected_product = Some(product.clone());
        }

        (PhotoProduct, WizardEvent::VariantSelected { variant }) => {
            if next.selected_product.is_none() {
                return Err(WizardTransitionError::SelectionRequired);
            }
            next.selected_variant = Some(variant.clone());
        }

        (PhotoProduct, WizardEvent::GenerateRequested) => {
            let entry =
                state.current_entry().ok_or(WizardTransitionError::NoActivePhoto)?;
            let (product, variant) = match (&state.selected_product, &state.selected_variant) {
                (Some(product), Some(variant)) => (product, variant),
                _ => return Err(WizardTransitionError::SelectionRequired),
            };
            next.generation = state.generation + 1;
            next.generated_image = None;
            next.step = PhotoSimulation;
            actions.push(WizardAction::RequestVisualization(SimulationSpec {
                generation: next.generation,
                photo: entry.photo.clone(),
                paver_style: format!("{} - {}", product.name, variant.name),
                paver_texture_url: variant.texture_url.clone(),
                custom_prompt: product.prompt.clone(),
            }));
        }

        (PhotoSimulation, WizardEvent::SimulationSucceeded { image, .. }) => {
            next.generated_image = Some(image.clone());
            let product = state.selected_product.as_ref().map(|p| p.name.clone());
            actions.push(WizardAction::track(
                EventType::SimulationGenerated,
                serde_json::json!({ "product": product }),
            ));
        }

        (PhotoSimulation, WizardEvent::SimulationFailed { reason, .. }) => {
            actions.push(WizardAction::track(
                EventType::SimulationFailed,
                serde_json::json!({ "error": reason }),
            ));
            // Back to product selection for the same photo; the user's
            // product/variant choice survives the failure.
            next.step = PhotoProduct;
        }

        (PhotoSimulation, WizardEvent::TryAnotherRequested) => {
            next.reset_selection();
            next.generation = state.generation + 1;
            next.step = PhotoProduct;
        }

        (PhotoSimulation, WizardEvent::PhotoApproved) => {
            let image = state
                .generated_image
                .clone()
                .ok_or(WizardTransitionError::RenderRequired)?;
            let index = state.photo_index;
            let entry =
                next.entries.get_mut(index).ok_or(WizardTransitionError::NoActivePhoto)?;
            entry.product = state.selected_product.clone();
            entry.variant = state.selected_variant.clone();
            entry.generated_image = Some(image);
            entry.done = true;

            if index + 1 < next.entries.len() {
                next.photo_index = index + 1;
                next.reset_selection();
                next.step = PhotoProduct;
            } else {
                if let (Some(product), Some(variant), Some(zone)) =
                    (&state.selected_product, &state.selected_variant, &state.selected_zone)
                {
                    let quote = calculate_material_quote(
                        next.total_sqft(),
                        product,
                        variant,
                        zone.fee,
                        &zone.label,
                        &next.pricing,
                    );
                    actions.push(WizardAction::track(
                        EventType::QuoteViewed,
                        serde_json::json!({ "type": "material", "total": quote.material_total }),
                    ));
                    next.material_quote = Some(quote);
                }
                advance(&mut next, &mut actions, MaterialQuote);
            }
        }

        (MaterialQuote, WizardEvent::ZoneChosen { zone_id }) => {
            let zone = state
                .zones
                .iter()
                .find(|zone| &zone.id == zone_id)
                .cloned()
                .ok_or_else(|| WizardTransitionError::UnknownZone { id: zone_id.clone() })?;
            if let Some(entry) = state.last_done_entry() {
                if let (Some(product), Some(variant)) = (&entry.product, &entry.variant) {
                    next.material_quote = Some(calculate_material_quote(
                        next.total_sqft(),
                        product,
                        variant,
                        zone.fee,
                        &zone.label,
                        &next.pricing,
                    ));
                }
            }
            next.selected_zone = Some(zone);
        }

        (MaterialQuote, WizardEvent::LaborRequested) => {
            let labor = calculate_labor_quote(next.total_sqft(), &next.pricing);
            actions.push(WizardAction::track(
                EventType::QuoteViewed,
                serde_json::json!({ "type": "labor", "total": labor.labor_cost }),
            ));
            next.labor_quote = Some(labor);
            advance(&mut next, &mut actions, LaborQuote);
        }

        (step, event) => {
            return Err(WizardTransitionError::InvalidTransition {
                step,
                event: event.name(),
            });
        }
    }

    Ok(WizardTransition { state: next, actions })
}

/// Forward transition with funnel tracking: completes the current step,
/// enters the next. Loop-internal moves (photo-product ↔ photo-simulation)
/// bypass this and set the step directly, matching the funnel the
/// dashboard expects.
fn advance(state: &mut WizardState, actions: &mut Vec<WizardAction>, to: WizardStep) {
    actions.push(WizardAction::step_completed(state.step));
    state.completed.insert(state.step);
    state.step = to;
    actions.push(WizardAction::step_entered(to));
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::analytics::{EventType, InMemoryEventSink};
    use crate::domain::pricing::{DeliveryZone, PricingConfig, ZoneId};
    use crate::domain::product::{
        ImageRef, ManufacturerId, Product, ProductId, Variant, VariantId,
    };
    use crate::wizard::states::{LeadContact, WizardAction, WizardEvent, WizardStep};

    use super::{WizardEngine, WizardState, WizardTransitionError};

    fn product(id: &str, variants: &[&str]) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: id.to_string(),
            description: None,
            manufacturer_id: ManufacturerId("flagstone".to_string()),
            prompt: None,
            variants: variants
                .iter()
                .map(|name| Variant {
                    id: VariantId(format!("{id}-{name}")),
                    name: name.to_string(),
                    texture_url: format!("https://textures.example/{id}-{name}.jpg"),
                    example_url: format!("https://examples.example/{id}-{name}.jpg"),
                    shop_url: None,
                    price_per_pallet: None,
                })
                .collect(),
            price_per_pallet: None,
            sqft_per_pallet: None,
        }
    }

    fn photo(name: &str) -> ImageRef {
        ImageRef(format!("data:image/jpeg;base64,{name}"))
    }

    fn state_with(require_lead_capture: bool) -> WizardState {
        let pricing = PricingConfig { require_lead_capture, ..PricingConfig::default() };
        WizardState::new(pricing, DeliveryZone::default_zones())
    }

    fn apply(state: WizardState, event: WizardEvent) -> WizardState {
        WizardEngine
            .apply(&state, &event)
            .unwrap_or_else(|error| panic!("{} should apply: {error}", event.name()))
            .state
    }

    /// Drives a fresh session to the product-selection step for the given
    /// photos, skipping lead capture.
    fn at_photo_product(photos: &[&str]) -> WizardState {
        let mut state = state_with(false);
        state = apply(state, WizardEvent::Started);
        state = apply(
            state,
            WizardEvent::PhotosSubmitted { photos: photos.iter().map(|p| photo(p)).collect() },
        );
        apply(
            state,
            WizardEvent::MeasurementsSubmitted {
                width: Decimal::from(20u32),
                length: Decimal::from(25u32),
            },
        )
    }

    fn approve_photo(mut state: WizardState, product: &Product) -> WizardState {
        let generation = state.generation + 1;
        state = apply(state, WizardEvent::ProductSelected { product: product.clone() });
        state = apply(state, WizardEvent::GenerateRequested);
        state = apply(
            state,
            WizardEvent::SimulationSucceeded { generation, image: photo("render") },
        );
        apply(state, WizardEvent::PhotoApproved)
    }

    #[test]
    fn zero_width_measurements_are_rejected() {
        let mut state = state_with(false);
        state = apply(state, WizardEvent::Started);
        state = apply(state, WizardEvent::PhotosSubmitted { photos: vec![photo("p1")] });

        let error = WizardEngine
            .apply(
                &state,
                &WizardEvent::MeasurementsSubmitted {
                    width: Decimal::ZERO,
                    length: Decimal::from(10u32),
                },
            )
            .expect_err("zero width must not advance");
        assert!(matches!(error, WizardTransitionError::MeasurementsRequired { .. }));
        assert_eq!(state.step, WizardStep::Measurements);
    }

    #[test]
    fn valid_measurements_compute_total_area() {
        let state = at_photo_product(&["p1"]);
        assert_eq!(state.total_sqft(), Decimal::from(500u32));
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.step, WizardStep::PhotoProduct);
    }

    #[test]
    fn empty_photo_set_is_rejected() {
        let mut state = state_with(false);
        state = apply(state, WizardEvent::Started);
        let error = WizardEngine
            .apply(&state, &WizardEvent::PhotosSubmitted { photos: vec![] })
            .expect_err("no photos must not advance");
        assert_eq!(error, WizardTransitionError::PhotosRequired);
    }

    #[test]
    fn lead_capture_is_skipped_when_disabled() {
        let state = at_photo_product(&["p1"]);
        assert_eq!(state.step, WizardStep::PhotoProduct);
        assert!(!state.completed.contains(&WizardStep::LeadCapture));
    }

    #[test]
    fn lead_capture_is_visited_when_enabled() {
        let mut state = state_with(true);
        state = apply(state, WizardEvent::Started);
        state = apply(state, WizardEvent::PhotosSubmitted { photos: vec![photo("p1")] });
        state = apply(
            state,
            WizardEvent::MeasurementsSubmitted {
                width: Decimal::from(20u32),
                length: Decimal::from(25u32),
            },
        );
        assert_eq!(state.step, WizardStep::LeadCapture);

        let transition = WizardEngine
            .apply(
                &state,
                &WizardEvent::LeadSubmitted {
                    contact: LeadContact {
                        name: "Ana".to_string(),
                        email: "ana@example.com".to_string(),
                        phone: None,
                    },
                },
            )
            .expect("lead submit");
        assert_eq!(transition.state.step, WizardStep::PhotoProduct);
        assert!(transition
            .actions
            .iter()
            .any(|action| matches!(action, WizardAction::PersistLead(lead) if lead.source == "quote")));
    }

    #[test]
    fn selecting_a_product_defaults_to_its_first_variant() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray", "red"]);
        let state = apply(state, WizardEvent::ProductSelected { product: union.clone() });
        assert_eq!(
            state.selected_variant.as_ref().map(|v| v.name.as_str()),
            Some("gray")
        );

        let red = union.variants[1].clone();
        let state = apply(state, WizardEvent::VariantSelected { variant: red });
        assert_eq!(state.selected_variant.as_ref().map(|v| v.name.as_str()), Some("red"));
    }

    #[test]
    fn generation_requires_a_selection() {
        let state = at_photo_product(&["p1"]);
        let error = WizardEngine
            .apply(&state, &WizardEvent::GenerateRequested)
            .expect_err("no selection yet");
        assert_eq!(error, WizardTransitionError::SelectionRequired);
    }

    #[test]
    fn generate_emits_a_tagged_visualization_request() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = apply(state, WizardEvent::ProductSelected { product: union });
        let transition =
            WizardEngine.apply(&state, &WizardEvent::GenerateRequested).expect("generate");

        assert_eq!(transition.state.step, WizardStep::PhotoSimulation);
        assert_eq!(transition.state.generation, state.generation + 1);
        let spec = transition
            .actions
            .iter()
            .find_map(|action| match action {
                WizardAction::RequestVisualization(spec) => Some(spec),
                _ => None,
            })
            .expect("visualization request");
        assert_eq!(spec.generation, transition.state.generation);
        assert_eq!(spec.paver_style, "union - gray");
    }

    #[test]
    fn simulation_failure_reverts_to_product_select_preserving_choice() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = apply(state, WizardEvent::ProductSelected { product: union });
        let state = apply(state, WizardEvent::GenerateRequested);
        let generation = state.generation;

        let state = apply(
            state,
            WizardEvent::SimulationFailed { generation, reason: "model timeout".to_string() },
        );
        assert_eq!(state.step, WizardStep::PhotoProduct);
        assert!(state.selected_product.is_some());
        assert!(state.selected_variant.is_some());
    }

    #[test]
    fn stale_simulation_responses_are_discarded() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = apply(state, WizardEvent::ProductSelected { product: union });
        let state = apply(state, WizardEvent::GenerateRequested);

        let stale = apply(
            state.clone(),
            WizardEvent::SimulationSucceeded {
                generation: state.generation - 1,
                image: photo("stale"),
            },
        );
        assert_eq!(stale, state);
        assert!(stale.generated_image.is_none());
    }

    #[test]
    fn restart_mid_generation_invalidates_the_in_flight_token() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = apply(state, WizardEvent::ProductSelected { product: union });
        let state = apply(state, WizardEvent::GenerateRequested);
        let in_flight = state.generation;

        let state = apply(state, WizardEvent::Restarted);
        assert_eq!(state.step, WizardStep::Welcome);
        assert!(state.completed.is_empty());
        assert!(state.generation > in_flight);

        let after = apply(
            state.clone(),
            WizardEvent::SimulationSucceeded { generation: in_flight, image: photo("late") },
        );
        assert_eq!(after, state);
    }

    #[test]
    fn approving_a_non_last_photo_moves_to_the_next_photo() {
        let state = at_photo_product(&["p1", "p2"]);
        let union = product("union", &["gray"]);
        let state = approve_photo(state, &union);

        assert_eq!(state.step, WizardStep::PhotoProduct);
        assert_eq!(state.photo_index, 1);
        assert!(state.selected_product.is_none(), "selection resets for the next photo");
        assert!(state.entries[0].done);
        assert_eq!(
            state.entries[0].product.as_ref().map(|p| p.name.as_str()),
            Some("union")
        );
    }

    #[test]
    fn last_photo_approval_quotes_with_the_final_selection() {
        let state = at_photo_product(&["p1", "p2"]);
        let union = product("union", &["gray"]);
        let heritage = product("heritage", &["walnut"]);

        let state = approve_photo(state, &union);
        let state = approve_photo(state, &heritage);

        assert_eq!(state.step, WizardStep::MaterialQuote);
        let quote = state.material_quote.as_ref().expect("material quote");
        assert_eq!(quote.product.name, "heritage");
        assert_eq!(quote.area_sqft, Decimal::from(500u32));
        // Photo 1's record stays untouched.
        assert_eq!(
            state.entries[0].product.as_ref().map(|p| p.name.as_str()),
            Some("union")
        );
        assert!(state.entries[0].done);
    }

    #[test]
    fn zone_change_requotes_from_the_last_done_entry() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = approve_photo(state, &union);
        let before = state.material_quote.clone().expect("quote");

        let state = apply(
            state,
            WizardEvent::ZoneChosen { zone_id: ZoneId("orlando".to_string()) },
        );
        let after = state.material_quote.expect("requote");
        assert_eq!(after.delivery_fee, Decimal::from(400u32));
        assert_eq!(after.delivery_zone_label, "Orlando (+ 25 miles)");
        assert_eq!(after.material_subtotal, before.material_subtotal);
        assert_eq!(after.product.name, "union");
    }

    #[test]
    fn unknown_zone_is_rejected() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = approve_photo(state, &union);

        let error = WizardEngine
            .apply(&state, &WizardEvent::ZoneChosen { zone_id: ZoneId("miami".to_string()) })
            .expect_err("zone not in snapshot");
        assert!(matches!(error, WizardTransitionError::UnknownZone { .. }));
    }

    #[test]
    fn labor_quote_requires_explicit_request() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = approve_photo(state, &union);
        assert!(state.labor_quote.is_none(), "never auto-computed");

        let state = apply(state, WizardEvent::LaborRequested);
        assert_eq!(state.step, WizardStep::LaborQuote);
        let labor = state.labor_quote.expect("labor quote");
        assert_eq!(labor.labor_cost, Decimal::from(4000u32));
    }

    #[test]
    fn restart_resets_everything_from_any_step() {
        let state = at_photo_product(&["p1"]);
        let union = product("union", &["gray"]);
        let state = approve_photo(state, &union);

        let state = apply(state, WizardEvent::Restarted);
        assert_eq!(state.step, WizardStep::Welcome);
        assert!(state.completed.is_empty());
        assert!(state.entries.is_empty());
        assert!(state.material_quote.is_none());
        assert!(state.lead.is_none());
        assert_eq!(state.width, Decimal::ZERO);
        assert_eq!(
            state.selected_zone.as_ref().map(|zone| zone.id.0.as_str()),
            Some("tampa"),
            "zone returns to the first active zone"
        );
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        let state = state_with(false);
        let error = WizardEngine
            .apply(&state, &WizardEvent::LaborRequested)
            .expect_err("labor before material quote");
        assert!(matches!(
            error,
            WizardTransitionError::InvalidTransition { step: WizardStep::Welcome, .. }
        ));
    }

    #[test]
    fn forward_transitions_emit_step_completed_then_step_entered() {
        let state = state_with(false);
        let transition = WizardEngine.apply(&state, &WizardEvent::Started).expect("start");

        let tracked: Vec<_> = transition
            .actions
            .iter()
            .filter_map(|action| match action {
                WizardAction::Track { event_type, step, .. } => Some((*event_type, *step)),
                _ => None,
            })
            .collect();
        assert_eq!(
            tracked,
            vec![
                (EventType::StepCompleted, Some(WizardStep::Welcome)),
                (EventType::StepEntered, Some(WizardStep::Photos)),
            ]
        );
    }

    #[test]
    fn apply_with_sink_routes_tracking_actions_to_the_sink() {
        let sink = InMemoryEventSink::default();
        let state = state_with(false);
        let transition = WizardEngine
            .apply_with_sink(&state, &WizardEvent::Started, &sink, "session-1")
            .expect("start");

        assert!(transition.actions.is_empty(), "tracking actions are drained");
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|event| event.session_id == "session-1"));
        assert_eq!(events[0].event_type, "step_completed");
        assert_eq!(events[1].event_type, "step_entered");
    }

    #[test]
    fn replay_is_deterministic_for_the_same_event_sequence() {
        let union = product("union", &["gray"]);
        let run = || {
            let state = at_photo_product(&["p1"]);
            let state = approve_photo(state, &union);
            apply(state, WizardEvent::LaborRequested)
        };
        assert_eq!(run(), run());
    }
}
