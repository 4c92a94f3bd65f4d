use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub String);

/// Singleton pricing configuration. Read once at wizard start and treated
/// as an immutable snapshot for that session; mutated only through the
/// admin surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    pub labor_rate_per_sqft: Decimal,
    pub waste_percentage: Decimal,
    pub owner_phone: String,
    pub owner_whatsapp: String,
    pub require_lead_capture: bool,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            labor_rate_per_sqft: Decimal::new(800, 2),
            waste_percentage: Decimal::from(10u32),
            owner_phone: "+18138191450".to_string(),
            owner_whatsapp: "+18138191450".to_string(),
            require_lead_capture: true,
        }
    }
}

/// A named service area with a flat delivery fee. Only active zones are
/// offered during quoting; the admin surface manages the full set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: ZoneId,
    pub name: String,
    pub label: String,
    pub fee: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_description: Option<String>,
    pub sort_order: i32,
    pub active: bool,
}

impl DeliveryZone {
    /// Built-in zones used when the store has none configured.
    pub fn default_zones() -> Vec<DeliveryZone> {
        vec![
            DeliveryZone {
                id: ZoneId("tampa".to_string()),
                name: "tampa".to_string(),
                label: "Tampa (+ 25 miles)".to_string(),
                fee: Decimal::from(300u32),
                radius_description: None,
                sort_order: 1,
                active: true,
            },
            DeliveryZone {
                id: ZoneId("orlando".to_string()),
                name: "orlando".to_string(),
                label: "Orlando (+ 25 miles)".to_string(),
                fee: Decimal::from(400u32),
                radius_description: None,
                sort_order: 2,
                active: true,
            },
        ]
    }
}
