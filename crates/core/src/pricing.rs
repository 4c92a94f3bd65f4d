use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::PricingConfig;
use crate::domain::product::{Product, Variant};

/// Pallet coverage assumed when a product does not declare its own.
pub const DEFAULT_SQFT_PER_PALLET: u32 = 100;
/// Pallet price assumed when neither variant nor product declares one.
pub const DEFAULT_PRICE_PER_PALLET: u32 = 285;

/// Material estimate for one area/product/variant combination. Carries all
/// inputs and derived numbers so the caller can render the full breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialQuote {
    pub product: Product,
    pub variant: Variant,
    pub area_sqft: Decimal,
    pub area_with_waste: Decimal,
    pub waste_percentage: Decimal,
    pub pallets_needed: u32,
    pub price_per_pallet: Decimal,
    pub sqft_per_pallet: Decimal,
    pub material_subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub delivery_zone_label: String,
    pub material_total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaborQuote {
    pub area_sqft: Decimal,
    pub labor_rate_per_sqft: Decimal,
    pub labor_cost: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullQuote {
    pub material: MaterialQuote,
    pub labor: Option<LaborQuote>,
    pub grand_total: Decimal,
}

/// Pure material pricing. Partial pallets are billed as whole pallets; a
/// zero area yields a zero-pallet, zero-cost quote (input validation is
/// the caller's job).
pub fn calculate_material_quote(
    area_sqft: Decimal,
    product: &Product,
    variant: &Variant,
    delivery_fee: Decimal,
    delivery_zone_label: &str,
    pricing: &PricingConfig,
) -> MaterialQuote {
    let waste_percentage = pricing.waste_percentage;
    let waste_factor = Decimal::ONE + waste_percentage / Decimal::ONE_HUNDRED;
    let area_with_waste = (area_sqft * waste_factor).ceil();

    let sqft_per_pallet =
        product.sqft_per_pallet.unwrap_or_else(|| Decimal::from(DEFAULT_SQFT_PER_PALLET));
    let price_per_pallet = variant
        .price_per_pallet
        .or(product.price_per_pallet)
        .unwrap_or_else(|| Decimal::from(DEFAULT_PRICE_PER_PALLET));

    let pallets_needed = (area_with_waste / sqft_per_pallet).ceil().to_u32().unwrap_or(0);
    let material_subtotal = Decimal::from(pallets_needed) * price_per_pallet;

    MaterialQuote {
        product: product.clone(),
        variant: variant.clone(),
        area_sqft,
        area_with_waste,
        waste_percentage,
        pallets_needed,
        price_per_pallet,
        sqft_per_pallet,
        material_subtotal,
        delivery_fee,
        delivery_zone_label: delivery_zone_label.to_string(),
        material_total: material_subtotal + delivery_fee,
    }
}

/// Labor is linear in area; no rounding.
pub fn calculate_labor_quote(area_sqft: Decimal, pricing: &PricingConfig) -> LaborQuote {
    LaborQuote {
        area_sqft,
        labor_rate_per_sqft: pricing.labor_rate_per_sqft,
        labor_cost: area_sqft * pricing.labor_rate_per_sqft,
    }
}

pub fn calculate_full_quote(material: MaterialQuote, labor: Option<LaborQuote>) -> FullQuote {
    let labor_cost = labor.as_ref().map(|quote| quote.labor_cost).unwrap_or(Decimal::ZERO);
    let grand_total = material.material_total + labor_cost;
    FullQuote { material, labor, grand_total }
}

/// Display-only currency rendering: `$` with thousands separators and two
/// decimal digits. Quote arithmetic keeps full decimal precision.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative();
    let unsigned = rounded.abs();
    let text = format!("{unsigned:.2}");
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}
