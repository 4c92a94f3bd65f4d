use rust_decimal::Decimal;
use serde_json::json;

use paverly_core::domain::pricing::PricingConfig;
use paverly_core::domain::product::{ManufacturerId, Product, ProductId, Variant, VariantId};
use paverly_core::pricing::{
    calculate_full_quote, calculate_labor_quote, calculate_material_quote, format_currency,
};

use crate::commands::CommandResult;

#[derive(Debug, Clone)]
pub struct EstimateArgs {
    pub width: Decimal,
    pub length: Decimal,
    pub waste: Option<Decimal>,
    pub price_per_pallet: Option<Decimal>,
    pub sqft_per_pallet: Option<Decimal>,
    pub delivery_fee: Option<Decimal>,
    pub labor: bool,
}

/// Offline run of the pricing engine, for smoke checks and phone quotes.
pub fn run(args: EstimateArgs) -> CommandResult {
    if args.width <= Decimal::ZERO || args.length <= Decimal::ZERO {
        return CommandResult::failure(
            "estimate",
            "invalid_dimensions",
            format!(
                "both dimensions must be positive (got width {}, length {})",
                args.width, args.length
            ),
            2,
        );
    }

    let mut pricing = PricingConfig::default();
    if let Some(waste) = args.waste {
        pricing.waste_percentage = waste;
    }

    let product = Product {
        id: ProductId("estimate".to_string()),
        name: "Estimate".to_string(),
        description: None,
        manufacturer_id: ManufacturerId("estimate".to_string()),
        prompt: None,
        variants: Vec::new(),
        price_per_pallet: args.price_per_pallet,
        sqft_per_pallet: args.sqft_per_pallet,
    };
    let variant = Variant {
        id: VariantId("estimate".to_string()),
        name: "Estimate".to_string(),
        texture_url: String::new(),
        example_url: String::new(),
        shop_url: None,
        price_per_pallet: None,
    };

    let area = args.width * args.length;
    let material = calculate_material_quote(
        area,
        &product,
        &variant,
        args.delivery_fee.unwrap_or(Decimal::ZERO),
        "estimate",
        &pricing,
    );
    let labor = args.labor.then(|| calculate_labor_quote(area, &pricing));
    let full = calculate_full_quote(material, labor);

    let mut breakdown = json!({
        "areaSqft": full.material.area_sqft,
        "areaWithWaste": full.material.area_with_waste,
        "palletsNeeded": full.material.pallets_needed,
        "pricePerPallet": full.material.price_per_pallet,
        "materialSubtotal": format_currency(full.material.material_subtotal),
        "deliveryFee": format_currency(full.material.delivery_fee),
        "materialTotal": format_currency(full.material.material_total),
        "grandTotal": format_currency(full.grand_total),
    });
    if let Some(labor) = &full.labor {
        breakdown["laborCost"] = json!(format_currency(labor.labor_cost));
    }

    match serde_json::to_string(&breakdown) {
        Ok(rendered) => CommandResult::success("estimate", rendered),
        Err(error) => CommandResult::failure(
            "estimate",
            "serialization",
            format!("could not render the estimate: {error}"),
            3,
        ),
    }
}
