use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManufacturerId(pub String);

/// Reference to an image exchanged as a `data:` URL (photo uploads and
/// generated renders alike).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

/// A color/finish option of a product. Each variant carries its own
/// reference texture; `price_per_pallet` overrides the product's.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    pub texture_url: String,
    pub example_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_pallet: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub manufacturer_id: ManufacturerId,
    /// Optional per-product override for the visualization prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Variant order is significant: the first variant is the default
    /// selection when the product is chosen.
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_pallet: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqft_per_pallet: Option<Decimal>,
}

impl Product {
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|variant| &variant.id == id)
    }
}
