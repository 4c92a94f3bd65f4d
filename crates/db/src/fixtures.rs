use rust_decimal::Decimal;
use serde::Serialize;

use paverly_core::domain::pricing::{DeliveryZone, PricingConfig};
use paverly_core::domain::product::{ManufacturerId, Product, ProductId, Variant, VariantId};

use crate::repositories::{
    DeliveryZoneRepository, PricingConfigRepository, ProductRepository, RepositoryError,
    SqlDeliveryZoneRepository, SqlPricingConfigRepository, SqlProductRepository,
};
use crate::DbPool;

#[derive(Clone, Debug, Serialize)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub zones_seeded: usize,
    pub pricing_seeded: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

/// Deterministic catalog/zone/pricing seeds matching the retailer's
/// shipped defaults. Safe to run repeatedly; rows are upserted.
pub struct SeedDataset;

impl SeedDataset {
    pub fn products() -> Vec<Product> {
        vec![
            product(
                "union",
                "Union",
                "flagstone",
                Some("Classic interlocking paver with a clean modern edge."),
                285,
                100,
                &[("union-gray", "Gray"), ("union-red", "Red")],
            ),
            product(
                "heritage",
                "Heritage",
                "flagstone",
                Some("Tumbled old-world finish."),
                270,
                100,
                &[("heritage-walnut", "Walnut"), ("heritage-sierra", "Sierra")],
            ),
            product(
                "monaco",
                "Monaco",
                "tremron",
                Some("Elegant and timeless stone look."),
                285,
                107,
                &[("monaco-glacier", "Glacier"), ("monaco-sand-dune", "Sand Dune")],
            ),
            product(
                "tuscany",
                "Tuscany",
                "tremron",
                Some("Large-format slab with a honed surface."),
                400,
                72,
                &[("tuscany-ivory", "Ivory")],
            ),
            product(
                "victory",
                "Victory",
                "flagstone",
                None,
                265,
                100,
                &[("victory-charcoal", "Charcoal"), ("victory-linen", "Linen")],
            ),
        ]
    }

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let products = SqlProductRepository::new(pool.clone());
        let zones = SqlDeliveryZoneRepository::new(pool.clone());
        let pricing = SqlPricingConfigRepository::new(pool.clone());

        let catalog = Self::products();
        for entry in catalog.iter().cloned() {
            products.upsert(entry).await?;
        }

        let default_zones = DeliveryZone::default_zones();
        for zone in default_zones.iter().cloned() {
            zones.upsert(zone).await?;
        }

        pricing.save(PricingConfig::default()).await?;

        Ok(SeedResult {
            products_seeded: catalog.len(),
            zones_seeded: default_zones.len(),
            pricing_seeded: true,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let products = SqlProductRepository::new(pool.clone());
        let zones = SqlDeliveryZoneRepository::new(pool.clone());
        let pricing = SqlPricingConfigRepository::new(pool.clone());

        let catalog = products.list().await?;
        let active_zones = zones.list(true).await?;
        let config = pricing.load().await?;

        let checks = vec![
            ("catalog_present", catalog.len() >= Self::products().len()),
            ("every_product_has_a_variant", catalog.iter().all(|p| !p.variants.is_empty())),
            ("active_zones_present", !active_zones.is_empty()),
            ("pricing_singleton_present", config == PricingConfig::default()),
        ];
        let all_present = checks.iter().all(|(_, passed)| *passed);

        Ok(VerificationResult { all_present, checks })
    }
}

fn product(
    id: &str,
    name: &str,
    manufacturer: &str,
    description: Option<&str>,
    price_per_pallet: u32,
    sqft_per_pallet: u32,
    variants: &[(&str, &str)],
) -> Product {
    Product {
        id: ProductId(id.to_string()),
        name: name.to_string(),
        description: description.map(str::to_string),
        manufacturer_id: ManufacturerId(manufacturer.to_string()),
        prompt: None,
        variants: variants
            .iter()
            .map(|(variant_id, variant_name)| Variant {
                id: VariantId(variant_id.to_string()),
                name: variant_name.to_string(),
                texture_url: format!("https://cdn.paverly.example/textures/{variant_id}.jpg"),
                example_url: format!("https://cdn.paverly.example/examples/{variant_id}.jpg"),
                shop_url: None,
                price_per_pallet: None,
            })
            .collect(),
        price_per_pallet: Some(Decimal::from(price_per_pallet)),
        sqft_per_pallet: Some(Decimal::from(sqft_per_pallet)),
    }
}

#[cfg(test)]
mod tests {
    use crate::{connect_with_settings, migrations};

    use super::SeedDataset;

    #[tokio::test]
    async fn seed_load_and_verify_round_trip() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let result = SeedDataset::load(&pool).await.expect("seed");
        assert_eq!(result.products_seeded, SeedDataset::products().len());
        assert_eq!(result.zones_seeded, 2);

        let verification = SeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "failed checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        SeedDataset::load(&pool).await.expect("first seed");
        SeedDataset::load(&pool).await.expect("second seed");

        let verification = SeedDataset::verify(&pool).await.expect("verify");
        assert!(verification.all_present);
    }
}
