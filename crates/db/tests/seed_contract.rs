//! Contract tests for the shipped seed dataset: the catalog, zones, and
//! pricing the wizard can always fall back to.

use std::collections::HashSet;

use rust_decimal::Decimal;

use paverly_core::domain::pricing::PricingConfig;
use paverly_db::repositories::{
    DeliveryZoneRepository, PricingConfigRepository, ProductRepository,
    SqlDeliveryZoneRepository, SqlPricingConfigRepository, SqlProductRepository,
};
use paverly_db::{connect_with_settings, migrations, DbPool, SeedDataset};

/// (product id, pallet price, pallet coverage) for the catalog entries the
/// pricing engine's defaults were derived from.
const PRICED_PRODUCTS: &[(&str, u32, u32)] =
    &[("union", 285, 100), ("heritage", 270, 100), ("monaco", 285, 107), ("tuscany", 400, 72)];

async fn seeded_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    SeedDataset::load(&pool).await.expect("seed");
    pool
}

#[tokio::test]
async fn seeded_catalog_carries_the_expected_pallet_pricing() {
    let pool = seeded_pool().await;
    let products = SqlProductRepository::new(pool).list().await.expect("list products");

    for (id, price, sqft) in PRICED_PRODUCTS {
        let product = products
            .iter()
            .find(|product| product.id.0 == *id)
            .unwrap_or_else(|| panic!("seed should include `{id}`"));
        assert_eq!(product.price_per_pallet, Some(Decimal::from(*price)), "price of `{id}`");
        assert_eq!(product.sqft_per_pallet, Some(Decimal::from(*sqft)), "coverage of `{id}`");
        assert!(!product.variants.is_empty(), "`{id}` needs at least one variant");
    }
}

#[tokio::test]
async fn seeded_variant_ids_are_unique_across_the_catalog() {
    let pool = seeded_pool().await;
    let products = SqlProductRepository::new(pool).list().await.expect("list products");

    let mut seen = HashSet::new();
    for product in &products {
        for variant in &product.variants {
            assert!(
                seen.insert(variant.id.0.clone()),
                "variant id `{}` appears more than once",
                variant.id.0
            );
            assert!(
                variant.texture_url.starts_with("https://"),
                "variant `{}` needs a fetchable texture",
                variant.id.0
            );
        }
    }
}

#[tokio::test]
async fn seeded_zones_match_the_shipped_service_areas() {
    let pool = seeded_pool().await;
    let zones =
        SqlDeliveryZoneRepository::new(pool).list(true).await.expect("list zones");

    assert_eq!(zones.len(), 2);
    assert_eq!(zones[0].id.0, "tampa");
    assert_eq!(zones[0].fee, Decimal::from(300u32));
    assert_eq!(zones[1].id.0, "orlando");
    assert_eq!(zones[1].fee, Decimal::from(400u32));
}

#[tokio::test]
async fn seeded_pricing_is_the_default_singleton() {
    let pool = seeded_pool().await;
    let config = SqlPricingConfigRepository::new(pool).load().await.expect("load pricing");
    assert_eq!(config, PricingConfig::default());
}

#[tokio::test]
async fn reseeding_does_not_duplicate_rows() {
    let pool = seeded_pool().await;
    SeedDataset::load(&pool).await.expect("second seed");

    let products =
        SqlProductRepository::new(pool.clone()).list().await.expect("list products");
    assert_eq!(products.len(), SeedDataset::products().len());

    let verification = SeedDataset::verify(&pool).await.expect("verify");
    assert!(verification.all_present, "failed checks: {:?}", verification.checks);
}
