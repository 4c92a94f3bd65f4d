use paverly_db::SeedDataset;

use crate::commands::{with_migrated_pool, CommandResult};

pub fn run() -> CommandResult {
    with_migrated_pool("seed", |pool| async move {
        let seeded = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if !verification.all_present {
            let failed = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(("seed_verification", format!("failed checks: {failed}"), 6u8));
        }

        Ok(format!(
            "seeded {} products, {} delivery zones, and the pricing defaults",
            seeded.products_seeded, seeded.zones_seeded
        ))
    })
}
