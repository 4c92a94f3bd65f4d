use std::env;
use std::sync::{Mutex, OnceLock};

use paverly_cli::commands::{estimate, migrate, seed};
use rust_decimal::Decimal;
use serde_json::Value;

#[test]
fn migrate_returns_success_against_a_memory_database() {
    with_env(&[("PAVERLY_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_reports_config_failures_with_a_dedicated_class() {
    with_env(&[("PAVERLY_DATABASE_URL", "postgres://elsewhere/paverly")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_and_verifies_the_shipped_dataset() {
    // A single connection keeps every statement on the same in-memory
    // database.
    with_env(
        &[
            ("PAVERLY_DATABASE_URL", "sqlite::memory:"),
            ("PAVERLY_DATABASE_MAX_CONNECTIONS", "1"),
        ],
        || {
            let result = seed::run();
            assert_eq!(result.exit_code, 0, "expected successful seed run: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "seed");
            assert_eq!(payload["status"], "ok");
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains("delivery zones"), "message should summarize the seed");
        },
    );
}

#[test]
fn estimate_runs_without_any_environment() {
    with_env(&[], || {
        let result = estimate::run(estimate::EstimateArgs {
            width: Decimal::from(20u32),
            length: Decimal::from(25u32),
            waste: None,
            price_per_pallet: None,
            sqft_per_pallet: None,
            delivery_fee: Some(Decimal::from(300u32)),
            labor: true,
        });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("$6,010.00"), "grand total should be rendered: {message}");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| {
        panic!("command output should be JSON ({error}): {output}");
    })
}

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const MANAGED_VARS: &[&str] = &[
    "PAVERLY_DATABASE_URL",
    "PAVERLY_DATABASE_MAX_CONNECTIONS",
    "PAVERLY_DATABASE_TIMEOUT_SECS",
    "PAVERLY_VISION_API_KEY",
    "PAVERLY_ADMIN_PASSWORD",
    "PAVERLY_LOGGING_LEVEL",
    "PAVERLY_LOG_LEVEL",
];

/// Commands read configuration from the process environment, so each test
/// pins exactly the variables it needs behind one lock.
fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
    let _guard = match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    for var in MANAGED_VARS {
        env::remove_var(var);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test();

    for var in MANAGED_VARS {
        env::remove_var(var);
    }
}
