use std::env;
use std::path::{Path, PathBuf};

use paverly_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

/// Render the effective configuration with per-field source attribution
/// (env > file > default) and secret redaction.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let file_doc = config_file_path
        .as_deref()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|raw| raw.parse::<toml::Value>().ok());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |field: &str, value: String, env_var: &str| {
        let source = field_source(field, env_var, file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("  {field} = {value}  ({source})"));
    };

    push("database.url", config.database.url.clone(), "PAVERLY_DATABASE_URL");
    push(
        "database.max_connections",
        config.database.max_connections.to_string(),
        "PAVERLY_DATABASE_MAX_CONNECTIONS",
    );
    push("server.bind_address", config.server.bind_address.clone(), "PAVERLY_SERVER_BIND_ADDRESS");
    push("server.port", config.server.port.to_string(), "PAVERLY_SERVER_PORT");
    push("vision.base_url", config.vision.base_url.clone(), "PAVERLY_VISION_BASE_URL");
    push("vision.model", config.vision.model.clone(), "PAVERLY_VISION_MODEL");
    push(
        "vision.api_key",
        config
            .vision
            .api_key
            .as_ref()
            .map(|key| redact(key.expose_secret()))
            .unwrap_or_else(|| "(unset)".to_string()),
        "PAVERLY_VISION_API_KEY",
    );
    push(
        "admin.password",
        config
            .admin
            .password
            .as_ref()
            .map(|password| redact(password.expose_secret()))
            .unwrap_or_else(|| "(unset; admin surface disabled)".to_string()),
        "PAVERLY_ADMIN_PASSWORD",
    );
    push("logging.level", config.logging.level.clone(), "PAVERLY_LOGGING_LEVEL");

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("paverly.toml"), PathBuf::from("config/paverly.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn field_source(
    field: &str,
    env_var: &str,
    file_doc: Option<&toml::Value>,
    file_path: Option<&Path>,
) -> String {
    if env::var(env_var).map(|value| !value.trim().is_empty()).unwrap_or(false) {
        return format!("env:{env_var}");
    }

    let in_file = field
        .split_once('.')
        .and_then(|(section, key)| file_doc?.get(section)?.get(key))
        .is_some();
    if in_file {
        if let Some(path) = file_path {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}

fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &secret[..4])
}
