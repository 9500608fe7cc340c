use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation live here, decoupled from the process environment,
/// so tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        let value = lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?;
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{var} must not be empty")));
        }
        Ok(value.trim().to_string())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let api_base_url = require("A24_BASE_URL")?;
    let api_token = require("A24_TOKEN")?;
    let merchant_id = require("A24_MERCHANT_ID")?;

    let env = parse_environment(&or_default("A24_ENV", "development"))?;
    let log_level = or_default("A24_LOG_LEVEL", "info");
    let debug = parse_flag("A24_DEBUG", &or_default("A24_DEBUG", "false"))?;

    let db_max_connections = parse_u32("A24_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("A24_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("A24_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let request_timeout_secs = parse_u64("A24_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("A24_USER_AGENT", "a24sync/0.1 (catalog-sync)");
    let max_pages = parse_u32("A24_MAX_PAGES", "500")?;
    if max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "A24_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let inter_request_delay_ms = parse_u64("A24_INTER_REQUEST_DELAY_MS", "0")?;
    let max_retries = parse_u32("A24_MAX_RETRIES", "0")?;
    let retry_backoff_base_secs = parse_u64("A24_RETRY_BACKOFF_BASE_SECS", "2")?;

    let variation_attribute = or_default("A24_VARIATION_ATTRIBUTE", "ზომა");
    if variation_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "A24_VARIATION_ATTRIBUTE must not be empty".to_string(),
        ));
    }
    let require_category = parse_flag(
        "A24_REQUIRE_CATEGORY",
        &or_default("A24_REQUIRE_CATEGORY", "false"),
    )?;
    let image_probe_timeout_secs = parse_u64("A24_IMAGE_PROBE_TIMEOUT_SECS", "12")?;
    let sync_cron = or_default("A24_SYNC_CRON", "0 0 3 * * *");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        debug,
        api_base_url,
        api_token,
        merchant_id,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        request_timeout_secs,
        user_agent,
        max_pages,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_secs,
        variation_attribute,
        require_category,
        image_probe_timeout_secs,
        sync_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "A24_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_flag(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
