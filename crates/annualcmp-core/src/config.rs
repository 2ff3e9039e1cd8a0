use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = parse_value::<usize>(var, &or_default(var, default))?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("ANNUALCMP_ENV", "development"));
    let log_level = or_default("ANNUALCMP_LOG_LEVEL", "info");

    // An empty key is treated the same as an absent one.
    let gemini_api_key = lookup("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let gemini_base_url = or_default("ANNUALCMP_GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    let embedding_model = or_default("ANNUALCMP_EMBEDDING_MODEL", "text-embedding-004");
    let generation_model = or_default("ANNUALCMP_GENERATION_MODEL", "gemini-1.5-flash");

    let embedding_dim = positive("ANNUALCMP_EMBEDDING_DIM", "768")?;
    let chunk_size = positive("ANNUALCMP_CHUNK_SIZE", "500")?;
    let search_top_k = positive("ANNUALCMP_TOP_K", "10")?;
    let request_timeout_secs = parse_num("ANNUALCMP_REQUEST_TIMEOUT_SECS", "30")?;
    let default_fiscal_year =
        parse_value::<i32>("ANNUALCMP_FISCAL_YEAR", &or_default("ANNUALCMP_FISCAL_YEAR", "2024"))?;

    Ok(AppConfig {
        env,
        log_level,
        gemini_api_key,
        gemini_base_url,
        embedding_model,
        generation_model,
        embedding_dim,
        chunk_size,
        search_top_k,
        request_timeout_secs,
        default_fiscal_year,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
