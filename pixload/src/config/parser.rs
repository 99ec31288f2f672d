//! INI parsing for [`LoaderConfig`].
//!
//! The single place where INI key names are mapped to settings.

use super::file::ConfigFileError;
use super::loader::LoaderConfig;
use ini::Ini;
use std::str::FromStr;
use std::time::Duration;

const SECTION: &str = "loader";

/// Starts from `LoaderConfig::default()` and overlays any values found in
/// the `[loader]` section.
pub(super) fn parse_ini(ini: &Ini) -> Result<LoaderConfig, ConfigFileError> {
    let mut config = LoaderConfig::default();

    let Some(section) = ini.section(Some(SECTION)) else {
        return Ok(config);
    };

    if let Some(v) = section.get("retry_count") {
        config = config.with_retry_count(parse_number(
            "retry_count",
            v,
            "must be a non-negative integer",
        )?);
    }
    if let Some(v) = section.get("retry_delay_ms") {
        let millis: u64 = parse_number(
            "retry_delay_ms",
            v,
            "must be a non-negative integer (milliseconds)",
        )?;
        config = config.with_retry_delay(Duration::from_millis(millis));
    }
    if let Some(v) = section.get("worker_threads") {
        let threads: usize = parse_number("worker_threads", v, "must be a positive integer")?;
        if threads == 0 {
            return Err(invalid("worker_threads", v, "must be a positive integer"));
        }
        config = config.with_worker_threads(threads);
    }
    if let Some(v) = section.get("debugging") {
        let debugging = parse_bool(v)
            .ok_or_else(|| invalid("debugging", v, "must be true/false, yes/no, on/off or 1/0"))?;
        config = config.with_debugging(debugging);
    }

    Ok(config)
}

fn parse_number<T: FromStr>(key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value.trim().parse().map_err(|_| invalid(key, value, reason))
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: SECTION.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a boolean value (true/false, yes/no, 1/0, on/off).
pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
