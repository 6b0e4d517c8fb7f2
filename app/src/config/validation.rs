//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

use notify_core::ClickAction;

use crate::providers::PROVIDER_NAMES;

static RE_NUMERIC_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static RE_CLIENT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]+$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "CLIENT_ID" | "CLIENT_SECRET" => {
            if !value.is_empty() && !RE_CLIENT_ID.is_match(value) {
                return Err("must be alphanumeric".into());
            }
        }
        "TWITCH_USER_ID" => {
            if !value.is_empty() && !RE_NUMERIC_ID.is_match(value) {
                return Err("must be a numeric user id".into());
            }
        }
        "SERVER_PORT" => validate_int_range(value, 1, 65535)?,
        "NOTIFY_PROVIDER" => {
            if !PROVIDER_NAMES.contains(&value) {
                return Err(format!("must be one of {}", PROVIDER_NAMES.join(", ")));
            }
        }
        "NOTIFY_CLICK" | "NOTIFY_CLICK_GROUP" => {
            value.parse::<ClickAction>()?;
        }
        "NOTIFY_PAGE_SIZE" => validate_int_range(value, 1, 100)?,
        "NOTIFY_INTERVAL_MS" => validate_int_range(value, 10_000, 3_600_000)?,
        "NOTIFY_RETRY_INTERVAL_MS" => validate_int_range(value, 100, 600_000)?,
        "NOTIFY_ERROR_INTERVAL_MS" => validate_int_range(value, 10_000, 3_600_000)?,
        "NOTIFY_REQUEST_FAILS" => validate_int_range(value, 0, 100)?,
        "NOTIFY_CHANNEL_FAILS" => validate_int_range(value, 0, 100)?,
        "NOTIFY_ICON_CACHE_HOURS" => validate_int_range(value, 1, 24 * 365)?,
        k if is_boolean_setting(k) => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

fn is_boolean_setting(key: &str) -> bool {
    matches!(
        key,
        "NOTIFY_ENABLED" | "NOTIFY_ALL" | "NOTIFY_GROUPING" | "NOTIFY_BADGE_LABEL"
    )
}
