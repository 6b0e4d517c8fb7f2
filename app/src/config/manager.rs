//! SettingsManager: DB-backed settings with defaults, migration, and feature status.

use std::collections::HashMap;

use notifier_db::Database;

use super::defaults::{DEFAULT_SETTINGS, SettingDef};
use super::validation::validate_setting;
use super::{FeatureStatus, SettingInfo, SettingType};

/// Wraps [`Database`] to provide high-level settings operations.
pub struct SettingsManager {
    db: Database,
}

fn setting_type(def: Option<&SettingDef>) -> SettingType {
    match def {
        Some(d) if d.secret => SettingType::Secret,
        _ => SettingType::Normal,
    }
}

impl SettingsManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value. Falls back to default if not in DB.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.db.get_setting(key)? {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        let def = DEFAULT_SETTINGS
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("unknown setting key: {key}"))?;

        validate_setting(key, value).map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;

        self.db.set_setting(key, value, setting_type(Some(def)).as_str())?;
        Ok(())
    }

    /// Validate every entry first, then write them in one transaction.
    pub fn set_settings(&self, values: &HashMap<String, String>) -> Result<usize, anyhow::Error> {
        let mut batch = HashMap::with_capacity(values.len());
        for (key, value) in values {
            let def = DEFAULT_SETTINGS
                .get(key.as_str())
                .ok_or_else(|| anyhow::anyhow!("unknown setting key: {key}"))?;
            validate_setting(key, value).map_err(|e| anyhow::anyhow!("{key}: {e}"))?;
            batch.insert(key.clone(), (value.clone(), setting_type(Some(def)).as_str()));
        }
        self.db.update_settings_bulk(&batch)?;
        Ok(batch.len())
    }

    /// Restore the given keys (all keys when empty) to their defaults.
    pub fn reset_settings(&self, keys: &[String]) -> Result<usize, anyhow::Error> {
        let targets: Vec<&SettingDef> = if keys.is_empty() {
            DEFAULT_SETTINGS.values().collect()
        } else {
            keys.iter()
                .filter_map(|k| DEFAULT_SETTINGS.get(k.as_str()))
                .collect()
        };

        let batch: HashMap<String, (String, &str)> = targets
            .iter()
            .map(|def| {
                (
                    def.key.to_string(),
                    (def.default.to_string(), setting_type(Some(*def)).as_str()),
                )
            })
            .collect();
        self.db.update_settings_bulk(&batch)?;
        Ok(batch.len())
    }

    /// Get all settings, filling in defaults for missing keys.
    pub fn get_all_settings(&self) -> Result<HashMap<String, SettingInfo>, anyhow::Error> {
        let db_settings = self.db.get_all_settings()?;
        let mut result = HashMap::new();

        for (key, value) in &db_settings {
            let def = DEFAULT_SETTINGS.get(key.as_str());
            result.insert(
                key.clone(),
                SettingInfo {
                    key: key.clone(),
                    value: value.clone(),
                    setting_type: setting_type(def),
                    required: def.is_some_and(|d| d.required),
                    description: def.map_or(String::new(), |d| d.description.to_string()),
                    has_value: !value.is_empty(),
                },
            );
        }

        for (key, def) in DEFAULT_SETTINGS.iter() {
            if !result.contains_key(*key) {
                result.insert(
                    key.to_string(),
                    SettingInfo {
                        key: key.to_string(),
                        value: def.default.to_string(),
                        setting_type: setting_type(Some(def)),
                        required: def.required,
                        description: def.description.to_string(),
                        has_value: !def.default.is_empty(),
                    },
                );
            }
        }

        Ok(result)
    }

    /// Initialize default settings in DB (skip existing).
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            self.db.set_setting(key, def.default, setting_type(Some(def)).as_str())?;
        }
        Ok(())
    }

    /// Migrate settings from environment variables to DB (one-time).
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        let mut migrated = 0u32;
        for (key, def) in DEFAULT_SETTINGS.iter() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            let Ok(env_val) = std::env::var(key) else {
                continue;
            };
            if env_val.is_empty() {
                continue;
            }
            if let Err(e) = validate_setting(key, &env_val) {
                tracing::warn!("Ignoring env setting {key}: {e}");
                continue;
            }
            self.db.set_setting(key, &env_val, setting_type(Some(def)).as_str())?;
            tracing::info!("Migrated setting from env: {key}");
            migrated += 1;
        }
        if migrated > 0 {
            tracing::info!("Migration completed: {migrated} settings migrated");
            if has_secret_in_env() {
                tracing::warn!(
                    "SECURITY WARNING: Sensitive data in env vars. \
                     Remove from .env after confirming migration."
                );
            }
        }
        Ok(migrated)
    }

    /// Check which features are properly configured.
    pub fn check_feature_status(&self) -> Result<FeatureStatus, anyhow::Error> {
        let mut status = FeatureStatus {
            twitch_configured: true,
            notifications_enabled: self.get_setting("NOTIFY_ENABLED")? == "true",
            missing_settings: Vec::new(),
            warnings: Vec::new(),
        };

        for key in ["CLIENT_ID", "CLIENT_SECRET", "TWITCH_USER_ID"] {
            if self.get_setting(key).unwrap_or_default().is_empty() {
                status.missing_settings.push(key.to_string());
                status.twitch_configured = false;
            }
        }

        if self.db.get_latest_token()?.is_none() {
            status
                .warnings
                .push("Not logged in to Twitch - open /auth to authorize".into());
        }
        if !status.notifications_enabled {
            status.warnings.push("NOTIFY_ENABLED is off - no notifications are shown".into());
        }

        Ok(status)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

fn has_secret_in_env() -> bool {
    ["CLIENT_SECRET", "CLIENT_ID"]
        .iter()
        .any(|k| std::env::var(k).is_ok_and(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SettingsManager {
        SettingsManager::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let sm = manager();
        assert_eq!(sm.get_setting("NOTIFY_PROVIDER").unwrap(), "auto");
        assert!(sm.get_setting("UNKNOWN").is_err());

        let all = sm.get_all_settings().unwrap();
        assert_eq!(all.len(), DEFAULT_SETTINGS.len());
        assert_eq!(all["CLIENT_SECRET"].setting_type, SettingType::Secret);
        assert!(!all["CLIENT_ID"].has_value);
    }

    #[test]
    fn set_setting_validates() {
        let sm = manager();
        sm.set_setting("NOTIFY_GROUPING", "false").unwrap();
        assert_eq!(sm.get_setting("NOTIFY_GROUPING").unwrap(), "false");

        assert!(sm.set_setting("NOTIFY_GROUPING", "maybe").is_err());
        assert!(sm.set_setting("NOT_A_KEY", "1").is_err());
    }

    #[test]
    fn bulk_update_is_all_or_nothing() {
        let sm = manager();
        let mut values = HashMap::new();
        values.insert("NOTIFY_PAGE_SIZE".to_string(), "50".to_string());
        values.insert("NOTIFY_CLICK".to_string(), "teleport".to_string());
        assert!(sm.set_settings(&values).is_err());
        assert_eq!(sm.get_setting("NOTIFY_PAGE_SIZE").unwrap(), "100");

        values.insert("NOTIFY_CLICK".to_string(), "stream".to_string());
        assert_eq!(sm.set_settings(&values).unwrap(), 2);
        assert_eq!(sm.get_setting("NOTIFY_CLICK").unwrap(), "stream");
    }

    #[test]
    fn reset_restores_defaults() {
        let sm = manager();
        sm.set_setting("NOTIFY_PROVIDER", "growl").unwrap();
        sm.set_setting("NOTIFY_ALL", "false").unwrap();

        assert_eq!(sm.reset_settings(&["NOTIFY_PROVIDER".to_string()]).unwrap(), 1);
        assert_eq!(sm.get_setting("NOTIFY_PROVIDER").unwrap(), "auto");
        assert_eq!(sm.get_setting("NOTIFY_ALL").unwrap(), "false");

        assert_eq!(sm.reset_settings(&[]).unwrap(), DEFAULT_SETTINGS.len());
        assert_eq!(sm.get_setting("NOTIFY_ALL").unwrap(), "true");
    }

    #[test]
    fn feature_status_reports_missing_credentials() {
        let sm = manager();
        sm.initialize_defaults().unwrap();
        let status = sm.check_feature_status().unwrap();
        assert!(!status.twitch_configured);
        assert!(status.notifications_enabled);
        assert!(status.missing_settings.contains(&"CLIENT_ID".to_string()));
        assert!(!status.warnings.is_empty());
    }
}
