//! Runtime application configuration loaded from DB + environment overrides.

use std::time::Duration;

use notify_core::{ClickAction, NotifyPreferences, PollerConfig};

use super::manager::SettingsManager;

/// Runtime configuration populated from the settings DB.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub twitch_user_id: String,
    pub server_port: u16,
    pub notify_enabled: bool,
    pub notify_provider: String,
    pub notify_all: bool,
    pub notify_grouping: bool,
    pub notify_click: ClickAction,
    pub notify_click_group: ClickAction,
    pub notify_badge_label: bool,
    pub page_size: u32,
    pub interval_ms: u64,
    pub retry_interval_ms: u64,
    pub error_interval_ms: u64,
    pub request_failure_tolerance: u32,
    pub channel_miss_tolerance: u32,
    pub icon_cache_hours: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            twitch_user_id: String::new(),
            server_port: 8090,
            notify_enabled: true,
            notify_provider: "auto".into(),
            notify_all: true,
            notify_grouping: true,
            notify_click: ClickAction::Favorites,
            notify_click_group: ClickAction::Favorites,
            notify_badge_label: true,
            page_size: 100,
            interval_ms: 60_000,
            retry_interval_ms: 1_000,
            error_interval_ms: 120_000,
            request_failure_tolerance: 3,
            channel_miss_tolerance: 2,
            icon_cache_hours: 168,
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager (DB-first, env overrides).
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };
        let d = Self::default();

        let mut server_port = parse_num(&g("SERVER_PORT"), d.server_port);

        // Environment variable override (backwards compatibility)
        if let Ok(v) = std::env::var("SERVER_PORT") {
            if let Ok(p) = v.parse::<u16>() {
                server_port = p;
            }
        }

        let provider = g("NOTIFY_PROVIDER");

        Ok(Self {
            client_id: g("CLIENT_ID"),
            client_secret: g("CLIENT_SECRET"),
            twitch_user_id: g("TWITCH_USER_ID"),
            server_port,
            notify_enabled: parse_bool(&g("NOTIFY_ENABLED"), d.notify_enabled),
            notify_provider: if provider.is_empty() { d.notify_provider } else { provider },
            notify_all: parse_bool(&g("NOTIFY_ALL"), d.notify_all),
            notify_grouping: parse_bool(&g("NOTIFY_GROUPING"), d.notify_grouping),
            notify_click: g("NOTIFY_CLICK").parse().unwrap_or(d.notify_click),
            notify_click_group: g("NOTIFY_CLICK_GROUP").parse().unwrap_or(d.notify_click_group),
            notify_badge_label: parse_bool(&g("NOTIFY_BADGE_LABEL"), d.notify_badge_label),
            page_size: parse_num(&g("NOTIFY_PAGE_SIZE"), d.page_size).clamp(1, 100),
            interval_ms: parse_num(&g("NOTIFY_INTERVAL_MS"), d.interval_ms),
            retry_interval_ms: parse_num(&g("NOTIFY_RETRY_INTERVAL_MS"), d.retry_interval_ms),
            error_interval_ms: parse_num(&g("NOTIFY_ERROR_INTERVAL_MS"), d.error_interval_ms),
            request_failure_tolerance: parse_num(
                &g("NOTIFY_REQUEST_FAILS"),
                d.request_failure_tolerance,
            ),
            channel_miss_tolerance: parse_num(&g("NOTIFY_CHANNEL_FAILS"), d.channel_miss_tolerance),
            icon_cache_hours: parse_num(&g("NOTIFY_ICON_CACHE_HOURS"), d.icon_cache_hours),
        })
    }

    /// Reload config from the settings manager.
    pub fn reload(&mut self, sm: &SettingsManager) -> Result<(), anyhow::Error> {
        *self = Self::load(sm)?;
        Ok(())
    }

    pub fn twitch_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.interval_ms),
            retry_interval: Duration::from_millis(self.retry_interval_ms),
            error_interval: Duration::from_millis(self.error_interval_ms),
            request_failure_tolerance: self.request_failure_tolerance,
            channel_miss_tolerance: self.channel_miss_tolerance,
            page_size: self.page_size,
            icon_retention: Duration::from_secs(self.icon_cache_hours * 60 * 60),
            ..PollerConfig::default()
        }
    }

    pub fn notify_preferences(&self) -> NotifyPreferences {
        NotifyPreferences {
            provider: self.notify_provider.clone(),
            allow_by_default: self.notify_all,
            grouping: self.notify_grouping,
            click: self.notify_click,
            group_click: self.notify_click_group,
            badge_label: self.notify_badge_label,
        }
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s {
        "true" => true,
        "false" => false,
        _ => default,
    }
}

fn parse_num<T: std::str::FromStr>(s: &str, default: T) -> T {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use notifier_db::Database;

    use super::*;

    #[test]
    fn loads_defaults_from_empty_db() {
        let sm = SettingsManager::new(Database::open_in_memory().unwrap());
        let config = AppConfig::load(&sm).unwrap();

        assert_eq!(config.notify_provider, "auto");
        assert!(config.notify_all);
        assert_eq!(config.page_size, 100);
        assert!(!config.twitch_configured());

        let poller = config.poller_config();
        assert_eq!(poller.interval, Duration::from_secs(60));
        assert_eq!(poller.retry_interval, Duration::from_secs(1));
        assert_eq!(poller.error_interval, Duration::from_secs(120));
        assert_eq!(poller.icon_retention, Duration::from_secs(7 * 24 * 60 * 60));
    }

    #[test]
    fn settings_flow_into_preferences() {
        let sm = SettingsManager::new(Database::open_in_memory().unwrap());
        sm.set_setting("NOTIFY_CLICK_GROUP", "nothing").unwrap();
        sm.set_setting("NOTIFY_GROUPING", "false").unwrap();
        sm.set_setting("NOTIFY_CHANNEL_FAILS", "5").unwrap();

        let config = AppConfig::load(&sm).unwrap();
        let prefs = config.notify_preferences();
        assert_eq!(prefs.group_click, ClickAction::Nothing);
        assert!(!prefs.grouping);
        assert_eq!(config.poller_config().channel_miss_tolerance, 5);
    }

    #[test]
    fn malformed_values_fall_back() {
        assert!(parse_bool("yes", true));
        assert_eq!(parse_num("", 7u32), 7);
        assert_eq!(parse_num("x", 7u32), 7);
        assert_eq!(parse_num("12", 7u32), 12);
    }
}
