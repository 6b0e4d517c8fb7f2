//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, bool, bool, &'static str);

const TWITCH_DEFS: &[DefTuple] = &[
    ("CLIENT_ID", "", true, true, "Twitch application client ID"),
    ("CLIENT_SECRET", "", true, true, "Twitch application client secret"),
    ("TWITCH_USER_ID", "", false, true, "User whose followed channels are polled"),
    ("SERVER_PORT", "8090", false, false, "Control API port"),
];

const NOTIFY_DEFS: &[DefTuple] = &[
    ("NOTIFY_ENABLED", "true", false, false, "Show desktop notifications"),
    ("NOTIFY_PROVIDER", "auto", false, false, "Notification back-end"),
    ("NOTIFY_ALL", "true", false, false, "Notify for channels without a preference"),
    ("NOTIFY_GROUPING", "true", false, false, "Merge simultaneous streams into one notification"),
    ("NOTIFY_CLICK", "favorites", false, false, "Click action of single notifications"),
    ("NOTIFY_CLICK_GROUP", "favorites", false, false, "Click action of grouped notifications"),
    ("NOTIFY_BADGE_LABEL", "true", false, false, "Publish the live stream count as badge label"),
    ("NOTIFY_PAGE_SIZE", "100", false, false, "Followed streams requested per poll"),
    ("NOTIFY_INTERVAL_MS", "60000", false, false, "Poll interval"),
    ("NOTIFY_RETRY_INTERVAL_MS", "1000", false, false, "Retry interval after a failed poll"),
    ("NOTIFY_ERROR_INTERVAL_MS", "120000", false, false, "Poll interval while offline"),
    ("NOTIFY_REQUEST_FAILS", "3", false, false, "Failed polls tolerated before going offline"),
    ("NOTIFY_CHANNEL_FAILS", "2", false, false, "Polls a channel may be missing before it is forgotten"),
    ("NOTIFY_ICON_CACHE_HOURS", "168", false, false, "Channel logo cache retention"),
];

const DEF_GROUPS: &[&[DefTuple]] = &[TWITCH_DEFS, NOTIFY_DEFS];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub secret: bool,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEF_GROUPS
        .iter()
        .flat_map(|defs| defs.iter())
        .map(|&(key, default, secret, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    secret,
                    required,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
