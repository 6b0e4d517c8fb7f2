use std::fmt;

use serde::Serialize;

/// Transient per-run state of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PollState {
    pub is_first_cycle: bool,
    pub consecutive_failures: u32,
    pub error: bool,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            is_first_cycle: true,
            consecutive_failures: 0,
            error: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierMode {
    Disabled,
    Paused,
    Offline,
    Enabled,
}

impl fmt::Display for NotifierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disabled => "disabled",
            Self::Paused => "paused",
            Self::Offline => "offline",
            Self::Enabled => "enabled",
        })
    }
}

/// Observable notifier status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollerStatus {
    pub enabled: bool,
    pub paused: bool,
    pub error: bool,
    /// Channels currently considered live.
    pub pending: usize,
    pub show_badge: bool,
}

impl PollerStatus {
    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused
    }

    pub fn mode(&self) -> NotifierMode {
        if !self.enabled {
            NotifierMode::Disabled
        } else if self.paused {
            NotifierMode::Paused
        } else if self.error {
            NotifierMode::Offline
        } else {
            NotifierMode::Enabled
        }
    }

    pub fn status_text(&self) -> String {
        format!("Desktop notifications are {}", self.mode())
    }

    /// Pending count for a badge, or empty when there is nothing to show.
    pub fn badge_label(&self) -> String {
        if self.is_running() && self.show_badge && self.pending > 0 {
            self.pending.to_string()
        } else {
            String::new()
        }
    }
}
