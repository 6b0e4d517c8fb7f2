//! WebSocket event names and payloads.
//!
//! Every message is a JSON object `{ "type": <event>, "data": <payload> }`
//! pushed to all connected clients.

use notify_core::PollerStatus;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;

// -- Event name constants --

pub const NOTIFICATION_STATUS: &str = "notification_status";
pub const BADGE_LABEL: &str = "badge_label";
pub const NOTIFICATION_CLICK: &str = "notification_click";
pub const RICH_NOTIFICATION: &str = "rich_notification";
pub const AUTH_SUCCESS: &str = "auth_success";
pub const SETTINGS_UPDATED: &str = "settings_updated";

// -- Payload types --

#[derive(Debug, Clone, Serialize)]
pub struct NotificationStatusPayload {
    pub mode: String,
    pub text: String,
    pub enabled: bool,
    pub paused: bool,
    pub error: bool,
    pub pending: usize,
}

impl From<&PollerStatus> for NotificationStatusPayload {
    fn from(status: &PollerStatus) -> Self {
        Self {
            mode: status.mode().to_string(),
            text: status.status_text(),
            enabled: status.enabled,
            paused: status.paused,
            error: status.error,
            pending: status.pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeLabelPayload {
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickPayload {
    pub action: String,
    pub channel_id: Option<String>,
    pub channel_login: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RichNotificationPayload {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub clickable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSuccessPayload {
    pub authenticated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsUpdatedPayload {
    pub source: String,
    pub count: usize,
}

/// Serialize and push an event to every WebSocket client.
pub fn broadcast<T: Serialize>(tx: &broadcast::Sender<String>, event: &str, data: &T) {
    let msg = json!({ "type": event, "data": data });
    if tx.send(msg.to_string()).is_err() {
        tracing::debug!("No WebSocket clients for {event}");
    }
}
