//! Click actions forwarded to WebSocket clients, which open the target URL.

use notify_core::{ClickAction, RemoteStream, StreamClickHandler};
use tokio::sync::broadcast;

use crate::events::{self, NotificationClickPayload};

const TWITCH_BASE: &str = "https://www.twitch.tv";

/// URL a click action leads to, if any.
pub fn click_url(action: ClickAction, stream: &RemoteStream) -> Option<String> {
    match action {
        ClickAction::Nothing => None,
        ClickAction::Favorites => Some(format!("{TWITCH_BASE}/directory/following/live")),
        ClickAction::Stream => Some(format!("{TWITCH_BASE}/{}", stream.channel_login)),
        ClickAction::StreamChat => Some(format!(
            "{TWITCH_BASE}/popout/{}/chat",
            stream.channel_login
        )),
    }
}

pub struct WsClickHandler {
    ws_tx: broadcast::Sender<String>,
}

impl WsClickHandler {
    pub fn new(ws_tx: broadcast::Sender<String>) -> Self {
        Self { ws_tx }
    }
}

impl StreamClickHandler for WsClickHandler {
    fn on_click(&self, action: ClickAction, stream: &RemoteStream) {
        let Some(url) = click_url(action, stream) else {
            return;
        };
        let per_channel = action != ClickAction::Favorites;
        tracing::debug!(action = %action, "Notification clicked: {url}");
        events::broadcast(
            &self.ws_tx,
            events::NOTIFICATION_CLICK,
            &NotificationClickPayload {
                action: action.to_string(),
                channel_id: per_channel.then(|| stream.channel_id.clone()),
                channel_login: per_channel.then(|| stream.channel_login.clone()),
                url,
            },
        );
    }
}
