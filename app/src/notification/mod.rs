//! Notification system wiring: builds the stream poller on top of the
//! Twitch session, the SQLite preferences and the built-in providers.

pub mod click;

use std::sync::Arc;

use notify_core::{
    FallbackMemo, NotificationData, NotifyError, Poller, PollerDeps, ProviderSelector,
    StreamSource,
};

use crate::app::SharedState;
use crate::config::AppConfig;
use crate::platform;
use crate::providers::{self, ClickRegistry};
use crate::services::channel_prefs::DbPreferences;
use crate::services::followed_streams::FollowedStreams;
use crate::services::icon_cache::HttpIconCache;

use click::WsClickHandler;

const TEST_TITLE: &str = "Stream Notifier";
const TEST_BODY: &str = "Desktop notifications are working";

pub struct Notifier {
    poller: Poller,
    selector: Arc<ProviderSelector>,
    source: Arc<dyn StreamSource>,
    clicks: ClickRegistry,
}

impl Notifier {
    pub async fn build(state: &SharedState) -> Self {
        let platform = platform::detect().await;
        let clicks = ClickRegistry::new();
        let registry =
            providers::builtin_registry(platform, state.ws_sender().clone(), clicks.clone());
        tracing::info!(
            providers = ?registry.supported_providers(),
            "Notification providers registered"
        );
        let selector = Arc::new(ProviderSelector::new(Arc::new(registry), FallbackMemo::new()));

        let source: Arc<dyn StreamSource> =
            Arc::new(FollowedStreams::new(state.session().clone()));
        let group_icon = Some(state.data_dir().join("icon.png")).filter(|p| p.is_file());
        let deps = PollerDeps {
            source: source.clone(),
            preferences: Arc::new(DbPreferences::new(state.db().clone())),
            icons: Arc::new(HttpIconCache::default()),
            clicks: Arc::new(WsClickHandler::new(state.ws_sender().clone())),
            selector: selector.clone(),
            group_icon,
        };

        let (config, prefs) = {
            let config = state.config().await;
            (config.poller_config(), config.notify_preferences())
        };
        Self::new(Poller::new(config, prefs, deps), selector, source, clicks)
    }

    pub fn new(
        poller: Poller,
        selector: Arc<ProviderSelector>,
        source: Arc<dyn StreamSource>,
        clicks: ClickRegistry,
    ) -> Self {
        Self {
            poller,
            selector,
            source,
            clicks,
        }
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn clicks(&self) -> &ClickRegistry {
        &self.clicks
    }

    /// Push the current settings into the poller and start or stop it.
    pub async fn apply_config(&self, config: &AppConfig, logged_in: bool) {
        self.poller.update_config(config.poller_config()).await;
        self.poller.update_preferences(config.notify_preferences()).await;

        let enabled = config.notify_enabled && logged_in && !config.twitch_user_id.is_empty();
        self.poller.set_enabled(enabled).await;
    }

    /// Show a test notification. Only `auto` may fall back to another provider.
    pub async fn send_test(&self, provider: &str) -> Result<String, NotifyError> {
        let data = NotificationData::new(TEST_TITLE, TEST_BODY);
        let allow_fallback = provider == providers::AUTO;
        let used = self.selector.notify(provider, &data, allow_fallback).await?;
        tracing::info!("Test notification sent via {used}");
        Ok(used)
    }

    /// Mark a channel the user just followed as already seen, so the next
    /// poll does not announce it. Returns whether it was live and tracked.
    pub async fn track_channel(&self, channel_id: &str) -> Result<bool, NotifyError> {
        if !self.poller.is_running() {
            return Ok(false);
        }
        match self.source.live_stream(channel_id).await? {
            Some(stream) => Ok(self.poller.track(&stream).await),
            None => Ok(false),
        }
    }
}

/// Build the notification system and start it if configured.
pub async fn initialize(state: &SharedState) {
    let notifier = Arc::new(Notifier::build(state).await);
    if !state.set_notifier(notifier) {
        tracing::warn!("Notification system already initialized");
        return;
    }
    refresh(state).await;
}

/// Re-apply settings and login state to the running notification system.
pub async fn refresh(state: &SharedState) {
    let Some(notifier) = state.notifier() else {
        return;
    };
    let logged_in = match state.session().has_token() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Failed to read Twitch token: {e}");
            false
        }
    };
    let config = state.config().await.clone();
    notifier.apply_config(&config, logged_in).await;
}

#[cfg(test)]
mod tests;
