use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use notifier_db::Database;
use notify_core::{
    NotifierMode, NotifyPreferences, Platform, PlatformKey, PollerConfig, RemoteStream,
};
use tokio::sync::broadcast;

use super::*;

fn stream(id: &str) -> RemoteStream {
    RemoteStream {
        channel_id: id.into(),
        channel_login: format!("login{id}"),
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
        display_name: format!("Channel {id}"),
        status_text: "live".into(),
        logo_url: None,
    }
}

/// Followed streams are `followed`; `live_stream` also knows `extra`.
struct FixedSource {
    followed: Vec<RemoteStream>,
    extra: Vec<RemoteStream>,
}

#[async_trait]
impl StreamSource for FixedSource {
    async fn followed_streams(&self, _limit: u32) -> notify_core::Result<Vec<RemoteStream>> {
        Ok(self.followed.clone())
    }

    async fn live_stream(&self, channel_id: &str) -> notify_core::Result<Option<RemoteStream>> {
        Ok(self
            .followed
            .iter()
            .chain(&self.extra)
            .find(|s| s.channel_id == channel_id)
            .cloned())
    }
}

struct Fixture {
    notifier: Notifier,
    ws_rx: broadcast::Receiver<String>,
    _icons: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let (ws_tx, ws_rx) = broadcast::channel(16);
    let icons = tempfile::tempdir().unwrap();
    let clicks = ClickRegistry::new();
    let registry = providers::builtin_registry(
        Platform::new([PlatformKey::Linux]),
        ws_tx.clone(),
        clicks.clone(),
    );
    let selector = Arc::new(ProviderSelector::new(Arc::new(registry), FallbackMemo::new()));
    let source: Arc<dyn StreamSource> = Arc::new(FixedSource {
        followed: vec![stream("1")],
        extra: vec![stream("2")],
    });

    let deps = PollerDeps {
        source: source.clone(),
        preferences: Arc::new(DbPreferences::new(Database::open_in_memory().unwrap())),
        icons: Arc::new(HttpIconCache::default()),
        clicks: Arc::new(WsClickHandler::new(ws_tx)),
        selector: selector.clone(),
        group_icon: None,
    };
    let config = PollerConfig {
        icon_dir: icons.path().to_path_buf(),
        ..PollerConfig::default()
    };
    let poller = Poller::new(config, NotifyPreferences::default(), deps);

    Fixture {
        notifier: Notifier::new(poller, selector, source, clicks),
        ws_rx,
        _icons: icons,
    }
}

fn logged_in_config() -> AppConfig {
    AppConfig {
        twitch_user_id: "1000".into(),
        ..AppConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn runs_only_when_enabled_and_logged_in() {
    let f = fixture();
    let poller = f.notifier.poller();

    f.notifier.apply_config(&AppConfig::default(), true).await;
    assert_eq!(poller.status().mode(), NotifierMode::Disabled);

    f.notifier.apply_config(&logged_in_config(), false).await;
    assert_eq!(poller.status().mode(), NotifierMode::Disabled);

    f.notifier.apply_config(&logged_in_config(), true).await;
    assert_eq!(poller.status().mode(), NotifierMode::Enabled);

    let off = AppConfig {
        notify_enabled: false,
        ..logged_in_config()
    };
    f.notifier.apply_config(&off, true).await;
    assert_eq!(poller.status().mode(), NotifierMode::Disabled);
}

#[tokio::test(start_paused = true)]
async fn settings_flow_into_running_poller() {
    let f = fixture();
    let config = AppConfig {
        notify_grouping: false,
        notify_badge_label: false,
        ..logged_in_config()
    };
    f.notifier.apply_config(&config, true).await;

    let prefs = f.notifier.poller().preferences().await;
    assert!(!prefs.grouping);
    assert!(!f.notifier.poller().status().show_badge);
}

#[tokio::test(start_paused = true)]
async fn tracks_newly_followed_live_channels() {
    let f = fixture();
    assert!(!f.notifier.track_channel("2").await.unwrap());

    f.notifier.apply_config(&logged_in_config(), true).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(f.notifier.poller().status().pending, 1);

    assert!(f.notifier.track_channel("2").await.unwrap());
    assert!(!f.notifier.track_channel("1").await.unwrap());
    assert!(!f.notifier.track_channel("3").await.unwrap());
    assert_eq!(f.notifier.poller().status().pending, 2);
}

#[tokio::test]
async fn test_notification_uses_requested_provider() {
    let mut f = fixture();

    let used = f.notifier.send_test(providers::RICH).await.unwrap();
    assert_eq!(used, providers::RICH);
    let msg: serde_json::Value = serde_json::from_str(&f.ws_rx.try_recv().unwrap()).unwrap();
    assert_eq!(msg["type"], "rich_notification");
    assert_eq!(msg["data"]["title"], TEST_TITLE);

    assert!(f.notifier.send_test("carrier-pigeon").await.is_err());
}
