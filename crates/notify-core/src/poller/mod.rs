//! The polling loop and its start/pause/reset transitions.

mod cycle;
mod state;


use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::batcher::{ClickAction, IconCache, StreamClickHandler};
use crate::filter::PreferenceLookup;
use crate::provider::ProviderSelector;
use crate::source::StreamSource;
use crate::stream::RemoteStream;

use cycle::PollerCore;
pub use state::{NotifierMode, PollerStatus};

/// Timing and tolerance settings of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub retry_interval: Duration,
    pub error_interval: Duration,
    /// Failed polls tolerated before going offline.
    pub request_failure_tolerance: u32,
    /// Polls a retained channel may be missing from before it is forgotten.
    pub channel_miss_tolerance: u32,
    pub page_size: u32,
    pub icon_dir: PathBuf,
    pub icon_retention: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            retry_interval: Duration::from_secs(1),
            error_interval: Duration::from_secs(120),
            request_failure_tolerance: 3,
            channel_miss_tolerance: 2,
            page_size: 100,
            icon_dir: std::env::temp_dir().join("stream-notifier-icons"),
            icon_retention: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// User preferences applied per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyPreferences {
    pub provider: String,
    pub allow_by_default: bool,
    pub grouping: bool,
    pub click: ClickAction,
    pub group_click: ClickAction,
    pub badge_label: bool,
}

impl Default for NotifyPreferences {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            allow_by_default: true,
            grouping: true,
            click: ClickAction::Favorites,
            group_click: ClickAction::Favorites,
            badge_label: true,
        }
    }
}

/// Collaborators the poll loop depends on.
pub struct PollerDeps {
    pub source: Arc<dyn StreamSource>,
    pub preferences: Arc<dyn PreferenceLookup>,
    pub icons: Arc<dyn IconCache>,
    pub clicks: Arc<dyn StreamClickHandler>,
    pub selector: Arc<ProviderSelector>,
    pub group_icon: Option<PathBuf>,
}

async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Drives poll cycles while the notifier is enabled and not paused.
pub struct Poller {
    core: Arc<tokio::sync::Mutex<PollerCore>>,
    schedule: Mutex<Option<CancellationToken>>,
    status: Arc<watch::Sender<PollerStatus>>,
}

impl Poller {
    pub fn new(config: PollerConfig, prefs: NotifyPreferences, deps: PollerDeps) -> Self {
        let status = Arc::new(watch::Sender::new(PollerStatus {
            show_badge: prefs.badge_label,
            ..PollerStatus::default()
        }));
        let core = PollerCore::new(config, prefs, deps, status.clone());
        Self {
            core: Arc::new(tokio::sync::Mutex::new(core)),
            schedule: Mutex::new(None),
            status,
        }
    }

    pub fn status(&self) -> PollerStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    /// Enable or disable notifications. Disabling also clears the pause flag.
    pub async fn set_enabled(&self, enabled: bool) {
        let was_running = self.is_running();
        self.status.send_if_modified(|s| {
            let changed = s.enabled != enabled || (!enabled && s.paused);
            s.enabled = enabled;
            if !enabled {
                s.paused = false;
            }
            changed
        });
        self.transition(was_running).await;
    }

    pub async fn set_paused(&self, paused: bool) {
        let was_running = self.is_running();
        self.status.send_if_modified(|s| {
            let changed = s.paused != paused;
            s.paused = paused;
            changed
        });
        self.transition(was_running).await;
    }

    async fn transition(&self, was_running: bool) {
        match (was_running, self.is_running()) {
            (false, true) => self.start().await,
            (true, false) => self.reset().await,
            _ => {}
        }
    }

    /// Reset, clean the icon cache and begin cycling.
    pub async fn start(&self) {
        self.reset().await;

        let token = CancellationToken::new();
        if let Some(previous) = self.replace_schedule(Some(token.clone())) {
            previous.cancel();
        }
        tokio::spawn(run(self.core.clone(), token));
        tracing::info!("Stream notifier started");
    }

    /// Cancel the pending cycle and forget all retained state.
    pub async fn reset(&self) {
        if let Some(token) = self.replace_schedule(None) {
            token.cancel();
            tracing::info!("Stream notifier stopped");
        }
        self.core.lock().await.clear();
    }

    pub async fn stop(&self) {
        self.reset().await;
    }

    pub async fn update_preferences(&self, prefs: NotifyPreferences) {
        self.core.lock().await.set_preferences(prefs);
    }

    pub async fn update_config(&self, config: PollerConfig) {
        self.core.lock().await.set_config(config);
    }

    /// Mark a live stream as already seen. Ignored while not running.
    pub async fn track(&self, stream: &RemoteStream) -> bool {
        if !self.is_running() {
            return false;
        }
        self.core.lock().await.track(stream)
    }

    pub async fn preferences(&self) -> NotifyPreferences {
        self.core.lock().await.prefs.clone()
    }

    fn replace_schedule(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        let mut schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *schedule, token)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(token) = self.replace_schedule(None) {
            token.cancel();
        }
    }
}

async fn run(core: Arc<tokio::sync::Mutex<PollerCore>>, token: CancellationToken) {
    core.lock().await.collect_icon_garbage().await;

    let mut delay = Duration::ZERO;
    loop {
        if sleep_or_cancel(&token, delay).await {
            break;
        }
        let mut core = core.lock().await;
        if token.is_cancelled() || !core.is_running() {
            break;
        }
        delay = core.cycle().await;
        tracing::debug!("Next stream poll in {}ms", delay.as_millis());
    }
}
