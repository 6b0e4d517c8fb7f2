use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::state::{PollState, PollerStatus};
use super::{NotifyPreferences, PollerConfig, PollerDeps};
use crate::batcher::{BatchOptions, IconCache, NotificationBatcher};
use crate::filter::ChannelFilter;
use crate::provider::{NotificationData, ProviderSelector};
use crate::reconcile::ReconciliationEngine;
use crate::source::StreamSource;
use crate::stream::RemoteStream;
use crate::{NotifyError, Result};

/// Everything one poll cycle touches. Guarded by the driver's mutex so only
/// one cycle runs at a time.
pub(crate) struct PollerCore {
    pub(crate) config: PollerConfig,
    pub(crate) prefs: NotifyPreferences,
    source: Arc<dyn StreamSource>,
    filter: ChannelFilter,
    batcher: NotificationBatcher,
    selector: Arc<ProviderSelector>,
    icons: Arc<dyn IconCache>,
    pub(crate) engine: ReconciliationEngine,
    pub(crate) state: PollState,
    pub(crate) status: Arc<watch::Sender<PollerStatus>>,
}

impl PollerCore {
    pub(crate) fn new(
        config: PollerConfig,
        prefs: NotifyPreferences,
        deps: PollerDeps,
        status: Arc<watch::Sender<PollerStatus>>,
    ) -> Self {
        let batcher = NotificationBatcher::new(
            deps.icons.clone(),
            deps.clicks,
            config.icon_dir.clone(),
            deps.group_icon,
        );
        Self {
            engine: ReconciliationEngine::new(config.channel_miss_tolerance),
            filter: ChannelFilter::new(deps.preferences),
            source: deps.source,
            selector: deps.selector,
            icons: deps.icons,
            batcher,
            config,
            prefs,
            state: PollState::default(),
            status,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }

    /// Forget retained streams and transient state.
    pub(crate) fn clear(&mut self) {
        self.engine.reset();
        self.state = PollState::default();
        self.publish();
    }

    pub(crate) async fn collect_icon_garbage(&self) {
        let dir = &self.config.icon_dir;
        if let Err(e) = self
            .icons
            .collect_garbage(dir, self.config.icon_retention)
            .await
        {
            tracing::debug!("Icon cache cleanup skipped for {}: {e}", dir.display());
        }
    }

    /// Run one cycle and return the delay before the next one.
    pub(crate) async fn cycle(&mut self) -> Duration {
        match self.poll_once().await {
            Ok(fired) => {
                if fired > 0 {
                    tracing::info!("Sent {fired} stream notification(s)");
                }
                self.on_success()
            }
            Err(e) => self.on_failure(e),
        }
    }

    async fn poll_once(&mut self) -> Result<usize> {
        let polled = self.source.followed_streams(self.config.page_size).await?;
        let first_cycle = std::mem::replace(&mut self.state.is_first_cycle, false);

        let new_streams = self.engine.reconcile(polled, first_cycle);
        self.publish();

        let streams = self
            .filter
            .filter(new_streams, self.prefs.allow_by_default)
            .await?;

        let options = BatchOptions {
            grouping: self.prefs.grouping,
            click: self.prefs.click,
            group_click: self.prefs.group_click,
        };
        let requests = self.batcher.prepare(streams, &options).await;

        self.deliver(&requests).await
    }

    /// Show every request. A failed notification does not hold back the
    /// others; the cycle fails only when none could be shown.
    async fn deliver(&self, requests: &[NotificationData]) -> Result<usize> {
        let mut shown = 0;
        let mut first_error = None;
        for data in requests {
            match self.selector.notify(&self.prefs.provider, data, true).await {
                Ok(_) => shown += 1,
                Err(e) => {
                    tracing::warn!(title = %data.title, "Failed to show notification: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if shown == 0 => Err(e),
            _ => Ok(shown),
        }
    }

    fn on_success(&mut self) -> Duration {
        self.state.consecutive_failures = 0;
        self.state.error = false;
        self.publish();
        self.config.interval
    }

    fn on_failure(&mut self, err: NotifyError) -> Duration {
        self.state.consecutive_failures += 1;
        let failures = self.state.consecutive_failures;

        if failures > self.config.request_failure_tolerance {
            tracing::warn!("Stream polling failed {failures} times, going offline: {err}");
            self.engine.reset();
            self.state = PollState {
                error: true,
                ..PollState::default()
            };
            self.publish();
            self.config.error_interval
        } else {
            tracing::debug!("Stream polling failed (attempt {failures}), retrying: {err}");
            self.config.retry_interval
        }
    }

    pub(crate) fn track(&mut self, stream: &RemoteStream) -> bool {
        let added = self.engine.track(stream);
        if added {
            self.publish();
        }
        added
    }

    pub(crate) fn set_preferences(&mut self, prefs: NotifyPreferences) {
        self.prefs = prefs;
        self.publish();
    }

    pub(crate) fn set_config(&mut self, config: PollerConfig) {
        self.engine.set_miss_tolerance(config.channel_miss_tolerance);
        self.batcher.set_icon_dir(config.icon_dir.clone());
        self.config = config;
    }

    fn publish(&self) {
        let pending = self.engine.len();
        let error = self.state.error;
        let show_badge = self.prefs.badge_label;
        self.status.send_if_modified(|status| {
            let changed = status.pending != pending
                || status.error != error
                || status.show_badge != show_badge;
            status.pending = pending;
            status.error = error;
            status.show_badge = show_badge;
            changed
        });
    }
}
