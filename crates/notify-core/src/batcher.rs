//! Turns newly-live streams into notification requests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::provider::{NotificationData, OnClick};
use crate::stream::RemoteStream;

pub const GROUP_TITLE: &str = "Some of your favorites have started streaming";

/// What a notification click does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    Nothing,
    #[default]
    Favorites,
    Stream,
    StreamChat,
}

impl ClickAction {
    pub const ALL: [ClickAction; 4] = [
        ClickAction::Nothing,
        ClickAction::Favorites,
        ClickAction::Stream,
        ClickAction::StreamChat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Favorites => "favorites",
            Self::Stream => "stream",
            Self::StreamChat => "stream_chat",
        }
    }
}

impl fmt::Display for ClickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClickAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown click action: {s}"))
    }
}

/// Local copies of channel logos.
#[async_trait]
pub trait IconCache: Send + Sync {
    /// Download `url` into `dir` (created if needed) and return the local path.
    async fn fetch(&self, url: &str, dir: &Path) -> Result<PathBuf>;

    /// Remove files in `dir` older than `max_age`.
    async fn collect_garbage(&self, dir: &Path, max_age: Duration) -> Result<()>;
}

/// Performs a click action for a stream.
pub trait StreamClickHandler: Send + Sync {
    fn on_click(&self, action: ClickAction, stream: &RemoteStream);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub grouping: bool,
    pub click: ClickAction,
    pub group_click: ClickAction,
}

pub struct NotificationBatcher {
    icons: Arc<dyn IconCache>,
    clicks: Arc<dyn StreamClickHandler>,
    icon_dir: PathBuf,
    group_icon: Option<PathBuf>,
}

impl NotificationBatcher {
    pub fn new(
        icons: Arc<dyn IconCache>,
        clicks: Arc<dyn StreamClickHandler>,
        icon_dir: PathBuf,
        group_icon: Option<PathBuf>,
    ) -> Self {
        Self {
            icons,
            clicks,
            icon_dir,
            group_icon,
        }
    }

    pub fn set_icon_dir(&mut self, icon_dir: PathBuf) {
        self.icon_dir = icon_dir;
    }

    pub async fn prepare(
        &self,
        streams: Vec<RemoteStream>,
        options: &BatchOptions,
    ) -> Vec<NotificationData> {
        match streams.len() {
            0 => Vec::new(),
            n if n > 1 && options.grouping => vec![self.group(streams, options.group_click)],
            _ => self.singles(streams, options.click).await,
        }
    }

    fn group(&self, streams: Vec<RemoteStream>, action: ClickAction) -> NotificationData {
        let body = streams
            .iter()
            .map(|s| s.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let on_click = (action != ClickAction::Nothing).then(|| {
            let clicks = self.clicks.clone();
            let handler: OnClick = Arc::new(move || {
                for stream in &streams {
                    clicks.on_click(action, stream);
                }
            });
            handler
        });

        NotificationData {
            title: GROUP_TITLE.to_string(),
            body,
            icon: self.group_icon.clone(),
            on_click,
        }
    }

    async fn singles(&self, streams: Vec<RemoteStream>, action: ClickAction) -> Vec<NotificationData> {
        let icons = join_all(streams.iter().map(|s| self.icon_for(s))).await;

        streams
            .into_iter()
            .zip(icons)
            .map(|(stream, icon)| {
                let title = format!("{} has started streaming", stream.display_name);
                let body = stream.status_text.clone();
                let on_click = (action != ClickAction::Nothing).then(|| {
                    let clicks = self.clicks.clone();
                    let handler: OnClick = Arc::new(move || clicks.on_click(action, &stream));
                    handler
                });
                NotificationData {
                    title,
                    body,
                    icon,
                    on_click,
                }
            })
            .collect()
    }

    async fn icon_for(&self, stream: &RemoteStream) -> Option<PathBuf> {
        let url = stream.logo_url.as_deref()?;
        match self.icons.fetch(url, &self.icon_dir).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Icon for {} unavailable: {e}", stream.channel_id);
                None
            }
        }
    }
}
