//! Notification providers: capability declarations, platform-aware registry
//! and the fallback-chasing selector.

mod platform;
mod registry;
mod selector;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

pub use platform::{Platform, PlatformKey};
pub use registry::{ProviderCapability, ProviderRegistry};
pub use selector::{FallbackMemo, ProviderSelector};

/// Data produced by a successful provider test and handed to its constructor.
pub type SetupData = serde_json::Value;

/// Callback invoked when the user clicks a notification.
pub type OnClick = Arc<dyn Fn() + Send + Sync>;

/// One notification to render.
#[derive(Clone, Default)]
pub struct NotificationData {
    pub title: String,
    pub body: String,
    pub icon: Option<PathBuf>,
    pub on_click: Option<OnClick>,
}

impl NotificationData {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn click(&self) {
        if let Some(on_click) = &self.on_click {
            on_click();
        }
    }
}

impl fmt::Debug for NotificationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationData")
            .field("title", &self.title)
            .field("body", &self.body)
            .field("icon", &self.icon)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

/// A notification back-end plugin.
///
/// `test` checks whether the back-end works on this machine; `create` builds
/// a long-lived instance from the data a successful test produced.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    fn capability(&self) -> &ProviderCapability;

    async fn test(&self) -> Result<SetupData>;

    fn create(&self, setup: SetupData) -> Result<Arc<dyn ProviderInstance>>;
}

/// A constructed provider able to render notifications.
#[async_trait]
pub trait ProviderInstance: Send + Sync {
    async fn notify(&self, data: &NotificationData) -> Result<()>;
}
