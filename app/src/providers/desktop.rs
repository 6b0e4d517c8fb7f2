//! Native desktop notifications through `notify-rust`: Windows toasts, macOS
//! Notification Center and freedesktop notification daemons.

use std::sync::Arc;

use async_trait::async_trait;
use notify_core::{
    NotificationData, NotificationProvider, NotifyError, OnClick, PlatformKey, ProviderCapability,
    ProviderInstance, SetupData,
};
use notify_rust::Notification;
use serde_json::json;

use super::{GROWL, LIBNOTIFY, NOTIFICATION_CENTER, TOAST};

pub const APP_NAME: &str = "Stream Notifier";

/// Action id the daemon reports when the notification body is clicked.
const CLICK_ACTION: &str = "default";

/// Notification service behind a desktop back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopService {
    Toast,
    NotificationCenter,
    Libnotify,
}

impl DesktopService {
    /// Whether this build talks to the service at all.
    pub fn compiled_in(self) -> bool {
        match self {
            Self::Toast => cfg!(target_os = "windows"),
            Self::NotificationCenter => cfg!(target_os = "macos"),
            Self::Libnotify => cfg!(all(unix, not(target_os = "macos"))),
        }
    }
}

pub fn build_notification(data: &NotificationData) -> Notification {
    let mut notification = Notification::new();
    notification
        .appname(APP_NAME)
        .summary(&data.title)
        .body(&data.body);
    if let Some(icon) = &data.icon {
        notification.icon(&icon.to_string_lossy());
    }
    if data.on_click.is_some() {
        notification.action(CLICK_ACTION, "Open");
    }
    notification
}

#[cfg(all(unix, not(target_os = "macos")))]
async fn check_daemon() -> Result<(), String> {
    let info = tokio::task::spawn_blocking(notify_rust::get_server_information)
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| format!("no notification daemon: {e}"))?;
    tracing::debug!(server = %info.name, version = %info.version, "Found notification daemon");
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
async fn check_daemon() -> Result<(), String> {
    Ok(())
}

/// Show the notification; a click waits on its own thread once the daemon
/// accepted it.
#[cfg(all(unix, not(target_os = "macos")))]
fn show(notification: Notification, on_click: Option<OnClick>) -> Result<(), String> {
    let handle = notification.show().map_err(|e| e.to_string())?;
    if let Some(on_click) = on_click {
        std::thread::spawn(move || {
            handle.wait_for_action(|action| {
                if action == CLICK_ACTION {
                    on_click();
                }
            });
        });
    }
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn show(notification: Notification, _on_click: Option<OnClick>) -> Result<(), String> {
    notification.show().map(|_| ()).map_err(|e| e.to_string())
}

pub struct DesktopProvider {
    capability: ProviderCapability,
    service: DesktopService,
}

impl DesktopProvider {
    pub fn new(capability: ProviderCapability, service: DesktopService) -> Self {
        Self {
            capability,
            service,
        }
    }

    fn unavailable(&self, message: impl Into<String>) -> NotifyError {
        NotifyError::ProviderUnavailable {
            provider: self.capability.name.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl NotificationProvider for DesktopProvider {
    fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    async fn test(&self) -> notify_core::Result<SetupData> {
        if !self.service.compiled_in() {
            return Err(self.unavailable("not available on this system"));
        }
        if self.service == DesktopService::Libnotify {
            check_daemon().await.map_err(|e| self.unavailable(e))?;
        }
        Ok(json!({ "service": format!("{:?}", self.service) }))
    }

    fn create(&self, _setup: SetupData) -> notify_core::Result<Arc<dyn ProviderInstance>> {
        Ok(Arc::new(DesktopInstance {
            name: self.capability.name.clone(),
        }))
    }
}

pub struct DesktopInstance {
    name: String,
}

#[async_trait]
impl ProviderInstance for DesktopInstance {
    async fn notify(&self, data: &NotificationData) -> notify_core::Result<()> {
        let notification = build_notification(data);
        let on_click = data.on_click.clone();
        let failed = |message: String| NotifyError::ProviderFailed {
            provider: self.name.clone(),
            message,
        };

        tokio::task::spawn_blocking(move || show(notification, on_click))
            .await
            .map_err(|e| failed(e.to_string()))?
            .map_err(failed)
    }
}

pub fn toast() -> DesktopProvider {
    DesktopProvider::new(
        ProviderCapability::new(TOAST).on(PlatformKey::Win32Gte8, Some(GROWL)),
        DesktopService::Toast,
    )
}

pub fn notification_center() -> DesktopProvider {
    DesktopProvider::new(
        ProviderCapability::new(NOTIFICATION_CENTER).on(PlatformKey::MountainLion, Some(GROWL)),
        DesktopService::NotificationCenter,
    )
}

pub fn libnotify() -> DesktopProvider {
    DesktopProvider::new(
        ProviderCapability::new(LIBNOTIFY).on(PlatformKey::Linux, Some(GROWL)),
        DesktopService::Libnotify,
    )
}
