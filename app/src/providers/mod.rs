//! Built-in notification back-ends.
//!
//! `auto` never works itself; it only points at the best back-end of each
//! platform. Native back-ends go through the desktop notification service and
//! fall back to Growl, which runs a client program. Growl falls back to the
//! in-browser `rich` notifications pushed over WebSocket.

mod auto;
mod command;
mod desktop;
mod growl;
mod rich;

use std::sync::Arc;

use notify_core::{Platform, ProviderRegistry};
use tokio::sync::broadcast;

pub use auto::AutoProvider;
pub use command::CommandProvider;
pub use desktop::{DesktopProvider, libnotify, notification_center, toast};
pub use growl::{GrowlFlavor, growl};
pub use rich::{ClickRegistry, RichProvider};

pub const AUTO: &str = "auto";
pub const TOAST: &str = "toast";
pub const NOTIFICATION_CENTER: &str = "notificationcenter";
pub const LIBNOTIFY: &str = "libnotify";
pub const GROWL: &str = "growl";
pub const RICH: &str = "rich";

/// Every provider name accepted by `NOTIFY_PROVIDER`.
pub const PROVIDER_NAMES: &[&str] = &[AUTO, TOAST, NOTIFICATION_CENTER, LIBNOTIFY, GROWL, RICH];

/// Registry of all built-in providers resolved against `platform`.
pub fn builtin_registry(
    platform: Platform,
    ws_tx: broadcast::Sender<String>,
    clicks: ClickRegistry,
) -> ProviderRegistry {
    ProviderRegistry::new(platform)
        .with(Arc::new(AutoProvider::new()))
        .with(Arc::new(toast()))
        .with(Arc::new(notification_center()))
        .with(Arc::new(libnotify()))
        .with(Arc::new(growl(GrowlFlavor::for_os(std::env::consts::OS))))
        .with(Arc::new(RichProvider::new(ws_tx, clicks)))
}

#[cfg(test)]
mod tests {
    use notify_core::PlatformKey;

    use super::*;

    fn registry(keys: &[PlatformKey]) -> ProviderRegistry {
        let (tx, _) = broadcast::channel(4);
        builtin_registry(Platform::new(keys.iter().copied()), tx, ClickRegistry::new())
    }

    fn chain(registry: &ProviderRegistry, start: &str) -> Vec<String> {
        let mut names = vec![start.to_string()];
        let mut current = start.to_string();
        while let Some(next) = registry.fallback_for(&current) {
            names.push(next.to_string());
            current = next.to_string();
        }
        names
    }

    #[test]
    fn linux_chain() {
        let r = registry(&[PlatformKey::Linux]);
        assert_eq!(chain(&r, AUTO), vec![AUTO, LIBNOTIFY, GROWL, RICH]);
        assert_eq!(r.supported_providers(), vec![AUTO, LIBNOTIFY, GROWL, RICH]);
    }

    #[test]
    fn modern_windows_prefers_toast() {
        let r = registry(&[PlatformKey::Win32, PlatformKey::Win32Gte8]);
        assert_eq!(chain(&r, AUTO), vec![AUTO, TOAST, GROWL, RICH]);
        assert!(r.is_supported(TOAST));
        assert!(!r.is_supported(LIBNOTIFY));
    }

    #[test]
    fn old_windows_skips_toast() {
        let r = registry(&[PlatformKey::Win32]);
        assert_eq!(chain(&r, AUTO), vec![AUTO, GROWL, RICH]);
        assert!(!r.is_supported(TOAST));
    }

    #[test]
    fn mac_chains() {
        let r = registry(&[PlatformKey::Darwin, PlatformKey::MountainLion]);
        assert_eq!(chain(&r, AUTO), vec![AUTO, NOTIFICATION_CENTER, GROWL, RICH]);

        let r = registry(&[PlatformKey::Darwin]);
        assert_eq!(chain(&r, AUTO), vec![AUTO, GROWL, RICH]);
    }

    #[test]
    fn provider_names_are_registered() {
        let r = registry(&[PlatformKey::Linux]);
        for name in PROVIDER_NAMES {
            assert!(r.get(name).is_some(), "{name} missing");
        }
    }
}
