use std::sync::Arc;

use async_trait::async_trait;
use notify_core::{
    NotificationProvider, NotifyError, PlatformKey, ProviderCapability, ProviderInstance, SetupData,
};

use super::{AUTO, GROWL, LIBNOTIFY, NOTIFICATION_CENTER, TOAST};

/// Placeholder that always defers to the platform's preferred back-end.
pub struct AutoProvider {
    capability: ProviderCapability,
}

impl AutoProvider {
    pub fn new() -> Self {
        Self {
            capability: ProviderCapability::new(AUTO)
                .on(PlatformKey::Win32Gte8, Some(TOAST))
                .on(PlatformKey::Win32, Some(GROWL))
                .on(PlatformKey::MountainLion, Some(NOTIFICATION_CENTER))
                .on(PlatformKey::Darwin, Some(GROWL))
                .on(PlatformKey::Linux, Some(LIBNOTIFY)),
        }
    }

    fn unavailable() -> NotifyError {
        NotifyError::ProviderUnavailable {
            provider: AUTO.into(),
            message: "resolves to a platform back-end".into(),
        }
    }
}

impl Default for AutoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationProvider for AutoProvider {
    fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    async fn test(&self) -> notify_core::Result<SetupData> {
        Err(Self::unavailable())
    }

    fn create(&self, _setup: SetupData) -> notify_core::Result<Arc<dyn ProviderInstance>> {
        Err(Self::unavailable())
    }
}
