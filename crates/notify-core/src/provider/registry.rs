use std::collections::HashMap;
use std::sync::Arc;

use super::NotificationProvider;
use super::platform::{Platform, PlatformKey};

/// Static declaration of where a provider runs and what to try next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCapability {
    pub name: String,
    platforms: HashMap<PlatformKey, Option<String>>,
}

impl ProviderCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platforms: HashMap::new(),
        }
    }

    /// Declare support for `key`, falling back to `fallback` when the
    /// provider fails there.
    pub fn on(mut self, key: PlatformKey, fallback: Option<&str>) -> Self {
        self.platforms.insert(key, fallback.map(str::to_string));
        self
    }

    pub fn supported_on(&self, platform: &Platform) -> bool {
        platform.keys().iter().any(|k| self.platforms.contains_key(k))
    }

    /// The fallback declared for the most specific matching platform entry.
    pub fn fallback_on(&self, platform: &Platform) -> Option<&str> {
        platform
            .keys()
            .iter()
            .find_map(|k| self.platforms.get(k))
            .and_then(|fallback| fallback.as_deref())
    }
}

/// All registered providers plus the platform they are resolved against.
pub struct ProviderRegistry {
    platform: Platform,
    providers: HashMap<String, Arc<dyn NotificationProvider>>,
    order: Vec<String>,
}

impl ProviderRegistry {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            providers: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn NotificationProvider>) {
        let name = provider.capability().name.clone();
        if self.providers.insert(name.clone(), provider).is_none() {
            self.order.push(name);
        }
    }

    pub fn with(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn NotificationProvider>> {
        self.providers.get(name)
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|p| p.capability().supported_on(&self.platform))
    }

    pub fn fallback_for(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|p| p.capability().fallback_on(&self.platform))
    }

    /// Names of providers usable on this platform, in registration order.
    pub fn supported_providers(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(|name| self.is_supported(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_prefers_most_specific_entry() {
        let cap = ProviderCapability::new("auto")
            .on(PlatformKey::Win32Gte8, Some("toast"))
            .on(PlatformKey::Win32, Some("growl"))
            .on(PlatformKey::Linux, Some("libnotify"));

        let win8 = Platform::new([PlatformKey::Win32, PlatformKey::Win32Gte8]);
        let win7 = Platform::new([PlatformKey::Win32]);
        let mac = Platform::new([PlatformKey::Darwin]);

        assert_eq!(cap.fallback_on(&win8), Some("toast"));
        assert_eq!(cap.fallback_on(&win7), Some("growl"));
        assert_eq!(cap.fallback_on(&mac), None);
        assert!(!cap.supported_on(&mac));
    }

    #[test]
    fn specific_entry_without_fallback_ends_the_chain() {
        let cap = ProviderCapability::new("toast")
            .on(PlatformKey::Win32Gte8, None)
            .on(PlatformKey::Win32, Some("growl"));
        let win8 = Platform::new([PlatformKey::Win32, PlatformKey::Win32Gte8]);
        assert_eq!(cap.fallback_on(&win8), None);
    }
}
