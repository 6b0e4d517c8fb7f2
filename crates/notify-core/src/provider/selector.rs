use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{NotificationData, ProviderInstance, ProviderRegistry, SetupData};
use crate::{NotifyError, Result};

/// Requested provider name → provider that actually worked, for this session.
#[derive(Debug, Clone, Default)]
pub struct FallbackMemo {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl FallbackMemo {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, requested: &str) -> Option<String> {
        self.lock().get(requested).cloned()
    }

    pub fn record(&self, requested: &str, actual: &str) {
        self.lock().insert(requested.to_string(), actual.to_string());
    }

    pub fn entries(&self) -> HashMap<String, String> {
        self.lock().clone()
    }
}

/// Resolves a requested provider to one that works and renders through it.
pub struct ProviderSelector {
    registry: Arc<ProviderRegistry>,
    memo: FallbackMemo,
    instances: Mutex<HashMap<String, Arc<dyn ProviderInstance>>>,
}

impl ProviderSelector {
    pub fn new(registry: Arc<ProviderRegistry>, memo: FallbackMemo) -> Self {
        Self {
            registry,
            memo,
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn memo(&self) -> &FallbackMemo {
        &self.memo
    }

    /// Show `data` through `requested`, walking the platform fallback chain
    /// when a provider's test fails.
    ///
    /// With `allow_fallback` unset the memo is ignored, only `requested` is
    /// tested and its failure is returned as is. Returns the name of the
    /// provider that rendered the notification.
    pub async fn notify(
        &self,
        requested: &str,
        data: &NotificationData,
        allow_fallback: bool,
    ) -> Result<String> {
        let mut current = requested.to_string();
        let mut visited = HashSet::new();

        loop {
            let memoized = if allow_fallback {
                self.memo.get(&current)
            } else {
                None
            };
            if let Some(actual) = memoized {
                let instance = self.instance(&actual, None)?;
                instance.notify(data).await?;
                return Ok(actual);
            }

            let provider = self
                .registry
                .get(&current)
                .cloned()
                .ok_or_else(|| NotifyError::UnknownProvider(current.clone()))?;
            visited.insert(current.clone());

            let err = match provider.test().await {
                Ok(setup) => {
                    self.memo.record(requested, &current);
                    let instance = self.instance(&current, Some(setup))?;
                    instance.notify(data).await?;
                    return Ok(current);
                }
                Err(e) => e,
            };

            if !allow_fallback {
                return Err(err);
            }

            match self.registry.fallback_for(&current) {
                Some(next) if !visited.contains(next) => {
                    tracing::debug!("Provider {current} unavailable ({err}), trying {next}");
                    current = next.to_string();
                }
                _ => {
                    tracing::warn!("No notification provider available for {requested}: {err}");
                    return Err(err);
                }
            }
        }
    }

    fn instance(&self, name: &str, setup: Option<SetupData>) -> Result<Arc<dyn ProviderInstance>> {
        let mut instances = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instances.get(name) {
            return Ok(instance.clone());
        }

        let provider = self
            .registry
            .get(name)
            .ok_or_else(|| NotifyError::UnknownProvider(name.to_string()))?;
        let instance = provider.create(setup.unwrap_or(SetupData::Null))?;
        instances.insert(name.to_string(), instance.clone());
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::provider::{NotificationProvider, Platform, PlatformKey, ProviderCapability};

    #[derive(Default)]
    struct Calls {
        tests: AtomicUsize,
        creates: AtomicUsize,
        shown: Mutex<Vec<(String, String)>>,
    }

    struct FakeProvider {
        capability: ProviderCapability,
        works: bool,
        calls: Arc<Calls>,
    }

    struct FakeInstance {
        name: String,
        calls: Arc<Calls>,
    }

    #[async_trait]
    impl ProviderInstance for FakeInstance {
        async fn notify(&self, data: &NotificationData) -> Result<()> {
            self.calls
                .shown
                .lock()
                .unwrap()
                .push((self.name.clone(), data.title.clone()));
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationProvider for FakeProvider {
        fn capability(&self) -> &ProviderCapability {
            &self.capability
        }

        async fn test(&self) -> Result<SetupData> {
            self.calls.tests.fetch_add(1, Ordering::SeqCst);
            if self.works {
                Ok(json!({ "provider": self.capability.name }))
            } else {
                Err(NotifyError::ProviderUnavailable {
                    provider: self.capability.name.clone(),
                    message: "not installed".into(),
                })
            }
        }

        fn create(&self, setup: SetupData) -> Result<Arc<dyn ProviderInstance>> {
            self.calls.creates.fetch_add(1, Ordering::SeqCst);
            assert_eq!(setup["provider"], self.capability.name.as_str());
            Ok(Arc::new(FakeInstance {
                name: self.capability.name.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    struct Fixture {
        selector: ProviderSelector,
        calls: HashMap<&'static str, Arc<Calls>>,
    }

    impl Fixture {
        fn tests(&self, name: &str) -> usize {
            self.calls[name].tests.load(Ordering::SeqCst)
        }
    }

    fn chain(links: &[(&'static str, bool, Option<&str>)]) -> Fixture {
        let mut registry = ProviderRegistry::new(Platform::new([PlatformKey::Linux]));
        let mut calls = HashMap::new();
        for (name, works, fallback) in links {
            let c = Arc::new(Calls::default());
            calls.insert(*name, c.clone());
            registry.register(Arc::new(FakeProvider {
                capability: ProviderCapability::new(*name).on(PlatformKey::Linux, *fallback),
                works: *works,
                calls: c,
            }));
        }
        Fixture {
            selector: ProviderSelector::new(Arc::new(registry), FallbackMemo::new()),
            calls,
        }
    }

    #[tokio::test]
    async fn walks_fallback_chain_and_memoizes() {
        let fx = chain(&[("a", false, Some("b")), ("b", false, Some("c")), ("c", true, None)]);
        let data = NotificationData::new("hello", "");

        let used = fx.selector.notify("a", &data, true).await.unwrap();
        assert_eq!(used, "c");
        assert_eq!(fx.selector.memo().get("a").as_deref(), Some("c"));
        assert_eq!((fx.tests("a"), fx.tests("b"), fx.tests("c")), (1, 1, 1));

        let used = fx.selector.notify("a", &data, true).await.unwrap();
        assert_eq!(used, "c");
        assert_eq!((fx.tests("a"), fx.tests("b"), fx.tests("c")), (1, 1, 1));
        assert_eq!(fx.calls["c"].creates.load(Ordering::SeqCst), 1);
        assert_eq!(fx.calls["c"].shown.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fallback_disabled_ignores_memo() {
        let fx = chain(&[("a", false, Some("b")), ("b", true, None)]);
        let data = NotificationData::new("hello", "");

        fx.selector.notify("a", &data, true).await.unwrap();
        assert_eq!(fx.tests("a"), 1);

        let err = fx.selector.notify("a", &data, false).await.unwrap_err();
        assert!(matches!(err, NotifyError::ProviderUnavailable { ref provider, .. } if provider == "a"));
        assert_eq!(fx.tests("a"), 2);
        assert_eq!(fx.tests("b"), 1);
    }

    #[tokio::test]
    async fn fallback_disabled_retests_working_provider() {
        let fx = chain(&[("a", true, None)]);
        let data = NotificationData::new("hello", "");

        fx.selector.notify("a", &data, false).await.unwrap();
        fx.selector.notify("a", &data, false).await.unwrap();
        assert_eq!(fx.tests("a"), 2);
        assert_eq!(fx.calls["a"].creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_returns_last_failure() {
        let fx = chain(&[("a", false, Some("b")), ("b", false, None)]);
        let err = fx
            .selector
            .notify("a", &NotificationData::new("x", ""), true)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::ProviderUnavailable { ref provider, .. } if provider == "b"));
        assert!(fx.selector.memo().get("a").is_none());
    }

    #[tokio::test]
    async fn cyclic_fallbacks_terminate() {
        let fx = chain(&[("a", false, Some("b")), ("b", false, Some("a"))]);
        let result = fx
            .selector
            .notify("a", &NotificationData::new("x", ""), true)
            .await;
        assert!(result.is_err());
        assert_eq!((fx.tests("a"), fx.tests("b")), (1, 1));
    }

    #[tokio::test]
    async fn unknown_provider_is_an_error() {
        let fx = chain(&[("a", true, None)]);
        let err = fx
            .selector
            .notify("missing", &NotificationData::new("x", ""), true)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::UnknownProvider(_)));
    }
}
