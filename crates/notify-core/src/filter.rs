//! Per-channel notification preference filtering.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::stream::RemoteStream;

/// A user's stored choice for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPreference {
    Enabled,
    Disabled,
    Unset,
}

impl ChannelPreference {
    pub fn allows(self, allow_by_default: bool) -> bool {
        match self {
            Self::Enabled => true,
            Self::Disabled => false,
            Self::Unset => allow_by_default,
        }
    }
}

impl From<Option<bool>> for ChannelPreference {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Enabled,
            Some(false) => Self::Disabled,
            None => Self::Unset,
        }
    }
}

/// Storage backing channel preferences.
#[async_trait]
pub trait PreferenceLookup: Send + Sync {
    async fn channel_preference(&self, channel_id: &str) -> Result<ChannelPreference>;
}

/// Drops streams the user opted out of.
#[derive(Clone)]
pub struct ChannelFilter {
    lookup: Arc<dyn PreferenceLookup>,
}

impl ChannelFilter {
    pub fn new(lookup: Arc<dyn PreferenceLookup>) -> Self {
        Self { lookup }
    }

    /// Keep the streams whose channel preference allows a notification.
    /// Lookups run concurrently; the first lookup error fails the whole call.
    pub async fn filter(
        &self,
        streams: Vec<RemoteStream>,
        allow_by_default: bool,
    ) -> Result<Vec<RemoteStream>> {
        if streams.is_empty() {
            return Ok(streams);
        }

        let prefs = try_join_all(
            streams
                .iter()
                .map(|s| self.lookup.channel_preference(&s.channel_id)),
        )
        .await?;

        Ok(streams
            .into_iter()
            .zip(prefs)
            .filter(|(_, pref)| pref.allows(allow_by_default))
            .map(|(stream, _)| stream)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::NotifyError;
    use crate::stream::fixtures::stream;

    struct MapLookup(HashMap<&'static str, bool>);

    #[async_trait]
    impl PreferenceLookup for MapLookup {
        async fn channel_preference(&self, channel_id: &str) -> Result<ChannelPreference> {
            Ok(self.0.get(channel_id).copied().into())
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl PreferenceLookup for BrokenLookup {
        async fn channel_preference(&self, _channel_id: &str) -> Result<ChannelPreference> {
            Err(NotifyError::PreferenceLookup("store closed".into()))
        }
    }

    fn ids(streams: &[RemoteStream]) -> Vec<&str> {
        streams.iter().map(|s| s.channel_id.as_str()).collect()
    }

    #[tokio::test]
    async fn explicit_preferences_override_default() {
        let filter = ChannelFilter::new(Arc::new(MapLookup(HashMap::from([
            ("on", true),
            ("off", false),
        ]))));
        let input = vec![stream("on", 1), stream("off", 1), stream("unset", 1)];

        let allowed = filter.filter(input.clone(), true).await.unwrap();
        assert_eq!(ids(&allowed), vec!["on", "unset"]);

        let allowed = filter.filter(input, false).await.unwrap();
        assert_eq!(ids(&allowed), vec!["on"]);
    }

    #[tokio::test]
    async fn lookup_failure_fails_filter() {
        let filter = ChannelFilter::new(Arc::new(BrokenLookup));
        assert!(filter.filter(vec![stream("a", 1)], true).await.is_err());
        assert!(filter.filter(vec![], true).await.unwrap().is_empty());
    }
}
