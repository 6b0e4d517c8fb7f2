//! Live followed streams from the Twitch Helix API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notify_core::{NotifyError, RemoteStream, StreamSource};
use twitch_client::api::{MAX_PAGE_SIZE, StreamInfo, TwitchUser};

use super::twitch_session::{SessionError, TwitchSession};

/// [`StreamSource`] backed by the logged-in user's follows.
pub struct FollowedStreams {
    session: Arc<TwitchSession>,
}

impl FollowedStreams {
    pub fn new(session: Arc<TwitchSession>) -> Self {
        Self { session }
    }

    async fn user_id(&self) -> Result<String, NotifyError> {
        let user_id = self.session.user_id().await;
        if user_id.is_empty() {
            return Err(NotifyError::Fetch("TWITCH_USER_ID is not set".into()));
        }
        Ok(user_id)
    }

    /// Profile images of the given broadcasters. Failures only cost the icons.
    async fn logos(&self, streams: &[StreamInfo]) -> HashMap<String, String> {
        let ids: Vec<String> = streams.iter().map(|s| s.user_id.clone()).collect();
        if ids.is_empty() {
            return HashMap::new();
        }
        let result = self
            .session
            .call(|client, token| {
                let ids = ids.clone();
                async move { client.get_users_by_ids(&token, &ids).await }
            })
            .await;

        match result {
            Ok(users) => logo_map(users),
            Err(e) => {
                tracing::warn!("Failed to fetch channel logos: {e}");
                HashMap::new()
            }
        }
    }
}

fn fetch_error(e: SessionError) -> NotifyError {
    NotifyError::Fetch(e.to_string())
}

fn logo_map(users: Vec<TwitchUser>) -> HashMap<String, String> {
    users
        .into_iter()
        .filter(|u| !u.profile_image_url.is_empty())
        .map(|u| (u.id, u.profile_image_url))
        .collect()
}

fn parse_started_at(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub(crate) fn to_remote_stream(info: StreamInfo, logos: &HashMap<String, String>) -> RemoteStream {
    let display_name = if info.user_name.is_empty() {
        info.user_login.clone()
    } else {
        info.user_name
    };
    RemoteStream {
        created_at: parse_started_at(info.started_at.as_deref()),
        logo_url: logos.get(&info.user_id).cloned(),
        channel_id: info.user_id,
        channel_login: info.user_login,
        display_name,
        status_text: info.title,
    }
}

#[async_trait]
impl StreamSource for FollowedStreams {
    async fn followed_streams(&self, limit: u32) -> notify_core::Result<Vec<RemoteStream>> {
        let user_id = self.user_id().await?;
        let first = limit.clamp(1, MAX_PAGE_SIZE);

        let (streams, _cursor) = self
            .session
            .call(|client, token| {
                let user_id = user_id.clone();
                async move {
                    client
                        .get_followed_streams_page(&token, &user_id, first, None)
                        .await
                }
            })
            .await
            .map_err(fetch_error)?;

        tracing::debug!(count = streams.len(), "Fetched followed streams");
        let logos = self.logos(&streams).await;
        Ok(streams
            .into_iter()
            .map(|info| to_remote_stream(info, &logos))
            .collect())
    }

    async fn live_stream(&self, channel_id: &str) -> notify_core::Result<Option<RemoteStream>> {
        let ids = vec![channel_id.to_string()];
        let streams = self
            .session
            .call(|client, token| {
                let ids = ids.clone();
                async move { client.get_streams_by_user_ids(&token, &ids).await }
            })
            .await
            .map_err(fetch_error)?;

        let Some(info) = streams.into_iter().find(|s| s.user_id == channel_id) else {
            return Ok(None);
        };
        let logos = self.logos(std::slice::from_ref(&info)).await;
        Ok(Some(to_remote_stream(info, &logos)))
    }
}
