//! Per-channel notification preferences:
//!   GET    /api/channels               – followed channels merged with stored choices
//!   GET    /api/channels/{channel_id}
//!   PUT    /api/channels/{channel_id}  – set or clear the choice
//!   DELETE /api/channels/{channel_id}

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use notifier_db::ChannelSetting;
use notify_core::ChannelPreference;
use serde::{Deserialize, Serialize};
use serde_json::json;
use twitch_client::api::FollowedChannel;

use crate::app::SharedState;
use crate::services::twitch_session::SessionError;

use super::auth::map_session_error;
use super::{ApiResult, err_json};

const FOLLOWED_CHANNELS_PAGE_SIZE: u32 = 100;
const FOLLOWED_CHANNELS_SCAN_LIMIT: usize = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct ChannelEntry {
    pub channel_id: String,
    pub login: String,
    pub display_name: String,
    pub followed: bool,
    /// Stored choice; `None` means the global default applies.
    pub notify_enabled: Option<bool>,
    /// Whether a stream of this channel would be announced right now.
    pub notifies: bool,
}

impl ChannelEntry {
    fn from_setting(setting: &ChannelSetting, notify_all: bool) -> Self {
        Self {
            channel_id: setting.channel_id.clone(),
            login: String::new(),
            display_name: setting.display_name.clone(),
            followed: false,
            notify_enabled: setting.notify_enabled,
            notifies: ChannelPreference::from(setting.notify_enabled).allows(notify_all),
        }
    }
}

/// Join followed channels with stored preferences. Channels with a stored
/// choice that are no longer followed are kept at the end.
fn merge_channels(
    followed: Vec<FollowedChannel>,
    stored: Vec<ChannelSetting>,
    notify_all: bool,
) -> Vec<ChannelEntry> {
    let mut stored: HashMap<String, ChannelSetting> = stored
        .into_iter()
        .map(|s| (s.channel_id.clone(), s))
        .collect();

    let mut entries: Vec<ChannelEntry> = followed
        .into_iter()
        .map(|f| {
            let notify_enabled = stored
                .remove(&f.broadcaster_id)
                .and_then(|s| s.notify_enabled);
            ChannelEntry {
                channel_id: f.broadcaster_id,
                login: f.broadcaster_login,
                display_name: f.broadcaster_name,
                followed: true,
                notify_enabled,
                notifies: ChannelPreference::from(notify_enabled).allows(notify_all),
            }
        })
        .collect();

    let mut rest: Vec<ChannelEntry> = stored
        .values()
        .map(|s| ChannelEntry::from_setting(s, notify_all))
        .collect();
    rest.sort_by(|a, b| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()));
    entries.extend(rest);
    entries
}

async fn fetch_followed_channels(
    state: &SharedState,
) -> Result<Vec<FollowedChannel>, SessionError> {
    let user_id = state.session().user_id().await;
    if user_id.is_empty() {
        return Ok(Vec::new());
    }

    let mut followed = Vec::new();
    let mut after: Option<String> = None;
    loop {
        let cursor = after.clone();
        let (mut page, next) = state
            .session()
            .call(|client, token| {
                let user_id = user_id.clone();
                let cursor = cursor.clone();
                async move {
                    client
                        .get_followed_channels_page(
                            &token,
                            &user_id,
                            FOLLOWED_CHANNELS_PAGE_SIZE,
                            cursor.as_deref(),
                        )
                        .await
                }
            })
            .await?;
        followed.append(&mut page);
        if followed.len() >= FOLLOWED_CHANNELS_SCAN_LIMIT {
            break;
        }
        let Some(next) = next.filter(|c| !c.is_empty()) else {
            break;
        };
        after = Some(next);
    }
    Ok(followed)
}

/// GET /api/channels
pub async fn list_channels(State(state): State<SharedState>) -> ApiResult {
    let stored = state
        .db()
        .list_channel_settings()
        .map_err(|e| err_json(500, &e.to_string()))?;
    let notify_all = state.config().await.notify_all;

    let logged_in = state.session().has_token().map_err(map_session_error)?;
    let (followed, followed_error) = if logged_in {
        match fetch_followed_channels(&state).await {
            Ok(rows) => (rows, None),
            Err(e) => {
                tracing::warn!("Failed to fetch followed channels: {e}");
                (Vec::new(), Some(e.to_string()))
            }
        }
    } else {
        (Vec::new(), None)
    };

    let channels = merge_channels(followed, stored, notify_all);
    Ok(Json(json!({
        "channels": channels,
        "count": channels.len(),
        "notify_all": notify_all,
        "followed_error": followed_error,
    })))
}

/// GET /api/channels/{channel_id}
pub async fn get_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> ApiResult {
    let setting = state
        .db()
        .get_channel_setting(&channel_id)
        .map_err(|e| err_json(500, &e.to_string()))?
        .ok_or_else(|| err_json(404, "Channel has no stored preference"))?;
    let notify_all = state.config().await.notify_all;
    Ok(Json(json!(ChannelEntry::from_setting(&setting, notify_all))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateChannelRequest {
    /// `null` clears the choice so the global default applies again.
    pub notify_enabled: Option<bool>,
    #[serde(default)]
    pub display_name: String,
}

/// PUT /api/channels/{channel_id}
pub async fn update_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
    Json(body): Json<UpdateChannelRequest>,
) -> ApiResult {
    state
        .db()
        .set_channel_notify(&channel_id, &body.display_name, body.notify_enabled)
        .map_err(|e| err_json(400, &e.to_string()))?;
    tracing::info!(
        channel_id = %channel_id,
        notify_enabled = ?body.notify_enabled,
        "Channel notification preference updated"
    );
    get_channel(State(state), Path(channel_id)).await
}

/// DELETE /api/channels/{channel_id}
pub async fn delete_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> ApiResult {
    let removed = state
        .db()
        .delete_channel_setting(&channel_id)
        .map_err(|e| err_json(500, &e.to_string()))?;
    if !removed {
        return Err(err_json(404, "Channel has no stored preference"));
    }
    Ok(Json(json!({ "success": true, "channel_id": channel_id })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::server::api::test_support;

    fn followed(id: &str, name: &str) -> FollowedChannel {
        FollowedChannel {
            broadcaster_id: id.into(),
            broadcaster_login: name.to_lowercase(),
            broadcaster_name: name.into(),
            followed_at: String::new(),
        }
    }

    fn stored(id: &str, name: &str, notify_enabled: Option<bool>) -> ChannelSetting {
        ChannelSetting {
            channel_id: id.into(),
            display_name: name.into(),
            notify_enabled,
            updated_at: String::new(),
        }
    }

    #[test]
    fn merge_applies_stored_choices() {
        let merged = merge_channels(
            vec![followed("1", "Alpha"), followed("2", "Beta")],
            vec![stored("2", "Beta", Some(false)), stored("9", "Gone", Some(true))],
            true,
        );

        let ids: Vec<&str> = merged.iter().map(|c| c.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "9"]);
        assert!(merged[0].notifies);
        assert_eq!(merged[0].notify_enabled, None);
        assert!(!merged[1].notifies);
        assert!(!merged[2].followed);
        assert!(merged[2].notifies);
    }

    #[test]
    fn unset_channels_follow_global_default() {
        let merged = merge_channels(vec![followed("1", "Alpha")], Vec::new(), false);
        assert!(!merged[0].notifies);
    }

    #[tokio::test]
    async fn preference_lifecycle() {
        let state = test_support::state();

        let body = UpdateChannelRequest {
            notify_enabled: Some(false),
            display_name: "Alpha".into(),
        };
        let Json(entry) = update_channel(State(state.clone()), Path("1".into()), Json(body))
            .await
            .unwrap();
        assert_eq!(entry["notify_enabled"], false);
        assert_eq!(entry["notifies"], false);

        let Json(list) = list_channels(State(state.clone())).await.unwrap();
        assert_eq!(list["count"], 1);
        assert_eq!(list["channels"][0]["display_name"], "Alpha");

        // Clearing keeps the row but falls back to the default.
        let body = UpdateChannelRequest {
            notify_enabled: None,
            display_name: String::new(),
        };
        let Json(entry) = update_channel(State(state.clone()), Path("1".into()), Json(body))
            .await
            .unwrap();
        assert!(entry["notify_enabled"].is_null());
        assert_eq!(entry["notifies"], true);
        assert_eq!(entry["display_name"], "Alpha");

        delete_channel(State(state.clone()), Path("1".into())).await.unwrap();
        let (status, _) = get_channel(State(state.clone()), Path("1".into())).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = delete_channel(State(state), Path("1".into())).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
