//! Settings management API:
//!   GET  /api/settings       – all settings + feature status
//!   PUT  /api/settings       – update settings
//!   POST /api/settings/reset – reset settings to defaults

use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::app::SharedState;
use crate::config::{SettingInfo, SettingType, SettingsManager};
use crate::events::{self, SettingsUpdatedPayload};
use crate::notification;

use super::{ApiResult, err_json};

fn settings_json(sm: &SettingsManager) -> Result<Value, (axum::http::StatusCode, Json<Value>)> {
    let all = sm
        .get_all_settings()
        .map_err(|e| err_json(500, &format!("Failed to get settings: {e}")))?;
    let status = sm
        .check_feature_status()
        .map_err(|e| err_json(500, &format!("Failed to check status: {e}")))?;

    let settings: HashMap<String, SettingInfo> = all
        .into_iter()
        .map(|(key, mut info)| {
            if info.setting_type == SettingType::Secret {
                info.value = String::new();
            }
            (key, info)
        })
        .collect();

    Ok(json!({ "settings": settings, "status": status }))
}

/// Reload runtime config and push it into the notifier.
async fn apply_changes(
    state: &SharedState,
    source: &str,
    count: usize,
) -> Result<(), (axum::http::StatusCode, Json<Value>)> {
    state
        .reload_config()
        .await
        .map_err(|e| err_json(500, &format!("Failed to reload config: {e}")))?;
    notification::refresh(state).await;
    events::broadcast(
        state.ws_sender(),
        events::SETTINGS_UPDATED,
        &SettingsUpdatedPayload {
            source: source.to_string(),
            count,
        },
    );
    Ok(())
}

/// GET /api/settings
pub async fn get_settings(State(state): State<SharedState>) -> ApiResult {
    let sm = SettingsManager::new(state.db().clone());
    Ok(Json(settings_json(&sm)?))
}

/// PUT /api/settings
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(body): Json<HashMap<String, String>>,
) -> ApiResult {
    let sm = SettingsManager::new(state.db().clone());
    let updated = sm
        .set_settings(&body)
        .map_err(|e| err_json(400, &e.to_string()))?;

    apply_changes(&state, "api", updated).await?;

    let mut payload = settings_json(&sm)?;
    payload["success"] = json!(true);
    payload["message"] = json!(format!("Updated {updated} setting(s) successfully"));
    Ok(Json(payload))
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// POST /api/settings/reset
pub async fn reset_settings(
    State(state): State<SharedState>,
    body: Option<Json<ResetRequest>>,
) -> ApiResult {
    let keys = body.map(|Json(b)| b.keys).unwrap_or_default();
    let sm = SettingsManager::new(state.db().clone());
    let reset_count = sm
        .reset_settings(&keys)
        .map_err(|e| err_json(500, &format!("Failed to reset settings: {e}")))?;

    apply_changes(&state, "reset", reset_count).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Reset {reset_count} setting(s) to default values"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::api::test_support;

    #[tokio::test]
    async fn secrets_are_masked() {
        let state = test_support::state();
        SettingsManager::new(state.db().clone())
            .set_setting("CLIENT_SECRET", "hunter2")
            .unwrap();

        let Json(body) = get_settings(State(state)).await.unwrap();
        assert_eq!(body["settings"]["CLIENT_SECRET"]["value"], "");
        assert_eq!(body["settings"]["CLIENT_SECRET"]["has_value"], true);
        assert_eq!(body["settings"]["NOTIFY_PROVIDER"]["value"], "auto");
    }

    #[tokio::test]
    async fn update_reloads_config_and_notifies_clients() {
        let state = test_support::state();
        let mut rx = state.subscribe_ws();

        let mut body = HashMap::new();
        body.insert("NOTIFY_GROUPING".to_string(), "false".to_string());
        let Json(resp) = update_settings(State(state.clone()), Json(body)).await.unwrap();
        assert_eq!(resp["success"], true);
        assert!(!state.config().await.notify_grouping);

        let msg: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(msg["type"], "settings_updated");
        assert_eq!(msg["data"]["count"], 1);
    }

    #[tokio::test]
    async fn invalid_update_is_rejected() {
        let state = test_support::state();
        let mut body = HashMap::new();
        body.insert("NOTIFY_PAGE_SIZE".to_string(), "1000".to_string());
        let (status, _) = update_settings(State(state.clone()), Json(body)).await.unwrap_err();
        assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(state.config().await.page_size, 100);
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let state = test_support::state();
        SettingsManager::new(state.db().clone())
            .set_setting("NOTIFY_PROVIDER", "rich")
            .unwrap();
        state.reload_config().await.unwrap();
        assert_eq!(state.config().await.notify_provider, "rich");

        let req = ResetRequest {
            keys: vec!["NOTIFY_PROVIDER".into()],
        };
        reset_settings(State(state.clone()), Some(Json(req))).await.unwrap();
        assert_eq!(state.config().await.notify_provider, "auto");
    }
}
