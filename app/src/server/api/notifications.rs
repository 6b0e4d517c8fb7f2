//! Notification control API:
//!   GET  /api/notifications/status
//!   POST /api/notifications/pause | resume
//!   POST /api/notifications/test
//!   GET  /api/notifications/providers
//!   POST /api/notifications/track/{channel_id}

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use notify_core::NotifyError;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::app::SharedState;
use crate::events::NotificationStatusPayload;
use crate::notification::Notifier;

use super::{ApiResult, err_json};

fn notifier(state: &SharedState) -> Result<&Arc<Notifier>, (StatusCode, Json<Value>)> {
    state
        .notifier()
        .ok_or_else(|| err_json(503, "Notification system not initialized"))
}

fn map_notify_error(err: NotifyError) -> (StatusCode, Json<Value>) {
    match err {
        NotifyError::UnknownProvider(_) => err_json(400, &err.to_string()),
        NotifyError::Fetch(_) => err_json(502, &err.to_string()),
        e => err_json(500, &e.to_string()),
    }
}

fn status_json(notifier: &Notifier) -> Value {
    let status = notifier.poller().status();
    json!({
        "status": NotificationStatusPayload::from(&status),
        "badge": status.badge_label(),
        "fallbacks": notifier.selector().memo().entries(),
    })
}

/// GET /api/notifications/status
pub async fn get_status(State(state): State<SharedState>) -> ApiResult {
    Ok(Json(status_json(notifier(&state)?)))
}

/// POST /api/notifications/pause
pub async fn pause(State(state): State<SharedState>) -> ApiResult {
    let n = notifier(&state)?;
    n.poller().set_paused(true).await;
    tracing::info!("Notifications paused");
    Ok(Json(status_json(n)))
}

/// POST /api/notifications/resume
pub async fn resume(State(state): State<SharedState>) -> ApiResult {
    let n = notifier(&state)?;
    n.poller().set_paused(false).await;
    tracing::info!("Notifications resumed");
    Ok(Json(status_json(n)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TestRequest {
    pub provider: Option<String>,
}

/// POST /api/notifications/test
///
/// Uses the configured provider unless the body names one.
pub async fn send_test(
    State(state): State<SharedState>,
    body: Option<Json<TestRequest>>,
) -> ApiResult {
    let requested = body.and_then(|Json(b)| b.provider).filter(|p| !p.is_empty());
    let provider = match requested {
        Some(p) => p,
        None => state.config().await.notify_provider.clone(),
    };

    let used = notifier(&state)?
        .send_test(&provider)
        .await
        .map_err(map_notify_error)?;
    Ok(Json(json!({
        "success": true,
        "requested": provider,
        "provider": used,
    })))
}

/// GET /api/notifications/providers
pub async fn get_providers(State(state): State<SharedState>) -> ApiResult {
    let n = notifier(&state)?;
    let registry = n.selector().registry();
    Ok(Json(json!({
        "platform": registry.platform().keys(),
        "supported": registry.supported_providers(),
        "selected": state.config().await.notify_provider,
        "fallbacks": n.selector().memo().entries(),
    })))
}

/// POST /api/notifications/track/{channel_id}
pub async fn track_channel(
    State(state): State<SharedState>,
    Path(channel_id): Path<String>,
) -> ApiResult {
    let tracked = notifier(&state)?
        .track_channel(&channel_id)
        .await
        .map_err(map_notify_error)?;
    Ok(Json(json!({ "channel_id": channel_id, "tracked": tracked })))
}
