//! Twitch OAuth endpoints:
//!   GET  /auth             – redirect to Twitch authorization
//!   GET  /callback         – exchange the code, log the user in
//!   GET  /api/auth/status  – token presence and expiry
//!   POST /api/auth/logout  – forget stored tokens

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::app::SharedState;
use crate::events::{self, AuthSuccessPayload};
use crate::notification;
use crate::services::twitch_session::SessionError;

use super::{ApiResult, err_json};

pub(crate) fn map_session_error(err: SessionError) -> (StatusCode, Json<Value>) {
    match err {
        SessionError::NotConfigured => err_json(400, &err.to_string()),
        e if e.needs_auth() => err_json(401, &format!("Authentication required: {e}")),
        e => err_json(500, &e.to_string()),
    }
}

/// GET /auth
pub async fn auth_redirect(
    State(state): State<SharedState>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let auth = state.session().auth().await.map_err(map_session_error)?;
    let csrf = uuid::Uuid::new_v4().to_string();
    let url = auth
        .get_auth_url(&csrf)
        .map_err(|e| err_json(500, &e.to_string()))?;
    state.set_oauth_state(csrf).await;
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn error_page(title: &str, detail: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html><html><body><h2>{title}</h2><p>{detail}</p>
<script>setTimeout(()=>window.close(),5000)</script></body></html>"#
    ))
}

/// GET /callback
pub async fn callback(
    State(state): State<SharedState>,
    Query(q): Query<CallbackQuery>,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    let expected = state.take_oauth_state().await;

    if let Some(error) = q.error {
        let desc = q.error_description.unwrap_or_default();
        tracing::warn!("Twitch authorization denied: {error}: {desc}");
        return Ok(error_page("Authorization failed", &format!("{error}: {desc}")));
    }

    if expected.is_none() || q.state != expected {
        tracing::warn!("OAuth callback with unexpected state");
        return Err(err_json(400, "OAuth state mismatch"));
    }

    let code = q
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| err_json(400, "OAuth code missing"))?;

    state
        .session()
        .complete_login(&code)
        .await
        .map_err(map_session_error)?;

    events::broadcast(
        state.ws_sender(),
        events::AUTH_SUCCESS,
        &AuthSuccessPayload {
            authenticated: true,
        },
    );
    notification::refresh(&state).await;

    Ok(Html(
        r#"<!DOCTYPE html><html><body>
<h2>Logged in to Twitch</h2><p>You can close this window.</p>
<script>setTimeout(()=>window.close(),2000)</script></body></html>"#
            .to_string(),
    ))
}

/// GET /api/auth/status
pub async fn auth_status(State(state): State<SharedState>) -> ApiResult {
    let token = state
        .db()
        .get_latest_token()
        .map_err(|e| err_json(500, &e.to_string()))?;
    let configured = state.config().await.twitch_configured();
    let auth_url = if configured {
        format!("http://localhost:{}/auth", state.server_port())
    } else {
        String::new()
    };
    Ok(Json(json!({
        "authenticated": token.is_some(),
        "configured": configured,
        "authUrl": auth_url,
        "expiresAt": token.as_ref().map(|t| t.expires_at),
        "userId": state.session().user_id().await,
    })))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<SharedState>) -> ApiResult {
    state.session().logout().map_err(map_session_error)?;
    notification::refresh(&state).await;
    Ok(Json(json!({ "success": true })))
}
