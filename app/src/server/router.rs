use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::{api, websocket};
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // --- Core ---
        .route("/status", get(status_handler))
        .route("/ws", get(websocket::ws_handler))
        // --- Auth ---
        .route("/auth", get(api::auth::auth_redirect))
        .route("/callback", get(api::auth::callback))
        .route("/api/auth/status", get(api::auth::auth_status))
        .route("/api/auth/logout", post(api::auth::logout))
        // --- Settings ---
        .route("/api/settings", get(api::settings::get_settings).put(api::settings::update_settings))
        .route("/api/settings/reset", post(api::settings::reset_settings))
        // --- Notifications ---
        .route("/api/notifications/status", get(api::notifications::get_status))
        .route("/api/notifications/pause", post(api::notifications::pause))
        .route("/api/notifications/resume", post(api::notifications::resume))
        .route("/api/notifications/test", post(api::notifications::send_test))
        .route("/api/notifications/providers", get(api::notifications::get_providers))
        .route("/api/notifications/track/{channel_id}", post(api::notifications::track_channel))
        // --- Channels ---
        .route("/api/channels", get(api::channels::list_channels))
        .route(
            "/api/channels/{channel_id}",
            get(api::channels::get_channel)
                .put(api::channels::update_channel)
                .delete(api::channels::delete_channel),
        )
        // --- Middleware ---
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn status_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
