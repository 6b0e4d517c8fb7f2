//! REST API handlers grouped by domain.

pub mod auth;
pub mod channels;
pub mod notifications;
pub mod settings;

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

pub type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Standard error response.
pub fn err_json(status: u16, message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json!({ "status": "error", "error": message })),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use notifier_db::Database;

    use crate::app::SharedState;
    use crate::config::AppConfig;

    pub fn state() -> SharedState {
        let db = Database::open_in_memory().unwrap();
        SharedState::new(db, AppConfig::default(), std::env::temp_dir())
    }
}
