//! Background task loops: token refresh and notifier status broadcast.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use twitch_client::auth::REFRESH_MARGIN_SECS;

use crate::app::SharedState;
use crate::events::{self, BadgeLabelPayload, NotificationStatusPayload};
use crate::notification::Notifier;
use crate::services::twitch_session::{SessionError, to_twitch_token};

async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Keep the stored OAuth token fresh.
pub async fn token_refresh_loop(state: SharedState) {
    const CHECK_INTERVAL_SECS: u64 = 30 * 60;
    const INITIAL_BACKOFF_SECS: u64 = 30;
    const MAX_BACKOFF_SECS: u64 = 30 * 60;
    let shutdown_token = state.shutdown_token().clone();

    // Wait for initial startup
    if sleep_or_cancel(&shutdown_token, Duration::from_secs(10)).await {
        tracing::info!("Token refresh loop stopped (shutdown)");
        return;
    }
    let mut failure_backoff_secs = INITIAL_BACKOFF_SECS;

    loop {
        let delay = match refresh_if_expiring(&state).await {
            Ok(()) => {
                failure_backoff_secs = INITIAL_BACKOFF_SECS;
                CHECK_INTERVAL_SECS
            }
            Err(e) => {
                tracing::error!("Token auto-refresh failed: {e}");
                tracing::warn!(
                    retry_after_secs = failure_backoff_secs,
                    "Retrying token refresh with exponential backoff"
                );
                let delay = failure_backoff_secs;
                failure_backoff_secs = (failure_backoff_secs * 2).min(MAX_BACKOFF_SECS);
                delay
            }
        };

        if sleep_or_cancel(&shutdown_token, Duration::from_secs(delay)).await {
            tracing::info!("Token refresh loop stopped (shutdown)");
            return;
        }
    }
}

async fn refresh_if_expiring(state: &SharedState) -> Result<(), SessionError> {
    let session = state.session();
    let Some(db_token) = session.db().get_latest_token()? else {
        return Ok(());
    };
    let current = to_twitch_token(&db_token);
    if !current.expires_within(REFRESH_MARGIN_SECS) {
        return Ok(());
    }
    if !state.config().await.twitch_configured() {
        return Ok(());
    }

    tracing::info!(
        time_until_expiry = current.expires_at - chrono::Utc::now().timestamp(),
        "Token expiring soon or expired, refreshing"
    );
    let token = session.force_refresh(&current).await?;
    tracing::info!(expires_at = token.expires_at, "Token auto-refreshed successfully");
    Ok(())
}

/// Mirror the notifier status to WebSocket clients as status text and badge.
pub async fn status_broadcast_loop(state: SharedState) {
    let shutdown_token = state.shutdown_token().clone();

    let notifier = loop {
        if let Some(notifier) = state.notifier() {
            break notifier.clone();
        }
        if sleep_or_cancel(&shutdown_token, Duration::from_millis(200)).await {
            return;
        }
    };

    broadcast_status(&state, &notifier);
    let mut rx = notifier.poller().subscribe();
    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                broadcast_status(&state, &notifier);
            }
        }
    }
    tracing::info!("Status broadcast loop stopped");
}

fn broadcast_status(state: &SharedState, notifier: &Arc<Notifier>) {
    let status = notifier.poller().status();
    events::broadcast(
        state.ws_sender(),
        events::NOTIFICATION_STATUS,
        &NotificationStatusPayload::from(&status),
    );
    events::broadcast(
        state.ws_sender(),
        events::BADGE_LABEL,
        &BadgeLabelPayload {
            label: status.badge_label(),
        },
    );
}
