use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};

use crate::app::SharedState;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe_ws();

    let client_id = uuid::Uuid::new_v4().to_string();
    let welcome = json!({
        "type": "connected",
        "data": { "clientId": client_id }
    });
    if sender
        .send(Message::Text(welcome.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    tracing::info!("WebSocket client connected: {}", client_id);

    // Forward broadcast messages to this client
    let mut send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let cid = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => handle_client_message(&text, &state),
                Message::Close(_) => break,
                _ => {}
            }
        }
        tracing::info!("WebSocket client disconnected: {}", cid);
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Route incoming client messages.
fn handle_client_message(text: &str, state: &SharedState) {
    let Ok(msg) = serde_json::from_str::<Value>(text) else {
        tracing::debug!("Ignoring non-JSON WebSocket message");
        return;
    };
    let msg_type = msg.get("type").and_then(|t| t.as_str()).unwrap_or("");

    match msg_type {
        "ping" => {
            let _ = state.ws_sender().send(json!({ "type": "pong" }).to_string());
        }
        "rich_notification_click" => {
            let Some(id) = msg.pointer("/data/id").and_then(Value::as_u64) else {
                tracing::warn!("rich_notification_click without a numeric id");
                return;
            };
            let Some(notifier) = state.notifier() else {
                return;
            };
            if !notifier.clicks().invoke(id) {
                tracing::debug!(id, "Click for unknown or expired notification");
            }
        }
        other => tracing::debug!(msg_type = other, "Ignoring WebSocket message"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use notify_core::OnClick;

    use super::*;
    use crate::server::api::test_support;

    #[test]
    fn ping_is_answered_with_pong() {
        let state = test_support::state();
        let mut rx = state.subscribe_ws();

        handle_client_message(r#"{"type":"ping"}"#, &state);
        let reply: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(reply["type"], "pong");
    }

    #[tokio::test]
    async fn rich_click_runs_registered_handler_once() {
        let state = test_support::state();
        crate::notification::initialize(&state).await;
        let clicks = state.notifier().unwrap().clicks().clone();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let on_click: OnClick = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let id = clicks.register(Some(on_click));

        let msg = json!({ "type": "rich_notification_click", "data": { "id": id } }).to_string();
        handle_client_message(&msg, &state);
        handle_client_message(&msg, &state);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_messages_are_ignored() {
        let state = test_support::state();
        let mut rx = state.subscribe_ws();

        handle_client_message("not json", &state);
        handle_client_message(r#"{"type":"rich_notification_click","data":{}}"#, &state);
        handle_client_message(r#"{"type":"chat"}"#, &state);
        assert!(rx.try_recv().is_err());
    }
}
