use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::hub::BroadcastHub;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with the
/// [`BroadcastHub`] and managed by two tasks (sender + receiver).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// Manage a single observer connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the observer with the hub.
///   2. Spawns a sender task that forwards messages from the hub channel.
///   3. Drains inbound keep-alive traffic on the current task.
///   4. Unregisters on disconnect.
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    let (observer_id, mut rx) = hub.register().await;
    tracing::info!(observer_id = %observer_id, "Observer connected");

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    // Receiver loop: inbound messages are keep-alives and are discarded.
    loop {
        tokio::select! {
            result = stream.next() => match result {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(observer_id = %observer_id, "Pong received");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(observer_id = %observer_id, error = %e, "WebSocket receive error");
                    break;
                }
            },
            // The sink failed or the hub closed us during shutdown.
            _ = &mut send_task => break,
        }
    }

    hub.unregister(&observer_id).await;
    send_task.abort();
    tracing::info!(observer_id = %observer_id, "Observer disconnected");
}
