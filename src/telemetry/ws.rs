use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;
use crate::telemetry::hub::{PushMessage, TelemetryHub};

/// GET /api/ws - push channel for monitoring snapshots and alerts.
///
/// Every connected client receives every broadcast; there is no
/// subscription filtering and no replay for late joiners.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, state.hub.clone()))
}

async fn client_session(socket: WebSocket, hub: TelemetryHub) {
    let (mut sink, mut stream) = socket.split();

    if send_message(&mut sink, &PushMessage::connected()).await.is_err() {
        return;
    }

    let mut rx = hub.subscribe();
    tracing::debug!(clients = hub.connected_clients(), "websocket client connected");

    // Deregistration is implicit: returning drops `rx`, removing this
    // client from the live set.
    loop {
        tokio::select! {
            push = rx.recv() => match push {
                Ok(message) => {
                    if send_message(&mut sink, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Slow consumer: drop the missed messages for this
                    // client and keep the stream alive.
                    tracing::debug!(skipped, "websocket client lagged behind broadcast");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Inbound frames (pings are answered by axum) are ignored.
                }
                Some(Err(_)) => break,
            },
        }
    }

    tracing::debug!("websocket client disconnected");
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &PushMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(message).map_err(axum::Error::new)?;
    sink.send(Message::Text(text)).await
}
