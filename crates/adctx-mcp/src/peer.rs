use std::sync::Arc;

use adctx_broker::{ClientMessage, CorrelationBroker};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::http::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let broker = Arc::clone(state.broker());
    ws.on_upgrade(move |socket| serve_peer(socket, broker))
}

/// Runs one escrow peer connection until either side closes it. Outbound
/// broker frames are written from a separate task so a slow reader never
/// holds up `resolve`.
pub async fn serve_peer(socket: WebSocket, broker: Arc<CorrelationBroker>) {
    let (mut sink, mut inbound) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let peer_id = broker.connect(tx);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(message) = inbound.next().await {
        match message {
            Ok(Message::Text(text)) => route_reply(&broker, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(peer_id, error = %err, "peer socket error");
                break;
            }
        }
    }

    if broker.release(peer_id) {
        info!(peer_id, "escrow peer closed");
    } else {
        debug!(peer_id, "replaced escrow peer closed");
    }
    writer.abort();
}

pub fn route_reply(broker: &CorrelationBroker, raw: &str) {
    match ClientMessage::parse(raw) {
        Ok(ClientMessage::OperationResult {
            request_id,
            payload,
        }) => broker.resolve(&request_id, payload),
        Err(err) => warn!(error = %err, "ignoring malformed peer frame"),
    }
}
