use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chalkline_shared::wire::{decode_binary, decode_text, WireError};
use chalkline_shared::BoardEvent;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::state::AppState;

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Parses a data frame into an event. Control frames yield `None`.
pub fn decode_frame(message: &Message) -> Option<Result<BoardEvent, WireError>> {
    match message {
        Message::Text(text) => Some(decode_text(text)),
        Message::Binary(data) => Some(decode_binary(data)),
        _ => None,
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut socket_sender, mut socket_receiver) = socket.split();
    let (peer, mut frames) = state.relay.connect().await;
    let peers = state.relay.peer_count().await;
    info!(%peer, peers, "peer connected");

    let send_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if let Err(error) = socket_sender
                .send(Message::Binary((*frame).clone()))
                .await
            {
                debug!(%peer, %error, "send failed, closing outbound queue");
                break;
            }
        }
    });

    let mut close_frame = None;

    while let Some(message) = socket_receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(error) => {
                debug!(%peer, %error, "receive failed");
                break;
            }
        };
        if let Message::Close(frame) = message {
            close_frame = frame;
            break;
        }
        let Some(decoded) = decode_frame(&message) else {
            continue;
        };
        match decoded {
            Ok(event) => match state.relay.broadcast(&event).await {
                Ok(delivery) => debug!(
                    %peer,
                    kind = event.kind(),
                    delivered = delivery.delivered,
                    dropped = delivery.dropped,
                    stale = delivery.stale,
                    "event relayed"
                ),
                Err(error) => warn!(%peer, kind = event.kind(), %error, "failed to encode event"),
            },
            Err(error) => warn!(%peer, %error, "rejected frame"),
        }
    }

    let remaining = state.relay.disconnect(peer).await;
    info!(%peer, peers = remaining, "peer disconnected");
    if let Some(frame) = &close_frame {
        debug!(%peer, code = frame.code, reason = %frame.reason, "close frame");
    }
    send_task.abort();
}

#[cfg(test)]
mod tests {
    use chalkline_shared::wire::encode_binary;
    use chalkline_shared::StrokePoint;

    use super::*;

    #[test]
    fn text_and_binary_frames_decode_to_events() {
        let event = BoardEvent::BeginPath(StrokePoint::new(3.0, 7.0));
        let text = Message::Text(r#"{"type":"beginPath","x":3,"y":7}"#.to_string());
        let binary = Message::Binary(encode_binary(&event).unwrap());

        assert_eq!(decode_frame(&text).unwrap().unwrap(), event);
        assert_eq!(decode_frame(&binary).unwrap().unwrap(), event);
    }

    #[test]
    fn malformed_frames_are_rejected() {
        let garbage = Message::Text("{\"type\":\"drawStroke\"}".to_string());
        assert!(decode_frame(&garbage).unwrap().is_err());

        let out_of_range = Message::Text(
            r#"{"type":"redoUndo","trackValue":3,"undoRedoTracker":["a"]}"#.to_string(),
        );
        assert!(matches!(
            decode_frame(&out_of_range),
            Some(Err(WireError::Invalid { .. }))
        ));

        assert!(decode_frame(&Message::Binary(vec![0xff; 3])).unwrap().is_err());
    }

    #[test]
    fn control_frames_are_ignored() {
        assert!(decode_frame(&Message::Ping(Vec::new())).is_none());
        assert!(decode_frame(&Message::Pong(Vec::new())).is_none());
    }
}
