use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Host, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::models::{Message, MessageType, Selection};
use crate::AppState;

/// `/create`: the author endpoint. Mints a fresh session, sends the
/// shareable viewer URL back as the very first frame, then relays the
/// author's updates until the socket closes.
pub async fn create_session_handler(
    ws: WebSocketUpgrade,
    Host(host): Host,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    info!("New author connection");
    ws.on_upgrade(move |socket| handle_author(socket, host, app_state))
}

async fn handle_author(socket: WebSocket, host: String, app_state: Arc<AppState>) {
    let session = app_state.registry.create_session().await;
    let session_id = session.id().to_string();

    let (mut sender, mut receiver) = socket.split();

    // Exactly one URL frame, before any other traffic.
    let share_url = app_state.config.share_url(&host, &session_id);
    let url_frame = Message::url(share_url.clone()).encode();
    if sender.send(WsMessage::Text(url_frame)).await.is_err() {
        warn!(session = %session_id, "author gone before URL frame was sent");
        session.close();
        app_state.registry.remove_session(&session_id).await;
        return;
    }
    info!(session = %session_id, url = %share_url, "session started");

    while let Some(Ok(frame)) = receiver.next().await {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            // Keepalive frames belong to the transport.
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            WsMessage::Binary(_) => {
                warn!(session = %session_id, "ignoring binary frame from author");
                continue;
            }
        };

        let msg = match Message::decode(&text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session = %session_id, "dropping author frame: {}", e);
                continue;
            }
        };

        match msg.kind {
            MessageType::Data => session.update_data(msg.content),
            MessageType::Selection => match Selection::parse(&msg.content) {
                Ok(selection) => session.update_selection(selection),
                Err(e) => warn!(session = %session_id, "dropping author frame: {}", e),
            },
            // Legacy point-cursor frames pass through uncached for the
            // older viewer page.
            MessageType::Cursor => session.relay(msg),
            MessageType::Url | MessageType::Resend => {
                warn!(session = %session_id, "ignoring {:?} frame from author", msg.kind);
            }
        }
    }

    // Author gone: end the session and let every viewer task observe the
    // closed queue.
    session.close();
    app_state.registry.remove_session(&session_id).await;
    info!(session = %session_id, "session ended, author disconnected");
}
