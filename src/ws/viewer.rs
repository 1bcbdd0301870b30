use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::models::RelayError;
use crate::session::Session;
use crate::AppState;

/// `/join/:id`: the viewer endpoint. Unknown or already-ended sessions
/// are rejected before the upgrade; otherwise the connection is attached
/// as a read-only viewer and pumped from its session queue.
pub async fn join_session_handler(
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    let Some(session) = app_state.registry.get_session(&session_id).await else {
        let err = RelayError::SessionNotFound(session_id);
        warn!("{}", err);
        return (StatusCode::NOT_FOUND, err.to_string()).into_response();
    };
    ws.on_upgrade(move |socket| handle_viewer(socket, session))
}

async fn handle_viewer(mut socket: WebSocket, session: Arc<Session>) {
    // Attach re-checks liveness: the author may have left between the
    // lookup and the upgrade completing.
    let viewer = match session.attach_viewer() {
        Ok(viewer) => viewer,
        Err(e) => {
            warn!("{}", e);
            let _ = socket
                .send(WsMessage::Close(Some(CloseFrame {
                    code: close_code::NORMAL,
                    reason: Cow::from("session closed"),
                })))
                .await;
            return;
        }
    };

    let session_id = session.id().to_string();
    let viewer_id = viewer.id;
    info!(session = %session_id, viewer = viewer_id, "viewer joined");

    let (mut sender, mut receiver) = socket.split();
    let mut queue = viewer.rx;

    // Pump the session queue out to the socket. The queue closing means
    // the session ended, or this viewer was evicted for falling behind;
    // the close notice tells the viewer page which.
    let pump_session = session.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = queue.recv().await {
            if sender.send(WsMessage::Text(msg.encode())).await.is_err() {
                return;
            }
        }
        let _ = sender
            .send(WsMessage::Close(Some(close_notice(&pump_session))))
            .await;
    });

    // Viewers are consumers only: any data frame ends the connection.
    let reject_session_id = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            match frame {
                WsMessage::Close(_) => break,
                WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
                WsMessage::Text(_) | WsMessage::Binary(_) => {
                    warn!(
                        session = %reject_session_id,
                        "{}", RelayError::UnexpectedRole
                    );
                    break;
                }
            }
        }
    });

    // Whichever direction finishes first tears down the other.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    session.detach_viewer(viewer_id);
    info!(session = %session_id, viewer = viewer_id, "viewer left");
}

/// Close frame for a viewer whose queue ended: "session closed" when the
/// author left, a policy close when the viewer was dropped for falling
/// too far behind a still-live session.
fn close_notice(session: &Session) -> CloseFrame<'static> {
    if session.is_closed() {
        CloseFrame {
            code: close_code::NORMAL,
            reason: Cow::from("session closed"),
        }
    } else {
        CloseFrame {
            code: close_code::POLICY,
            reason: Cow::from("too far behind"),
        }
    }
}
