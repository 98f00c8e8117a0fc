//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::GameCmd;
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler. Sessions are anonymous; the server assigns
/// each connection an opaque identity for its lifetime.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "New WebSocket connection");

    // Per-connection send queue: the simulation loop pushes into it and
    // never blocks; the writer task drains it into the socket.
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<ServerMsg>();

    state.sessions.register(session_id);

    if state
        .game
        .cmd_tx
        .send(GameCmd::Connect {
            session_id,
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        error!(session_id = %session_id, "Simulation loop unavailable");
        state.sessions.unregister(session_id);
        return;
    }

    let (ws_sink, ws_stream) = socket.split();
    run_session(session_id, &state, ws_sink, ws_stream, outbound_rx).await;

    // Signal the loop; a no-op if the loop already evicted the session
    let _ = state
        .game
        .cmd_tx
        .send(GameCmd::Disconnect { session_id })
        .await;

    if let Some(connected_at) = state.sessions.unregister(session_id) {
        info!(
            session_id = %session_id,
            duration_secs = unix_millis().saturating_sub(connected_at) / 1_000,
            "WebSocket connection closed"
        );
    }
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session_id: Uuid,
    state: &AppState,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbound_rx: mpsc::UnboundedReceiver<ServerMsg>,
) {
    let rate_limiter = SessionRateLimiter::new();

    // Writer task: per-connection queue -> WebSocket. When the simulation
    // loop drops the sender (server full, idle eviction) the queue closes
    // and the socket is shut down, forcing the disconnect.
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                return;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader loop: WebSocket -> simulation loop
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(session_id = %session_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        let cmd = GameCmd::Message {
                            session_id,
                            msg,
                            received_at: unix_millis(),
                        };
                        if state.game.cmd_tx.send(cmd).await.is_err() {
                            debug!(session_id = %session_id, "Command channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!(session_id = %session_id, "WebSocket keepalive");
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
