//! WebSocket connection handling for the game protocol.
//!
//! Each connection is its own pair of tasks: the receive loop decodes client
//! commands and calls into the round engine; a forward task drains the
//! connection's outbound queue into the socket. Errors on either side only
//! ever tear down that one connection; nothing propagates into the round
//! loop.

use super::events::{ClientCommand, WsEvent};
use super::handlers::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::ops::ControlFlow;
use std::sync::{atomic::Ordering, Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// WebSocket endpoint handler
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Handle one client connection from upgrade to disconnect.
async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let client_id = state.broadcaster.register(tx);
    let online = state
        .metrics
        .websocket_connections_active
        .fetch_add(1, Ordering::SeqCst)
        + 1;
    info!("🔌 Client {} connected (online: {})", client_id, online);

    // Private snapshot so the client can render the current round at once.
    let snapshot = state.engine.snapshot().await;
    state.broadcaster.send_to(
        client_id,
        &WsEvent::State {
            phase: snapshot.phase,
            multiplier: snapshot.multiplier,
            round_id: snapshot.round_id,
            history: snapshot.history,
            players_online: snapshot.players_online,
        },
    );

    // Forward task: outbound queue → socket. A send failure ends the task;
    // the client is presumed dead and gets unregistered below.
    let metrics = state.metrics.clone();
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload)).await.is_err() {
                break;
            }
            metrics
                .websocket_messages_sent
                .fetch_add(1, Ordering::SeqCst);
        }
    });

    // Receive loop: commands in, private replies out.
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                state
                    .metrics
                    .websocket_messages_received
                    .fetch_add(1, Ordering::SeqCst);
                if handle_text(&state, client_id, &text).await.is_break() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Client {} requested close", client_id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error from client {}: {}", client_id, e);
                break;
            }
        }
    }

    state.broadcaster.unregister(client_id);
    send_task.abort();
    let remaining = state
        .metrics
        .websocket_connections_active
        .fetch_sub(1, Ordering::SeqCst)
        - 1;
    info!("🔌 Client {} disconnected (online: {})", client_id, remaining);
}

/// Route one inbound text frame.
///
/// Unparsable text is a transport-level failure and drops the connection.
/// Parsable JSON that is not a known command, and any validation error from
/// the ledger, get a private `error` reply and leave state untouched.
async fn handle_text(state: &Arc<AppState>, client_id: u64, text: &str) -> ControlFlow<()> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Dropping client {} after malformed frame: {}", client_id, e);
            return ControlFlow::Break(());
        }
    };

    let command = match serde_json::from_value::<ClientCommand>(value) {
        Ok(command) => command,
        Err(e) => {
            state
                .broadcaster
                .send_to(client_id, &WsEvent::error(format!("Unsupported command: {}", e)));
            return ControlFlow::Continue(());
        }
    };

    let result = match command {
        ClientCommand::PlaceBet {
            user_id,
            amount,
            auto_cashout,
            username,
        } => {
            state
                .engine
                .place_bet(user_id, amount, auto_cashout, username)
                .await
        }
        ClientCommand::Cashout { user_id } => state.engine.request_cashout(user_id).await,
    };

    if let Err(e) = result {
        state
            .broadcaster
            .send_to(client_id, &WsEvent::error(e.to_string()));
    }
    ControlFlow::Continue(())
}
