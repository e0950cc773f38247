//! WebSocket session lifecycle — handles a single connected participant
//! from upgrade through disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use vitrine_core::ConnectionId;

use super::connection::ClientConnection;
use super::engine::FanoutEngine;
use super::protocol::{ClientEvent, Outbound, invalid_payload_error};
use super::rooms::RoomBroadcaster;
use crate::config::ServerConfig;
use crate::metrics::{
    WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_CONNECTION_DURATION_SECONDS,
    WS_DISCONNECTIONS_TOTAL,
};

/// Run a WebSocket session for a connected participant.
///
/// 1. Registers the connection with the broadcaster
/// 2. Forwards outbound events via the send channel, pinging periodically
///    and dropping clients that stop answering
/// 3. Parses incoming text frames as [`ClientEvent`]s and dispatches them
///    through the engine, applying the resulting directives
/// 4. On disconnect, removes the connection everywhere and broadcasts the
///    updated viewer counts
#[instrument(skip_all, fields(conn_id = %connection_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    engine: Arc<FanoutEngine>,
    rooms: Arc<RoomBroadcaster>,
    config: ServerConfig,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(config.send_queue_capacity);
    let connection = Arc::new(ClientConnection::new(connection_id.clone(), send_tx));

    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    rooms.add(connection.clone()).await;

    // Outbound forwarder with periodic Ping frames.
    let ping_interval = Duration::from_secs(config.heartbeat_interval_secs);
    let pong_timeout = Duration::from_secs(config.heartbeat_timeout_secs);
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // Skip the immediate first tick.
        let _ = ticker.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!("client unresponsive for {pong_timeout:?}, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Inbound loop.
    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_owned()),
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };
        let Some(text) = text else { continue };
        connection.mark_alive();

        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => {
                let directives = engine.handle(&connection_id, event);
                apply_outbound(&connection_id, directives, &rooms).await;
            }
            Err(e) => {
                debug!(error = %e, "unparseable frame");
                rooms
                    .emit_to_connection(&connection_id, &invalid_payload_error())
                    .await;
            }
        }
    }

    // Clean up. The dying connection leaves the transport first so the
    // disconnect broadcasts only reach the remaining room members.
    info!(dropped = connection.drop_count(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
    outbound.abort();
    rooms.remove(&connection_id).await;
    let directives = engine.handle_disconnect(&connection_id);
    apply_outbound(&connection_id, directives, &rooms).await;
}

/// Apply engine directives to the transport, all relative to the
/// originating connection.
pub async fn apply_outbound(
    caller: &ConnectionId,
    directives: Vec<Outbound>,
    rooms: &RoomBroadcaster,
) {
    for directive in directives {
        match directive {
            Outbound::JoinRoom(session_id) => rooms.join_room(&session_id, caller).await,
            Outbound::LeaveRoom(session_id) => rooms.leave_room(&session_id, caller).await,
            Outbound::ToRoom(session_id, event) => rooms.emit_to_room(&session_id, &event).await,
            Outbound::ToRoomExcept(session_id, event) => {
                rooms.emit_to_room_except(&session_id, caller, &event).await;
            }
            Outbound::ToCaller(event) => rooms.emit_to_connection(caller, &event).await,
        }
    }
}
