//! Room-grouped event fan-out to connected WebSocket clients.
//!
//! The broadcaster is the transport-layer capability the engine drives:
//! per-connection channels plus room membership, with serialize-once
//! broadcast to a room, an exclude-sender variant for typing indicators,
//! and single-connection delivery for acks and errors. Send failures are
//! logged and counted, never propagated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use vitrine_core::{ConnectionId, SessionId};

use super::connection::ClientConnection;
use super::protocol::ServerEvent;
use crate::metrics::WS_BROADCAST_DROPS_TOTAL;

/// Manages connections and their room membership.
pub struct RoomBroadcaster {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Session rooms: which connections receive a session's broadcasts.
    rooms: RwLock<HashMap<SessionId, HashSet<ConnectionId>>>,
}

impl RoomBroadcaster {
    /// Create an empty broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
    }

    /// Remove a connection and strip it from every room.
    pub async fn remove(&self, connection_id: &ConnectionId) {
        {
            let mut conns = self.connections.write().await;
            let _ = conns.remove(connection_id);
        }
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            let _ = members.remove(connection_id);
            !members.is_empty()
        });
    }

    /// Add a connection to a session room.
    pub async fn join_room(&self, session_id: &SessionId, connection_id: &ConnectionId) {
        let mut rooms = self.rooms.write().await;
        let _ = rooms
            .entry(session_id.clone())
            .or_default()
            .insert(connection_id.clone());
    }

    /// Remove a connection from a session room, dropping empty rooms.
    pub async fn leave_room(&self, session_id: &SessionId, connection_id: &ConnectionId) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(session_id) {
            let _ = members.remove(connection_id);
            if members.is_empty() {
                let _ = rooms.remove(session_id);
            }
        }
    }

    /// Broadcast an event to every member of a session room.
    pub async fn emit_to_room(&self, session_id: &SessionId, event: &ServerEvent) {
        self.emit_room_inner(session_id, None, event).await;
    }

    /// Broadcast an event to every room member except one connection.
    pub async fn emit_to_room_except(
        &self,
        session_id: &SessionId,
        exclude: &ConnectionId,
        event: &ServerEvent,
    ) {
        self.emit_room_inner(session_id, Some(exclude), event).await;
    }

    async fn emit_room_inner(
        &self,
        session_id: &SessionId,
        exclude: Option<&ConnectionId>,
        event: &ServerEvent,
    ) {
        let Some(json) = serialize(event) else { return };

        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(session_id) else {
            debug!(session_id = %session_id, "broadcast to empty room");
            return;
        };
        let conns = self.connections.read().await;
        for member in members {
            if exclude == Some(member) {
                continue;
            }
            let Some(conn) = conns.get(member) else { continue };
            if !conn.send(json.clone()) {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, session_id = %session_id, "failed to send event to client");
            }
        }
    }

    /// Send an event to a single connection.
    pub async fn emit_to_connection(&self, connection_id: &ConnectionId, event: &ServerEvent) {
        let Some(json) = serialize(event) else { return };
        let conns = self.connections.read().await;
        if let Some(conn) = conns.get(connection_id) {
            if !conn.send(json) {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, "failed to send event to client");
            }
        }
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of members in a session room.
    pub async fn room_size(&self, session_id: &SessionId) -> usize {
        self.rooms
            .read()
            .await
            .get(session_id)
            .map_or(0, HashSet::len)
    }
}

impl Default for RoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "failed to serialize event");
            None
        }
    }
}
