//! Viewer registry — concurrent viewer connections per session, in memory.
//!
//! Owned exclusively by the fan-out engine; never persisted. A process
//! restart correctly rebuilds it as empty. Entries are created on first
//! join and deleted as soon as the set empties, so ended sessions cannot
//! accumulate stale entries.

use std::collections::{HashMap, HashSet};

use vitrine_core::{ConnectionId, SessionId};

/// Mapping from session to the set of connected viewer connections.
#[derive(Debug, Default)]
pub struct ViewerRegistry {
    sessions: HashMap<SessionId, HashSet<ConnectionId>>,
}

impl ViewerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection into a session's set, creating the set if
    /// absent. Idempotent on duplicates. Returns the new count.
    pub fn add(&mut self, session: &SessionId, conn: &ConnectionId) -> usize {
        let set = self.sessions.entry(session.clone()).or_default();
        let _ = set.insert(conn.clone());
        set.len()
    }

    /// Remove a connection from a session's set.
    ///
    /// Returns `Some(new_count)` when the session had an entry (deleting
    /// the entry if the set emptied), `None` when it did not — the caller
    /// uses this to skip broadcasting for sessions nobody ever joined.
    pub fn remove(&mut self, session: &SessionId, conn: &ConnectionId) -> Option<usize> {
        let set = self.sessions.get_mut(session)?;
        let _ = set.remove(conn);
        let count = set.len();
        if count == 0 {
            let _ = self.sessions.remove(session);
        }
        Some(count)
    }

    /// Current viewer count for a session (0 if absent).
    #[must_use]
    pub fn count(&self, session: &SessionId) -> usize {
        self.sessions.get(session).map_or(0, HashSet::len)
    }

    /// Remove a connection from every session it appears in.
    ///
    /// Returns the (session, new count) pairs for sessions that changed,
    /// so the caller can broadcast updated counts. The transport does not
    /// say which room a closing connection was in, so all entries are
    /// scanned.
    pub fn remove_connection_from_all(&mut self, conn: &ConnectionId) -> Vec<(SessionId, usize)> {
        let mut changed = Vec::new();
        self.sessions.retain(|session, set| {
            if set.remove(conn) {
                changed.push((session.clone(), set.len()));
            }
            !set.is_empty()
        });
        changed
    }

    /// Number of sessions with at least one viewer.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
