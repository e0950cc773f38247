//! The session fan-out engine.
//!
//! One dispatch function per inbound event kind: each handler mutates the
//! viewer registry and/or the store, then returns the outbound directives
//! for the socket task to apply. Keeping the transport out of the engine
//! makes every handler unit-testable with nothing but an in-memory store.
//!
//! Failure semantics: a broken store on the reaction/question paths is
//! reported to the originating connection only; join/leave analytics
//! writes are best-effort and never block the viewer-count broadcast.
//! No error escapes a handler — other sessions and connections are never
//! affected.

use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use tracing::{debug, warn};
use vitrine_core::{ConnectionId, Question, SessionId};
use vitrine_store::Store;

use super::protocol::{
    ClientEvent, HighlightPayload, Outbound, QuestionPayload, ReactionPayload, ServerEvent,
    StatusPayload, TypingPayload,
};
use super::registry::ViewerRegistry;
use crate::metrics::{EVENTS_TOTAL, JOINS_TOTAL, QUESTIONS_TOTAL, REACTIONS_TOTAL};

/// Routes participant events to session rooms and keeps the per-session
/// engagement counters consistent while doing so.
pub struct FanoutEngine {
    store: Store,
    registry: Mutex<ViewerRegistry>,
}

impl FanoutEngine {
    /// Create an engine over the given store with an empty registry.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            registry: Mutex::new(ViewerRegistry::new()),
        }
    }

    /// Current in-memory viewer count for a session.
    pub fn viewer_count(&self, session: &SessionId) -> usize {
        self.registry.lock().count(session)
    }

    /// Number of sessions with at least one viewer.
    pub fn active_rooms(&self) -> usize {
        self.registry.lock().active_sessions()
    }

    /// Dispatch one inbound event for the given connection.
    pub fn handle(&self, caller: &ConnectionId, event: ClientEvent) -> Vec<Outbound> {
        counter!(EVENTS_TOTAL, "event" => event_name(&event)).increment(1);
        match event {
            ClientEvent::JoinSession(session_id) => self.join(caller, &session_id),
            ClientEvent::LeaveSession(session_id) => self.leave(caller, &session_id),
            ClientEvent::SendReaction(payload) => self.reaction(&payload),
            ClientEvent::SendQuestion(payload) => self.question(&payload),
            ClientEvent::HighlightProduct(payload) => Self::highlight(&payload),
            ClientEvent::UpdateSessionStatus(payload) => Self::status_change(&payload),
            ClientEvent::TypingQuestion(payload) => Self::typing(&payload),
        }
    }

    /// Clean up after a dropped connection.
    ///
    /// Idempotent: a connection that never joined anything produces no
    /// broadcasts at all.
    pub fn handle_disconnect(&self, caller: &ConnectionId) -> Vec<Outbound> {
        let changed = self.registry.lock().remove_connection_from_all(caller);
        changed
            .into_iter()
            .map(|(session_id, count)| {
                debug!(session_id = %session_id, count, "viewer disconnected");
                Outbound::ToRoom(session_id, ServerEvent::ViewerCount(count))
            })
            .collect()
    }

    fn join(&self, caller: &ConnectionId, session_id: &SessionId) -> Vec<Outbound> {
        // Room and registry membership are established before the session
        // lookup, mirroring the transport joining the room first.
        let mut out = vec![Outbound::JoinRoom(session_id.clone())];
        let current = self.registry.lock().add(session_id, caller);

        match self.store.session(session_id) {
            Ok(Some(_)) => {
                // Best-effort: the live broadcast uses the in-memory count
                // even when the durable high-water update fails.
                if let Err(e) = self.store.record_viewer_high_water(session_id, current as u64) {
                    warn!(session_id = %session_id, error = %e, "failed to persist viewer high-water");
                }
                counter!(JOINS_TOTAL).increment(1);
                debug!(session_id = %session_id, conn_id = %caller, current, "viewer joined");
                out.push(Outbound::ToRoom(
                    session_id.clone(),
                    ServerEvent::ViewerCount(current),
                ));
                out.push(Outbound::ToCaller(ServerEvent::JoinSuccess {
                    session_id: session_id.clone(),
                    viewer_count: current,
                }));
            }
            Ok(None) => {
                // Unknown session: no broadcast, no acknowledgement.
                debug!(session_id = %session_id, "join for unknown session");
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to load session on join");
                out.push(Outbound::ToCaller(ServerEvent::Error {
                    message: "Failed to join session".into(),
                }));
            }
        }
        out
    }

    fn leave(&self, caller: &ConnectionId, session_id: &SessionId) -> Vec<Outbound> {
        let mut out = vec![Outbound::LeaveRoom(session_id.clone())];
        if let Some(count) = self.registry.lock().remove(session_id, caller) {
            debug!(session_id = %session_id, conn_id = %caller, count, "viewer left");
            out.push(Outbound::ToRoom(
                session_id.clone(),
                ServerEvent::ViewerCount(count),
            ));
        }
        out
    }

    fn reaction(&self, payload: &ReactionPayload) -> Vec<Outbound> {
        match self.store.record_reaction(&payload.session_id, &payload.reaction_type) {
            Ok(Some(analytics)) => {
                counter!(REACTIONS_TOTAL, "kind" => payload.reaction_type.clone()).increment(1);
                vec![Outbound::ToRoom(
                    payload.session_id.clone(),
                    ServerEvent::NewReaction {
                        reaction_type: payload.reaction_type.clone(),
                        user_id: payload.user_id.clone(),
                        timestamp: Utc::now().timestamp_millis(),
                        analytics,
                    },
                )]
            }
            Ok(None) => {
                debug!(session_id = %payload.session_id, "reaction for unknown session");
                vec![error_to_caller("Failed to send reaction")]
            }
            Err(e) => {
                warn!(session_id = %payload.session_id, error = %e, "failed to record reaction");
                vec![error_to_caller("Failed to send reaction")]
            }
        }
    }

    fn question(&self, payload: &QuestionPayload) -> Vec<Outbound> {
        match self.store.record_question(&payload.session_id) {
            Ok(Some(_)) => {
                counter!(QUESTIONS_TOTAL).increment(1);
                let question = Question::new(payload.question.clone(), payload.user_name.clone());
                vec![Outbound::ToRoom(
                    payload.session_id.clone(),
                    ServerEvent::NewQuestion(question),
                )]
            }
            Ok(None) => {
                debug!(session_id = %payload.session_id, "question for unknown session");
                vec![error_to_caller("Failed to send question")]
            }
            Err(e) => {
                warn!(session_id = %payload.session_id, error = %e, "failed to record question");
                vec![error_to_caller("Failed to send question")]
            }
        }
    }

    // No persistence and no product-list check: the caller is trusted.
    fn highlight(payload: &HighlightPayload) -> Vec<Outbound> {
        vec![Outbound::ToRoom(
            payload.session_id.clone(),
            ServerEvent::ProductHighlighted {
                product_id: payload.product_id.clone(),
            },
        )]
    }

    // Broadcast only — the durable transition is the REST status endpoint.
    fn status_change(payload: &StatusPayload) -> Vec<Outbound> {
        vec![Outbound::ToRoom(
            payload.session_id.clone(),
            ServerEvent::SessionStatusChanged {
                status: payload.status,
            },
        )]
    }

    fn typing(payload: &TypingPayload) -> Vec<Outbound> {
        vec![Outbound::ToRoomExcept(
            payload.session_id.clone(),
            ServerEvent::UserTyping {
                user_name: payload.user_name.clone(),
                is_typing: payload.is_typing,
            },
        )]
    }
}

fn error_to_caller(message: &str) -> Outbound {
    Outbound::ToCaller(ServerEvent::Error {
        message: message.into(),
    })
}

fn event_name(event: &ClientEvent) -> &'static str {
    match event {
        ClientEvent::JoinSession(_) => "join-session",
        ClientEvent::LeaveSession(_) => "leave-session",
        ClientEvent::SendReaction(_) => "send-reaction",
        ClientEvent::SendQuestion(_) => "send-question",
        ClientEvent::HighlightProduct(_) => "highlight-product",
        ClientEvent::UpdateSessionStatus(_) => "update-session-status",
        ClientEvent::TypingQuestion(_) => "typing-question",
    }
}
