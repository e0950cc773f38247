//! Wire protocol for the realtime channel.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`;
//! event names are kebab-case, payload fields camelCase. The reaction kind
//! travels as a plain string so unknown kinds can still be counted.

use serde::{Deserialize, Serialize};
use vitrine_core::{Analytics, ProductId, Question, SessionId, SessionStatus};

/// Inbound event from a participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join a session room. Payload is the bare session id.
    JoinSession(SessionId),
    /// Leave a session room. Payload is the bare session id.
    LeaveSession(SessionId),
    /// Send a reaction.
    SendReaction(ReactionPayload),
    /// Ask a question.
    SendQuestion(QuestionPayload),
    /// Spotlight a product (admin clients).
    HighlightProduct(HighlightPayload),
    /// Announce a status change to the room (broadcast only — the durable
    /// transition is the REST status endpoint).
    UpdateSessionStatus(StatusPayload),
    /// Typing indicator for the question box.
    TypingQuestion(TypingPayload),
}

/// Payload of [`ClientEvent::SendReaction`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload {
    /// Target session.
    pub session_id: SessionId,
    /// Reaction kind; unknown kinds count toward the total only.
    pub reaction_type: String,
    /// Identifier of the reacting viewer.
    pub user_id: String,
}

/// Payload of [`ClientEvent::SendQuestion`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    /// Target session.
    pub session_id: SessionId,
    /// The question text.
    pub question: String,
    /// Author display name; `"Anonymous"` when absent.
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Payload of [`ClientEvent::HighlightProduct`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightPayload {
    /// Target session.
    pub session_id: SessionId,
    /// Product to spotlight. Not checked against the session's list — the
    /// caller is trusted (authorization is the HTTP layer's concern).
    pub product_id: ProductId,
}

/// Payload of [`ClientEvent::UpdateSessionStatus`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    /// Target session.
    pub session_id: SessionId,
    /// Announced status.
    pub status: SessionStatus,
}

/// Payload of [`ClientEvent::TypingQuestion`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    /// Target session.
    pub session_id: SessionId,
    /// Who is typing.
    pub user_name: String,
    /// Whether typing started or stopped.
    pub is_typing: bool,
}

/// Outbound event to a room or a single connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Current concurrent viewer count for the room.
    ViewerCount(usize),
    /// Join acknowledgement, sent to the joining connection only.
    #[serde(rename_all = "camelCase")]
    JoinSuccess {
        /// The joined session.
        session_id: SessionId,
        /// Viewer count at join time.
        viewer_count: usize,
    },
    /// A reaction, with the full post-increment aggregate.
    #[serde(rename_all = "camelCase")]
    NewReaction {
        /// Reaction kind as sent.
        reaction_type: String,
        /// Who reacted.
        user_id: String,
        /// Emission time, epoch milliseconds.
        timestamp: i64,
        /// Updated analytics aggregate.
        analytics: Analytics,
    },
    /// A question, broadcast to the whole room.
    NewQuestion(Question),
    /// A product spotlight.
    #[serde(rename_all = "camelCase")]
    ProductHighlighted {
        /// The spotlighted product.
        product_id: ProductId,
    },
    /// Status change announcement.
    SessionStatusChanged {
        /// The announced status.
        status: SessionStatus,
    },
    /// Typing indicator, sent to everyone except the typist.
    #[serde(rename_all = "camelCase")]
    UserTyping {
        /// Who is typing.
        user_name: String,
        /// Whether typing started or stopped.
        is_typing: bool,
    },
    /// Failure notice, sent to the originating connection only.
    Error {
        /// Human-readable message; never carries internal detail.
        message: String,
    },
}

/// A directive produced by the fan-out engine, applied to the transport by
/// the socket task. All directives are relative to the originating
/// connection.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// Join the originator to a session room.
    JoinRoom(SessionId),
    /// Remove the originator from a session room.
    LeaveRoom(SessionId),
    /// Broadcast to every room member.
    ToRoom(SessionId, ServerEvent),
    /// Broadcast to every room member except the originator.
    ToRoomExcept(SessionId, ServerEvent),
    /// Reply to the originator only.
    ToCaller(ServerEvent),
}

/// Error reply for a frame that could not be parsed.
pub fn invalid_payload_error() -> ServerEvent {
    ServerEvent::Error {
        message: "Invalid event payload".into(),
    }
}
