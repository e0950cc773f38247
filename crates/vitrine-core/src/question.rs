//! Ephemeral question payloads.
//!
//! Questions are never persisted — they exist only for the duration of the
//! broadcast to the session room.

use serde::{Deserialize, Serialize};

/// Display name used when a viewer asks without identifying themselves.
pub const ANONYMOUS: &str = "Anonymous";

/// A question broadcast to every member of a session room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Time-derived identifier (epoch milliseconds, stringified).
    pub id: String,
    /// Author display name, `"Anonymous"` when not provided.
    pub user_name: String,
    /// The question text.
    pub question: String,
    /// Creation timestamp (RFC 3339).
    pub timestamp: String,
}

impl Question {
    /// Build a question stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>, user_name: Option<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            user_name: user_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_owned()),
            question: text.into(),
            timestamp: now.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_author_is_kept() {
        let q = Question::new("Does it ship abroad?", Some("maya".into()));
        assert_eq!(q.user_name, "maya");
        assert_eq!(q.question, "Does it ship abroad?");
    }

    #[test]
    fn missing_author_defaults_to_anonymous() {
        let q = Question::new("Price?", None);
        assert_eq!(q.user_name, ANONYMOUS);
    }

    #[test]
    fn empty_author_defaults_to_anonymous() {
        let q = Question::new("Price?", Some(String::new()));
        assert_eq!(q.user_name, ANONYMOUS);
    }

    #[test]
    fn id_is_numeric_millis() {
        let q = Question::new("hi", None);
        let millis: i64 = q.id.parse().unwrap();
        assert!(millis > 0);
    }

    #[test]
    fn serializes_camel_case() {
        let q = Question::new("Any discount?", Some("sam".into()));
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["userName"], "sam");
        assert!(json["timestamp"].is_string());
        assert!(json["id"].is_string());
    }
}
