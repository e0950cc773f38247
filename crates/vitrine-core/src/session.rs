//! Session lifecycle and engagement analytics.
//!
//! A session moves `scheduled → live → ended`. At most one session is
//! `live` at any time; the store's activation transaction enforces this.
//! The analytics aggregate is embedded in the session record and updated
//! in place by the store so concurrent increments never lose writes.

use serde::{Deserialize, Serialize};

use crate::ids::{ProductId, SessionId};

/// Lifecycle status of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created but not yet started.
    Scheduled,
    /// Currently broadcasting. At most one session may be live.
    Live,
    /// Finished; remains queryable.
    Ended,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Live => write!(f, "live"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "live" => Ok(Self::Live),
            "ended" => Ok(Self::Ended),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// The fixed set of reaction kinds tracked per session.
///
/// Reactions arriving with any other kind still count toward
/// `total_reactions` but are not broken down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    /// 👍
    Like,
    /// ❤️
    Love,
    /// 😮
    Wow,
    /// 🔥
    Fire,
}

impl ReactionKind {
    /// All known kinds, in breakdown order.
    pub const ALL: [Self; 4] = [Self::Like, Self::Love, Self::Wow, Self::Fire];

    /// The lowercase wire name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Love => "love",
            Self::Wow => "wow",
            Self::Fire => "fire",
        }
    }

    /// Parse a wire name, returning `None` for unknown kinds.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "love" => Some(Self::Love),
            "wow" => Some(Self::Wow),
            "fire" => Some(Self::Fire),
            _ => None,
        }
    }
}

/// Per-kind reaction counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionBreakdown {
    /// Count of `like` reactions.
    pub like: u64,
    /// Count of `love` reactions.
    pub love: u64,
    /// Count of `wow` reactions.
    pub wow: u64,
    /// Count of `fire` reactions.
    pub fire: u64,
}

impl ReactionBreakdown {
    /// Counter for a specific kind.
    #[must_use]
    pub fn get(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Like => self.like,
            ReactionKind::Love => self.love,
            ReactionKind::Wow => self.wow,
            ReactionKind::Fire => self.fire,
        }
    }

    /// Sum over all kinds.
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.like + self.love + self.wow + self.fire
    }
}

/// Engagement aggregate embedded in a session record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// Historic peak concurrent viewer count.
    ///
    /// Updated identically to `peak_viewers`; the distinction is kept for
    /// wire compatibility. See DESIGN.md.
    pub total_viewers: u64,
    /// Maximum concurrent viewers ever observed.
    pub peak_viewers: u64,
    /// Total reactions, including unknown kinds.
    pub total_reactions: u64,
    /// Total questions asked.
    pub total_questions: u64,
    /// Per-kind reaction counters.
    pub reaction_breakdown: ReactionBreakdown,
}

/// A live-shopping session record.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session ID.
    pub id: SessionId,
    /// Display title (≤ 200 chars).
    pub title: String,
    /// Display description (≤ 500 chars).
    pub description: String,
    /// Ordered product references showcased in this session.
    pub products: Vec<ProductId>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// When the broadcast starts (RFC 3339).
    pub start_time: String,
    /// When the broadcast ended (RFC 3339), if it has.
    pub end_time: Option<String>,
    /// Engagement aggregate.
    pub analytics: Analytics,
    /// Row creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last row update timestamp (RFC 3339).
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_roundtrip() {
        for status in [
            SessionStatus::Scheduled,
            SessionStatus::Live,
            SessionStatus::Ended,
        ] {
            let parsed: SessionStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_rejects_unknown() {
        let result: Result<SessionStatus, _> = "paused".parse();
        assert!(result.is_err());
    }

    #[test]
    fn status_serde_is_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Live).unwrap();
        assert_eq!(json, "\"live\"");
    }

    #[test]
    fn reaction_kind_parse_known() {
        for kind in ReactionKind::ALL {
            assert_eq!(ReactionKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn reaction_kind_parse_unknown() {
        assert_eq!(ReactionKind::parse("clap"), None);
        assert_eq!(ReactionKind::parse(""), None);
        // Case-sensitive: wire names are lowercase
        assert_eq!(ReactionKind::parse("Fire"), None);
    }

    #[test]
    fn breakdown_get_and_sum() {
        let breakdown = ReactionBreakdown {
            like: 1,
            love: 2,
            wow: 3,
            fire: 4,
        };
        assert_eq!(breakdown.get(ReactionKind::Like), 1);
        assert_eq!(breakdown.get(ReactionKind::Fire), 4);
        assert_eq!(breakdown.sum(), 10);
    }

    #[test]
    fn analytics_serializes_camel_case() {
        let analytics = Analytics {
            total_viewers: 5,
            peak_viewers: 5,
            total_reactions: 2,
            total_questions: 1,
            reaction_breakdown: ReactionBreakdown {
                fire: 2,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&analytics).unwrap();
        assert_eq!(json["totalViewers"], 5);
        assert_eq!(json["peakViewers"], 5);
        assert_eq!(json["totalReactions"], 2);
        assert_eq!(json["totalQuestions"], 1);
        assert_eq!(json["reactionBreakdown"]["fire"], 2);
        assert_eq!(json["reactionBreakdown"]["like"], 0);
    }

    #[test]
    fn default_analytics_is_zeroed() {
        let analytics = Analytics::default();
        assert_eq!(analytics.total_reactions, 0);
        assert_eq!(analytics.reaction_breakdown.sum(), 0);
    }
}
