//! # vitrine-core
//!
//! Shared domain types for the vitrine live-shopping platform:
//!
//! - Branded ID newtypes ([`SessionId`], [`ProductId`], [`ConnectionId`])
//! - Session lifecycle and engagement analytics ([`Session`], [`Analytics`])
//! - Product catalog records ([`Product`])
//! - Ephemeral broadcast payloads ([`Question`])

#![deny(unsafe_code)]

pub mod ids;
pub mod product;
pub mod question;
pub mod session;

pub use ids::{ConnectionId, ProductId, SessionId};
pub use product::{Product, ProductCategory};
pub use question::Question;
pub use session::{Analytics, ReactionBreakdown, ReactionKind, Session, SessionStatus};
