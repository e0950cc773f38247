//! WebSocket gateway: connection management, room fan-out, the viewer
//! registry, and the session fan-out engine.

pub mod connection;
pub mod engine;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod session;
