//! # vitrine-server
//!
//! Axum HTTP + `WebSocket` server for the vitrine live-shopping platform.
//!
//! - REST routes for the product catalog and session administration
//! - `WebSocket` gateway with heartbeat and per-connection send queues
//! - The session fan-out engine: viewer registry, room broadcast, and
//!   live-updated engagement counters
//! - Health and Prometheus metrics endpoints, graceful shutdown

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod validation;
pub mod ws;

pub use config::ServerConfig;
pub use server::{AppState, VitrineServer};
