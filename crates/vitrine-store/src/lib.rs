//! # vitrine-store
//!
//! `SQLite` persistence for live-shopping sessions and the product catalog.
//!
//! - `r2d2` connection pool with WAL mode and foreign keys enforced per
//!   connection
//! - Embedded, idempotent schema migrations
//! - Stateless repositories ([`SessionRepo`], [`ProductRepo`]) over
//!   `&Connection`, wrapped by the pool-owning [`Store`] facade
//! - Engagement counters updated atomically in place; live activation runs
//!   as a single transaction enforcing the at-most-one-live invariant

#![deny(unsafe_code)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod products;
mod row;
pub mod sessions;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use error::{Result, StoreError};
pub use migrations::run_migrations;
pub use products::{NewProduct, ProductFilter, ProductRepo};
pub use sessions::{NewSession, SessionRepo};
pub use store::Store;
