//! `Store` — pool-owning facade over the repositories.
//!
//! One `Store` is shared by the REST routes and the fan-out engine. Every
//! method checks a connection out of the pool, delegates to the stateless
//! repository, and returns it. Cloning is cheap (the pool is refcounted).

use std::path::Path;

use vitrine_core::{Analytics, Product, ProductId, Session, SessionId, SessionStatus};

use crate::connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
use crate::error::{Result, StoreError};
use crate::migrations::run_migrations;
use crate::products::{NewProduct, ProductFilter, ProductRepo};
use crate::sessions::{NewSession, SessionRepo};

/// Shared handle to the session and product store.
#[derive(Clone)]
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Wrap an existing pool. Assumes migrations have been run.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open a file-backed store and run pending migrations.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        let path = path.to_str().ok_or_else(|| StoreError::Migration {
            message: format!("database path is not valid UTF-8: {}", path.display()),
        })?;
        let pool = new_file(path, config)?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing) and run migrations.
    pub fn in_memory() -> Result<Self> {
        let pool = new_in_memory(&ConnectionConfig::default())?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ── Sessions ────────────────────────────────────────────────────

    /// Create a session.
    pub fn create_session(&self, new: &NewSession) -> Result<Session> {
        SessionRepo::create(&*self.conn()?, new)
    }

    /// Fetch a session by ID.
    pub fn session(&self, id: &SessionId) -> Result<Option<Session>> {
        SessionRepo::get(&*self.conn()?, id)
    }

    /// Fetch the currently live session, if any.
    pub fn find_live(&self) -> Result<Option<Session>> {
        SessionRepo::find_live(&*self.conn()?)
    }

    /// List sessions, optionally filtered by status.
    pub fn list_sessions(&self, status: Option<SessionStatus>) -> Result<Vec<Session>> {
        SessionRepo::list(&*self.conn()?, status)
    }

    /// Apply a durable status transition.
    ///
    /// `live` runs the atomic activation (ending every other live session
    /// first); `ended` stamps the end time; `scheduled` just sets status.
    pub fn set_live_status(&self, id: &SessionId, status: SessionStatus) -> Result<Session> {
        let conn = self.conn()?;
        match status {
            SessionStatus::Live => SessionRepo::activate(&conn, id),
            SessionStatus::Scheduled | SessionStatus::Ended => {
                SessionRepo::set_status(&conn, id, status)
            }
        }
    }

    /// Raise the viewer high-water marks for a session.
    pub fn record_viewer_high_water(&self, id: &SessionId, current: u64) -> Result<bool> {
        SessionRepo::record_viewer_high_water(&*self.conn()?, id, current)
    }

    /// Count one reaction; `None` when the session does not exist.
    pub fn record_reaction(&self, id: &SessionId, kind: &str) -> Result<Option<Analytics>> {
        SessionRepo::record_reaction(&*self.conn()?, id, kind)
    }

    /// Count one question; `None` when the session does not exist.
    pub fn record_question(&self, id: &SessionId) -> Result<Option<Analytics>> {
        SessionRepo::record_question(&*self.conn()?, id)
    }

    /// Replace a session's analytics aggregate wholesale.
    pub fn replace_analytics(&self, id: &SessionId, analytics: &Analytics) -> Result<Session> {
        let conn = self.conn()?;
        if !SessionRepo::replace_analytics(&conn, id, analytics)? {
            return Err(StoreError::SessionNotFound(id.to_string()));
        }
        SessionRepo::get(&conn, id)?.ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    /// Delete a session.
    pub fn delete_session(&self, id: &SessionId) -> Result<()> {
        if SessionRepo::delete(&*self.conn()?, id)? {
            Ok(())
        } else {
            Err(StoreError::SessionNotFound(id.to_string()))
        }
    }

    // ── Products ────────────────────────────────────────────────────

    /// Create a product.
    pub fn create_product(&self, new: &NewProduct) -> Result<Product> {
        ProductRepo::create(&*self.conn()?, new)
    }

    /// Fetch a product by ID.
    pub fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        ProductRepo::get(&*self.conn()?, id)
    }

    /// Fetch products by ID, preserving order, skipping dangling references.
    pub fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        ProductRepo::get_many(&*self.conn()?, ids)
    }

    /// List products with filters.
    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        ProductRepo::list(&*self.conn()?, filter)
    }

    /// Replace a product's fields.
    pub fn update_product(&self, id: &ProductId, new: &NewProduct) -> Result<Product> {
        ProductRepo::update(&*self.conn()?, id, new)?
            .ok_or_else(|| StoreError::ProductNotFound(id.to_string()))
    }

    /// Delete a product.
    pub fn delete_product(&self, id: &ProductId) -> Result<()> {
        if ProductRepo::delete(&*self.conn()?, id)? {
            Ok(())
        } else {
            Err(StoreError::ProductNotFound(id.to_string()))
        }
    }
}
