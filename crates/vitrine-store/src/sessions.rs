//! Session repository — lifecycle, catalog references, and aggregate
//! engagement counters.
//!
//! All counter updates happen in place (`SET x = x + 1`, `SET x = MAX(x, ?)`)
//! so interleaved handlers for the same session can never lose an increment
//! to a stale read-modify-write. The live-activation path runs as a single
//! transaction: every other live session is ended before the target becomes
//! live, which keeps the at-most-one-live invariant even for
//! near-simultaneous activations.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::instrument;
use vitrine_core::{Analytics, ReactionBreakdown, ReactionKind, Session, SessionId, SessionStatus};

use crate::error::{Result, StoreError};
use crate::row;

/// Input for creating a new session.
#[derive(Clone, Debug)]
pub struct NewSession {
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Products showcased in this session.
    pub products: Vec<vitrine_core::ProductId>,
    /// Initial status (normally `scheduled`).
    pub status: SessionStatus,
    /// Broadcast start time (RFC 3339); defaults to now.
    pub start_time: Option<String>,
}

const SESSION_COLUMNS: &str = "id, title, description, products, status, start_time, end_time,
        total_viewers, peak_viewers, total_reactions, total_questions,
        reaction_like, reaction_love, reaction_wow, reaction_fire,
        created_at, updated_at";

/// Session repository — stateless, every method takes `&Connection`.
pub struct SessionRepo;

impl SessionRepo {
    /// Create a new session.
    #[instrument(skip_all, fields(title = %new.title))]
    pub fn create(conn: &Connection, new: &NewSession) -> Result<Session> {
        let id = SessionId::new();
        let now = Utc::now().to_rfc3339();
        let start_time = new.start_time.clone().unwrap_or_else(|| now.clone());
        let products_json = serde_json::to_string(&new.products)?;

        let _ = conn.execute(
            "INSERT INTO sessions (id, title, description, products, status, start_time, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.as_str(),
                new.title,
                new.description,
                products_json,
                new.status.to_string(),
                start_time,
                now,
                now,
            ],
        )?;

        Ok(Session {
            id,
            title: new.title.clone(),
            description: new.description.clone(),
            products: new.products.clone(),
            status: new.status,
            start_time,
            end_time: None,
            analytics: Analytics::default(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a session by ID.
    pub fn get(conn: &Connection, id: &SessionId) -> Result<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([id.as_str()])?;
        match rows.next()? {
            Some(r) => Ok(Some(map_session(r)?)),
            None => Ok(None),
        }
    }

    /// Find the currently live session, if any.
    pub fn find_live(conn: &Connection) -> Result<Option<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE status = 'live'
             ORDER BY start_time DESC LIMIT 1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(r) => Ok(Some(map_session(r)?)),
            None => Ok(None),
        }
    }

    /// List sessions, newest start time first, optionally filtered by status.
    pub fn list(conn: &Connection, status: Option<SessionStatus>) -> Result<Vec<Session>> {
        let (sql, args) = match status {
            Some(s) => (
                format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE status = ?1
                     ORDER BY start_time DESC"
                ),
                vec![s.to_string()],
            ),
            None => (
                format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY start_time DESC"),
                Vec::new(),
            ),
        };

        let mut stmt = conn.prepare(&sql)?;
        let args_refs: Vec<&dyn rusqlite::types::ToSql> =
            args.iter().map(|a| a as &dyn rusqlite::types::ToSql).collect();
        let mut rows = stmt.query(args_refs.as_slice())?;
        let mut results = Vec::new();
        while let Some(r) = rows.next()? {
            results.push(map_session(r)?);
        }
        Ok(results)
    }

    /// Make the session live, ending every other live session first.
    ///
    /// Runs as one transaction so two near-simultaneous activations
    /// serialize: the loser finds its rival already ended.
    #[instrument(skip(conn), fields(session_id = %id))]
    pub fn activate(conn: &Connection, id: &SessionId) -> Result<Session> {
        let now = Utc::now().to_rfc3339();
        let tx = conn.unchecked_transaction()?;

        let _ = tx.execute(
            "UPDATE sessions SET status = 'ended', end_time = ?1, updated_at = ?1
             WHERE status = 'live' AND id != ?2",
            params![now, id.as_str()],
        )?;
        let changed = tx.execute(
            "UPDATE sessions SET status = 'live', updated_at = ?1 WHERE id = ?2",
            params![now, id.as_str()],
        )?;
        if changed == 0 {
            // Target does not exist; nothing was committed.
            return Err(StoreError::SessionNotFound(id.to_string()));
        }
        tx.commit()?;

        Self::get(conn, id)?.ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    /// Set a non-live status. Ending a session also stamps its end time.
    #[instrument(skip(conn), fields(session_id = %id, status = %status))]
    pub fn set_status(conn: &Connection, id: &SessionId, status: SessionStatus) -> Result<Session> {
        let now = Utc::now().to_rfc3339();
        let changed = if status == SessionStatus::Ended {
            conn.execute(
                "UPDATE sessions SET status = ?1, end_time = ?2, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), now, id.as_str()],
            )?
        } else {
            conn.execute(
                "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), now, id.as_str()],
            )?
        };
        if changed == 0 {
            return Err(StoreError::SessionNotFound(id.to_string()));
        }
        Self::get(conn, id)?.ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }

    /// Raise the viewer high-water marks to the given concurrent count.
    ///
    /// Both columns track the same maximum; see DESIGN.md for why the
    /// original's behavior is preserved.
    pub fn record_viewer_high_water(
        conn: &Connection,
        id: &SessionId,
        current: u64,
    ) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE sessions SET total_viewers = MAX(total_viewers, ?2),
                                 peak_viewers = MAX(peak_viewers, ?2),
                                 updated_at = ?3
             WHERE id = ?1",
            params![id.as_str(), current as i64, now],
        )?;
        Ok(changed > 0)
    }

    /// Atomically count one reaction and return the updated aggregate.
    ///
    /// Known kinds bump their breakdown column too; unknown kinds bump the
    /// total only. Returns `None` if the session does not exist.
    #[instrument(skip(conn), fields(session_id = %id, kind))]
    pub fn record_reaction(
        conn: &Connection,
        id: &SessionId,
        kind: &str,
    ) -> Result<Option<Analytics>> {
        let now = Utc::now().to_rfc3339();
        let changed = match ReactionKind::parse(kind) {
            Some(known) => {
                let column = breakdown_column(known);
                let sql = format!(
                    "UPDATE sessions SET total_reactions = total_reactions + 1,
                                         {column} = {column} + 1,
                                         updated_at = ?2
                     WHERE id = ?1"
                );
                conn.execute(&sql, params![id.as_str(), now])?
            }
            None => conn.execute(
                "UPDATE sessions SET total_reactions = total_reactions + 1, updated_at = ?2
                 WHERE id = ?1",
                params![id.as_str(), now],
            )?,
        };
        if changed == 0 {
            return Ok(None);
        }
        Self::read_analytics(conn, id)
    }

    /// Atomically count one question and return the updated aggregate.
    ///
    /// Returns `None` if the session does not exist.
    #[instrument(skip(conn), fields(session_id = %id))]
    pub fn record_question(conn: &Connection, id: &SessionId) -> Result<Option<Analytics>> {
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE sessions SET total_questions = total_questions + 1, updated_at = ?2
             WHERE id = ?1",
            params![id.as_str(), now],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Self::read_analytics(conn, id)
    }

    /// Read just the analytics aggregate for a session.
    pub fn read_analytics(conn: &Connection, id: &SessionId) -> Result<Option<Analytics>> {
        conn.query_row(
            "SELECT total_viewers, peak_viewers, total_reactions, total_questions,
                    reaction_like, reaction_love, reaction_wow, reaction_fire
             FROM sessions WHERE id = ?1",
            [id.as_str()],
            |r| {
                Ok(Analytics {
                    total_viewers: r.get::<_, i64>(0)? as u64,
                    peak_viewers: r.get::<_, i64>(1)? as u64,
                    total_reactions: r.get::<_, i64>(2)? as u64,
                    total_questions: r.get::<_, i64>(3)? as u64,
                    reaction_breakdown: ReactionBreakdown {
                        like: r.get::<_, i64>(4)? as u64,
                        love: r.get::<_, i64>(5)? as u64,
                        wow: r.get::<_, i64>(6)? as u64,
                        fire: r.get::<_, i64>(7)? as u64,
                    },
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Replace the whole analytics aggregate (admin REST path).
    pub fn replace_analytics(
        conn: &Connection,
        id: &SessionId,
        analytics: &Analytics,
    ) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE sessions SET total_viewers = ?2, peak_viewers = ?3,
                                 total_reactions = ?4, total_questions = ?5,
                                 reaction_like = ?6, reaction_love = ?7,
                                 reaction_wow = ?8, reaction_fire = ?9,
                                 updated_at = ?10
             WHERE id = ?1",
            params![
                id.as_str(),
                analytics.total_viewers as i64,
                analytics.peak_viewers as i64,
                analytics.total_reactions as i64,
                analytics.total_questions as i64,
                analytics.reaction_breakdown.like as i64,
                analytics.reaction_breakdown.love as i64,
                analytics.reaction_breakdown.wow as i64,
                analytics.reaction_breakdown.fire as i64,
                now,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete a session.
    pub fn delete(conn: &Connection, id: &SessionId) -> Result<bool> {
        let changed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id.as_str()])?;
        Ok(changed > 0)
    }
}

fn breakdown_column(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Like => "reaction_like",
        ReactionKind::Love => "reaction_love",
        ReactionKind::Wow => "reaction_wow",
        ReactionKind::Fire => "reaction_fire",
    }
}

fn map_session(r: &rusqlite::Row<'_>) -> Result<Session> {
    let status_raw: String = row::get(r, 4, "sessions", "status")?;
    let products_raw: String = row::get(r, 3, "sessions", "products")?;

    Ok(Session {
        id: SessionId::from_raw(row::get::<String>(r, 0, "sessions", "id")?),
        title: row::get(r, 1, "sessions", "title")?,
        description: row::get(r, 2, "sessions", "description")?,
        products: row::parse_product_ids(&products_raw)?,
        status: row::parse_enum(&status_raw, "sessions", "status")?,
        start_time: row::get(r, 5, "sessions", "start_time")?,
        end_time: row::get_opt(r, 6, "sessions", "end_time")?,
        analytics: Analytics {
            total_viewers: row::get::<i64>(r, 7, "sessions", "total_viewers")? as u64,
            peak_viewers: row::get::<i64>(r, 8, "sessions", "peak_viewers")? as u64,
            total_reactions: row::get::<i64>(r, 9, "sessions", "total_reactions")? as u64,
            total_questions: row::get::<i64>(r, 10, "sessions", "total_questions")? as u64,
            reaction_breakdown: ReactionBreakdown {
                like: row::get::<i64>(r, 11, "sessions", "reaction_like")? as u64,
                love: row::get::<i64>(r, 12, "sessions", "reaction_love")? as u64,
                wow: row::get::<i64>(r, 13, "sessions", "reaction_wow")? as u64,
                fire: row::get::<i64>(r, 14, "sessions", "reaction_fire")? as u64,
            },
        },
        created_at: row::get(r, 15, "sessions", "created_at")?,
        updated_at: row::get(r, 16, "sessions", "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{new_in_memory, ConnectionConfig, ConnectionPool};
    use crate::migrations::run_migrations;
    use vitrine_core::ProductId;

    fn setup() -> ConnectionPool {
        let pool = new_in_memory(&ConnectionConfig::default()).unwrap();
        let conn = pool.get().unwrap();
        let _ = run_migrations(&conn).unwrap();
        pool
    }

    fn new_session(title: &str) -> NewSession {
        NewSession {
            title: title.into(),
            description: "A session".into(),
            products: vec![ProductId::from_raw("prod_a")],
            status: SessionStatus::Scheduled,
            start_time: None,
        }
    }

    #[test]
    fn create_and_get() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let created = SessionRepo::create(&conn, &new_session("Launch day")).unwrap();
        assert!(created.id.as_str().starts_with("sess_"));
        assert_eq!(created.status, SessionStatus::Scheduled);
        assert_eq!(created.analytics, Analytics::default());

        let fetched = SessionRepo::get(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Launch day");
        assert_eq!(fetched.products, created.products);
        assert!(fetched.end_time.is_none());
    }

    #[test]
    fn get_missing_returns_none() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let result = SessionRepo::get(&conn, &SessionId::from_raw("sess_missing")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn list_with_status_filter() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();
        let _b = SessionRepo::create(&conn, &new_session("B")).unwrap();
        let _ = SessionRepo::activate(&conn, &a.id).unwrap();

        let all = SessionRepo::list(&conn, None).unwrap();
        assert_eq!(all.len(), 2);

        let live = SessionRepo::list(&conn, Some(SessionStatus::Live)).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, a.id);
    }

    #[test]
    fn activate_enforces_single_live() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();
        let b = SessionRepo::create(&conn, &new_session("B")).unwrap();

        let a_live = SessionRepo::activate(&conn, &a.id).unwrap();
        assert_eq!(a_live.status, SessionStatus::Live);

        let b_live = SessionRepo::activate(&conn, &b.id).unwrap();
        assert_eq!(b_live.status, SessionStatus::Live);

        // A must have been ended with an end time.
        let a_after = SessionRepo::get(&conn, &a.id).unwrap().unwrap();
        assert_eq!(a_after.status, SessionStatus::Ended);
        assert!(a_after.end_time.is_some());

        let live = SessionRepo::list(&conn, Some(SessionStatus::Live)).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, b.id);
    }

    #[test]
    fn activate_is_idempotent_for_live_session() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();
        let _ = SessionRepo::activate(&conn, &a.id).unwrap();
        let again = SessionRepo::activate(&conn, &a.id).unwrap();
        assert_eq!(again.status, SessionStatus::Live);
        assert_eq!(
            SessionRepo::list(&conn, Some(SessionStatus::Live)).unwrap().len(),
            1
        );
    }

    #[test]
    fn activate_missing_session_fails() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let result = SessionRepo::activate(&conn, &SessionId::from_raw("sess_nope"));
        assert!(matches!(result, Err(StoreError::SessionNotFound(_))));
    }

    #[test]
    fn end_sets_end_time() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();
        let ended = SessionRepo::set_status(&conn, &a.id, SessionStatus::Ended).unwrap();
        assert_eq!(ended.status, SessionStatus::Ended);
        assert!(ended.end_time.is_some());
    }

    #[test]
    fn find_live_none_when_no_live_session() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let _ = SessionRepo::create(&conn, &new_session("A")).unwrap();
        assert!(SessionRepo::find_live(&conn).unwrap().is_none());
    }

    #[test]
    fn find_live_returns_the_live_session() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();
        let _ = SessionRepo::activate(&conn, &a.id).unwrap();
        let live = SessionRepo::find_live(&conn).unwrap().unwrap();
        assert_eq!(live.id, a.id);
    }

    #[test]
    fn viewer_high_water_is_monotone() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();

        assert!(SessionRepo::record_viewer_high_water(&conn, &a.id, 3).unwrap());
        let analytics = SessionRepo::read_analytics(&conn, &a.id).unwrap().unwrap();
        assert_eq!(analytics.peak_viewers, 3);
        assert_eq!(analytics.total_viewers, 3);

        // A lower concurrent count must not lower the marks.
        assert!(SessionRepo::record_viewer_high_water(&conn, &a.id, 2).unwrap());
        let analytics = SessionRepo::read_analytics(&conn, &a.id).unwrap().unwrap();
        assert_eq!(analytics.peak_viewers, 3);
        assert_eq!(analytics.total_viewers, 3);
    }

    #[test]
    fn viewer_high_water_missing_session() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let hit =
            SessionRepo::record_viewer_high_water(&conn, &SessionId::from_raw("sess_x"), 1)
                .unwrap();
        assert!(!hit);
    }

    #[test]
    fn reactions_update_total_and_breakdown() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();

        let analytics = SessionRepo::record_reaction(&conn, &a.id, "fire").unwrap().unwrap();
        assert_eq!(analytics.total_reactions, 1);
        assert_eq!(analytics.reaction_breakdown.fire, 1);

        let analytics = SessionRepo::record_reaction(&conn, &a.id, "like").unwrap().unwrap();
        assert_eq!(analytics.total_reactions, 2);
        assert_eq!(analytics.reaction_breakdown.like, 1);
        assert_eq!(analytics.total_reactions, analytics.reaction_breakdown.sum());
    }

    #[test]
    fn unknown_reaction_kind_bumps_total_only() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();

        let analytics = SessionRepo::record_reaction(&conn, &a.id, "clap").unwrap().unwrap();
        assert_eq!(analytics.total_reactions, 1);
        assert_eq!(analytics.reaction_breakdown.sum(), 0);
    }

    #[test]
    fn reaction_for_missing_session_returns_none() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let result =
            SessionRepo::record_reaction(&conn, &SessionId::from_raw("sess_x"), "fire").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn questions_increment() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();

        let analytics = SessionRepo::record_question(&conn, &a.id).unwrap().unwrap();
        assert_eq!(analytics.total_questions, 1);
        let analytics = SessionRepo::record_question(&conn, &a.id).unwrap().unwrap();
        assert_eq!(analytics.total_questions, 2);
    }

    #[test]
    fn replace_analytics_overwrites() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();

        let replacement = Analytics {
            total_viewers: 10,
            peak_viewers: 10,
            total_reactions: 4,
            total_questions: 2,
            reaction_breakdown: ReactionBreakdown {
                like: 1,
                love: 1,
                wow: 1,
                fire: 1,
            },
        };
        assert!(SessionRepo::replace_analytics(&conn, &a.id, &replacement).unwrap());
        let analytics = SessionRepo::read_analytics(&conn, &a.id).unwrap().unwrap();
        assert_eq!(analytics, replacement);
    }

    #[test]
    fn delete_session() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let a = SessionRepo::create(&conn, &new_session("A")).unwrap();
        assert!(SessionRepo::delete(&conn, &a.id).unwrap());
        assert!(SessionRepo::get(&conn, &a.id).unwrap().is_none());
        assert!(!SessionRepo::delete(&conn, &a.id).unwrap());
    }

    #[test]
    fn corrupt_status_surfaces_as_corrupt_row() {
        let pool = setup();
        let conn = pool.get().unwrap();
        let now = Utc::now().to_rfc3339();
        let _ = conn
            .execute(
                "INSERT INTO sessions (id, title, description, products, status, start_time, created_at, updated_at)
                 VALUES ('sess_bad', 't', 'd', '[]', 'BOGUS', ?1, ?1, ?1)",
                [&now],
            )
            .unwrap();
        let result = SessionRepo::get(&conn, &SessionId::from_raw("sess_bad"));
        assert!(matches!(result, Err(StoreError::CorruptRow { .. })));
    }
}
