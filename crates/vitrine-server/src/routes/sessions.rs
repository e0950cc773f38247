//! Session administration CRUD.
//!
//! The status endpoint here is the durable side of a status change: going
//! live runs the store's atomic activation (ending every other live
//! session). The realtime `update-session-status` event only broadcasts —
//! admin clients invoke both.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use vitrine_core::{Analytics, ProductId, Session, SessionId, SessionStatus};
use vitrine_store::NewSession;

use crate::error::ApiError;
use crate::server::AppState;
use crate::validation::{MAX_SESSION_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, require_bounded};

/// Query parameters for `GET /api/sessions`.
#[derive(Debug, Default, Deserialize)]
pub struct SessionListQuery {
    /// Filter by lifecycle status.
    pub status: Option<String>,
}

/// Request body for creating a session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    /// Display title.
    pub title: Option<String>,
    /// Display description.
    pub description: Option<String>,
    /// Product ids to showcase.
    pub products: Option<Vec<String>>,
    /// Initial status (default `scheduled`).
    pub status: Option<String>,
    /// Broadcast start time (RFC 3339, default now).
    pub start_time: Option<String>,
}

/// Request body for `PATCH /api/sessions/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    /// The new status.
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> Result<SessionStatus, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("Invalid status value".into()))
}

fn validate(body: SessionBody) -> Result<NewSession, ApiError> {
    let title = body
        .title
        .ok_or_else(|| ApiError::Validation("Session title is required".into()))?;
    require_bounded(&title, "Title", MAX_TITLE_LENGTH)?;

    let description = body
        .description
        .ok_or_else(|| ApiError::Validation("Session description is required".into()))?;
    require_bounded(&description, "Description", MAX_SESSION_DESCRIPTION_LENGTH)?;

    let status = match body.status {
        Some(raw) => parse_status(&raw)?,
        None => SessionStatus::Scheduled,
    };

    Ok(NewSession {
        title,
        description,
        products: body
            .products
            .unwrap_or_default()
            .into_iter()
            .map(ProductId::from_raw)
            .collect(),
        status,
        start_time: body.start_time,
    })
}

/// Serialize a session with its product references resolved to full
/// records, the way the viewer page consumes it.
fn with_products(state: &AppState, session: &Session) -> Result<Value, ApiError> {
    let products = state.store.products_by_ids(&session.products)?;
    let mut value = serde_json::to_value(session)
        .map_err(|e| ApiError::Internal(vitrine_store::StoreError::Serde(e)))?;
    value["products"] = serde_json::to_value(products)
        .map_err(|e| ApiError::Internal(vitrine_store::StoreError::Serde(e)))?;
    Ok(value)
}

/// `GET /api/sessions`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<Value>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let sessions = state.store.list_sessions(status)?;
    Ok(Json(json!({
        "success": true,
        "count": sessions.len(),
        "data": sessions,
    })))
}

/// `GET /api/sessions/live`
pub async fn live(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let data = match state.store.find_live()? {
        Some(session) => with_products(&state, &session)?,
        None => Value::Null,
    };
    Ok(Json(json!({"success": true, "data": data})))
}

/// `GET /api/sessions/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = state
        .store
        .session(&SessionId::from_raw(id))?
        .ok_or_else(|| ApiError::NotFound("Session not found".into()))?;
    Ok(Json(json!({
        "success": true,
        "data": with_products(&state, &session)?,
    })))
}

/// `POST /api/sessions`
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<SessionBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = validate(body)?;
    let session = state.store.create_session(&new)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Session created successfully",
            "data": with_products(&state, &session)?,
        })),
    ))
}

/// `PATCH /api/sessions/{id}/status`
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Value>, ApiError> {
    let status = parse_status(
        body.status
            .as_deref()
            .ok_or_else(|| ApiError::Validation("Invalid status value".into()))?,
    )?;
    let session = state
        .store
        .set_live_status(&SessionId::from_raw(id), status)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Session {status} successfully"),
        "data": with_products(&state, &session)?,
    })))
}

/// `PATCH /api/sessions/{id}/analytics`
pub async fn update_analytics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(analytics): Json<Analytics>,
) -> Result<Json<Value>, ApiError> {
    let session = state
        .store
        .replace_analytics(&SessionId::from_raw(id), &analytics)?;
    Ok(Json(json!({"success": true, "data": session})))
}

/// `DELETE /api/sessions/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.delete_session(&SessionId::from_raw(id))?;
    Ok(Json(json!({
        "success": true,
        "message": "Session deleted successfully",
    })))
}
