use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::{AuthUser, StaffUser};
use crate::models::ShowSession;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_sessions", get(list_sessions))
        .route("/show_sessions", post(create_session))
        .route("/show_sessions/{id}", get(get_session))
}

/* ---------- helpers ---------- */

async fn show_exists(pool: &sqlx::PgPool, show_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM astronomy_shows WHERE id = $1)")
        .bind(show_id)
        .fetch_one(pool)
        .await
}

async fn dome_exists(pool: &sqlx::PgPool, dome_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM planetarium_domes WHERE id = $1)")
        .bind(dome_id)
        .fetch_one(pool)
        .await
}

/* ---------- SESSIONS ---------- */

// GET /api/show_sessions
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.cache.get_upcoming_sessions().await;

    Ok((StatusCode::OK, Json(sessions)))
}

// GET /api/show_sessions/{id}
#[derive(Debug, Serialize)]
struct DomeInfo {
    id: i64,
    name: String,
    rows: i32,
    seats_in_row: i32,
    capacity: i64,
}

#[derive(Debug, Serialize)]
struct TakenPlace {
    row: i32,
    seat: i32,
}

#[derive(Debug, Serialize)]
struct SessionDetailResponse {
    id: i64,
    show_time: DateTime<Utc>,
    show_title: String,
    planetarium_dome: DomeInfo,
    tickets_available: i64,
    taken_places: Vec<TakenPlace>,
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query(
        r#"
        SELECT ss.id, ss.show_time, a.title AS show_title,
               d.id AS dome_id, d.name AS dome_name, d."rows", d.seats_in_row
        FROM show_sessions ss
        JOIN astronomy_shows a ON a.id = ss.show_id
        JOIN planetarium_domes d ON d.id = ss.dome_id
        WHERE ss.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("show session".to_string()))?;

    let taken = sqlx::query_as::<_, (i32, i32)>(
        r#"SELECT "row", seat FROM tickets WHERE session_id = $1 ORDER BY "row", seat"#,
    )
    .bind(id)
    .fetch_all(&state.db.pool)
    .await?;

    let rows: i32 = row.get("rows");
    let seats_in_row: i32 = row.get("seats_in_row");
    let capacity = rows as i64 * seats_in_row as i64;
    let taken_places: Vec<TakenPlace> = taken
        .into_iter()
        .map(|(row, seat)| TakenPlace { row, seat })
        .collect();
    let tickets_available = capacity - taken_places.len() as i64;

    Ok((
        StatusCode::OK,
        Json(SessionDetailResponse {
            id: row.get("id"),
            show_time: row.get("show_time"),
            show_title: row.get("show_title"),
            planetarium_dome: DomeInfo {
                id: row.get("dome_id"),
                name: row.get("dome_name"),
                rows,
                seats_in_row,
                capacity,
            },
            tickets_available,
            taken_places,
        }),
    ))
}

// POST /api/show_sessions
#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    show_time: DateTime<Utc>,
    astronomy_show: i64,
    planetarium_dome: i64,
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    StaffUser(_user): StaffUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !show_exists(&state.db.pool, req.astronomy_show).await? {
        return Err(AppError::BadRequest(format!(
            "unknown astronomy show id: {}",
            req.astronomy_show
        )));
    }
    if !dome_exists(&state.db.pool, req.planetarium_dome).await? {
        return Err(AppError::BadRequest(format!(
            "unknown planetarium dome id: {}",
            req.planetarium_dome
        )));
    }

    let session = sqlx::query_as::<_, ShowSession>(
        r#"
        INSERT INTO show_sessions (show_time, show_id, dome_id)
        VALUES ($1, $2, $3)
        RETURNING id, show_time, show_id, dome_id
        "#,
    )
    .bind(req.show_time)
    .bind(req.astronomy_show)
    .bind(req.planetarium_dome)
    .fetch_one(&state.db.pool)
    .await?;

    state.cache.invalidate_sessions().await;

    Ok((StatusCode::CREATED, Json(session)))
}
