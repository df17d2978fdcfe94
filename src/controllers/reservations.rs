use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{PlanetariumDome, Reservation, Ticket};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations))
        .route("/reservations", post(create_reservation))
        .route("/reservations/{id}", delete(delete_reservation))
}

/* ---------- helpers ---------- */

async fn session_dome(
    conn: impl sqlx::PgExecutor<'_>,
    session_id: i64,
) -> Result<Option<PlanetariumDome>, sqlx::Error> {
    sqlx::query_as::<_, PlanetariumDome>(
        r#"
        SELECT d.id, d.name, d."rows", d.seats_in_row
        FROM planetarium_domes d
        JOIN show_sessions ss ON ss.dome_id = d.id
        WHERE ss.id = $1
        "#,
    )
    .bind(session_id)
    .fetch_optional(conn)
    .await
}

/* ---------- RESERVATIONS ---------- */

#[derive(Debug, Serialize)]
struct TicketResponse {
    id: i64,
    row: i32,
    seat: i32,
    show_session: i64,
}

#[derive(Debug, Serialize)]
struct ReservationResponse {
    id: i64,
    created_at: DateTime<Utc>,
    tickets: Vec<TicketResponse>,
}

// GET /api/reservations
async fn list_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT r.id AS rid, r.created_at, t.id AS tid, t."row", t.seat, t.session_id
        FROM reservations r
        LEFT JOIN tickets t ON t.reservation_id = r.id
        WHERE r.user_id = $1
        ORDER BY r.created_at DESC, r.id DESC, t."row", t.seat
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.db.pool)
    .await?;

    // Rows arrive grouped by reservation; fold them without losing the
    // newest-first order.
    let mut reservations: Vec<ReservationResponse> = Vec::new();
    for r in rows {
        let rid: i64 = r.get("rid");
        if reservations.last().map(|last| last.id) != Some(rid) {
            reservations.push(ReservationResponse {
                id: rid,
                created_at: r.get("created_at"),
                tickets: Vec::new(),
            });
        }
        let tid: Option<i64> = r.get("tid");
        if let (Some(tid), Some(last)) = (tid, reservations.last_mut()) {
            last.tickets.push(TicketResponse {
                id: tid,
                row: r.get("row"),
                seat: r.get("seat"),
                show_session: r.get("session_id"),
            });
        }
    }

    Ok((StatusCode::OK, Json(reservations)))
}

// POST /api/reservations
#[derive(Debug, Deserialize)]
struct TicketRequest {
    row: i32,
    seat: i32,
    show_session: i64,
}

#[derive(Debug, Deserialize)]
struct CreateReservationRequest {
    tickets: Vec<TicketRequest>,
}

async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.tickets.is_empty() {
        return Err(AppError::BadRequest("tickets must not be empty".to_string()));
    }

    // All tickets commit in one transaction: a range failure or a lost
    // seat race on any of them rolls the whole reservation back.
    let mut tx = state.db.pool.begin().await?;

    let reservation = sqlx::query_as::<_, Reservation>(
        "INSERT INTO reservations (user_id) VALUES ($1) RETURNING id, created_at, user_id",
    )
    .bind(user.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut domes: HashMap<i64, PlanetariumDome> = HashMap::new();
    let mut tickets: Vec<TicketResponse> = Vec::new();
    for t in &req.tickets {
        let dome = match domes.get(&t.show_session) {
            Some(dome) => dome.clone(),
            None => {
                let dome = session_dome(&mut *tx, t.show_session).await?.ok_or_else(|| {
                    AppError::BadRequest(format!("unknown show session id: {}", t.show_session))
                })?;
                domes.insert(t.show_session, dome.clone());
                dome
            }
        };

        let ticket_id =
            Ticket::create(&mut *tx, t.show_session, reservation.id, t.row, t.seat, &dome).await?;
        tickets.push(TicketResponse {
            id: ticket_id,
            row: t.row,
            seat: t.seat,
            show_session: t.show_session,
        });
    }

    tx.commit().await?;

    tracing::info!(
        "reservation {} created for user {} with {} ticket(s)",
        reservation.id,
        user.user_id,
        tickets.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            id: reservation.id,
            created_at: reservation.created_at,
            tickets,
        }),
    ))
}

// DELETE /api/reservations/{id}
async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // Scoped to the owner; tickets go with the reservation via cascade.
    let deleted = sqlx::query_scalar::<_, i64>(
        "DELETE FROM reservations WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.db.pool)
    .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound("reservation".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
