use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::{AuthUser, StaffUser};
use crate::models::PlanetariumDome;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/planetarium_domes", get(list_domes))
        .route("/planetarium_domes", post(create_dome))
}

#[derive(Debug, Serialize)]
struct DomeResponse {
    id: i64,
    name: String,
    rows: i32,
    seats_in_row: i32,
    capacity: i64,
}

impl From<PlanetariumDome> for DomeResponse {
    fn from(dome: PlanetariumDome) -> Self {
        let capacity = dome.capacity();
        DomeResponse {
            id: dome.id,
            name: dome.name,
            rows: dome.rows,
            seats_in_row: dome.seats_in_row,
            capacity,
        }
    }
}

// GET /api/planetarium_domes
async fn list_domes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let domes = sqlx::query_as::<_, PlanetariumDome>(
        r#"SELECT id, name, "rows", seats_in_row FROM planetarium_domes ORDER BY name"#,
    )
    .fetch_all(&state.db.pool)
    .await?;

    let payload: Vec<DomeResponse> = domes.into_iter().map(DomeResponse::from).collect();

    Ok((StatusCode::OK, Json(payload)))
}

// POST /api/planetarium_domes
#[derive(Debug, Deserialize)]
struct CreateDomeRequest {
    name: String,
    rows: i32,
    seats_in_row: i32,
}

async fn create_dome(
    State(state): State<Arc<AppState>>,
    StaffUser(_user): StaffUser,
    Json(req): Json<CreateDomeRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Rejected here so the caller gets a 400 instead of tripping the
    // CHECK constraints with a 500.
    if req.rows <= 0 {
        return Err(AppError::BadRequest("rows must be > 0".to_string()));
    }
    if req.seats_in_row <= 0 {
        return Err(AppError::BadRequest("seats_in_row must be > 0".to_string()));
    }

    let dome = sqlx::query_as::<_, PlanetariumDome>(
        r#"
        INSERT INTO planetarium_domes (name, "rows", seats_in_row)
        VALUES ($1, $2, $3)
        RETURNING id, name, "rows", seats_in_row
        "#,
    )
    .bind(req.name.trim())
    .bind(req.rows)
    .bind(req.seats_in_row)
    .fetch_one(&state.db.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(DomeResponse::from(dome))))
}
