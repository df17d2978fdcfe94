use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::{AuthUser, StaffUser};
use crate::models::ShowTheme;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/show_themes", get(list_themes))
        .route("/show_themes", post(create_theme))
}

// GET /api/show_themes
async fn list_themes(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let themes = sqlx::query_as::<_, ShowTheme>("SELECT id, name FROM show_themes ORDER BY name")
        .fetch_all(&state.db.pool)
        .await?;

    Ok((StatusCode::OK, Json(themes)))
}

// POST /api/show_themes
#[derive(Debug, Deserialize)]
struct CreateThemeRequest {
    name: String,
}

async fn create_theme(
    State(state): State<Arc<AppState>>,
    StaffUser(_user): StaffUser,
    Json(req): Json<CreateThemeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let theme = sqlx::query_as::<_, ShowTheme>(
        "INSERT INTO show_themes (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(&state.db.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(theme)))
}
