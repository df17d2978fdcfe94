use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::{AuthUser, StaffUser};
use crate::models::{AstronomyShow, ShowTheme};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/astronomy_shows", get(list_shows))
        .route("/astronomy_shows", post(create_show))
        .route("/astronomy_shows/{id}", get(get_show))
        .route("/astronomy_shows/{id}/upload_image", post(upload_image))
}

/* ---------- helpers ---------- */

async fn fetch_show(pool: &sqlx::PgPool, id: i64) -> Result<AstronomyShow, AppError> {
    sqlx::query_as::<_, AstronomyShow>(
        "SELECT id, title, description, image FROM astronomy_shows WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("astronomy show".to_string()))
}

async fn fetch_show_themes(pool: &sqlx::PgPool, show_id: i64) -> Result<Vec<ShowTheme>, AppError> {
    let themes = sqlx::query_as::<_, ShowTheme>(
        r#"
        SELECT t.id, t.name
        FROM show_themes t
        JOIN astronomy_show_themes st ON st.theme_id = t.id
        WHERE st.show_id = $1
        ORDER BY t.name
        "#,
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    Ok(themes)
}

// "1,2,3" -> [1, 2, 3]
fn parse_theme_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    raw.split(',')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<i64>, _>>()
        .map_err(|_| {
            AppError::BadRequest("themes must be a comma-separated list of ids".to_string())
        })
}

// Filesystem-safe name derived from the show title, used as the prefix
// of uploaded image files.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/* ---------- SHOWS ---------- */

// GET /api/astronomy_shows?title=...&themes=1,2
#[derive(Debug, Deserialize)]
struct ShowsQuery {
    title: Option<String>,
    themes: Option<String>,
}

async fn list_shows(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<ShowsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let theme_ids = params.themes.as_deref().map(parse_theme_ids).transpose()?;

    let mut q =
        String::from("SELECT DISTINCT a.id, a.title, a.description, a.image FROM astronomy_shows a");
    if theme_ids.is_some() {
        q.push_str(" JOIN astronomy_show_themes st ON st.show_id = a.id");
    }

    let mut conds: Vec<String> = Vec::new();
    let mut bind_idx = 1;
    if params.title.is_some() {
        conds.push(format!("a.title ILIKE ${}", bind_idx));
        bind_idx += 1;
    }
    if theme_ids.is_some() {
        conds.push(format!("st.theme_id = ANY(${})", bind_idx));
    }
    if !conds.is_empty() {
        q.push_str(" WHERE ");
        q.push_str(&conds.join(" AND "));
    }
    q.push_str(" ORDER BY a.title");

    let mut dbq = sqlx::query_as::<_, AstronomyShow>(&q);
    if let Some(ref title) = params.title {
        dbq = dbq.bind(format!("%{}%", title));
    }
    if let Some(ref ids) = theme_ids {
        dbq = dbq.bind(ids.clone());
    }

    let shows = dbq.fetch_all(&state.db.pool).await?;

    Ok((StatusCode::OK, Json(shows)))
}

// GET /api/astronomy_shows/{id}
#[derive(Debug, Serialize)]
struct ShowDetailResponse {
    id: i64,
    title: String,
    description: String,
    image: Option<String>,
    show_themes: Vec<ShowTheme>,
}

async fn get_show(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let show = fetch_show(&state.db.pool, id).await?;
    let themes = fetch_show_themes(&state.db.pool, id).await?;

    Ok((
        StatusCode::OK,
        Json(ShowDetailResponse {
            id: show.id,
            title: show.title,
            description: show.description,
            image: show.image,
            show_themes: themes,
        }),
    ))
}

// POST /api/astronomy_shows
#[derive(Debug, Deserialize)]
struct CreateShowRequest {
    title: String,
    description: String,
    #[serde(default)]
    show_themes: Vec<i64>,
}

async fn create_show(
    State(state): State<Arc<AppState>>,
    StaffUser(_user): StaffUser,
    Json(req): Json<CreateShowRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let mut tx = state.db.pool.begin().await?;

    let show_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO astronomy_shows (title, description) VALUES ($1, $2) RETURNING id",
    )
    .bind(title)
    .bind(&req.description)
    .fetch_one(&mut *tx)
    .await?;

    for theme_id in &req.show_themes {
        sqlx::query(
            "INSERT INTO astronomy_show_themes (show_id, theme_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(show_id)
        .bind(theme_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::BadRequest(format!("unknown theme id: {}", theme_id))
            }
            _ => AppError::Database(e),
        })?;
    }

    tx.commit().await?;

    let show = fetch_show(&state.db.pool, show_id).await?;
    let themes = fetch_show_themes(&state.db.pool, show_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShowDetailResponse {
            id: show.id,
            title: show.title,
            description: show.description,
            image: show.image,
            show_themes: themes,
        }),
    ))
}

// POST /api/astronomy_shows/{id}/upload_image
async fn upload_image(
    State(state): State<Arc<AppState>>,
    StaffUser(_user): StaffUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let show = fetch_show(&state.db.pool, id).await?;

    let mut saved: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("malformed multipart body".to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| AppError::BadRequest("image must be a file upload".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::BadRequest("failed to read image data".to_string()))?;

        let ext = std::path::Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let relative = format!(
            "uploads/astronomy_show/{}-{}{}",
            slugify(&show.title),
            uuid::Uuid::new_v4(),
            ext
        );

        let dest = std::path::Path::new(&state.config.media.root).join(&relative);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, &data).await?;

        sqlx::query("UPDATE astronomy_shows SET image = $1 WHERE id = $2")
            .bind(&relative)
            .bind(id)
            .execute(&state.db.pool)
            .await?;

        saved = Some(relative);
        break;
    }

    let image = saved.ok_or_else(|| AppError::BadRequest("image field is required".to_string()))?;

    Ok((StatusCode::OK, Json(json!({ "id": id, "image": image }))))
}
