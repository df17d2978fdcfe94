use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AstronomyShow {
    pub id: i64,
    pub title: String,
    pub description: String,
    // Relative path under the media root, set by the upload endpoint.
    pub image: Option<String>,
}
