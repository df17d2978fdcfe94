use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A scheduled screening: one show in one dome at a point in time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowSession {
    pub id: i64,
    pub show_time: DateTime<Utc>,
    pub show_id: i64,
    pub dome_id: i64,
}
