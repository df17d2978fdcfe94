use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A booking event grouping one or more tickets for one user.
/// Owns its tickets: deleting the reservation cascades to them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}
