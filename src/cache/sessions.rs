use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::cache::CacheService;

const SESSIONS_KEY: &str = "sessions:upcoming";
const SESSIONS_TTL_SECS: u64 = 60;

/// One row of the upcoming-sessions listing. `tickets_available` is the
/// dome capacity minus tickets already sold for the session.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionListing {
    pub id: i64,
    pub show_time: chrono::DateTime<chrono::Utc>,
    pub show_title: String,
    pub dome_name: String,
    pub tickets_available: i64,
}

impl CacheService {
    // Upcoming sessions with availability, cache-first. Staleness here is
    // bounded by the TTL and by invalidation on session creation; seat
    // correctness never depends on this path.
    pub async fn get_upcoming_sessions(&self) -> Vec<SessionListing> {
        if let Ok(sessions) = self.get_sessions_from_cache().await {
            return sessions;
        }

        if let Ok(sessions) = self.load_sessions_from_db().await {
            let _ = self.save_sessions_to_cache(&sessions).await;
            return sessions;
        }

        vec![]
    }

    pub async fn invalidate_sessions(&self) {
        let mut conn = self.redis.conn.clone();
        let _: Result<(), _> = conn.del(SESSIONS_KEY).await;
    }

    async fn load_sessions_from_db(&self) -> Result<Vec<SessionListing>, sqlx::Error> {
        sqlx::query_as::<_, SessionListing>(
            r#"
            SELECT ss.id,
                   ss.show_time,
                   a.title AS show_title,
                   d.name AS dome_name,
                   d."rows"::bigint * d.seats_in_row::bigint - COUNT(t.id) AS tickets_available
            FROM show_sessions ss
            JOIN astronomy_shows a ON a.id = ss.show_id
            JOIN planetarium_domes d ON d.id = ss.dome_id
            LEFT JOIN tickets t ON t.session_id = ss.id
            WHERE ss.show_time > NOW()
            GROUP BY ss.id, ss.show_time, a.title, d.name, d."rows", d.seats_in_row
            ORDER BY ss.show_time
            "#,
        )
        .fetch_all(&self.db.pool)
        .await
    }

    // === Cache plumbing ===
    async fn get_sessions_from_cache(&self) -> Result<Vec<SessionListing>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: String = conn.get(SESSIONS_KEY).await?;
        let sessions: Vec<SessionListing> = serde_json::from_str(&data).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
        })?;
        Ok(sessions)
    }

    async fn save_sessions_to_cache(
        &self,
        sessions: &[SessionListing],
    ) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(sessions).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(SESSIONS_KEY, data, SESSIONS_TTL_SECS).await
    }
}
