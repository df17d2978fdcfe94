use crate::{database::Database, redis_client::RedisClient};
use tracing::info;

pub mod sessions;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database) -> Self {
        Self { redis, db }
    }

    // Warm the hot read path at startup.
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");

        let _ = self.get_upcoming_sessions().await;

        info!("Cache warmup done");
    }
}
