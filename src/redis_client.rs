use redis::{aio::MultiplexedConnection, Client};

#[derive(Clone)]
pub struct RedisClient {
    pub conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_tokio_connection().await?;

        // Round-trip once so a bad URL fails at startup, not on the
        // first cached read.
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(RedisClient { conn })
    }
}
