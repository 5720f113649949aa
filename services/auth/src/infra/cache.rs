//! Redis-backed rate-limit counters.

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::{AsyncCommands, cmd};

use crate::domain::repository::RateLimitStore;

#[derive(Clone)]
pub struct RedisRateLimitStore {
    pub pool: Pool,
}

fn counter_key(key: &str) -> String {
    format!("ratelimit:{key}")
}

impl RateLimitStore for RedisRateLimitStore {
    async fn increment(&self, key: &str, window_secs: u64) -> Result<u64, anyhow::Error> {
        let mut conn = self.pool.get().await.context("redis pool")?;
        let key = counter_key(key);
        let count: u64 = conn.incr(&key, 1).await.context("incr rate counter")?;
        // NX anchors the window at the first hit without sliding it
        // forward on traffic, and re-arms a key whose TTL was lost to a
        // failed EXPIRE after its INCR had already landed.
        let _: i64 = cmd("EXPIRE")
            .arg(&key)
            .arg(window_secs as i64)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .context("set rate window")?;
        Ok(count)
    }
}
