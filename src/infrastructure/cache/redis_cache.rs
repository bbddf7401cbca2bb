use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::time::Duration;

use super::Cache;
use crate::error::Result;

/// Redis-backed cache. Entries share one optional TTL configured at
/// construction time.
pub struct RedisCache {
    client: Client,
    ttl: Option<Duration>,
}

impl RedisCache {
    pub fn new(redis_url: &str, ttl: Option<Duration>) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client, ttl })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        if let Some(ttl) = self.ttl {
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs() as usize)
                .await?;
        } else {
            conn.set::<_, _, ()>(key, value).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("FLUSHDB").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Redis connection
    async fn test_cache_operations() {
        let cache = RedisCache::new("redis://localhost:6379", Some(Duration::from_secs(60)))
            .unwrap();

        cache.set("flow:id:test", "{\"value\":1}").await.unwrap();
        let value = cache.get("flow:id:test").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"value\":1}"));

        cache.delete("flow:id:test").await.unwrap();
        let value = cache.get("flow:id:test").await.unwrap();
        assert_eq!(value, None);
    }
}
