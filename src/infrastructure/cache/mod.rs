use async_trait::async_trait;

use crate::error::Result;

pub mod redis_cache;
pub mod memory_cache;
pub mod graph_cache;

pub use redis_cache::RedisCache;
pub use memory_cache::MemoryCache;
pub use graph_cache::InMemoryGraphCache;

/// Generic string-keyed cache. Values are serialized JSON; callers own
/// the encoding. Implementations must be safe for concurrent use.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}
