pub mod database;
pub mod cache;
pub mod repositories;
pub mod resources;

pub use database::*;
pub use cache::{Cache, InMemoryGraphCache, MemoryCache, RedisCache};
pub use repositories::*;
pub use resources::*;
