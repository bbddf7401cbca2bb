pub mod config;
pub mod error;
pub mod domain;
pub mod application;
pub mod infrastructure;

pub use config::AppConfig;
pub use error::{FlowMgtError, Result};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use application::services::{FlowMgtService, FlowMgtServiceImpl};
use domain::repositories::FlowRepository;
use domain::services::{ExecutorRegistry, GraphBuilder};
use infrastructure::cache::{InMemoryGraphCache, RedisCache};
use infrastructure::database::Database;
use infrastructure::repositories::{CachedFlowRepository, DbFlowRepository};
use infrastructure::resources::FileFlowRepository;

const FLOW_CACHE_TTL: Duration = Duration::from_secs(300);

/// Wire the management service for a deployment: an immutable deployment
/// reads flows from YAML resources, any other runs against the cached
/// relational store.
pub async fn build_flow_mgt_service(config: &AppConfig) -> Result<Arc<dyn FlowMgtService>> {
    let graph_builder = Arc::new(GraphBuilder::new(
        Arc::new(ExecutorRegistry::with_defaults()),
        Arc::new(InMemoryGraphCache::new()),
    ));

    let store: Arc<dyn FlowRepository> = if config.immutable_resources.enabled {
        Arc::new(FileFlowRepository::load(Path::new(
            &config.immutable_resources.dir,
        ))?)
    } else {
        let database = Database::new(&config.database_url).await?;
        let db_store = Arc::new(DbFlowRepository::new(
            database.connection(),
            config.server.identifier.clone(),
            config.flow.max_version_history,
        ));
        let cache = Arc::new(RedisCache::new(&config.redis_url, Some(FLOW_CACHE_TTL))?);
        Arc::new(CachedFlowRepository::new(db_store, cache))
    };

    Ok(Arc::new(FlowMgtServiceImpl::new(
        store,
        graph_builder,
        config.immutable_resources.enabled,
        config.flow.auto_infer_registration,
    )))
}
