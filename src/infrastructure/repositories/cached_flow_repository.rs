use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::{
    BasicFlowDefinition, BasicFlowVersion, CompleteFlowDefinition, FlowDefinition,
    FlowVersionRecord,
};
use crate::domain::repositories::FlowRepository;
use crate::domain::value_objects::{FlowId, FlowType};
use crate::error::{FlowMgtError, Result};
use crate::infrastructure::cache::Cache;

/// Read-through cache over any flow store. Entries are keyed both by id
/// and by handle within a flow type; a cached `null` marks a flow as
/// known-absent. Cache failures are logged and never fail the operation.
pub struct CachedFlowRepository {
    backend: Arc<dyn FlowRepository>,
    cache: Arc<dyn Cache>,
}

impl CachedFlowRepository {
    pub fn new(backend: Arc<dyn FlowRepository>, cache: Arc<dyn Cache>) -> Self {
        Self { backend, cache }
    }

    fn id_key(flow_id: &FlowId) -> String {
        format!("flow:id:{}", flow_id)
    }

    /// Handle keys carry the flow type so authentication and
    /// registration flows sharing a handle stay isolated.
    fn handle_key(handle: &str, flow_type: FlowType) -> String {
        format!("flow:handle:{}:{}", handle, flow_type.as_str())
    }

    /// Outer `None` is a cache miss; inner `None` is a known-absent
    /// entry.
    async fn read_entry(&self, key: &str) -> Option<Option<CompleteFlowDefinition>> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Dropping undecodable cache entry '{}': {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cache read failed for '{}': {}", key, e);
                None
            }
        }
    }

    async fn write_entry(&self, definition: &CompleteFlowDefinition) {
        let raw = match serde_json::to_string(&Some(definition)) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Could not encode flow {} for caching: {}", definition.id, e);
                return;
            }
        };
        for key in [
            Self::id_key(&definition.id),
            Self::handle_key(definition.handle.as_str(), definition.flow_type),
        ] {
            if let Err(e) = self.cache.set(&key, &raw).await {
                log::warn!("Cache write failed for '{}': {}", key, e);
            }
        }
    }

    async fn drop_key(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            log::warn!("Cache eviction failed for '{}': {}", key, e);
        }
    }
}

#[async_trait]
impl FlowRepository for CachedFlowRepository {
    /// Listings vary too freely to cache; go straight to the backend.
    async fn list_flows(
        &self,
        limit: u64,
        offset: u64,
        flow_type: Option<FlowType>,
    ) -> Result<(Vec<BasicFlowDefinition>, u64)> {
        self.backend.list_flows(limit, offset, flow_type).await
    }

    async fn create_flow(
        &self,
        flow_id: FlowId,
        definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition> {
        let created = self.backend.create_flow(flow_id, definition).await?;
        self.write_entry(&created).await;
        Ok(created)
    }

    async fn get_flow_by_id(&self, flow_id: &FlowId) -> Result<CompleteFlowDefinition> {
        if let Some(entry) = self.read_entry(&Self::id_key(flow_id)).await {
            return match entry {
                Some(definition) => Ok(definition),
                None => Err(FlowMgtError::FlowNotFound(flow_id.to_string())),
            };
        }

        let definition = self.backend.get_flow_by_id(flow_id).await?;
        self.write_entry(&definition).await;
        Ok(definition)
    }

    async fn get_flow_by_handle(
        &self,
        handle: &str,
        flow_type: FlowType,
    ) -> Result<CompleteFlowDefinition> {
        if let Some(entry) = self.read_entry(&Self::handle_key(handle, flow_type)).await {
            return match entry {
                Some(definition) => Ok(definition),
                None => Err(FlowMgtError::FlowNotFound(handle.to_string())),
            };
        }

        let definition = self.backend.get_flow_by_handle(handle, flow_type).await?;
        self.write_entry(&definition).await;
        Ok(definition)
    }

    async fn update_flow(
        &self,
        flow_id: &FlowId,
        definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition> {
        let updated = self.backend.update_flow(flow_id, definition).await?;
        self.write_entry(&updated).await;
        Ok(updated)
    }

    async fn delete_flow(&self, flow_id: &FlowId) -> Result<()> {
        // The handle key can only be evicted once the handle is known;
        // resolve it from the cache or the backend, tolerating a flow
        // that is already gone.
        let known = match self.read_entry(&Self::id_key(flow_id)).await.flatten() {
            Some(definition) => Some(definition),
            None => match self.backend.get_flow_by_id(flow_id).await {
                Ok(definition) => Some(definition),
                Err(FlowMgtError::FlowNotFound(_)) => None,
                Err(e) => return Err(e),
            },
        };

        self.backend.delete_flow(flow_id).await?;

        self.drop_key(&Self::id_key(flow_id)).await;
        if let Some(definition) = known {
            self.drop_key(&Self::handle_key(
                definition.handle.as_str(),
                definition.flow_type,
            ))
            .await;
        }
        Ok(())
    }

    async fn list_flow_versions(&self, flow_id: &FlowId) -> Result<Vec<BasicFlowVersion>> {
        self.backend.list_flow_versions(flow_id).await
    }

    async fn get_flow_version(
        &self,
        flow_id: &FlowId,
        version: i32,
    ) -> Result<FlowVersionRecord> {
        self.backend.get_flow_version(flow_id, version).await
    }

    async fn restore_flow_version(
        &self,
        flow_id: &FlowId,
        version: i32,
    ) -> Result<CompleteFlowDefinition> {
        let restored = self.backend.restore_flow_version(flow_id, version).await?;
        self.write_entry(&restored).await;
        Ok(restored)
    }

    async fn is_flow_exists(&self, flow_id: &FlowId) -> Result<bool> {
        // A known-absent cache entry answers the check without touching
        // the backend.
        if let Some(entry) = self.read_entry(&Self::id_key(flow_id)).await {
            return Ok(entry.is_some());
        }
        self.backend.is_flow_exists(flow_id).await
    }

    async fn is_flow_exists_by_handle(&self, handle: &str, flow_type: FlowType) -> Result<bool> {
        if let Some(entry) = self.read_entry(&Self::handle_key(handle, flow_type)).await {
            return Ok(entry.is_some());
        }
        self.backend.is_flow_exists_by_handle(handle, flow_type).await
    }
}
