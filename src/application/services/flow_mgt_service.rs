use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    application::dto::{build_pagination_links, FlowDefinitionRequest, FlowListResponse},
    domain::{
        entities::{BasicFlowVersion, CompleteFlowDefinition, FlowDefinition, FlowVersionRecord},
        repositories::FlowRepository,
        services::{
            flow_validation,
            registration_inference::infer_registration_flow,
            Graph, GraphBuilder,
        },
        value_objects::{FlowId, FlowType},
    },
    error::{FlowMgtError, Result},
};

pub const DEFAULT_PAGE_SIZE: u64 = 30;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Management surface for flow definitions: validation, persistence
/// orchestration, graph compilation, and registration-flow inference.
#[async_trait]
pub trait FlowMgtService: Send + Sync {
    /// List flows, paginated, optionally filtered by flow type.
    async fn list_flows(
        &self,
        limit: Option<u64>,
        offset: Option<i64>,
        flow_type: Option<String>,
    ) -> Result<FlowListResponse>;

    /// Create a flow with a freshly generated id and version 1.
    async fn create_flow(
        &self,
        request: FlowDefinitionRequest,
    ) -> Result<CompleteFlowDefinition>;

    /// Get a flow by id, joined with its active version.
    async fn get_flow(&self, flow_id: &str) -> Result<CompleteFlowDefinition>;

    /// Get a flow by handle within a flow type.
    async fn get_flow_by_handle(
        &self,
        handle: &str,
        flow_type: &str,
    ) -> Result<CompleteFlowDefinition>;

    /// Replace a flow's definition, advancing its active version.
    async fn update_flow(
        &self,
        flow_id: &str,
        request: FlowDefinitionRequest,
    ) -> Result<CompleteFlowDefinition>;

    /// Delete a flow and its history. Succeeds when the flow is absent.
    async fn delete_flow(&self, flow_id: &str) -> Result<()>;

    /// List the retained versions of a flow, newest first.
    async fn list_flow_versions(&self, flow_id: &str) -> Result<Vec<BasicFlowVersion>>;

    /// Fetch one retained version snapshot.
    async fn get_flow_version(&self, flow_id: &str, version: i32) -> Result<FlowVersionRecord>;

    /// Re-activate a prior version by copying it into a new one.
    async fn restore_flow_version(
        &self,
        flow_id: &str,
        version: i32,
    ) -> Result<CompleteFlowDefinition>;

    /// Compile (or fetch from cache) the executable graph of a flow.
    async fn get_graph(&self, flow_id: &str) -> Result<Arc<Graph>>;

    /// Run definition validation without persisting anything.
    fn is_valid_flow(&self, request: &FlowDefinitionRequest) -> Result<()>;
}

pub struct FlowMgtServiceImpl {
    store: Arc<dyn FlowRepository>,
    graph_builder: Arc<GraphBuilder>,
    immutable: bool,
    auto_infer_registration: bool,
}

impl FlowMgtServiceImpl {
    pub fn new(
        store: Arc<dyn FlowRepository>,
        graph_builder: Arc<GraphBuilder>,
        immutable: bool,
        auto_infer_registration: bool,
    ) -> Self {
        Self {
            store,
            graph_builder,
            immutable,
            auto_infer_registration,
        }
    }

    fn check_mutable(&self) -> Result<()> {
        if self.immutable {
            return Err(FlowMgtError::DeploymentImmutable(
                "flow definitions cannot be modified on an immutable deployment".to_string(),
            ));
        }
        Ok(())
    }

    fn parse_flow_id(flow_id: &str) -> Result<FlowId> {
        FlowId::parse(flow_id).map_err(|_| {
            FlowMgtError::InvalidRequestFormat(format!("'{}' is not a valid flow id", flow_id))
        })
    }

    fn check_version(version: i32) -> Result<()> {
        if version < 1 {
            return Err(FlowMgtError::InvalidVersion(format!(
                "version must be a positive integer, got {}",
                version
            )));
        }
        Ok(())
    }

    /// Best-effort: derive and persist the paired registration flow.
    /// Failures are logged, never surfaced to the creating caller.
    async fn infer_and_persist_registration(&self, definition: &FlowDefinition) {
        let inferred = match infer_registration_flow(definition) {
            Ok(inferred) => inferred,
            Err(e) => {
                log::warn!(
                    "Registration inference failed for flow '{}': {}",
                    definition.handle,
                    e
                );
                return;
            }
        };

        match self
            .store
            .is_flow_exists_by_handle(inferred.handle.as_str(), FlowType::Registration)
            .await
        {
            Ok(true) => {
                log::debug!(
                    "Registration flow '{}' already exists, skipping inference",
                    inferred.handle
                );
                return;
            }
            Ok(false) => {}
            Err(e) => {
                log::warn!(
                    "Could not check for an existing registration flow '{}': {}",
                    inferred.handle,
                    e
                );
                return;
            }
        }

        match self.store.create_flow(FlowId::new(), &inferred).await {
            Ok(created) => log::info!(
                "Inferred registration flow '{}' ({}) from authentication flow",
                created.handle,
                created.id
            ),
            Err(e) => log::warn!(
                "Failed to persist inferred registration flow '{}': {}",
                inferred.handle,
                e
            ),
        }
    }
}

#[async_trait]
impl FlowMgtService for FlowMgtServiceImpl {
    async fn list_flows(
        &self,
        limit: Option<u64>,
        offset: Option<i64>,
        flow_type: Option<String>,
    ) -> Result<FlowListResponse> {
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(l) => l.min(MAX_PAGE_SIZE),
        };
        let offset = offset.unwrap_or(0).max(0) as u64;
        let flow_type = match flow_type.as_deref() {
            Some(s) => Some(
                FlowType::parse(s).ok_or_else(|| FlowMgtError::InvalidFlowType(s.to_string()))?,
            ),
            None => None,
        };

        let (flows, total) = self.store.list_flows(limit, offset, flow_type).await?;

        Ok(FlowListResponse {
            total_results: total,
            start_index: offset + 1,
            count: flows.len() as u64,
            links: build_pagination_links(offset, limit, total),
            flows,
        })
    }

    async fn create_flow(
        &self,
        request: FlowDefinitionRequest,
    ) -> Result<CompleteFlowDefinition> {
        self.check_mutable()?;
        let definition = flow_validation::validate_new_flow(
            &request.handle,
            &request.name,
            &request.flow_type,
            &request.nodes,
        )?;

        if self
            .store
            .is_flow_exists_by_handle(definition.handle.as_str(), definition.flow_type)
            .await?
        {
            return Err(FlowMgtError::DuplicateHandle(definition.handle.to_string()));
        }

        let created = self.store.create_flow(FlowId::new(), &definition).await?;
        self.graph_builder.invalidate_cache(&created.id.to_string());

        if self.auto_infer_registration && definition.flow_type == FlowType::Authentication {
            self.infer_and_persist_registration(&definition).await;
        }

        Ok(created)
    }

    async fn get_flow(&self, flow_id: &str) -> Result<CompleteFlowDefinition> {
        let flow_id = Self::parse_flow_id(flow_id)?;
        self.store.get_flow_by_id(&flow_id).await
    }

    async fn get_flow_by_handle(
        &self,
        handle: &str,
        flow_type: &str,
    ) -> Result<CompleteFlowDefinition> {
        let flow_type = FlowType::parse(flow_type)
            .ok_or_else(|| FlowMgtError::InvalidFlowType(flow_type.to_string()))?;
        self.store.get_flow_by_handle(handle, flow_type).await
    }

    async fn update_flow(
        &self,
        flow_id: &str,
        request: FlowDefinitionRequest,
    ) -> Result<CompleteFlowDefinition> {
        self.check_mutable()?;
        let id = Self::parse_flow_id(flow_id)?;
        let definition = flow_validation::validate_new_flow(
            &request.handle,
            &request.name,
            &request.flow_type,
            &request.nodes,
        )?;

        let existing = self.store.get_flow_by_id(&id).await?;
        flow_validation::validate_update(&existing, &definition)?;

        let updated = self.store.update_flow(&id, &definition).await?;
        self.graph_builder.invalidate_cache(flow_id);
        Ok(updated)
    }

    async fn delete_flow(&self, flow_id: &str) -> Result<()> {
        self.check_mutable()?;
        let id = Self::parse_flow_id(flow_id)?;
        self.store.delete_flow(&id).await?;
        self.graph_builder.invalidate_cache(flow_id);
        Ok(())
    }

    async fn list_flow_versions(&self, flow_id: &str) -> Result<Vec<BasicFlowVersion>> {
        let id = Self::parse_flow_id(flow_id)?;
        self.store.list_flow_versions(&id).await
    }

    async fn get_flow_version(&self, flow_id: &str, version: i32) -> Result<FlowVersionRecord> {
        let id = Self::parse_flow_id(flow_id)?;
        Self::check_version(version)?;
        self.store.get_flow_version(&id, version).await
    }

    async fn restore_flow_version(
        &self,
        flow_id: &str,
        version: i32,
    ) -> Result<CompleteFlowDefinition> {
        let id = Self::parse_flow_id(flow_id)?;
        Self::check_version(version)?;
        let restored = self.store.restore_flow_version(&id, version).await?;
        self.graph_builder.invalidate_cache(flow_id);
        Ok(restored)
    }

    async fn get_graph(&self, flow_id: &str) -> Result<Arc<Graph>> {
        let id = Self::parse_flow_id(flow_id)?;
        let definition = self.store.get_flow_by_id(&id).await?;
        self.graph_builder.get_graph(&definition)
    }

    fn is_valid_flow(&self, request: &FlowDefinitionRequest) -> Result<()> {
        flow_validation::validate_new_flow(
            &request.handle,
            &request.name,
            &request.flow_type,
            &request.nodes,
        )
        .map(|_| ())
    }
}
