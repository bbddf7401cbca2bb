use async_trait::async_trait;

use crate::domain::entities::{
    BasicFlowDefinition, BasicFlowVersion, CompleteFlowDefinition, FlowDefinition,
    FlowVersionRecord,
};
use crate::domain::value_objects::{FlowId, FlowType};
use crate::error::Result;

/// Storage interface for flow definitions and their version history.
///
/// `get_*` operations return the `FlowNotFound` / `FlowVersionNotFound`
/// sentinels when the target does not exist; every other failure is an
/// internal error.
#[async_trait]
pub trait FlowRepository: Send + Sync {
    /// List flows ordered by creation time, newest first, with the total
    /// count before pagination.
    async fn list_flows(
        &self,
        limit: u64,
        offset: u64,
        flow_type: Option<FlowType>,
    ) -> Result<(Vec<BasicFlowDefinition>, u64)>;

    /// Atomically insert a flow and its version 1.
    async fn create_flow(
        &self,
        flow_id: FlowId,
        definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition>;

    /// Fetch a flow joined with its active version's node list.
    async fn get_flow_by_id(&self, flow_id: &FlowId) -> Result<CompleteFlowDefinition>;

    /// Fetch a flow by its handle within a flow type.
    async fn get_flow_by_handle(
        &self,
        handle: &str,
        flow_type: FlowType,
    ) -> Result<CompleteFlowDefinition>;

    /// Insert a new version, advance the active version, and evict the
    /// oldest version past the history cap, all in one transaction.
    async fn update_flow(
        &self,
        flow_id: &FlowId,
        definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition>;

    /// Delete a flow and all of its versions. Deleting a missing flow is
    /// a no-op success.
    async fn delete_flow(&self, flow_id: &FlowId) -> Result<()>;

    /// List the retained versions of a flow, newest first.
    async fn list_flow_versions(&self, flow_id: &FlowId) -> Result<Vec<BasicFlowVersion>>;

    /// Fetch one retained version snapshot.
    async fn get_flow_version(
        &self,
        flow_id: &FlowId,
        version: i32,
    ) -> Result<FlowVersionRecord>;

    /// Copy a prior version's node list into a new version and make it
    /// active. The historical row is left untouched.
    async fn restore_flow_version(
        &self,
        flow_id: &FlowId,
        version: i32,
    ) -> Result<CompleteFlowDefinition>;

    async fn is_flow_exists(&self, flow_id: &FlowId) -> Result<bool>;

    async fn is_flow_exists_by_handle(&self, handle: &str, flow_type: FlowType) -> Result<bool>;
}
