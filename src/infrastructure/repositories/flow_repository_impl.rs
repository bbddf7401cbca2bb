use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::sync::Arc;

use crate::domain::entities::{
    BasicFlowDefinition, BasicFlowVersion, CompleteFlowDefinition, FlowDefinition,
    FlowVersionRecord,
};
use crate::domain::repositories::FlowRepository;
use crate::domain::value_objects::{FlowId, FlowType, Handle, NodeDefinition};
use crate::error::{FlowMgtError, Result};
use crate::infrastructure::database::entities;

/// Transactional flow store over the relational schema. Every multi-step
/// mutation runs inside one transaction; an uncommitted transaction is
/// rolled back on drop.
pub struct DbFlowRepository {
    db: Arc<DatabaseConnection>,
    deployment_id: String,
    max_version_history: u32,
}

impl DbFlowRepository {
    pub fn new(db: Arc<DatabaseConnection>, deployment_id: String, max_version_history: u32) -> Self {
        Self {
            db,
            deployment_id,
            max_version_history,
        }
    }

    fn parse_flow_type(raw: &str) -> Result<FlowType> {
        FlowType::parse(raw).ok_or_else(|| {
            FlowMgtError::InternalError(format!("unknown flow type '{}' in storage", raw))
        })
    }

    fn parse_nodes(nodes_json: &str) -> Result<Vec<NodeDefinition>> {
        Ok(serde_json::from_str(nodes_json)?)
    }

    fn encode_nodes(nodes: &[NodeDefinition]) -> Result<String> {
        Ok(serde_json::to_string(nodes)?)
    }

    fn complete_from(
        flow: &entities::flow::Model,
        nodes_json: &str,
    ) -> Result<CompleteFlowDefinition> {
        Ok(CompleteFlowDefinition {
            id: FlowId::parse(&flow.flow_id)
                .map_err(|e| FlowMgtError::InternalError(format!("corrupt flow id: {}", e)))?,
            handle: Handle(flow.handle.clone()),
            name: flow.name.clone(),
            flow_type: Self::parse_flow_type(&flow.flow_type)?,
            active_version: flow.active_version,
            nodes: Self::parse_nodes(nodes_json)?,
            created_at: flow.created_at,
            updated_at: flow.updated_at,
        })
    }

    fn basic_from(flow: entities::flow::Model) -> Result<BasicFlowDefinition> {
        Ok(BasicFlowDefinition {
            id: FlowId::parse(&flow.flow_id)
                .map_err(|e| FlowMgtError::InternalError(format!("corrupt flow id: {}", e)))?,
            handle: Handle(flow.handle),
            name: flow.name,
            flow_type: Self::parse_flow_type(&flow.flow_type)?,
            active_version: flow.active_version,
            created_at: flow.created_at,
            updated_at: flow.updated_at,
        })
    }

    async fn find_flow<C: ConnectionTrait>(
        &self,
        conn: &C,
        flow_id: &FlowId,
    ) -> Result<Option<entities::flow::Model>> {
        let flow = entities::Flow::find()
            .filter(entities::flow::Column::FlowId.eq(flow_id.to_string()))
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()))
            .one(conn)
            .await?;
        Ok(flow)
    }

    /// Version-stack push shared by update and restore: insert the new
    /// version, then drop the smallest version once the retained count
    /// exceeds the history cap. Runs on the caller's transaction.
    async fn push_version<C: ConnectionTrait>(
        &self,
        conn: &C,
        flow_internal_id: i64,
        version: i32,
        nodes_json: &str,
    ) -> Result<()> {
        let version_model = entities::flow_version::ActiveModel {
            flow_internal_id: Set(flow_internal_id),
            version: Set(version),
            nodes: Set(nodes_json.to_string()),
            deployment_id: Set(self.deployment_id.clone()),
            created_at: Set(Utc::now()),
        };
        entities::FlowVersion::insert(version_model)
            .exec_without_returning(conn)
            .await?;

        let count = entities::FlowVersion::find()
            .filter(entities::flow_version::Column::FlowInternalId.eq(flow_internal_id))
            .count(conn)
            .await?;

        if count > self.max_version_history as u64 {
            let oldest = entities::FlowVersion::find()
                .filter(entities::flow_version::Column::FlowInternalId.eq(flow_internal_id))
                .order_by_asc(entities::flow_version::Column::Version)
                .one(conn)
                .await?;
            if let Some(oldest) = oldest {
                entities::FlowVersion::delete_by_id((flow_internal_id, oldest.version))
                    .exec(conn)
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl FlowRepository for DbFlowRepository {
    async fn list_flows(
        &self,
        limit: u64,
        offset: u64,
        flow_type: Option<FlowType>,
    ) -> Result<(Vec<BasicFlowDefinition>, u64)> {
        let mut query = entities::Flow::find()
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()));
        if let Some(flow_type) = flow_type {
            query = query.filter(entities::flow::Column::FlowType.eq(flow_type.as_str()));
        }

        let total = query.clone().count(self.db.as_ref()).await?;

        let rows = query
            .order_by_desc(entities::flow::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        let mut flows = Vec::with_capacity(rows.len());
        for row in rows {
            flows.push(Self::basic_from(row)?);
        }
        Ok((flows, total))
    }

    async fn create_flow(
        &self,
        flow_id: FlowId,
        definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition> {
        let nodes_json = Self::encode_nodes(&definition.nodes)?;
        let txn = self.db.begin().await?;

        let collisions = entities::Flow::find()
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()))
            .filter(entities::flow::Column::Handle.eq(definition.handle.as_str()))
            .filter(entities::flow::Column::FlowType.eq(definition.flow_type.as_str()))
            .count(&txn)
            .await?;
        if collisions > 0 {
            return Err(FlowMgtError::DuplicateHandle(definition.handle.to_string()));
        }

        let now = Utc::now();
        let flow_model = entities::flow::ActiveModel {
            id: NotSet,
            flow_id: Set(flow_id.to_string()),
            handle: Set(definition.handle.to_string()),
            name: Set(definition.name.clone()),
            flow_type: Set(definition.flow_type.as_str().to_string()),
            active_version: Set(1),
            deployment_id: Set(self.deployment_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = entities::Flow::insert(flow_model).exec(&txn).await?;

        let version_model = entities::flow_version::ActiveModel {
            flow_internal_id: Set(inserted.last_insert_id),
            version: Set(1),
            nodes: Set(nodes_json),
            deployment_id: Set(self.deployment_id.clone()),
            created_at: Set(now),
        };
        entities::FlowVersion::insert(version_model)
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        Ok(CompleteFlowDefinition {
            id: flow_id,
            handle: definition.handle.clone(),
            name: definition.name.clone(),
            flow_type: definition.flow_type,
            active_version: 1,
            nodes: definition.nodes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_flow_by_id(&self, flow_id: &FlowId) -> Result<CompleteFlowDefinition> {
        let Some(flow) = self.find_flow(self.db.as_ref(), flow_id).await? else {
            return Err(FlowMgtError::FlowNotFound(flow_id.to_string()));
        };

        let version = entities::FlowVersion::find()
            .filter(entities::flow_version::Column::FlowInternalId.eq(flow.id))
            .filter(entities::flow_version::Column::Version.eq(flow.active_version))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                FlowMgtError::InternalError(format!(
                    "active version {} of flow {} has no version row",
                    flow.active_version, flow.flow_id
                ))
            })?;

        Self::complete_from(&flow, &version.nodes)
    }

    async fn get_flow_by_handle(
        &self,
        handle: &str,
        flow_type: FlowType,
    ) -> Result<CompleteFlowDefinition> {
        let flow = entities::Flow::find()
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()))
            .filter(entities::flow::Column::Handle.eq(handle))
            .filter(entities::flow::Column::FlowType.eq(flow_type.as_str()))
            .one(self.db.as_ref())
            .await?;
        let Some(flow) = flow else {
            return Err(FlowMgtError::FlowNotFound(handle.to_string()));
        };

        let version = entities::FlowVersion::find()
            .filter(entities::flow_version::Column::FlowInternalId.eq(flow.id))
            .filter(entities::flow_version::Column::Version.eq(flow.active_version))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                FlowMgtError::InternalError(format!(
                    "active version {} of flow {} has no version row",
                    flow.active_version, flow.flow_id
                ))
            })?;

        Self::complete_from(&flow, &version.nodes)
    }

    async fn update_flow(
        &self,
        flow_id: &FlowId,
        definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition> {
        let nodes_json = Self::encode_nodes(&definition.nodes)?;
        let txn = self.db.begin().await?;

        let Some(flow) = self.find_flow(&txn, flow_id).await? else {
            return Err(FlowMgtError::FlowNotFound(flow_id.to_string()));
        };
        let new_version = flow.active_version + 1;

        // Inserting the version before advancing active_version keeps a
        // concurrent reader of the old pointer on a consistent row.
        self.push_version(&txn, flow.id, new_version, &nodes_json).await?;

        let now = Utc::now();
        let created_at = flow.created_at;
        let mut active: entities::flow::ActiveModel = flow.into();
        active.name = Set(definition.name.clone());
        active.active_version = Set(new_version);
        active.updated_at = Set(now);
        entities::Flow::update(active).exec(&txn).await?;

        txn.commit().await?;

        Ok(CompleteFlowDefinition {
            id: *flow_id,
            handle: definition.handle.clone(),
            name: definition.name.clone(),
            flow_type: definition.flow_type,
            active_version: new_version,
            nodes: definition.nodes.clone(),
            created_at,
            updated_at: now,
        })
    }

    async fn delete_flow(&self, flow_id: &FlowId) -> Result<()> {
        // Version rows follow through the FK cascade. Deleting a missing
        // flow is a no-op success.
        entities::Flow::delete_many()
            .filter(entities::flow::Column::FlowId.eq(flow_id.to_string()))
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn list_flow_versions(&self, flow_id: &FlowId) -> Result<Vec<BasicFlowVersion>> {
        let Some(flow) = self.find_flow(self.db.as_ref(), flow_id).await? else {
            return Err(FlowMgtError::FlowNotFound(flow_id.to_string()));
        };

        let rows = entities::FlowVersion::find()
            .filter(entities::flow_version::Column::FlowInternalId.eq(flow.id))
            .order_by_desc(entities::flow_version::Column::Version)
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| BasicFlowVersion {
                version: row.version,
                is_active: row.version == flow.active_version,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn get_flow_version(
        &self,
        flow_id: &FlowId,
        version: i32,
    ) -> Result<FlowVersionRecord> {
        let Some(flow) = self.find_flow(self.db.as_ref(), flow_id).await? else {
            return Err(FlowMgtError::FlowNotFound(flow_id.to_string()));
        };

        let row = entities::FlowVersion::find()
            .filter(entities::flow_version::Column::FlowInternalId.eq(flow.id))
            .filter(entities::flow_version::Column::Version.eq(version))
            .one(self.db.as_ref())
            .await?;
        let Some(row) = row else {
            return Err(FlowMgtError::FlowVersionNotFound(format!(
                "flow {} has no version {}",
                flow_id, version
            )));
        };

        Ok(FlowVersionRecord {
            flow_id: *flow_id,
            version: row.version,
            nodes: Self::parse_nodes(&row.nodes)?,
            created_at: row.created_at,
        })
    }

    async fn restore_flow_version(
        &self,
        flow_id: &FlowId,
        version: i32,
    ) -> Result<CompleteFlowDefinition> {
        let txn = self.db.begin().await?;

        let Some(flow) = self.find_flow(&txn, flow_id).await? else {
            return Err(FlowMgtError::FlowNotFound(flow_id.to_string()));
        };

        let row = entities::FlowVersion::find()
            .filter(entities::flow_version::Column::FlowInternalId.eq(flow.id))
            .filter(entities::flow_version::Column::Version.eq(version))
            .one(&txn)
            .await?;
        let Some(row) = row else {
            return Err(FlowMgtError::FlowVersionNotFound(format!(
                "flow {} has no version {}",
                flow_id, version
            )));
        };

        let new_version = flow.active_version + 1;
        // The historical row is copied, never mutated.
        self.push_version(&txn, flow.id, new_version, &row.nodes).await?;

        let now = Utc::now();
        let snapshot = flow.clone();
        let mut active: entities::flow::ActiveModel = flow.into();
        active.active_version = Set(new_version);
        active.updated_at = Set(now);
        entities::Flow::update(active).exec(&txn).await?;

        txn.commit().await?;

        Ok(CompleteFlowDefinition {
            id: *flow_id,
            handle: Handle(snapshot.handle),
            name: snapshot.name,
            flow_type: Self::parse_flow_type(&snapshot.flow_type)?,
            active_version: new_version,
            nodes: Self::parse_nodes(&row.nodes)?,
            created_at: snapshot.created_at,
            updated_at: now,
        })
    }

    async fn is_flow_exists(&self, flow_id: &FlowId) -> Result<bool> {
        let count = entities::Flow::find()
            .filter(entities::flow::Column::FlowId.eq(flow_id.to_string()))
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn is_flow_exists_by_handle(&self, handle: &str, flow_type: FlowType) -> Result<bool> {
        let count = entities::Flow::find()
            .filter(entities::flow::Column::DeploymentId.eq(self.deployment_id.clone()))
            .filter(entities::flow::Column::Handle.eq(handle))
            .filter(entities::flow::Column::FlowType.eq(flow_type.as_str()))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}
