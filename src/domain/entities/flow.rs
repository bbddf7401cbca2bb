use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{FlowId, FlowType, Handle, NodeDefinition};

/// A flow definition as submitted by a caller: the declarative payload
/// without any server-assigned attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub handle: Handle,
    pub name: String,
    pub flow_type: FlowType,
    pub nodes: Vec<NodeDefinition>,
}

/// A flow joined with the node list of its active version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteFlowDefinition {
    pub id: FlowId,
    pub handle: Handle,
    pub name: String,
    pub flow_type: FlowType,
    pub active_version: i32,
    pub nodes: Vec<NodeDefinition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection used by list endpoints; omits the node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicFlowDefinition {
    pub id: FlowId,
    pub handle: Handle,
    pub name: String,
    pub flow_type: FlowType,
    pub active_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of one version row for version listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicFlowVersion {
    pub version: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// An immutable snapshot of a flow's node list at a version number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowVersionRecord {
    pub flow_id: FlowId,
    pub version: i32,
    pub nodes: Vec<NodeDefinition>,
    pub created_at: DateTime<Utc>,
}

impl CompleteFlowDefinition {
    pub fn to_basic(&self) -> BasicFlowDefinition {
        BasicFlowDefinition {
            id: self.id,
            handle: self.handle.clone(),
            name: self.name.clone(),
            flow_type: self.flow_type,
            active_version: self.active_version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// The declarative payload view of this flow, as a caller would
    /// submit it.
    pub fn to_definition(&self) -> FlowDefinition {
        FlowDefinition {
            handle: self.handle.clone(),
            name: self.name.clone(),
            flow_type: self.flow_type,
            nodes: self.nodes.clone(),
        }
    }
}
