use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::CompleteFlowDefinition;
use crate::domain::value_objects::{
    ActionDefinition, ConditionDefinition, ExecutorDefinition, FlowId, FlowType, Handle,
    InputDefinition, NodeDefinition, NodeLayout, NodeType,
};
use crate::error::{FlowMgtError, Result};

/// YAML document shape of a flow definition resource.
///
/// `meta` is JSON-encoded into a string when emitting so heterogeneous
/// content round-trips reliably; on read a string is first tried as JSON
/// and kept as the literal string when that fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub handle: String,
    pub name: String,
    pub flow_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResource {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<NodeLayout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<ExecutorDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionDefinition>,
}

fn encode_meta(meta: &Value) -> Value {
    Value::String(meta.to_string())
}

fn decode_meta(meta: Value) -> Value {
    match meta {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    }
}

impl NodeResource {
    pub fn from_definition(node: &NodeDefinition) -> Self {
        NodeResource {
            id: node.id.clone(),
            node_type: node.node_type.as_str().to_string(),
            layout: node.layout.clone(),
            meta: if node.meta.is_null() {
                None
            } else {
                Some(encode_meta(&node.meta))
            },
            inputs: node.inputs.clone(),
            actions: node.actions.clone(),
            properties: node.properties.clone(),
            executor: node.executor.clone(),
            on_success: node.on_success.clone(),
            on_failure: node.on_failure.clone(),
            condition: node.condition.clone(),
        }
    }

    pub fn into_definition(self) -> Result<NodeDefinition> {
        let node_type = NodeType::parse(&self.node_type).ok_or_else(|| {
            FlowMgtError::InvalidFlowData(format!("unknown node type '{}'", self.node_type))
        })?;
        Ok(NodeDefinition {
            id: self.id,
            node_type,
            layout: self.layout,
            meta: self.meta.map(decode_meta).unwrap_or(Value::Null),
            inputs: self.inputs,
            actions: self.actions,
            properties: self.properties,
            executor: self.executor,
            on_success: self.on_success,
            on_failure: self.on_failure,
            condition: self.condition,
        })
    }
}

impl FlowResource {
    pub fn from_complete(definition: &CompleteFlowDefinition) -> Self {
        FlowResource {
            id: Some(definition.id.to_string()),
            handle: definition.handle.to_string(),
            name: definition.name.clone(),
            flow_type: definition.flow_type.as_str().to_string(),
            active_version: Some(definition.active_version),
            created_at: Some(definition.created_at.to_rfc3339()),
            updated_at: Some(definition.updated_at.to_rfc3339()),
            nodes: definition
                .nodes
                .iter()
                .map(NodeResource::from_definition)
                .collect(),
        }
    }

    pub fn into_complete(self) -> Result<CompleteFlowDefinition> {
        let flow_type = FlowType::parse(&self.flow_type)
            .ok_or_else(|| FlowMgtError::InvalidFlowType(self.flow_type.clone()))?;
        let id = match &self.id {
            Some(raw) => FlowId::parse(raw).map_err(|_| {
                FlowMgtError::InvalidFlowData(format!("'{}' is not a valid flow id", raw))
            })?,
            None => FlowId::new(),
        };
        let created_at = parse_timestamp(self.created_at.as_deref())?;
        let updated_at = parse_timestamp(self.updated_at.as_deref())?;

        let mut nodes = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            nodes.push(node.into_definition()?);
        }

        Ok(CompleteFlowDefinition {
            id,
            handle: Handle(self.handle),
            name: self.name,
            flow_type,
            active_version: self.active_version.unwrap_or(1),
            nodes,
            created_at,
            updated_at,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| FlowMgtError::InvalidFlowData(format!("malformed flow resource: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FlowMgtError::InternalError(format!("cannot encode flow resource: {}", e)))
    }
}

fn parse_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                FlowMgtError::InvalidFlowData(format!("'{}' is not an RFC3339 timestamp: {}", raw, e))
            }),
        None => Ok(Utc::now()),
    }
}
