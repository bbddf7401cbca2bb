use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Start,
    End,
    Prompt,
    TaskExecution,
    Decision,
}

impl NodeType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "START" => Some(NodeType::Start),
            "END" => Some(NodeType::End),
            "PROMPT" => Some(NodeType::Prompt),
            "TASK_EXECUTION" => Some(NodeType::TaskExecution),
            "DECISION" => Some(NodeType::Decision),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "START",
            NodeType::End => "END",
            NodeType::Prompt => "PROMPT",
            NodeType::TaskExecution => "TASK_EXECUTION",
            NodeType::Decision => "DECISION",
        }
    }
}

/// Canvas placement hint carried by editor-authored definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeLayout {
    /// Placement given to nodes synthesized by inference when the source
    /// flow carries layout information.
    pub fn synthesized() -> Self {
        NodeLayout {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDefinition {
    #[serde(rename = "ref", default, skip_serializing_if = "String::is_empty")]
    pub input_ref: String,
    pub identifier: String,
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node: Option<String>,
}

impl ActionDefinition {
    pub fn next_node_target(&self) -> Option<&str> {
        self.next_node.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_skip: Option<String>,
}

impl ConditionDefinition {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }
}

/// One typed vertex of a flow definition. `meta` is structurally opaque:
/// object, array, scalar, or null, preserved verbatim through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<NodeLayout>,
    /// `Value::Null` means no meta; a JSON `null` and an absent field
    /// are equivalent on the wire.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub meta: Value,
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

impl NodeDefinition {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        NodeDefinition {
            id: id.into(),
            node_type,
            layout: None,
            meta: Value::Null,
            inputs: Vec::new(),
            actions: Vec::new(),
            properties: None,
            executor: None,
            on_success: None,
            on_failure: None,
            condition: None,
        }
    }

    /// Non-empty `on_success` target, if any.
    pub fn on_success_target(&self) -> Option<&str> {
        self.on_success.as_deref().filter(|t| !t.is_empty())
    }

    /// Non-empty `on_failure` target, if any.
    pub fn on_failure_target(&self) -> Option<&str> {
        self.on_failure.as_deref().filter(|t| !t.is_empty())
    }

    pub fn executor_name(&self) -> Option<&str> {
        self.executor
            .as_ref()
            .map(|e| e.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// A node with no outgoing navigation terminates the flow.
    pub fn is_final(&self) -> bool {
        self.on_success_target().is_none()
            && self.on_failure_target().is_none()
            && self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_type_wire_format() {
        let json = serde_json::to_string(&NodeType::TaskExecution).unwrap();
        assert_eq!(json, "\"TASK_EXECUTION\"");
        assert_eq!(NodeType::parse("PROMPT"), Some(NodeType::Prompt));
        assert_eq!(NodeType::parse("prompt"), None);
    }

    #[test]
    fn test_meta_round_trip_heterogeneous() {
        let metas = vec![
            json!({"title": "Sign in", "i18n": {"fr": "Connexion"}}),
            json!(["a", 1, null]),
            json!("plain text with \"quotes\" and \\backslashes"),
            json!(42.5),
            json!(true),
            Value::Null,
        ];
        for meta in metas {
            let mut node = NodeDefinition::new("n1", NodeType::Prompt);
            node.meta = meta.clone();
            let encoded = serde_json::to_string(&node).unwrap();
            let decoded: NodeDefinition = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded.meta, meta);
        }
    }

    #[test]
    fn test_empty_targets_are_not_navigation() {
        let mut node = NodeDefinition::new("n1", NodeType::TaskExecution);
        node.on_success = Some(String::new());
        assert_eq!(node.on_success_target(), None);
        assert!(node.is_final());

        node.on_success = Some("next".to_string());
        assert_eq!(node.on_success_target(), Some("next"));
        assert!(!node.is_final());
    }

    #[test]
    fn test_is_final_considers_actions() {
        let mut node = NodeDefinition::new("p1", NodeType::Prompt);
        node.actions.push(ActionDefinition {
            id: "continue".to_string(),
            next_node: Some("n2".to_string()),
        });
        assert!(!node.is_final());
    }

    #[test]
    fn test_deserialize_minimal_node() {
        let node: NodeDefinition =
            serde_json::from_str(r#"{"id": "end", "type": "END"}"#).unwrap();
        assert_eq!(node.id, "end");
        assert_eq!(node.node_type, NodeType::End);
        assert!(node.inputs.is_empty());
        assert!(node.is_final());
    }
}
