use std::collections::HashMap;

use serde_json::Value;

use crate::domain::value_objects::{
    ActionDefinition, ConditionDefinition, FlowType, InputDefinition, NodeType,
};

/// Attributes shared by every runtime node variant.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCore {
    pub id: String,
    pub properties: Option<Value>,
    pub is_start: bool,
    pub is_final: bool,
    pub inputs: Vec<InputDefinition>,
    pub condition: Option<ConditionDefinition>,
}

impl NodeCore {
    fn new(id: &str, properties: Option<Value>, is_start: bool, is_final: bool) -> Self {
        NodeCore {
            id: id.to_string(),
            properties,
            is_start,
            is_final,
            inputs: Vec::new(),
            condition: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartNode {
    pub core: NodeCore,
    pub on_success: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndNode {
    pub core: NodeCore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptNode {
    pub core: NodeCore,
    pub on_success: Option<String>,
    pub on_failure: Option<String>,
    pub meta: Option<Value>,
    pub actions: Vec<ActionDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskExecutionNode {
    pub core: NodeCore,
    pub on_success: Option<String>,
    pub on_failure: Option<String>,
    pub executor_name: Option<String>,
    pub executor_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionNode {
    pub core: NodeCore,
    pub on_success: Option<String>,
    pub on_failure: Option<String>,
}

/// Executable node, tagged by kind. Capability setters return whether
/// the variant accepts the capability; callers decide what a rejected
/// assignment means.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeNode {
    Start(StartNode),
    End(EndNode),
    Prompt(PromptNode),
    TaskExecution(TaskExecutionNode),
    Decision(DecisionNode),
}

impl RuntimeNode {
    /// Factory over the definition-level node type.
    pub fn create(
        id: &str,
        node_type: NodeType,
        properties: Option<Value>,
        is_start: bool,
        is_final: bool,
    ) -> Self {
        let core = NodeCore::new(id, properties, is_start, is_final);
        match node_type {
            NodeType::Start => RuntimeNode::Start(StartNode {
                core,
                on_success: None,
            }),
            NodeType::End => RuntimeNode::End(EndNode { core }),
            NodeType::Prompt => RuntimeNode::Prompt(PromptNode {
                core,
                on_success: None,
                on_failure: None,
                meta: None,
                actions: Vec::new(),
            }),
            NodeType::TaskExecution => RuntimeNode::TaskExecution(TaskExecutionNode {
                core,
                on_success: None,
                on_failure: None,
                executor_name: None,
                executor_mode: None,
            }),
            NodeType::Decision => RuntimeNode::Decision(DecisionNode {
                core,
                on_success: None,
                on_failure: None,
            }),
        }
    }

    pub fn core(&self) -> &NodeCore {
        match self {
            RuntimeNode::Start(n) => &n.core,
            RuntimeNode::End(n) => &n.core,
            RuntimeNode::Prompt(n) => &n.core,
            RuntimeNode::TaskExecution(n) => &n.core,
            RuntimeNode::Decision(n) => &n.core,
        }
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        match self {
            RuntimeNode::Start(n) => &mut n.core,
            RuntimeNode::End(n) => &mut n.core,
            RuntimeNode::Prompt(n) => &mut n.core,
            RuntimeNode::TaskExecution(n) => &mut n.core,
            RuntimeNode::Decision(n) => &mut n.core,
        }
    }

    pub fn id(&self) -> &str {
        &self.core().id
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            RuntimeNode::Start(_) => NodeType::Start,
            RuntimeNode::End(_) => NodeType::End,
            RuntimeNode::Prompt(_) => NodeType::Prompt,
            RuntimeNode::TaskExecution(_) => NodeType::TaskExecution,
            RuntimeNode::Decision(_) => NodeType::Decision,
        }
    }

    pub fn is_final(&self) -> bool {
        self.core().is_final
    }

    pub fn set_condition(&mut self, condition: ConditionDefinition) {
        self.core_mut().condition = Some(condition);
    }

    pub fn set_inputs(&mut self, inputs: Vec<InputDefinition>) {
        self.core_mut().inputs = inputs;
    }

    pub fn mark_start(&mut self) {
        self.core_mut().is_start = true;
    }

    pub fn set_on_success(&mut self, target: &str) -> bool {
        match self {
            RuntimeNode::Start(n) => n.on_success = Some(target.to_string()),
            RuntimeNode::Prompt(n) => n.on_success = Some(target.to_string()),
            RuntimeNode::TaskExecution(n) => n.on_success = Some(target.to_string()),
            RuntimeNode::Decision(n) => n.on_success = Some(target.to_string()),
            RuntimeNode::End(_) => return false,
        }
        true
    }

    pub fn set_on_failure(&mut self, target: &str) -> bool {
        match self {
            RuntimeNode::Prompt(n) => n.on_failure = Some(target.to_string()),
            RuntimeNode::TaskExecution(n) => n.on_failure = Some(target.to_string()),
            RuntimeNode::Decision(n) => n.on_failure = Some(target.to_string()),
            RuntimeNode::Start(_) | RuntimeNode::End(_) => return false,
        }
        true
    }

    pub fn set_meta(&mut self, meta: Value) -> bool {
        match self {
            RuntimeNode::Prompt(n) => {
                n.meta = Some(meta);
                true
            }
            _ => false,
        }
    }

    pub fn set_actions(&mut self, actions: Vec<ActionDefinition>) -> bool {
        match self {
            RuntimeNode::Prompt(n) => {
                n.actions = actions;
                true
            }
            _ => false,
        }
    }

    pub fn set_executor_name(&mut self, name: &str) -> bool {
        match self {
            RuntimeNode::TaskExecution(n) => {
                n.executor_name = Some(name.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn set_executor_mode(&mut self, mode: &str) -> bool {
        match self {
            RuntimeNode::TaskExecution(n) => {
                n.executor_mode = Some(mode.to_string());
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Executable form of a flow definition, handed to the node-execution
/// runtime.
#[derive(Debug, Clone)]
pub struct Graph {
    id: String,
    flow_type: FlowType,
    start_node_id: Option<String>,
    nodes: HashMap<String, RuntimeNode>,
    edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn new(id: &str, flow_type: FlowType) -> Self {
        Graph {
            id: id.to_string(),
            flow_type,
            start_node_id: None,
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow_type
    }

    pub fn add_node(&mut self, node: RuntimeNode) {
        self.nodes.insert(node.id().to_string(), node);
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn set_start_node(&mut self, id: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.mark_start();
        }
        self.start_node_id = Some(id.to_string());
    }

    pub fn start_node_id(&self) -> Option<&str> {
        self.start_node_id.as_deref()
    }

    pub fn node(&self, id: &str) -> Option<&RuntimeNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_sets() {
        let mut start = RuntimeNode::create("start", NodeType::Start, None, true, false);
        assert!(start.set_on_success("next"));
        assert!(!start.set_on_failure("p1"));
        assert!(!start.set_meta(Value::Null));
        assert!(!start.set_executor_name("basic-auth"));

        let mut end = RuntimeNode::create("end", NodeType::End, None, false, true);
        assert!(!end.set_on_success("x"));
        assert!(!end.set_on_failure("x"));

        let mut prompt = RuntimeNode::create("p1", NodeType::Prompt, None, false, false);
        assert!(prompt.set_on_failure("p1"));
        assert!(prompt.set_meta(serde_json::json!({"title": "Login"})));
        assert!(prompt.set_actions(vec![]));
        assert!(!prompt.set_executor_name("basic-auth"));

        let mut task = RuntimeNode::create("t1", NodeType::TaskExecution, None, false, false);
        assert!(task.set_executor_name("basic-auth"));
        assert!(task.set_executor_mode("silent"));
        assert!(!task.set_meta(Value::Null));
    }

    #[test]
    fn test_condition_and_inputs_on_every_variant() {
        for node_type in [
            NodeType::Start,
            NodeType::End,
            NodeType::Prompt,
            NodeType::TaskExecution,
            NodeType::Decision,
        ] {
            let mut node = RuntimeNode::create("n", node_type, None, false, false);
            node.set_condition(ConditionDefinition {
                key: "user_type".to_string(),
                value: "customer".to_string(),
                on_skip: None,
            });
            node.set_inputs(vec![]);
            assert!(node.core().condition.is_some());
        }
    }

    #[test]
    fn test_graph_start_node_marking() {
        let mut graph = Graph::new("flow-1", FlowType::Authentication);
        graph.add_node(RuntimeNode::create("start", NodeType::Start, None, false, false));
        graph.set_start_node("start");
        assert_eq!(graph.start_node_id(), Some("start"));
        assert!(graph.node("start").map(|n| n.core().is_start).unwrap_or(false));
    }
}
