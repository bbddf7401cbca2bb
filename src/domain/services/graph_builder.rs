use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::entities::CompleteFlowDefinition;
use crate::domain::services::executor_registry::ExecutorRegistry;
use crate::domain::services::graph::{Graph, RuntimeNode};
use crate::domain::value_objects::NodeType;
use crate::error::{FlowMgtError, Result};

/// Cache of compiled graphs, keyed by flow id. Failures must never block
/// graph compilation; callers log and move on.
pub trait GraphCache: Send + Sync {
    fn get(&self, flow_id: &str) -> Result<Option<Arc<Graph>>>;
    fn set(&self, flow_id: &str, graph: Arc<Graph>) -> Result<()>;
    fn invalidate(&self, flow_id: &str) -> Result<()>;
}

/// Compiles flow definitions into executable graphs, enforcing the
/// structural rules that definition storage does not.
pub struct GraphBuilder {
    registry: Arc<ExecutorRegistry>,
    cache: Arc<dyn GraphCache>,
}

impl GraphBuilder {
    pub fn new(registry: Arc<ExecutorRegistry>, cache: Arc<dyn GraphCache>) -> Self {
        GraphBuilder { registry, cache }
    }

    /// Return the compiled graph for a definition, building and caching
    /// it on first use.
    pub fn get_graph(&self, definition: &CompleteFlowDefinition) -> Result<Arc<Graph>> {
        if definition.nodes.is_empty() {
            return Err(FlowMgtError::InvalidFlowData(
                "flow definition has no nodes".to_string(),
            ));
        }

        let flow_id = definition.id.to_string();
        match self.cache.get(&flow_id) {
            Ok(Some(graph)) => return Ok(graph),
            Ok(None) => {}
            Err(e) => log::warn!("Graph cache read failed for flow {}: {}", flow_id, e),
        }

        let graph = Arc::new(self.build(definition)?);
        if let Err(e) = self.cache.set(&flow_id, graph.clone()) {
            log::warn!("Graph cache write failed for flow {}: {}", flow_id, e);
        }
        Ok(graph)
    }

    /// Drop the compiled graph for a flow. Must be called after every
    /// update, restore, or delete. No-op on an empty id.
    pub fn invalidate_cache(&self, flow_id: &str) {
        if flow_id.is_empty() {
            return;
        }
        if let Err(e) = self.cache.invalidate(flow_id) {
            log::warn!("Graph cache invalidation failed for flow {}: {}", flow_id, e);
        }
    }

    fn build(&self, definition: &CompleteFlowDefinition) -> Result<Graph> {
        let mut graph = Graph::new(&definition.id.to_string(), definition.flow_type);
        // First pass creates the runtime nodes; edges are collected by
        // source id and wired afterwards so forward references resolve.
        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for node_def in &definition.nodes {
            if !seen_ids.insert(node_def.id.as_str()) {
                return Err(FlowMgtError::GraphBuildFailure(format!(
                    "duplicate node id '{}'",
                    node_def.id
                )));
            }

            let mut node = RuntimeNode::create(
                &node_def.id,
                node_def.node_type,
                node_def.properties.clone(),
                false,
                node_def.is_final(),
            );

            if let Some(target) = node_def.on_success_target() {
                if node.set_on_success(target) {
                    edges
                        .entry(node_def.id.clone())
                        .or_default()
                        .push(target.to_string());
                }
            }

            if let Some(target) = node_def.on_failure_target() {
                let target_def = definition
                    .nodes
                    .iter()
                    .find(|n| n.id == target)
                    .ok_or_else(|| {
                        FlowMgtError::GraphBuildFailure(format!(
                            "onFailure target '{}' does not exist",
                            target
                        ))
                    })?;
                if target_def.node_type != NodeType::Prompt {
                    return Err(FlowMgtError::GraphBuildFailure(
                        "onFailure must point to a PROMPT node".to_string(),
                    ));
                }
                if node.set_on_failure(target) {
                    edges
                        .entry(node_def.id.clone())
                        .or_default()
                        .push(target.to_string());
                }
            }

            node.set_inputs(node_def.inputs.clone());

            if node_def.node_type == NodeType::Prompt {
                if !node_def.meta.is_null() {
                    node.set_meta(node_def.meta.clone());
                }
                node.set_actions(node_def.actions.clone());
                for action in &node_def.actions {
                    if let Some(target) = action.next_node_target() {
                        edges
                            .entry(node_def.id.clone())
                            .or_default()
                            .push(target.to_string());
                    }
                }
            }

            if let Some(condition) = &node_def.condition {
                if !condition.is_empty() {
                    node.set_condition(condition.clone());
                }
            }

            if let Some(name) = node_def.executor_name() {
                if !self.registry.is_registered(name) {
                    return Err(FlowMgtError::GraphBuildFailure(format!(
                        "executor '{}' is not registered",
                        name
                    )));
                }
                // Rejected on non-executor variants; legacy definitions
                // carry stray executor blocks.
                node.set_executor_name(name);
                if let Some(mode) = node_def.executor.as_ref().and_then(|e| e.mode.as_deref()) {
                    node.set_executor_mode(mode);
                }
            }

            graph.add_node(node);
        }

        for node_def in &definition.nodes {
            if let Some(targets) = edges.remove(node_def.id.as_str()) {
                for target in targets {
                    if !graph.contains_node(&target) {
                        return Err(FlowMgtError::GraphBuildFailure(format!(
                            "edge target '{}' does not exist",
                            target
                        )));
                    }
                    graph.add_edge(&node_def.id, &target);
                }
            }
        }

        let start = definition
            .nodes
            .iter()
            .find(|n| n.node_type == NodeType::Start)
            .ok_or_else(|| {
                FlowMgtError::GraphBuildFailure("flow has no START node".to_string())
            })?;
        graph.set_start_node(&start.id);

        Ok(graph)
    }
}
