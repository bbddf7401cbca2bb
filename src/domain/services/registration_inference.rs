use serde_json::Value;

use crate::domain::entities::FlowDefinition;
use crate::domain::services::executor_registry::{EXEC_AUTH_ASSERT, EXEC_PROVISIONING, EXEC_USER_TYPE_RESOLVER};
use crate::domain::value_objects::{
    ExecutorDefinition, FlowType, NodeDefinition, NodeLayout, NodeType,
};
use crate::error::{FlowMgtError, Result};

/// Reserved ids of the nodes synthesized into inferred registration flows.
pub const PROVISIONING_NODE_ID: &str = "prov_node";
pub const USER_TYPE_RESOLVER_NODE_ID: &str = "ut_res_node";

/// Node properties that only make sense during authentication and are
/// stripped from the inferred registration flow.
const AUTH_ONLY_PROPERTIES: [&str; 1] = ["allow_auth_without_local_user"];

/// Name tokens substituted with "Registration", tried in priority order.
const RENAME_TOKENS: [&str; 7] = [
    "Authentication",
    "Authenticate",
    "Sign-in",
    "Signin",
    "Sign in",
    "Login",
    "Auth",
];

/// Derive a registration flow from an authentication flow by structural
/// rewriting. Pure function of the input; the caller persists the result.
pub fn infer_registration_flow(definition: &FlowDefinition) -> Result<FlowDefinition> {
    // Serialize/deserialize to deep-copy the node list, opaque meta
    // payloads included.
    let encoded = serde_json::to_string(&definition.nodes)?;
    let mut nodes: Vec<NodeDefinition> = serde_json::from_str(&encoded)?;

    strip_authentication_properties(&mut nodes);

    let has_layout = nodes.iter().any(|n| n.layout.is_some());

    if !nodes.iter().any(|n| n.executor_name() == Some(EXEC_PROVISIONING)) {
        insert_provisioning_node(&mut nodes)?;
    }
    if !nodes
        .iter()
        .any(|n| n.executor_name() == Some(EXEC_USER_TYPE_RESOLVER))
    {
        insert_user_type_resolver_node(&mut nodes)?;
    }

    if has_layout {
        for node in nodes.iter_mut() {
            if (node.id == PROVISIONING_NODE_ID || node.id == USER_TYPE_RESOLVER_NODE_ID)
                && node.layout.is_none()
            {
                node.layout = Some(NodeLayout::synthesized());
            }
        }
    }

    Ok(FlowDefinition {
        handle: definition.handle.clone(),
        name: registration_name(&definition.name),
        flow_type: FlowType::Registration,
        nodes,
    })
}

fn strip_authentication_properties(nodes: &mut [NodeDefinition]) {
    for node in nodes.iter_mut() {
        if let Some(Value::Object(map)) = node.properties.as_mut() {
            for key in AUTH_ONLY_PROPERTIES {
                map.remove(key);
            }
        }
    }
}

fn task_execution_node(id: &str, executor: &str, on_success: &str) -> NodeDefinition {
    let mut node = NodeDefinition::new(id, NodeType::TaskExecution);
    node.executor = Some(ExecutorDefinition {
        name: executor.to_string(),
        mode: None,
    });
    node.on_success = Some(on_success.to_string());
    node
}

/// Re-point every reference to `from` (on_success, on_failure, action
/// next_node) at `to`.
fn redirect_references(nodes: &mut [NodeDefinition], from: &str, to: &str) {
    for node in nodes.iter_mut() {
        if node.on_success_target() == Some(from) {
            node.on_success = Some(to.to_string());
        }
        if node.on_failure_target() == Some(from) {
            node.on_failure = Some(to.to_string());
        }
        for action in node.actions.iter_mut() {
            if action.next_node_target() == Some(from) {
                action.next_node = Some(to.to_string());
            }
        }
    }
}

/// Insert the provisioning step immediately before the auth-assert
/// executor when present, otherwise immediately before the END node.
fn insert_provisioning_node(nodes: &mut Vec<NodeDefinition>) -> Result<()> {
    let anchor = nodes
        .iter()
        .position(|n| n.executor_name() == Some(EXEC_AUTH_ASSERT))
        .or_else(|| nodes.iter().position(|n| n.node_type == NodeType::End));
    let Some(anchor_index) = anchor else {
        return Err(FlowMgtError::InvalidFlowData(
            "flow has no END node to anchor provisioning".to_string(),
        ));
    };

    let anchor_id = nodes[anchor_index].id.clone();
    redirect_references(nodes, &anchor_id, PROVISIONING_NODE_ID);
    nodes.insert(
        anchor_index,
        task_execution_node(PROVISIONING_NODE_ID, EXEC_PROVISIONING, &anchor_id),
    );
    Ok(())
}

/// Insert the user-type resolver immediately after START, taking over
/// START's original successor.
fn insert_user_type_resolver_node(nodes: &mut Vec<NodeDefinition>) -> Result<()> {
    let Some(start_index) = nodes.iter().position(|n| n.node_type == NodeType::Start) else {
        return Err(FlowMgtError::InvalidFlowData(
            "flow has no START node".to_string(),
        ));
    };
    let Some(start_target) = nodes[start_index].on_success_target().map(str::to_string) else {
        return Err(FlowMgtError::InvalidFlowData(
            "START node has no on_success target".to_string(),
        ));
    };

    nodes[start_index].on_success = Some(USER_TYPE_RESOLVER_NODE_ID.to_string());
    nodes.insert(
        start_index + 1,
        task_execution_node(
            USER_TYPE_RESOLVER_NODE_ID,
            EXEC_USER_TYPE_RESOLVER,
            &start_target,
        ),
    );
    Ok(())
}

/// Substitute the first matching name token with "Registration",
/// preserving the case of the matched text; fall back to a suffix.
fn registration_name(name: &str) -> String {
    for token in RENAME_TOKENS {
        if let Some(pos) = find_ascii_case_insensitive(name, token) {
            let matched = &name[pos..pos + token.len()];
            let replacement = match_case(matched, "Registration");
            return format!(
                "{}{}{}",
                &name[..pos],
                replacement,
                &name[pos + token.len()..]
            );
        }
    }
    format!("{} - Registration", name)
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| {
        haystack.is_char_boundary(i)
            && haystack.is_char_boundary(i + n.len())
            && h[i..i + n.len()].eq_ignore_ascii_case(n)
    })
}

fn match_case(sample: &str, word: &str) -> String {
    if sample.chars().all(|c| !c.is_ascii_lowercase()) {
        word.to_ascii_uppercase()
    } else if sample.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
        word.to_ascii_lowercase()
    } else {
        word.to_string()
    }
}
