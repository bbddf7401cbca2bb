use crate::domain::entities::{CompleteFlowDefinition, FlowDefinition};
use crate::domain::value_objects::{FlowType, Handle, NodeDefinition};
use crate::error::{FlowMgtError, Result};

/// Minimum number of nodes a storable flow must carry: strictly more
/// than a bare start and end pair.
pub const MIN_NODE_COUNT: usize = 3;

/// Validate a submitted definition and lift it into its typed form.
/// Checks run in a fixed order and the first violation wins.
pub fn validate_new_flow(
    handle: &str,
    name: &str,
    flow_type: &str,
    nodes: &[NodeDefinition],
) -> Result<FlowDefinition> {
    if handle.trim().is_empty() {
        return Err(FlowMgtError::MissingHandle);
    }
    if !Handle::matches_format(handle) {
        return Err(FlowMgtError::InvalidHandleFormat(handle.to_string()));
    }
    if name.trim().is_empty() {
        return Err(FlowMgtError::MissingName);
    }
    let flow_type = FlowType::parse(flow_type)
        .ok_or_else(|| FlowMgtError::InvalidFlowType(flow_type.to_string()))?;
    if nodes.len() < MIN_NODE_COUNT {
        return Err(FlowMgtError::InvalidFlowData(format!(
            "a flow must contain at least {} nodes, got {}",
            MIN_NODE_COUNT,
            nodes.len()
        )));
    }

    Ok(FlowDefinition {
        handle: Handle(handle.to_string()),
        name: name.to_string(),
        flow_type,
        nodes: nodes.to_vec(),
    })
}

/// Constraints applied on top of `validate_new_flow` when an existing
/// flow is updated: neither the flow type nor the handle may change.
pub fn validate_update(
    existing: &CompleteFlowDefinition,
    definition: &FlowDefinition,
) -> Result<()> {
    if definition.flow_type != existing.flow_type {
        return Err(FlowMgtError::CannotUpdateFlowType);
    }
    if definition.handle != existing.handle {
        return Err(FlowMgtError::HandleUpdateNotAllowed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::NodeType;
    use chrono::Utc;
    use crate::domain::value_objects::FlowId;

    fn nodes(count: usize) -> Vec<NodeDefinition> {
        (0..count)
            .map(|i| NodeDefinition::new(format!("n{}", i), NodeType::Prompt))
            .collect()
    }

    #[test]
    fn test_first_violation_wins() {
        // Empty handle reported before the bad flow type.
        let err = validate_new_flow("", "Basic", "bogus", &nodes(3)).unwrap_err();
        assert!(matches!(err, FlowMgtError::MissingHandle));
    }

    #[test]
    fn test_handle_format_rejected() {
        let err = validate_new_flow("Bad Handle", "Basic", "authentication", &nodes(3))
            .unwrap_err();
        assert!(matches!(err, FlowMgtError::InvalidHandleFormat(_)));
    }

    #[test]
    fn test_missing_name() {
        let err = validate_new_flow("basic-auth", "  ", "authentication", &nodes(3))
            .unwrap_err();
        assert!(matches!(err, FlowMgtError::MissingName));
    }

    #[test]
    fn test_unknown_flow_type() {
        let err = validate_new_flow("basic-auth", "Basic", "sign-up", &nodes(3)).unwrap_err();
        assert!(matches!(err, FlowMgtError::InvalidFlowType(_)));
    }

    #[test]
    fn test_too_few_nodes() {
        let err = validate_new_flow("basic-auth", "Basic", "authentication", &nodes(2))
            .unwrap_err();
        assert!(matches!(err, FlowMgtError::InvalidFlowData(_)));
    }

    #[test]
    fn test_valid_definition_is_typed() {
        let def = validate_new_flow("basic-auth", "Basic", "authentication", &nodes(3)).unwrap();
        assert_eq!(def.flow_type, FlowType::Authentication);
        assert_eq!(def.handle.as_str(), "basic-auth");
    }

    #[test]
    fn test_update_constraints() {
        let existing = CompleteFlowDefinition {
            id: FlowId::new(),
            handle: Handle("h".to_string()),
            name: "Basic".to_string(),
            flow_type: FlowType::Authentication,
            active_version: 1,
            nodes: nodes(3),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut def = existing.to_definition();
        def.flow_type = FlowType::Registration;
        assert!(matches!(
            validate_update(&existing, &def),
            Err(FlowMgtError::CannotUpdateFlowType)
        ));

        let mut def = existing.to_definition();
        def.handle = Handle("h2".to_string());
        assert!(matches!(
            validate_update(&existing, &def),
            Err(FlowMgtError::HandleUpdateNotAllowed)
        ));

        let def = existing.to_definition();
        assert!(validate_update(&existing, &def).is_ok());
    }
}
