#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    use crate::domain::entities::FlowDefinition;
    use crate::domain::repositories::FlowRepository;
    use crate::domain::value_objects::{FlowId, FlowType, Handle, NodeDefinition, NodeType};
    use crate::error::FlowMgtError;
    use crate::infrastructure::database::entities;
    use crate::infrastructure::repositories::DbFlowRepository;

    const DEPLOYMENT: &str = "default";

    fn nodes() -> Vec<NodeDefinition> {
        let mut start = NodeDefinition::new("start", NodeType::Start);
        start.on_success = Some("login".to_string());
        let mut login = NodeDefinition::new("login", NodeType::Prompt);
        login.on_success = Some("end".to_string());
        let end = NodeDefinition::new("end", NodeType::End);
        vec![start, login, end]
    }

    fn nodes_json() -> String {
        serde_json::to_string(&nodes()).unwrap()
    }

    fn definition() -> FlowDefinition {
        FlowDefinition {
            handle: Handle("basic-auth".to_string()),
            name: "Basic".to_string(),
            flow_type: FlowType::Authentication,
            nodes: nodes(),
        }
    }

    fn flow_model(flow_id: &FlowId, active_version: i32) -> entities::flow::Model {
        entities::flow::Model {
            id: 7,
            flow_id: flow_id.to_string(),
            handle: "basic-auth".to_string(),
            name: "Basic".to_string(),
            flow_type: "authentication".to_string(),
            active_version,
            deployment_id: DEPLOYMENT.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn version_model(version: i32) -> entities::flow_version::Model {
        entities::flow_version::Model {
            flow_internal_id: 7,
            version,
            nodes: nodes_json(),
            deployment_id: DEPLOYMENT.to_string(),
            created_at: Utc::now(),
        }
    }

    fn count_row(count: i64) -> BTreeMap<&'static str, Value> {
        let mut row = BTreeMap::new();
        row.insert("num_items", Value::Int(Some(count as i32)));
        row
    }

    fn repo(db: sea_orm::DatabaseConnection, max_history: u32) -> DbFlowRepository {
        DbFlowRepository::new(Arc::new(db), DEPLOYMENT.to_string(), max_history)
    }

    #[tokio::test]
    async fn test_get_flow_by_id_joins_active_version() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            .append_query_results([vec![version_model(3)]])
            .into_connection();

        let result = repo(db, 10).get_flow_by_id(&flow_id).await.unwrap();
        assert_eq!(result.id, flow_id);
        assert_eq!(result.active_version, 3);
        assert_eq!(result.nodes, nodes());
        assert_eq!(result.flow_type, FlowType::Authentication);
    }

    #[tokio::test]
    async fn test_get_flow_by_id_not_found() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([Vec::<entities::flow::Model>::new()])
            .into_connection();

        let err = repo(db, 10).get_flow_by_id(&FlowId::new()).await.unwrap_err();
        assert!(matches!(err, FlowMgtError::FlowNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_flow_by_handle() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 1)]])
            .append_query_results([vec![version_model(1)]])
            .into_connection();

        let result = repo(db, 10)
            .get_flow_by_handle("basic-auth", FlowType::Authentication)
            .await
            .unwrap();
        assert_eq!(result.handle.as_str(), "basic-auth");
        assert_eq!(result.id, flow_id);
    }

    #[tokio::test]
    async fn test_missing_active_version_row_is_internal() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 2)]])
            .append_query_results([Vec::<entities::flow_version::Model>::new()])
            .into_connection();

        let err = repo(db, 10).get_flow_by_id(&flow_id).await.unwrap_err();
        assert!(matches!(err, FlowMgtError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_list_flows_counts_then_pages() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![count_row(42)]])
            .append_query_results([vec![flow_model(&flow_id, 1)]])
            .into_connection();

        let (flows, total) = repo(db, 10).list_flows(30, 0, None).await.unwrap();
        assert_eq!(total, 42);
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].id, flow_id);
    }

    #[tokio::test]
    async fn test_create_flow_inserts_flow_and_version() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![count_row(0)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 7,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let created = repo(db, 10).create_flow(flow_id, &definition()).await.unwrap();
        assert_eq!(created.id, flow_id);
        assert_eq!(created.active_version, 1);
        assert_eq!(created.nodes, nodes());
    }

    #[tokio::test]
    async fn test_create_flow_duplicate_handle() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![count_row(1)]])
            .into_connection();

        let err = repo(db, 10)
            .create_flow(FlowId::new(), &definition())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowMgtError::DuplicateHandle(ref h) if h == "basic-auth"));
    }

    #[tokio::test]
    async fn test_update_flow_advances_active_version() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            // read current flow row
            .append_query_results([vec![flow_model(&flow_id, 2)]])
            // version count after insert, under the cap
            .append_query_results([vec![count_row(3)]])
            // row fetched back after the UPDATE statement
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            .append_exec_results([
                // insert new version
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // update flow row
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let updated = repo(db, 10).update_flow(&flow_id, &definition()).await.unwrap();
        assert_eq!(updated.active_version, 3);
    }

    #[tokio::test]
    async fn test_update_flow_not_found() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([Vec::<entities::flow::Model>::new()])
            .into_connection();

        let err = repo(db, 10)
            .update_flow(&FlowId::new(), &definition())
            .await
            .unwrap_err();
        assert!(matches!(err, FlowMgtError::FlowNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_flow_evicts_oldest_version() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            // count exceeds the cap of 3 after the insert
            .append_query_results([vec![count_row(4)]])
            // the smallest retained version
            .append_query_results([vec![version_model(1)]])
            .append_query_results([vec![flow_model(&flow_id, 4)]])
            .append_exec_results([
                // insert new version
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // delete evicted version
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // update flow row
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let updated = repo(db, 3).update_flow(&flow_id, &definition()).await.unwrap();
        assert_eq!(updated.active_version, 4);
    }

    #[tokio::test]
    async fn test_restore_copies_snapshot_into_new_version() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            // the restored snapshot
            .append_query_results([vec![version_model(1)]])
            .append_query_results([vec![count_row(4)]])
            // the smallest retained version is evicted
            .append_query_results([vec![version_model(1)]])
            .append_query_results([vec![flow_model(&flow_id, 4)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let restored = repo(db, 3)
            .restore_flow_version(&flow_id, 1)
            .await
            .unwrap();
        assert_eq!(restored.active_version, 4);
        assert_eq!(restored.nodes, nodes());
    }

    #[tokio::test]
    async fn test_restore_missing_version() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            .append_query_results([Vec::<entities::flow_version::Model>::new()])
            .into_connection();

        let err = repo(db, 10)
            .restore_flow_version(&flow_id, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowMgtError::FlowVersionNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_flow_versions_marks_active() {
        let flow_id = FlowId::new();
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            .append_query_results([vec![version_model(3), version_model(2)]])
            .into_connection();

        let versions = repo(db, 10).list_flow_versions(&flow_id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[0].is_active);
        assert_eq!(versions[0].version, 3);
        assert!(!versions[1].is_active);
    }

    #[tokio::test]
    async fn test_get_flow_version_sentinels() {
        let flow_id = FlowId::new();

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([Vec::<entities::flow::Model>::new()])
            .into_connection();
        let err = repo(db, 10).get_flow_version(&flow_id, 1).await.unwrap_err();
        assert!(matches!(err, FlowMgtError::FlowNotFound(_)));

        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![flow_model(&flow_id, 3)]])
            .append_query_results([Vec::<entities::flow_version::Model>::new()])
            .into_connection();
        let err = repo(db, 10).get_flow_version(&flow_id, 9).await.unwrap_err();
        assert!(matches!(err, FlowMgtError::FlowVersionNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_flow_is_noop() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        assert!(repo(db, 10).delete_flow(&FlowId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_exists_checks() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![count_row(1)]])
            .append_query_results([vec![count_row(0)]])
            .into_connection();

        let repo = repo(db, 10);
        assert!(repo.is_flow_exists(&FlowId::new()).await.unwrap());
        assert!(!repo
            .is_flow_exists_by_handle("basic-auth", FlowType::Registration)
            .await
            .unwrap());
    }
}
