use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::domain::entities::{
    BasicFlowDefinition, BasicFlowVersion, CompleteFlowDefinition, FlowDefinition,
    FlowVersionRecord,
};
use crate::domain::repositories::FlowRepository;
use crate::domain::services::flow_validation::MIN_NODE_COUNT;
use crate::domain::value_objects::{FlowId, FlowType};
use crate::error::{FlowMgtError, Result};
use crate::infrastructure::resources::FlowResource;

/// Read-only flow store backed by YAML documents, used when the
/// deployment runs from immutable resources. Documents are parsed and
/// validated once at startup; unloadable files are logged and skipped.
pub struct FileFlowRepository {
    by_id: RwLock<HashMap<String, CompleteFlowDefinition>>,
    by_handle: RwLock<HashMap<String, String>>,
}

impl FileFlowRepository {
    pub fn load(dir: &Path) -> Result<Self> {
        let mut by_id: HashMap<String, CompleteFlowDefinition> = HashMap::new();
        let mut by_handle: HashMap<String, String> = HashMap::new();

        let entries = fs::read_dir(dir).map_err(|e| {
            FlowMgtError::InternalError(format!(
                "cannot read flow resource directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    log::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
                .unwrap_or(false);
            if !is_yaml {
                continue;
            }

            match Self::load_file(&path) {
                Ok(definition) => {
                    let handle_key =
                        handle_key(definition.handle.as_str(), definition.flow_type);
                    if by_handle.contains_key(&handle_key) {
                        log::warn!(
                            "Skipping {}: duplicate handle '{}' for flow type {}",
                            path.display(),
                            definition.handle,
                            definition.flow_type
                        );
                        continue;
                    }
                    by_handle.insert(handle_key, definition.id.to_string());
                    by_id.insert(definition.id.to_string(), definition);
                }
                Err(e) => {
                    log::warn!("Skipping flow resource {}: {}", path.display(), e);
                }
            }
        }

        log::info!(
            "Loaded {} flow definitions from {}",
            by_id.len(),
            dir.display()
        );

        Ok(Self {
            by_id: RwLock::new(by_id),
            by_handle: RwLock::new(by_handle),
        })
    }

    fn load_file(path: &Path) -> Result<CompleteFlowDefinition> {
        let raw = fs::read_to_string(path)
            .map_err(|e| FlowMgtError::InternalError(format!("cannot read file: {}", e)))?;
        let definition = FlowResource::from_yaml(&raw)?.into_complete()?;
        Self::validate_loaded(&definition)?;
        Ok(definition)
    }

    // Handle syntax is deliberately accepted as-is from disk; only the
    // definition-level checks run on the load path.
    fn validate_loaded(definition: &CompleteFlowDefinition) -> Result<()> {
        if definition.name.trim().is_empty() {
            return Err(FlowMgtError::MissingName);
        }
        if definition.nodes.len() < MIN_NODE_COUNT {
            return Err(FlowMgtError::InvalidFlowData(format!(
                "a flow must contain at least {} nodes, got {}",
                MIN_NODE_COUNT,
                definition.nodes.len()
            )));
        }
        Ok(())
    }

    fn not_supported() -> FlowMgtError {
        FlowMgtError::NotSupported("the file-backed flow store is read-only".to_string())
    }

    fn flows(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, CompleteFlowDefinition>>> {
        self.by_id
            .read()
            .map_err(|_| FlowMgtError::InternalError("flow store lock poisoned".to_string()))
    }
}

fn handle_key(handle: &str, flow_type: FlowType) -> String {
    format!("{}:{}", handle, flow_type.as_str())
}

#[async_trait]
impl FlowRepository for FileFlowRepository {
    async fn list_flows(
        &self,
        limit: u64,
        offset: u64,
        flow_type: Option<FlowType>,
    ) -> Result<(Vec<BasicFlowDefinition>, u64)> {
        let flows = self.flows()?;
        let mut matching: Vec<BasicFlowDefinition> = flows
            .values()
            .filter(|f| flow_type.map(|t| f.flow_type == t).unwrap_or(true))
            .map(|f| f.to_basic())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn create_flow(
        &self,
        _flow_id: FlowId,
        _definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition> {
        Err(Self::not_supported())
    }

    async fn get_flow_by_id(&self, flow_id: &FlowId) -> Result<CompleteFlowDefinition> {
        self.flows()?
            .get(&flow_id.to_string())
            .cloned()
            .ok_or_else(|| FlowMgtError::FlowNotFound(flow_id.to_string()))
    }

    async fn get_flow_by_handle(
        &self,
        handle: &str,
        flow_type: FlowType,
    ) -> Result<CompleteFlowDefinition> {
        let id = {
            let handles = self.by_handle.read().map_err(|_| {
                FlowMgtError::InternalError("flow store lock poisoned".to_string())
            })?;
            handles.get(&handle_key(handle, flow_type)).cloned()
        };
        let Some(id) = id else {
            return Err(FlowMgtError::FlowNotFound(handle.to_string()));
        };
        self.flows()?
            .get(&id)
            .cloned()
            .ok_or_else(|| FlowMgtError::FlowNotFound(handle.to_string()))
    }

    async fn update_flow(
        &self,
        _flow_id: &FlowId,
        _definition: &FlowDefinition,
    ) -> Result<CompleteFlowDefinition> {
        Err(Self::not_supported())
    }

    async fn delete_flow(&self, _flow_id: &FlowId) -> Result<()> {
        Err(Self::not_supported())
    }

    async fn list_flow_versions(&self, _flow_id: &FlowId) -> Result<Vec<BasicFlowVersion>> {
        Err(Self::not_supported())
    }

    async fn get_flow_version(
        &self,
        _flow_id: &FlowId,
        _version: i32,
    ) -> Result<FlowVersionRecord> {
        Err(Self::not_supported())
    }

    async fn restore_flow_version(
        &self,
        _flow_id: &FlowId,
        _version: i32,
    ) -> Result<CompleteFlowDefinition> {
        Err(Self::not_supported())
    }

    async fn is_flow_exists(&self, flow_id: &FlowId) -> Result<bool> {
        Ok(self.flows()?.contains_key(&flow_id.to_string()))
    }

    async fn is_flow_exists_by_handle(&self, handle: &str, flow_type: FlowType) -> Result<bool> {
        let flows = self.flows()?;
        Ok(flows
            .values()
            .any(|f| f.handle.as_str() == handle && f.flow_type == flow_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_flow(dir: &Path, file: &str, handle: &str, flow_type: &str, created_at: &str) {
        let yaml = format!(
            r#"
handle: {handle}
name: Flow {handle}
flow_type: {flow_type}
created_at: "{created_at}"
nodes:
  - id: start
    type: START
    on_success: login
  - id: login
    type: PROMPT
    on_success: end
  - id: end
    type: END
"#
        );
        fs::write(dir.join(file), yaml).unwrap();
    }

    #[tokio::test]
    async fn test_load_and_read() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path(), "a.yaml", "basic-auth", "authentication", "2025-03-01T10:00:00Z");
        write_flow(dir.path(), "b.yml", "self-signup", "registration", "2025-03-02T10:00:00Z");
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = FileFlowRepository::load(dir.path()).unwrap();
        let (flows, total) = store.list_flows(30, 0, None).await.unwrap();
        assert_eq!(total, 2);
        // Newest first.
        assert_eq!(flows[0].handle.as_str(), "self-signup");

        let flow = store
            .get_flow_by_handle("basic-auth", FlowType::Authentication)
            .await
            .unwrap();
        assert_eq!(flow.nodes.len(), 3);
        assert!(store.is_flow_exists(&flow.id).await.unwrap());
        assert_eq!(store.get_flow_by_id(&flow.id).await.unwrap(), flow);
    }

    #[tokio::test]
    async fn test_type_filter_and_pagination() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path(), "a.yaml", "f-a", "authentication", "2025-03-01T10:00:00Z");
        write_flow(dir.path(), "b.yaml", "f-b", "authentication", "2025-03-02T10:00:00Z");
        write_flow(dir.path(), "c.yaml", "f-c", "registration", "2025-03-03T10:00:00Z");

        let store = FileFlowRepository::load(dir.path()).unwrap();

        let (flows, total) = store
            .list_flows(30, 0, Some(FlowType::Authentication))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(flows.len(), 2);

        let (page, total) = store.list_flows(1, 1, None).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].handle.as_str(), "f-b");
    }

    #[tokio::test]
    async fn test_corrupt_and_invalid_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path(), "good.yaml", "basic-auth", "authentication", "2025-03-01T10:00:00Z");
        fs::write(dir.path().join("corrupt.yaml"), ":: not yaml {{{").unwrap();
        // Too few nodes to be a usable flow.
        fs::write(
            dir.path().join("short.yaml"),
            "handle: tiny\nname: Tiny\nflow_type: authentication\nnodes:\n  - id: start\n    type: START\n",
        )
        .unwrap();

        let store = FileFlowRepository::load(dir.path()).unwrap();
        let (_, total) = store.list_flows(30, 0, None).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_mutations_not_supported() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path(), "a.yaml", "basic-auth", "authentication", "2025-03-01T10:00:00Z");
        let store = FileFlowRepository::load(dir.path()).unwrap();
        let flow = store
            .get_flow_by_handle("basic-auth", FlowType::Authentication)
            .await
            .unwrap();

        let definition = flow.to_definition();
        assert!(matches!(
            store.create_flow(FlowId::new(), &definition).await,
            Err(FlowMgtError::NotSupported(_))
        ));
        assert!(matches!(
            store.update_flow(&flow.id, &definition).await,
            Err(FlowMgtError::NotSupported(_))
        ));
        assert!(matches!(
            store.delete_flow(&flow.id).await,
            Err(FlowMgtError::NotSupported(_))
        ));
        assert!(matches!(
            store.list_flow_versions(&flow.id).await,
            Err(FlowMgtError::NotSupported(_))
        ));
        assert!(matches!(
            store.restore_flow_version(&flow.id, 1).await,
            Err(FlowMgtError::NotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_handles_keep_first() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path(), "a.yaml", "basic-auth", "authentication", "2025-03-01T10:00:00Z");
        write_flow(dir.path(), "b.yaml", "basic-auth", "authentication", "2025-03-02T10:00:00Z");

        let store = FileFlowRepository::load(dir.path()).unwrap();
        let (_, total) = store.list_flows(30, 0, None).await.unwrap();
        assert_eq!(total, 1);
    }
}
