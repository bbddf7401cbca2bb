use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::domain::repositories::FlowRepository;
use crate::error::{FlowMgtError, Result};
use crate::infrastructure::resources::FlowResource;

const EXPORT_PAGE_SIZE: u64 = 100;

/// Feeds flow definitions to the deployment's resource-export pipeline
/// as YAML documents.
pub struct FlowResourceExporter {
    store: Arc<dyn FlowRepository>,
}

impl FlowResourceExporter {
    pub fn new(store: Arc<dyn FlowRepository>) -> Self {
        Self { store }
    }

    /// Walk every flow in the store and render it as a resource.
    pub async fn export_all(&self) -> Result<Vec<FlowResource>> {
        let mut resources = Vec::new();
        let mut offset = 0u64;
        loop {
            let (page, total) = self.store.list_flows(EXPORT_PAGE_SIZE, offset, None).await?;
            if page.is_empty() {
                break;
            }
            offset += page.len() as u64;
            for basic in page {
                let complete = self.store.get_flow_by_id(&basic.id).await?;
                resources.push(FlowResource::from_complete(&complete));
            }
            if offset >= total {
                break;
            }
        }
        Ok(resources)
    }

    /// Write one `{handle}_{flow_type}.yaml` document per flow. Returns
    /// the number of files written.
    pub async fn export_to_dir(&self, dir: &Path) -> Result<usize> {
        fs::create_dir_all(dir).map_err(|e| {
            FlowMgtError::InternalError(format!(
                "cannot create export directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let resources = self.export_all().await?;
        for resource in &resources {
            let file = dir.join(format!("{}_{}.yaml", resource.handle, resource.flow_type));
            fs::write(&file, resource.to_yaml()?).map_err(|e| {
                FlowMgtError::InternalError(format!("cannot write {}: {}", file.display(), e))
            })?;
        }
        Ok(resources.len())
    }
}
