use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::services::{Graph, GraphCache};
use crate::error::Result;

/// Process-wide cache of compiled graphs keyed by flow id.
#[derive(Debug, Default)]
pub struct InMemoryGraphCache {
    graphs: DashMap<String, Arc<Graph>>,
}

impl InMemoryGraphCache {
    pub fn new() -> Self {
        InMemoryGraphCache {
            graphs: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl GraphCache for InMemoryGraphCache {
    fn get(&self, flow_id: &str) -> Result<Option<Arc<Graph>>> {
        Ok(self.graphs.get(flow_id).map(|g| g.clone()))
    }

    fn set(&self, flow_id: &str, graph: Arc<Graph>) -> Result<()> {
        self.graphs.insert(flow_id.to_string(), graph);
        Ok(())
    }

    fn invalidate(&self, flow_id: &str) -> Result<()> {
        self.graphs.remove(flow_id);
        Ok(())
    }
}
