use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Time-ordered flow identifier. New ids are UUIDv7 so creation order is
/// preserved in the textual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub Uuid);

impl FlowId {
    pub fn new() -> Self {
        FlowId(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        FlowId(uuid)
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(FlowId(Uuid::parse_str(s)?))
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for FlowId {
    fn from(uuid: Uuid) -> Self {
        FlowId(uuid)
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
