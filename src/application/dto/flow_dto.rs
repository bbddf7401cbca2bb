use serde::{Deserialize, Serialize};

use crate::domain::entities::BasicFlowDefinition;
use crate::domain::value_objects::NodeDefinition;

/// Flow definition as submitted over the wire; validated and typed by
/// the management service before anything touches storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinitionRequest {
    pub handle: String,
    pub name: String,
    pub flow_type: String,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// Paginated flow listing with hypermedia navigation links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowListResponse {
    pub total_results: u64,
    pub start_index: u64,
    pub count: u64,
    pub flows: Vec<BasicFlowDefinition>,
    pub links: Vec<Link>,
}

/// first/prev/next/last links for a page. `limit` must be positive.
pub fn build_pagination_links(offset: u64, limit: u64, total: u64) -> Vec<Link> {
    let href = |offset: u64| format!("flows?offset={}&limit={}", offset, limit);
    let mut links = vec![Link {
        href: href(0),
        rel: "first".to_string(),
    }];

    if offset > 0 {
        links.push(Link {
            href: href(offset.saturating_sub(limit)),
            rel: "prev".to_string(),
        });
    }
    if offset + limit < total {
        links.push(Link {
            href: href(offset + limit),
            rel: "next".to_string(),
        });
    }

    let last_offset = if total > 0 {
        ((total - 1) / limit) * limit
    } else {
        0
    };
    links.push(Link {
        href: href(last_offset),
        rel: "last".to_string(),
    });

    links
}
