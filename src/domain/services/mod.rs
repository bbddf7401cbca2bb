pub mod flow_validation;
pub mod executor_registry;
pub mod graph;
pub mod graph_builder;
pub mod registration_inference;

pub use executor_registry::ExecutorRegistry;
pub use graph::{Graph, GraphEdge, RuntimeNode};
pub use graph_builder::{GraphBuilder, GraphCache};
