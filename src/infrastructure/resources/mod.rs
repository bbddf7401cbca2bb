pub mod flow_resource;
pub mod file_flow_repository;
pub mod exporter;

pub use flow_resource::{FlowResource, NodeResource};
pub use file_flow_repository::FileFlowRepository;
pub use exporter::FlowResourceExporter;
