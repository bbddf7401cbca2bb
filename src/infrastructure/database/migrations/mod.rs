pub mod m20250301_000001_create_flows;
pub mod m20250301_000002_create_flow_versions;
