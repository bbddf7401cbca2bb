pub mod flow_dto;

pub use flow_dto::*;
