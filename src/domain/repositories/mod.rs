pub mod flow_repository;

pub use flow_repository::*;
