pub mod flow_repository_impl;
pub mod cached_flow_repository;

#[cfg(test)]
pub mod flow_repository_test;

pub use flow_repository_impl::DbFlowRepository;
pub use cached_flow_repository::CachedFlowRepository;
