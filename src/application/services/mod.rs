pub mod flow_mgt_service;


pub use flow_mgt_service::*;
