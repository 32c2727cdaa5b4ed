pub mod grpc_service;
pub mod proto;
