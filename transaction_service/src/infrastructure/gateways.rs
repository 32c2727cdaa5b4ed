pub mod grpc_wallet_gateway;
