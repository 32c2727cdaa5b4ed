use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use wallet_service::api::grpc_service::WalletGrpcService;
use wallet_service::api::proto::wallet_backup_server::WalletBackupServer;
use wallet_service::domain::engine::LedgerEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder().with_max_level(tracing::Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting backup replica...");

    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data/backup".to_string());
    let data_dir = PathBuf::from(data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let engine = Arc::new(LedgerEngine::load(data_dir.join("wallets.json"), data_dir.join("transactions.json")).await?);

    let host = env::var("BACKUP_GRPC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("BACKUP_GRPC_PORT").unwrap_or_else(|_| "50052".to_string());
    let addr = format!("{host}:{port}").parse()?;

    let service = WalletGrpcService::new(engine);

    info!(%addr, "backup gRPC server listening");
    tonic::transport::Server::builder()
        .add_service(WalletBackupServer::new(service))
        .serve(addr)
        .await?;

    Ok(())
}
