use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use transaction_service::api::http_routes::{routes, AppState, BalanceRequest, BalanceResponse, MutationRequest, MutationResponse};
use transaction_service::api::response::ApiResponse;
use transaction_service::infrastructure::gateways::grpc_wallet_gateway::GrpcReplicationClient;
use transaction_service::services::failover_monitor::FailoverMonitor;
use transaction_service::use_cases::replicated_writer::ReplicatedWriter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use wallet_service::domain::engine::LedgerEngine;

#[derive(OpenApi)]
#[openapi(
    paths(
        transaction_service::api::http_routes::deposit,
        transaction_service::api::http_routes::withdraw,
        transaction_service::api::http_routes::get_balance,
        transaction_service::api::http_routes::health
    ),
    components(schemas(
        MutationRequest,
        MutationResponse,
        BalanceRequest,
        BalanceResponse,
        ApiResponse<serde_json::Value>
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder().with_max_level(tracing::Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting primary replica...");

    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data/primary".to_string());
    let data_dir = PathBuf::from(data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let local_engine = Arc::new(LedgerEngine::load(data_dir.join("wallets.json"), data_dir.join("transactions.json")).await?);

    let backup_host = env::var("BACKUP_GRPC_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let backup_port = env::var("BACKUP_GRPC_PORT").unwrap_or_else(|_| "50052".to_string());
    let backup_addr = format!("http://{backup_host}:{backup_port}");

    let replication_client = Arc::new(GrpcReplicationClient::connect(backup_addr.clone()).await?);
    let failover = Arc::new(FailoverMonitor::new(backup_addr));

    let monitor = failover.clone();
    tokio::spawn(async move {
        monitor.run().await;
    });

    let writer = Arc::new(ReplicatedWriter::new(local_engine, replication_client, failover));
    let app_state = Arc::new(AppState { writer });

    let app = routes(app_state).merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let http_host = env::var("HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let http_port = env::var("HTTP_PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("{http_host}:{http_port}");

    info!(%addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
