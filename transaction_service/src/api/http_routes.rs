use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{AccountId, TransactionId, TransactionOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::use_cases::replicated_writer::ReplicatedWriter;

// Frontera HTTP. Cada handler mutante asigna un `transaction_id` cuando el
// cliente no lo proporciona, y luego reenvía directo al Replicated Writer
// — aquí no vive más lógica de negocio que eso y la clasificación de
// códigos de estado.
pub struct AppState {
    pub writer: Arc<ReplicatedWriter>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/balance", post(get_balance))
        .route("/health", get(health))
        .with_state(state) // Inyectamos el estado (writer replicado)
}

#[derive(Deserialize, ToSchema)]
pub struct MutationRequest {
    pub account_id: String,
    pub amount: Decimal,
    /// Clave de idempotencia. Si se omite, el adaptador genera una y la
    /// reporta en la respuesta para que el cliente pueda reintentar con ella.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MutationResponse {
    pub transaction_id: String,
    pub success: bool,
    pub message: String,
    pub new_balance: Decimal,
}

impl MutationResponse {
    fn new(transaction_id: TransactionId, outcome: TransactionOutcome) -> Self {
        Self {
            transaction_id: transaction_id.as_str().to_string(),
            success: outcome.success,
            message: outcome.message,
            new_balance: outcome.new_balance,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct BalanceRequest {
    pub account_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    pub account_id: String,
    pub success: bool,
    pub balance: Decimal,
    pub message: String,
}

fn resolve_transaction_id(supplied: Option<String>) -> TransactionId {
    supplied.map(TransactionId::new).unwrap_or_else(|| TransactionId::new(Uuid::new_v4().to_string()))
}

// Clasifica un resultado del ledger en un código HTTP: los rechazos de
// validación o de replicación son 400, los fallos de persistencia (el
// motor revirtió) son 500, el éxito es 200.
fn response_status(outcome: &TransactionOutcome) -> StatusCode {
    if outcome.success {
        return StatusCode::OK;
    }
    if outcome.message.starts_with("Deposit failed:") || outcome.message.starts_with("Withdraw failed:") {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::BAD_REQUEST
}

// Handler: Iniciar un depósito
// POST /deposit
#[utoipa::path(
    post,
    path = "/deposit",
    request_body = MutationRequest,
    responses(
        (status = 200, description = "Deposit committed", body = ApiResponse<MutationResponse>),
        (status = 400, description = "Validation or replication rejection"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn deposit(State(state): State<Arc<AppState>>, Json(payload): Json<MutationRequest>) -> impl IntoResponse {
    let transaction_id = resolve_transaction_id(payload.transaction_id);
    let outcome = state
        .writer
        .deposit(AccountId::new(payload.account_id), payload.amount, transaction_id.clone())
        .await;

    let status = response_status(&outcome);
    (status, Json(ApiResponse::success(MutationResponse::new(transaction_id, outcome)))).into_response()
}

// Handler: Iniciar un retiro
// POST /withdraw
#[utoipa::path(
    post,
    path = "/withdraw",
    request_body = MutationRequest,
    responses(
        (status = 200, description = "Withdrawal committed", body = ApiResponse<MutationResponse>),
        (status = 400, description = "Validation or replication rejection"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn withdraw(State(state): State<Arc<AppState>>, Json(payload): Json<MutationRequest>) -> impl IntoResponse {
    let transaction_id = resolve_transaction_id(payload.transaction_id);
    let outcome = state
        .writer
        .withdraw(AccountId::new(payload.account_id), payload.amount, transaction_id.clone())
        .await;

    let status = response_status(&outcome);
    (status, Json(ApiResponse::success(MutationResponse::new(transaction_id, outcome)))).into_response()
}

// Handler: Consultar saldo
// POST /balance
// Nota: lee directo del ledger propio del primario; nunca llama al backup.
#[utoipa::path(
    post,
    path = "/balance",
    request_body = BalanceRequest,
    responses((status = 200, description = "Balance retrieved", body = ApiResponse<BalanceResponse>))
)]
pub async fn get_balance(State(state): State<Arc<AppState>>, Json(payload): Json<BalanceRequest>) -> impl axum::response::IntoResponse {
    let outcome = state.writer.get_balance(&AccountId::new(payload.account_id.clone())).await;
    Json(ApiResponse::success(BalanceResponse {
        account_id: payload.account_id,
        success: outcome.success,
        balance: outcome.balance,
        message: outcome.message,
    }))
}

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> impl axum::response::IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, "", StatusCode::OK)]
    #[case(false, "Insufficient funds", StatusCode::BAD_REQUEST)]
    #[case(false, "Backup error: unreachable", StatusCode::BAD_REQUEST)]
    #[case(false, "Deposit failed: disk full", StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(false, "Withdraw failed: disk full", StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_outcomes_to_the_right_status_code(#[case] success: bool, #[case] message: &str, #[case] expected: StatusCode) {
        let outcome = TransactionOutcome::new(success, message.to_string(), Decimal::ZERO);
        assert_eq!(response_status(&outcome), expected);
    }

    #[test]
    fn a_missing_transaction_id_is_synthesized() {
        assert!(resolve_transaction_id(None).as_str().len() > 0);
    }

    #[test]
    fn a_supplied_transaction_id_is_kept_as_is() {
        assert_eq!(resolve_transaction_id(Some("abc-123".to_string())).as_str(), "abc-123");
    }
}
