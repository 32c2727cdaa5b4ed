use async_trait::async_trait;
use common::{AccountId, BalanceOutcome, TransactionId, TransactionOutcome};
use rust_decimal::Decimal;

use crate::domain::error::WriteError;

/// La única vista que tiene el Replicated Writer del backup. Un stub de RPC
/// delgado — construye la solicitud, emite la llamada con un plazo de
/// 5 segundos, devuelve la terna de respuesta. Ante un fallo de transporte,
/// la llamada falla hacia arriba; el Replicated Writer decide la política.
#[async_trait]
pub trait ReplicationGateway: Send + Sync {
    async fn deposit(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> Result<TransactionOutcome, WriteError>;
    async fn withdraw(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> Result<TransactionOutcome, WriteError>;
    async fn get_balance(&self, account_id: &AccountId) -> Result<BalanceOutcome, WriteError>;
}
