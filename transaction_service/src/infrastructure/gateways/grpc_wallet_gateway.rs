use std::time::Duration;

use async_trait::async_trait;
use common::{AccountId, BalanceOutcome, TransactionId, TransactionOutcome};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tonic::transport::Channel;
use tracing::{info, warn};

use crate::api::proto::wallet_backup_client::WalletBackupClient;
use crate::api::proto::{GetBalanceRequest, TransactionRequest};
use crate::domain::error::WriteError;
use crate::domain::gateways::ReplicationGateway;

const RPC_DEADLINE: Duration = Duration::from_secs(5);

/// La única conexión del primario hacia el backup. Se establece una vez al
/// arrancar; una conexión rota se manifiesta como fallos repetidos de
/// llamada para que el Failover Monitor los note, no algo que este cliente
/// intente reparar por sí mismo.
pub struct GrpcReplicationClient {
    addr: String,
    client: Mutex<WalletBackupClient<Channel>>,
}

impl GrpcReplicationClient {
    /// Construye el canal de forma perezosa: no ocurre I/O de red aquí, sin
    /// hacer que el arranque del propio primario dependa de que el backup
    /// ya esté arriba. La primera llamada RPC paga el costo de conexión, y
    /// los fallos a partir de ahí se manifiestan como errores de llamada
    /// ordinarios para que el Failover Monitor los note.
    pub async fn connect(addr: impl Into<String>) -> Result<Self, WriteError> {
        let addr = addr.into();
        let channel = tonic::transport::Endpoint::from_shared(addr.clone())
            .map_err(|source| WriteError::Connect { addr: addr.clone(), source })?
            .connect_lazy();

        info!(%addr, "backup replica channel configured");
        Ok(Self { addr, client: Mutex::new(WalletBackupClient::new(channel)) })
    }

    fn amount_to_wire(amount: Decimal) -> Result<f64, WriteError> {
        amount.to_f64().ok_or(WriteError::AmountOutOfRange)
    }

    fn balance_from_wire(balance: f64) -> Decimal {
        Decimal::from_f64(balance).unwrap_or(Decimal::ZERO)
    }

    fn log_failure(&self, op: &str, error: &WriteError) {
        warn!(addr = %self.addr, op, %error, "backup replica call failed");
    }

    async fn call_with_deadline<F, T>(&self, op: &str, call: F) -> Result<T, WriteError>
    where
        F: std::future::Future<Output = Result<T, tonic::Status>>,
    {
        match tokio::time::timeout(RPC_DEADLINE, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(status)) => {
                let error = WriteError::from(status);
                self.log_failure(op, &error);
                Err(error)
            }
            Err(_) => {
                let error = WriteError::Timeout(RPC_DEADLINE);
                self.log_failure(op, &error);
                Err(error)
            }
        }
    }
}

#[async_trait]
impl ReplicationGateway for GrpcReplicationClient {
    async fn deposit(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> Result<TransactionOutcome, WriteError> {
        let request = tonic::Request::new(TransactionRequest {
            account_id: account_id.as_str().to_string(),
            amount: Self::amount_to_wire(amount)?,
            transaction_id: transaction_id.as_str().to_string(),
        });

        let response = self.call_with_deadline("deposit", self.client.lock().await.deposit(request)).await?;

        let inner = response.into_inner();
        Ok(TransactionOutcome::new(inner.success, inner.message, Self::balance_from_wire(inner.new_balance)))
    }

    async fn withdraw(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> Result<TransactionOutcome, WriteError> {
        let request = tonic::Request::new(TransactionRequest {
            account_id: account_id.as_str().to_string(),
            amount: Self::amount_to_wire(amount)?,
            transaction_id: transaction_id.as_str().to_string(),
        });

        let response = self.call_with_deadline("withdraw", self.client.lock().await.withdraw(request)).await?;

        let inner = response.into_inner();
        Ok(TransactionOutcome::new(inner.success, inner.message, Self::balance_from_wire(inner.new_balance)))
    }

    async fn get_balance(&self, account_id: &AccountId) -> Result<BalanceOutcome, WriteError> {
        let request = tonic::Request::new(GetBalanceRequest { account_id: account_id.as_str().to_string() });

        let response = self.call_with_deadline("get_balance", self.client.lock().await.get_balance(request)).await?;

        let inner = response.into_inner();
        Ok(BalanceOutcome::new(inner.success, Self::balance_from_wire(inner.balance), inner.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_does_not_require_the_backup_to_be_reachable() {
        // Construcción perezosa del canal: no hay I/O de red hasta la primera llamada.
        let result = GrpcReplicationClient::connect("http://127.0.0.1:1").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn call_against_an_unreachable_backup_times_out_or_errors() {
        let client = GrpcReplicationClient::connect("http://127.0.0.1:1").await.unwrap();
        let result = client.get_balance(&AccountId::new("alice")).await;
        assert!(result.is_err());
    }
}
