use std::sync::Arc;

use common::{AccountId, BalanceOutcome, TransactionId, TransactionOutcome};
use rust_decimal::Decimal;
use tracing::warn;
use wallet_service::domain::engine::LedgerEngine;

use crate::domain::gateways::ReplicationGateway;
use crate::services::failover_monitor::FailoverMonitor;

/// El protocolo de escritura del lado primario. Sostiene un Replication
/// Client, un Ledger Engine local, y una referencia al Failover Monitor.
///
/// El orden "backup primero" es todo el punto: si el backup rechaza o está
/// inalcanzable, el primario nunca se muta, así que la única ventana de
/// divergencia es "el backup aceptó, el primario luego falló" — segura
/// bajo un reintento idempotente.
///
/// # Examples
/// ```ignore
/// use transaction_service::use_cases::replicated_writer::ReplicatedWriter;
///
/// let writer = ReplicatedWriter::new(local_engine, replication_client, failover_monitor);
/// let outcome = writer.deposit(account_id, amount, transaction_id).await;
/// ```
pub struct ReplicatedWriter {
    local_engine: Arc<LedgerEngine>,
    replication: Arc<dyn ReplicationGateway>,
    failover: Arc<FailoverMonitor>,
}

impl ReplicatedWriter {
    /// Construye el writer a partir de sus tres colaboradores inyectados.
    pub fn new(local_engine: Arc<LedgerEngine>, replication: Arc<dyn ReplicationGateway>, failover: Arc<FailoverMonitor>) -> Self {
        Self { local_engine, replication, failover }
    }

    /// Replica el depósito al backup antes de aplicarlo localmente.
    pub async fn deposit(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> TransactionOutcome {
        if let Some(rejection) = self.replicate(self.replication.deposit(account_id.clone(), amount, transaction_id.clone())).await {
            return rejection;
        }
        self.local_engine.deposit(account_id, amount, transaction_id).await
    }

    /// Replica el retiro al backup antes de aplicarlo localmente.
    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> TransactionOutcome {
        if let Some(rejection) = self.replicate(self.replication.withdraw(account_id.clone(), amount, transaction_id.clone())).await {
            return rejection;
        }
        self.local_engine.withdraw(account_id, amount, transaction_id).await
    }

    /// Protocolo de lectura: se sirve directamente desde el motor local, sin llamada al backup.
    pub async fn get_balance(&self, account_id: &AccountId) -> BalanceOutcome {
        self.local_engine.get_balance(account_id).await
    }

    /// Ejecuta los pasos del protocolo de escritura que involucran al
    /// backup. Devuelve `Some(outcome)` cuando el primario NO debe proceder
    /// a su propio ledger (el backup rechazó la transacción, o la llamada
    /// falló); `None` significa que el modo failover se saltó el backup por
    /// completo, o que el backup aceptó, y el llamador debe continuar
    /// mutando el motor local.
    async fn replicate(&self, call: impl std::future::Future<Output = Result<TransactionOutcome, crate::domain::error::WriteError>>) -> Option<TransactionOutcome> {
        if self.failover.failover_mode() {
            return None;
        }

        match call.await {
            Ok(outcome) if !outcome.success => {
                warn!(message = %outcome.message, "backup rejected the transaction");
                Some(TransactionOutcome::new(false, format!("Backup error: {}", outcome.message), Decimal::ZERO))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "backup replication call failed");
                Some(TransactionOutcome::new(false, format!("Backup error: {e}"), Decimal::ZERO))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::WriteError;
    use async_trait::async_trait;
    use mockall::mock;
    use tempfile::tempdir;

    mock! {
        pub ReplicationGatewayImpl {}

        #[async_trait]
        impl ReplicationGateway for ReplicationGatewayImpl {
            async fn deposit(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> Result<TransactionOutcome, WriteError>;
            async fn withdraw(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> Result<TransactionOutcome, WriteError>;
            async fn get_balance(&self, account_id: &AccountId) -> Result<BalanceOutcome, WriteError>;
        }
    }

    async fn local_engine() -> (tempfile::TempDir, Arc<LedgerEngine>) {
        let dir = tempdir().unwrap();
        let engine = LedgerEngine::load(dir.path().join("wallets.json"), dir.path().join("transactions.json"))
            .await
            .unwrap();
        (dir, Arc::new(engine))
    }

    #[tokio::test]
    async fn backup_rejection_leaves_primary_untouched() {
        let (_dir, engine) = local_engine().await;

        let mut gateway = MockReplicationGatewayImpl::new();
        gateway
            .expect_deposit()
            .times(1)
            .returning(|_, _, _| Ok(TransactionOutcome::new(false, "Insufficient balance", Decimal::ZERO)));

        let failover = Arc::new(FailoverMonitor::new("http://127.0.0.1:1"));
        let writer = ReplicatedWriter::new(engine.clone(), Arc::new(gateway), failover);

        let outcome = writer
            .deposit(AccountId::new("alice"), Decimal::new(1000, 2), TransactionId::new("t1"))
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Backup error:"));

        let balance = engine.get_balance(&AccountId::new("alice")).await;
        assert_eq!(balance.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn backup_success_applies_to_local_engine() {
        let (_dir, engine) = local_engine().await;

        let mut gateway = MockReplicationGatewayImpl::new();
        gateway
            .expect_deposit()
            .times(1)
            .returning(|_, _, _| Ok(TransactionOutcome::new(true, "Deposited", Decimal::new(1000, 2))));

        let failover = Arc::new(FailoverMonitor::new("http://127.0.0.1:1"));
        let writer = ReplicatedWriter::new(engine.clone(), Arc::new(gateway), failover);

        let outcome = writer
            .deposit(AccountId::new("alice"), Decimal::new(1000, 2), TransactionId::new("t2"))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.new_balance, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn failover_mode_skips_the_backup_call_entirely() {
        let (_dir, engine) = local_engine().await;

        let mut gateway = MockReplicationGatewayImpl::new();
        gateway.expect_deposit().times(0);

        let failover = FailoverMonitor::new("http://127.0.0.1:1");
        failover.probe_once().await; // unreachable backup flips failover_mode on
        let failover = Arc::new(failover);

        let writer = ReplicatedWriter::new(engine, Arc::new(gateway), failover);
        let outcome = writer
            .deposit(AccountId::new("bob"), Decimal::new(500, 2), TransactionId::new("t3"))
            .await;

        assert!(outcome.success);
    }
}
