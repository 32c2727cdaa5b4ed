use std::collections::hash_map::Entry;
use std::path::PathBuf;

use common::{AccountId, BalanceOutcome, Operation, TransactionId, TransactionOutcome};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::entities::TransactionRecord;
use crate::domain::error::LedgerError;
use crate::infrastructure::persistence::transaction_log::TransactionLog;
use crate::infrastructure::persistence::wallet_store::WalletStore;

/// El mapa de cuentas en memoria junto con su Write-Ahead Log. Puro — no
/// sabe nada de replicación, failover, ni HTTP; solo garantiza que el saldo
/// nunca sea negativo, que una repetición con el mismo identificador sea
/// idempotente, que el WAL se escriba en el orden correcto, y que una
/// transacción interrumpida a mitad de camino nunca se vuelva a aplicar.
///
/// Todos los puntos de entrada mutantes toman el mismo candado
/// `Mutex<Inner>` durante toda su ejecución, dando la sección crítica por
/// motor que se necesita: desde la verificación de idempotencia hasta la
/// escritura final del log, ninguna otra llamada mutante sobre este motor
/// puede intercalarse.
///
/// # Examples
/// ```ignore
/// use wallet_service::domain::engine::LedgerEngine;
/// use common::{AccountId, TransactionId};
/// use rust_decimal::Decimal;
///
/// let engine = LedgerEngine::load("wallets.json", "transactions.json").await?;
/// let outcome = engine
///     .deposit(AccountId::new("alice"), Decimal::new(10000, 2), TransactionId::new("t1"))
///     .await;
/// assert!(outcome.success);
/// ```
pub struct LedgerEngine {
    inner: Mutex<Inner>,
}

struct Inner {
    wallets: WalletStore,
    log: TransactionLog,
    /// Se activa en cuanto falla una escritura del Transaction Log: el motor
    /// ha perdido la capacidad de registrar idempotencia y debe rechazar
    /// nuevas escrituras hasta reiniciar.
    poisoned: bool,
}

impl LedgerEngine {
    /// Carga ambos archivos de datos (creándolos vacíos si no existen) y
    /// ejecuta la recuperación de arranque.
    pub async fn load(wallets_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let wallets = WalletStore::load(wallets_path)?;
        let mut log = TransactionLog::load(log_path)?;
        let recovered = recover(&mut log)?;
        if recovered > 0 {
            warn!(recovered, "recovered pending transactions into ROLLED_BACK on startup");
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                wallets,
                log,
                poisoned: false,
            }),
        })
    }

    /// Ejecuta un depósito, idempotente por `transaction_id`.
    ///
    /// # Argumentos
    ///
    /// * `account_id` - Cuenta destino; se crea implícitamente con saldo cero si no existe.
    /// * `amount` - Monto a depositar; debe ser positivo o la operación se rechaza.
    /// * `transaction_id` - Clave de idempotencia provista por el cliente.
    pub async fn deposit(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> TransactionOutcome {
        let mut state = self.inner.lock().await;

        if state.poisoned {
            return poisoned_outcome();
        }

        if let Some(cached) = state.log.get(&transaction_id).and_then(|r| r.cached_outcome()) {
            return cached.clone();
        }

        if amount <= Decimal::ZERO {
            let outcome = TransactionOutcome::new(false, "Amount must be positive", Decimal::ZERO);
            if let Err(e) = state.log.write(
                transaction_id.clone(),
                TransactionRecord::committed(Operation::Deposit, account_id, amount, outcome.clone()),
            ) {
                state.poisoned = true;
                warn!(error = %e, %transaction_id, "failed to persist validation-rejection record, poisoning engine");
            }
            return outcome;
        }

        if let Err(e) = state.log.write(
            transaction_id.clone(),
            TransactionRecord::pending(Operation::Deposit, account_id.clone(), amount),
        ) {
            state.poisoned = true;
            warn!(error = %e, %transaction_id, "failed to persist PENDING record, poisoning engine");
            return poisoned_outcome();
        }

        match apply_deposit(&mut state.wallets, &account_id, amount) {
            Ok(new_balance) => {
                let outcome = TransactionOutcome::new(true, format!("Deposited {amount}"), new_balance);
                if let Err(e) = state.log.write(
                    transaction_id.clone(),
                    TransactionRecord::committed(Operation::Deposit, account_id.clone(), amount, outcome.clone()),
                ) {
                    state.poisoned = true;
                    warn!(error = %e, %transaction_id, "failed to persist COMMITTED record, poisoning engine");
                }
                info!(%transaction_id, %account_id, %amount, "deposit committed");
                outcome
            }
            Err(e) => rollback(&mut state, &transaction_id, "Deposit", e),
        }
    }

    /// Ejecuta un retiro, idempotente por `transaction_id`.
    ///
    /// # Argumentos
    ///
    /// * `account_id` - Cuenta origen.
    /// * `amount` - Monto a retirar; debe ser positivo y no exceder el saldo actual.
    /// * `transaction_id` - Clave de idempotencia provista por el cliente.
    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal, transaction_id: TransactionId) -> TransactionOutcome {
        let mut state = self.inner.lock().await;

        if state.poisoned {
            return poisoned_outcome();
        }

        if let Some(cached) = state.log.get(&transaction_id).and_then(|r| r.cached_outcome()) {
            return cached.clone();
        }

        if amount <= Decimal::ZERO {
            let outcome = TransactionOutcome::new(false, "Amount must be positive", Decimal::ZERO);
            if let Err(e) = state.log.write(
                transaction_id.clone(),
                TransactionRecord::committed(Operation::Withdraw, account_id, amount, outcome.clone()),
            ) {
                state.poisoned = true;
                warn!(error = %e, %transaction_id, "failed to persist validation-rejection record, poisoning engine");
            }
            return outcome;
        }

        // El rechazo por saldo insuficiente no toca el balance, así que se
        // verifica — y se confirma directamente — antes de escribir el
        // registro PENDING.
        let current_balance = *state.wallets.balances().get(&account_id).unwrap_or(&Decimal::ZERO);
        if current_balance < amount {
            let outcome = TransactionOutcome::new(false, "Insufficient balance", current_balance);
            if let Err(e) = state.log.write(
                transaction_id.clone(),
                TransactionRecord::committed(Operation::Withdraw, account_id, amount, outcome.clone()),
            ) {
                state.poisoned = true;
                warn!(error = %e, %transaction_id, "failed to persist rejection record, poisoning engine");
            }
            return outcome;
        }

        if let Err(e) = state.log.write(
            transaction_id.clone(),
            TransactionRecord::pending(Operation::Withdraw, account_id.clone(), amount),
        ) {
            state.poisoned = true;
            warn!(error = %e, %transaction_id, "failed to persist PENDING record, poisoning engine");
            return poisoned_outcome();
        }

        match apply_withdraw(&mut state.wallets, &account_id, amount) {
            Ok(new_balance) => {
                let outcome = TransactionOutcome::new(true, format!("Withdrew {amount}"), new_balance);
                if let Err(e) = state.log.write(
                    transaction_id.clone(),
                    TransactionRecord::committed(Operation::Withdraw, account_id.clone(), amount, outcome.clone()),
                ) {
                    state.poisoned = true;
                    warn!(error = %e, %transaction_id, "failed to persist COMMITTED record, poisoning engine");
                }
                info!(%transaction_id, %account_id, %amount, "withdraw committed");
                outcome
            }
            Err(e) => rollback(&mut state, &transaction_id, "Withdraw", e),
        }
    }

    /// Solo lectura. Crea implícitamente una cuenta desconocida con saldo
    /// cero y persiste el Wallet Store únicamente cuando esa creación
    /// ocurrió — una lectura sobre una cuenta ya existente no vuelve a
    /// escribir el archivo. Nunca toca el Transaction Log.
    pub async fn get_balance(&self, account_id: &AccountId) -> BalanceOutcome {
        let mut state = self.inner.lock().await;

        let balance = match state.wallets.balances_mut().entry(account_id.clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let balance = *entry.insert(Decimal::ZERO);
                if let Err(e) = state.wallets.save() {
                    warn!(error = %e, %account_id, "failed to persist wallet store after implicit account creation");
                }
                balance
            }
        };

        BalanceOutcome::new(true, balance, "Balance retrieved")
    }
}

fn apply_deposit(wallets: &mut WalletStore, account_id: &AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
    let balance = wallets.balances_mut().entry(account_id.clone()).or_insert(Decimal::ZERO);
    *balance += amount;
    let new_balance = *balance;
    wallets.save()?;
    Ok(new_balance)
}

fn apply_withdraw(wallets: &mut WalletStore, account_id: &AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
    let balance = wallets.balances_mut().entry(account_id.clone()).or_insert(Decimal::ZERO);
    *balance -= amount;
    let new_balance = *balance;
    wallets.save()?;
    Ok(new_balance)
}

fn rollback(state: &mut Inner, transaction_id: &TransactionId, op_label: &str, cause: LedgerError) -> TransactionOutcome {
    warn!(error = %cause, %transaction_id, "{op_label} mutation failed, rolling back");
    if let Err(e) = state.log.mark_rolled_back(transaction_id) {
        state.poisoned = true;
        warn!(error = %e, %transaction_id, "failed to persist ROLLED_BACK record, poisoning engine");
    }
    TransactionOutcome::new(false, format!("{op_label} failed: {cause}"), Decimal::ZERO)
}

fn poisoned_outcome() -> TransactionOutcome {
    TransactionOutcome::new(
        false,
        "Ledger engine unavailable: transaction log persistence failed",
        Decimal::ZERO,
    )
}

/// Recuperación de arranque: cualquier registro que siga en `Pending`
/// significa que la escritura del Wallet Store nunca ocurrió o no puede
/// verificarse como durable. Descartarlo es seguro — un reintento con el
/// mismo identificador no encontrará registro `Committed` y simplemente se
/// reprocesará.
fn recover(log: &mut TransactionLog) -> Result<usize, LedgerError> {
    let pending_ids: Vec<TransactionId> = log
        .records()
        .filter(|(_, record)| matches!(record.status, common::TransactionStatus::Pending))
        .map(|(id, _)| id.clone())
        .collect();

    for id in &pending_ids {
        log.mark_rolled_back(id)?;
    }

    Ok(pending_ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn paths() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        let wallets = dir.path().join("wallets.json");
        let log = dir.path().join("transactions.json");
        (dir, wallets, log)
    }

    #[tokio::test]
    async fn deposit_then_replay_is_idempotent() {
        let (_dir, wallets, log) = paths();
        let engine = LedgerEngine::load(wallets, log).await.unwrap();

        let tx = TransactionId::new("t1");
        let first = engine
            .deposit(AccountId::new("alice"), Decimal::new(10000, 2), tx.clone())
            .await;
        assert!(first.success);
        assert_eq!(first.new_balance, Decimal::new(10000, 2));

        let second = engine
            .deposit(AccountId::new("alice"), Decimal::new(10000, 2), tx)
            .await;
        assert_eq!(first, second);

        let balance = engine.get_balance(&AccountId::new("alice")).await;
        assert_eq!(balance.balance, Decimal::new(10000, 2));
    }

    #[tokio::test]
    async fn negative_amount_is_rejected_and_cached() {
        let (_dir, wallets, log) = paths();
        let engine = LedgerEngine::load(wallets, log).await.unwrap();

        let tx = TransactionId::new("t4");
        let first = engine.deposit(AccountId::new("alice"), Decimal::new(-500, 2), tx.clone()).await;
        assert!(!first.success);
        assert_eq!(first.message, "Amount must be positive");

        let second = engine.deposit(AccountId::new("alice"), Decimal::new(-500, 2), tx).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn insufficient_funds_rejection_is_cached_even_after_deposit() {
        let (_dir, wallets, log) = paths();
        let engine = LedgerEngine::load(wallets, log).await.unwrap();

        let t2 = TransactionId::new("t2");
        let rejected = engine.withdraw(AccountId::new("bob"), Decimal::new(5000, 2), t2.clone()).await;
        assert!(!rejected.success);
        assert_eq!(rejected.message, "Insufficient balance");

        engine
            .deposit(AccountId::new("bob"), Decimal::new(20000, 2), TransactionId::new("t3"))
            .await;

        let retried = engine.withdraw(AccountId::new("bob"), Decimal::new(5000, 2), t2).await;
        assert_eq!(rejected, retried);
    }

    #[tokio::test]
    async fn recovery_discards_pending_and_allows_replay() {
        let (_dir, wallets, log) = paths();

        {
            let mut state = TransactionLog::load(&log).unwrap();
            state
                .write(
                    TransactionId::new("t5"),
                    TransactionRecord::pending(Operation::Deposit, AccountId::new("alice"), Decimal::new(1000, 2)),
                )
                .unwrap();
        }

        let engine = LedgerEngine::load(&wallets, &log).await.unwrap();
        let balance = engine.get_balance(&AccountId::new("alice")).await;
        assert_eq!(balance.balance, Decimal::ZERO);

        let retried = engine
            .deposit(AccountId::new("alice"), Decimal::new(1000, 2), TransactionId::new("t5"))
            .await;
        assert!(retried.success);
        assert_eq!(retried.new_balance, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn balance_never_goes_negative() {
        let (_dir, wallets, log) = paths();
        let engine = LedgerEngine::load(wallets, log).await.unwrap();

        engine
            .deposit(AccountId::new("carol"), Decimal::new(1000, 2), TransactionId::new("d1"))
            .await;
        let over = engine
            .withdraw(AccountId::new("carol"), Decimal::new(5000, 2), TransactionId::new("w1"))
            .await;
        assert!(!over.success);

        let balance = engine.get_balance(&AccountId::new("carol")).await;
        assert!(balance.balance >= Decimal::ZERO);
    }

    #[tokio::test]
    async fn get_balance_only_persists_on_implicit_creation() {
        let (_dir, wallets, log) = paths();
        let engine = LedgerEngine::load(&wallets, &log).await.unwrap();

        engine.get_balance(&AccountId::new("dana")).await;
        let created_mtime = std::fs::metadata(&wallets).unwrap().modified().unwrap();

        engine.get_balance(&AccountId::new("dana")).await;
        let unchanged_mtime = std::fs::metadata(&wallets).unwrap().modified().unwrap();

        assert_eq!(created_mtime, unchanged_mtime);
    }
}
