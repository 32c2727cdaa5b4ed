use common::{AccountId, Operation, TransactionOutcome, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Modelo de Entidad: TransactionRecord.
/// Representa una fila del Transaction Log. `outcome` solo es `Some` una
/// vez que `status` es `Committed` — un registro `Pending` aún no ha
/// terminado, y uno `RolledBack` ha descartado deliberadamente su efecto en
/// lugar de guardarlo en caché, así que ninguno de los dos transporta un
/// resultado repetible.
///
/// # Examples
/// ```
/// use wallet_service::domain::entities::TransactionRecord;
/// use common::{AccountId, Operation, TransactionOutcome};
/// use rust_decimal::Decimal;
///
/// let record = TransactionRecord::committed(
///     Operation::Deposit,
///     AccountId::new("alice"),
///     Decimal::new(10000, 2),
///     TransactionOutcome::new(true, "Deposited 100.00", Decimal::new(10000, 2)),
/// );
/// assert!(record.cached_outcome().is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub status: TransactionStatus,
    pub operation: Operation,
    pub account_id: AccountId,
    pub amount: rust_decimal::Decimal,
    pub outcome: Option<TransactionOutcome>,
}

impl TransactionRecord {
    /// Construye un registro recién creado en estado `Pending`, sin resultado aún.
    pub fn pending(operation: Operation, account_id: AccountId, amount: rust_decimal::Decimal) -> Self {
        Self {
            status: TransactionStatus::Pending,
            operation,
            account_id,
            amount,
            outcome: None,
        }
    }

    /// Construye un registro ya resuelto en estado `Committed`, con su resultado.
    pub fn committed(
        operation: Operation,
        account_id: AccountId,
        amount: rust_decimal::Decimal,
        outcome: TransactionOutcome,
    ) -> Self {
        Self {
            status: TransactionStatus::Committed,
            operation,
            account_id,
            amount,
            outcome: Some(outcome),
        }
    }

    /// Un registro solo es un acierto válido de caché de idempotencia una
    /// vez confirmado. Un registro todavía `Pending` (no debería ocurrir
    /// bajo el candado por motor) o `RolledBack` (descartado tras un fallo)
    /// debe tratarse como si el identificador nunca se hubiera visto, de
    /// modo que el llamador vuelva a ejecutar en lugar de repetir un
    /// resultado obsoleto.
    ///
    /// # Examples
    /// ```
    /// use wallet_service::domain::entities::TransactionRecord;
    /// use common::{AccountId, Operation};
    /// use rust_decimal::Decimal;
    ///
    /// let pending = TransactionRecord::pending(Operation::Deposit, AccountId::new("alice"), Decimal::new(1000, 2));
    /// assert!(pending.cached_outcome().is_none());
    /// ```
    pub fn cached_outcome(&self) -> Option<&TransactionOutcome> {
        match self.status {
            TransactionStatus::Committed => self.outcome.as_ref(),
            TransactionStatus::Pending | TransactionStatus::RolledBack => None,
        }
    }
}
