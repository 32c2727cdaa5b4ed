use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Las dos operaciones mutantes que entiende el ledger. Las consultas de
/// solo lectura del saldo no se representan aquí — nunca entran al
/// Transaction Log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Deposit,
    Withdraw,
}

/// Estado del ciclo de vida de un registro del Transaction Log. Un registro
/// se crea en `Pending` justo antes de la mutación de saldo que describe, y
/// abandona ese estado exactamente una vez: a `Committed` en cuanto la
/// escritura del Wallet Store que lo respalda es durable, o a `RolledBack`
/// si la mutación falló o si se encontró todavía en `Pending` durante la
/// recuperación al arranque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Committed,
    RolledBack,
}

/// La terna `(success, message, new_balance)` que devuelve toda operación
/// mutante del ledger, y la única parte de un registro de transacción que
/// un cliente que reintenta puede observar. Dos llamadas con el mismo
/// `TransactionId` deben producir resultados idénticos byte a byte.
///
/// # Examples
/// ```
/// use common::TransactionOutcome;
/// use rust_decimal::Decimal;
///
/// let outcome = TransactionOutcome::new(true, "Deposited 100.00", Decimal::new(10000, 2));
/// assert!(outcome.success);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub success: bool,
    pub message: String,
    pub new_balance: Decimal,
}

impl TransactionOutcome {
    /// Construye una terna de resultado a partir de sus tres campos.
    pub fn new(success: bool, message: impl Into<String>, new_balance: Decimal) -> Self {
        Self {
            success,
            message: message.into(),
            new_balance,
        }
    }
}

/// La terna `(success, balance, message)` que devuelve `get_balance`. Se
/// mantiene distinta de `TransactionOutcome` porque el orden de los campos
/// difiere entre lecturas y escrituras, y mezclarlas invita a errores de
/// transposición en el punto de llamada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOutcome {
    pub success: bool,
    pub balance: Decimal,
    pub message: String,
}

impl BalanceOutcome {
    /// Construye una terna de resultado de consulta a partir de sus tres campos.
    pub fn new(success: bool, balance: Decimal, message: impl Into<String>) -> Self {
        Self {
            success,
            balance,
            message: message.into(),
        }
    }
}
