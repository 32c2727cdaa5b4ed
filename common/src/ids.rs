use serde::{Deserialize, Serialize};
use std::fmt;

/// Identificador opaco de cuenta. Las cuentas nunca se crean explícitamente —
/// la primera referencia a un `AccountId` desconocido lo crea implícitamente
/// con saldo cero.
///
/// # Examples
/// ```
/// use common::AccountId;
///
/// let account = AccountId::new("alice");
/// assert_eq!(account.as_str(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Construye un `AccountId` a partir de cualquier tipo convertible a `String`.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for AccountId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Clave de idempotencia opaca, provista por el cliente. A diferencia de
/// `AccountId`, nunca se acuña implícitamente en el ledger — el llamador (o,
/// en su defecto, el adaptador HTTP) es responsable de generarla.
///
/// # Examples
/// ```
/// use common::TransactionId;
///
/// let tx = TransactionId::new("t1");
/// assert_eq!(tx.as_str(), "t1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Construye un `TransactionId` a partir de cualquier tipo convertible a `String`.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for TransactionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
