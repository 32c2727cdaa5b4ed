use thiserror::Error;

/// Fallos de la capa de persistencia. Nunca llegan directamente a un
/// cliente de la API — `LedgerEngine` los captura, revierte el registro en
/// curso, y reporta un `TransactionOutcome` en su lugar.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("wallet store I/O error: {0}")]
    WalletStoreIo(#[source] std::io::Error),

    #[error("wallet store is corrupt: {0}")]
    WalletStoreFormat(#[source] serde_json::Error),

    #[error("transaction log I/O error: {0}")]
    TransactionLogIo(#[source] std::io::Error),

    #[error("transaction log is corrupt: {0}")]
    TransactionLogFormat(#[source] serde_json::Error),
}
