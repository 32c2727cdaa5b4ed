use thiserror::Error;

/// Fallos en el trato del Replicated Writer con la réplica backup. Nunca se
/// exponen al cliente HTTP tal cual — el Replicated Writer los convierte en
/// un `TransactionOutcome` con `(false, "Backup error: ...", 0)`.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to connect to backup replica at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("backup replica call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("backup replica RPC failed: {0}")]
    Rpc(#[source] tonic::Status),

    #[error("backup replica returned a balance outside the f64 precision range")]
    AmountOutOfRange,
}

impl From<tonic::Status> for WriteError {
    fn from(status: tonic::Status) -> Self {
        WriteError::Rpc(status)
    }
}
