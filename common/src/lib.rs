pub mod ids;
pub mod model;

pub use ids::{AccountId, TransactionId};
pub use model::{BalanceOutcome, Operation, TransactionOutcome, TransactionStatus};
