pub mod transaction_log;
pub mod wallet_store;
