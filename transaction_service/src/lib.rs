//! Transaction Service
//!
//! The primary replica process: owns the Replication Client, the
//! Replicated Writer, the Failover Monitor, and the HTTP API Adapter. Its
//! own ledger is a `wallet_service::domain::engine::LedgerEngine` run
//! against a distinct pair of data files from the backup.
//!
//! # Modules
//!
//! * `api` - HTTP routes, wire DTOs, and the gRPC client's generated proto module.
//! * `domain` - The `ReplicationGateway` port and its error taxonomy.
//! * `infrastructure` - The gRPC-backed `ReplicationGateway` implementation.
//! * `services` - The Failover Monitor background task.
//! * `use_cases` - The Replicated Writer orchestration.

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod use_cases;
