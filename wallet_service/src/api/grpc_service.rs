use std::sync::Arc;

use common::{AccountId, TransactionId};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tonic::{Request, Response, Status};

use crate::api::proto::wallet_backup_server::WalletBackup;
use crate::api::proto::{GetBalanceRequest, GetBalanceResponse, TransactionRequest, TransactionResponse};
use crate::domain::engine::LedgerEngine;

// Definicion del servicio gRPC que el backup expone al primario para
// comunicacion inter-replicas.
//
/// El servidor gRPC que la réplica backup expone al primario. Un adaptador
/// delgado — toda la semántica del ledger vive en `LedgerEngine`, esto solo
/// traduce los mensajes de red hacia y desde sus tipos de dominio.
pub struct WalletGrpcService {
    engine: Arc<LedgerEngine>,
}

impl WalletGrpcService {
    /// Construye el servicio gRPC sobre un motor ya cargado.
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }
}

fn parse_amount(amount: f64) -> Result<Decimal, Status> {
    Decimal::from_f64(amount).ok_or_else(|| Status::invalid_argument("amount is not a finite number"))
}

fn balance_to_wire(balance: Decimal) -> f64 {
    balance.to_f64().unwrap_or(0.0)
}

#[tonic::async_trait]
impl WalletBackup for WalletGrpcService {
    async fn deposit(&self, request: Request<TransactionRequest>) -> Result<Response<TransactionResponse>, Status> {
        let req = request.into_inner();
        let amount = parse_amount(req.amount)?;
        let outcome = self
            .engine
            .deposit(AccountId::new(req.account_id), amount, TransactionId::new(req.transaction_id.clone()))
            .await;

        Ok(Response::new(TransactionResponse {
            success: outcome.success,
            message: outcome.message,
            new_balance: balance_to_wire(outcome.new_balance),
            transaction_id: req.transaction_id,
        }))
    }

    async fn withdraw(&self, request: Request<TransactionRequest>) -> Result<Response<TransactionResponse>, Status> {
        let req = request.into_inner();
        let amount = parse_amount(req.amount)?;
        let outcome = self
            .engine
            .withdraw(AccountId::new(req.account_id), amount, TransactionId::new(req.transaction_id.clone()))
            .await;

        Ok(Response::new(TransactionResponse {
            success: outcome.success,
            message: outcome.message,
            new_balance: balance_to_wire(outcome.new_balance),
            transaction_id: req.transaction_id,
        }))
    }

    async fn get_balance(&self, request: Request<GetBalanceRequest>) -> Result<Response<GetBalanceResponse>, Status> {
        let req = request.into_inner();
        let outcome = self.engine.get_balance(&AccountId::new(req.account_id)).await;

        Ok(Response::new(GetBalanceResponse {
            success: outcome.success,
            balance: balance_to_wire(outcome.balance),
            message: outcome.message,
        }))
    }
}
