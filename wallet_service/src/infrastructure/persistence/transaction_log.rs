use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use common::{TransactionId, TransactionStatus};

use crate::domain::entities::TransactionRecord;
use crate::domain::error::LedgerError;

/// El Transaction Log: `transaction_id -> TransactionRecord`, persistido
/// con reemplazo atómico para que un lector nunca observe un archivo
/// a medio escribir. Toda llamada que cambia el estado de un registro pasa
/// por `write`, que reescribe el archivo completo a un archivo hermano
/// `.tmp` y lo renombra sobre el destino.
///
/// # Examples
/// ```
/// use wallet_service::infrastructure::persistence::transaction_log::TransactionLog;
///
/// let log = TransactionLog::load("/tmp/does-not-exist-transactions.json").unwrap();
/// assert!(log.records().next().is_none());
/// ```
pub struct TransactionLog {
    path: PathBuf,
    records: HashMap<TransactionId, TransactionRecord>,
}

impl TransactionLog {
    /// Carga los registros desde disco, o un mapa vacío si el archivo no existe todavía.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let records = if path.exists() {
            let file = File::open(&path).map_err(LedgerError::TransactionLogIo)?;
            serde_json::from_reader(file).map_err(LedgerError::TransactionLogFormat)?
        } else {
            HashMap::new()
        };
        Ok(Self { path, records })
    }

    pub fn get(&self, transaction_id: &TransactionId) -> Option<&TransactionRecord> {
        self.records.get(transaction_id)
    }

    pub fn records(&self) -> impl Iterator<Item = (&TransactionId, &TransactionRecord)> {
        self.records.iter()
    }

    /// Inserta o sobrescribe un registro y persiste de inmediato.
    pub fn write(&mut self, transaction_id: TransactionId, record: TransactionRecord) -> Result<(), LedgerError> {
        self.records.insert(transaction_id, record);
        self.persist()
    }

    /// Transiciona un registro existente a `RolledBack`, descartando
    /// cualquier resultado en caché — una transacción revertida no debe
    /// poder repetirse.
    pub fn mark_rolled_back(&mut self, transaction_id: &TransactionId) -> Result<(), LedgerError> {
        if let Some(record) = self.records.get_mut(transaction_id) {
            record.status = TransactionStatus::RolledBack;
            record.outcome = None;
        }
        self.persist()
    }

    fn persist(&self) -> Result<(), LedgerError> {
        let mut temp_name = self.path.clone().into_os_string();
        temp_name.push(OsString::from(".tmp"));
        let temp_path = PathBuf::from(temp_name);

        {
            let file = File::create(&temp_path).map_err(LedgerError::TransactionLogIo)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &self.records).map_err(LedgerError::TransactionLogFormat)?;
        }

        fs::rename(&temp_path, &self.path).map_err(LedgerError::TransactionLogIo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AccountId, Operation, TransactionOutcome};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn atomic_replace_survives_a_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transactions.json");

        let mut log = TransactionLog::load(&path).unwrap();
        log.write(
            TransactionId::new("t1"),
            TransactionRecord::committed(
                Operation::Deposit,
                AccountId::new("alice"),
                Decimal::new(10000, 2),
                TransactionOutcome::new(true, "Deposited 100.00", Decimal::new(10000, 2)),
            ),
        )
        .unwrap();

        assert!(!dir.path().join("transactions.json.tmp").exists());

        let reloaded = TransactionLog::load(&path).unwrap();
        let record = reloaded.get(&TransactionId::new("t1")).unwrap();
        assert_eq!(record.status, TransactionStatus::Committed);
    }

    #[test]
    fn rollback_clears_cached_outcome() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transactions.json");
        let mut log = TransactionLog::load(&path).unwrap();

        let id = TransactionId::new("t5");
        log.write(
            id.clone(),
            TransactionRecord::pending(Operation::Deposit, AccountId::new("alice"), Decimal::new(1000, 2)),
        )
        .unwrap();

        log.mark_rolled_back(&id).unwrap();

        let record = log.get(&id).unwrap();
        assert_eq!(record.status, TransactionStatus::RolledBack);
        assert!(record.cached_outcome().is_none());
    }
}
