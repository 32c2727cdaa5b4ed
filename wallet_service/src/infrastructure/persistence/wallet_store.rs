use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use common::AccountId;
use rust_decimal::Decimal;

use crate::domain::error::LedgerError;

/// El Wallet Store: un mapa plano `account_id -> balance` persistido como
/// un objeto JSON indentado a 2 espacios. El comportamiento de referencia
/// es una reescritura directa del archivo completo en cada guardado — sin
/// reemplazo atómico. La durabilidad para la caché de idempotencia vive
/// enteramente en el Transaction Log (ver `transaction_log`), que sí usa
/// reemplazo atómico.
///
/// # Examples
/// ```
/// use wallet_service::infrastructure::persistence::wallet_store::WalletStore;
///
/// let store = WalletStore::load("/tmp/does-not-exist-wallets.json").unwrap();
/// assert!(store.balances().is_empty());
/// ```
pub struct WalletStore {
    path: PathBuf,
    balances: HashMap<AccountId, Decimal>,
}

impl WalletStore {
    /// Carga el mapa de saldos desde disco, o devuelve un mapa vacío si el
    /// archivo todavía no existe.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let balances = if path.exists() {
            let file = File::open(&path).map_err(LedgerError::WalletStoreIo)?;
            serde_json::from_reader(file).map_err(LedgerError::WalletStoreFormat)?
        } else {
            HashMap::new()
        };
        Ok(Self { path, balances })
    }

    pub fn balances(&self) -> &HashMap<AccountId, Decimal> {
        &self.balances
    }

    pub fn balances_mut(&mut self) -> &mut HashMap<AccountId, Decimal> {
        &mut self.balances
    }

    /// Reescribe el archivo completo con el mapa de saldos actual.
    pub fn save(&self) -> Result<(), LedgerError> {
        let file = File::create(&self.path).map_err(LedgerError::WalletStoreIo)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.balances).map_err(LedgerError::WalletStoreFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_balances_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wallets.json");

        let mut store = WalletStore::load(&path).unwrap();
        store.balances_mut().insert(AccountId::new("alice"), Decimal::new(12345, 2));
        store.save().unwrap();

        let reloaded = WalletStore::load(&path).unwrap();
        assert_eq!(reloaded.balances().get(&AccountId::new("alice")), Some(&Decimal::new(12345, 2)));
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does_not_exist.json");
        let store = WalletStore::load(&path).unwrap();
        assert!(store.balances().is_empty());
    }
}
