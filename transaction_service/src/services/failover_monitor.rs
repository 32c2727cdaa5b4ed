use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{error, info, warn};

const PROBE_INTERVAL: Duration = Duration::from_secs(5);
const PROBE_DEADLINE: Duration = Duration::from_secs(5);

/// Dueño de las dos banderas que el Replicated Writer lee en cada llamada
/// mutante: si la réplica backup respondió la última sonda, y si el writer
/// debe actualmente saltarse la replicación por completo.
///
/// Solo una tarea escribe estas banderas (`run`), así que bastan atómicos
/// simples con orden `Relaxed` — no hay consistencia entre campos que
/// proteger, y la publicación de un único escritor hacia múltiples
/// lectores es suficiente.
pub struct FailoverMonitor {
    backup_addr: String,
    peer_alive: AtomicBool,
    failover_mode: AtomicBool,
}

impl FailoverMonitor {
    /// Construye el monitor en estado sano (`HEALTHY`), apuntando a la dirección del backup.
    pub fn new(backup_addr: impl Into<String>) -> Self {
        Self {
            backup_addr: backup_addr.into(),
            peer_alive: AtomicBool::new(true),
            failover_mode: AtomicBool::new(false),
        }
    }

    pub fn failover_mode(&self) -> bool {
        self.failover_mode.load(Ordering::Relaxed)
    }

    pub fn peer_alive(&self) -> bool {
        self.peer_alive.load(Ordering::Relaxed)
    }

    /// Corre para siempre. Nunca se cancela en operación normal; el
    /// llamador lo lanza como tarea de fondo y nunca lo espera.
    pub async fn run(&self) -> ! {
        loop {
            self.probe_once().await;
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    }

    pub(crate) async fn probe_once(&self) {
        let reachable = match tonic::transport::Endpoint::from_shared(self.backup_addr.clone()) {
            Ok(endpoint) => endpoint.connect_timeout(PROBE_DEADLINE).connect().await.is_ok(),
            Err(_) => false,
        };

        if reachable {
            self.peer_alive.store(true, Ordering::Relaxed);
            let was_in_failover = self.failover_mode.swap(false, Ordering::Relaxed);
            if was_in_failover {
                info!(addr = %self.backup_addr, "backup reachable again, exiting failover mode");
            }
        } else {
            self.peer_alive.store(false, Ordering::Relaxed);
            let was_healthy = !self.failover_mode.swap(true, Ordering::Relaxed);
            if was_healthy {
                error!(addr = %self.backup_addr, critical = true, "BACKUP REPLICA DOWN - ACTIVATING FAILOVER MODE");
            } else {
                warn!(addr = %self.backup_addr, "backup replica still unreachable");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_peer_enters_failover_mode_on_first_probe() {
        let monitor = FailoverMonitor::new("http://127.0.0.1:1");
        assert!(!monitor.failover_mode());

        monitor.probe_once().await;

        assert!(monitor.failover_mode());
        assert!(!monitor.peer_alive());
    }
}
