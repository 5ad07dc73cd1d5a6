//! Zustellung – Schnittstelle zwischen Relay-Kern und Transport
//!
//! Der Kern sendet nie selbst ueber Sockets. Er uebergibt fertige
//! Frame-Nutzlasten an eine `Zustellung`, die sie nicht-blockierend in die
//! Send-Queue der jeweiligen Verbindung legt. Eine volle oder geschlossene
//! Queue ist ein Zustellfehler.

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tuschel_core::VerbindungsId;

/// Grund fuer eine fehlgeschlagene Zustellung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ZustellFehler {
    #[error("Send-Queue voll")]
    QueueVoll,

    #[error("Verbindung geschlossen")]
    Geschlossen,

    #[error("Verbindung unbekannt")]
    Unbekannt,
}

/// Byte-Transport zu den verbundenen Clients
pub trait Zustellung {
    /// Legt eine Frame-Nutzlast fuer die Verbindung ab, ohne zu blockieren
    fn senden(&mut self, id: VerbindungsId, nutzlast: Bytes) -> Result<(), ZustellFehler>;

    /// Schliesst die Verbindung
    ///
    /// Bereits abgelegte Nutzlasten werden noch geschrieben.
    fn schliessen(&mut self, id: VerbindungsId);
}

// ---------------------------------------------------------------------------
// KanalZustellung
// ---------------------------------------------------------------------------

/// Ausgang einer Verbindung: Send-Queue des Schreib-Tasks und Lese-Task
#[derive(Debug)]
struct Ausgang {
    tx: mpsc::Sender<Bytes>,
    leser: AbortHandle,
}

/// Zustellung ueber die Send-Queues der Verbindungs-Tasks
#[derive(Debug, Default)]
pub struct KanalZustellung {
    ausgaenge: HashMap<VerbindungsId, Ausgang>,
}

impl KanalZustellung {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert die Queue und den Lese-Task einer neuen Verbindung
    pub fn registrieren(&mut self, id: VerbindungsId, tx: mpsc::Sender<Bytes>, leser: AbortHandle) {
        self.ausgaenge.insert(id, Ausgang { tx, leser });
    }

    /// Anzahl offener Verbindungen (inklusive laufender Handshakes)
    pub fn anzahl(&self) -> usize {
        self.ausgaenge.len()
    }
}

impl Zustellung for KanalZustellung {
    fn senden(&mut self, id: VerbindungsId, nutzlast: Bytes) -> Result<(), ZustellFehler> {
        let ausgang = self.ausgaenge.get(&id).ok_or(ZustellFehler::Unbekannt)?;
        match ausgang.tx.try_send(nutzlast) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %id, "Send-Queue voll");
                Err(ZustellFehler::QueueVoll)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %id, "Send-Queue geschlossen");
                Err(ZustellFehler::Geschlossen)
            }
        }
    }

    fn schliessen(&mut self, id: VerbindungsId) {
        // Sender fallen lassen: der Schreib-Task leert die Queue und beendet sich
        if let Some(ausgang) = self.ausgaenge.remove(&id) {
            ausgang.leser.abort();
            tracing::debug!(verbindung = %id, "Verbindung geschlossen");
        }
    }
}
