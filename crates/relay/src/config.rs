//! Laufzeit-Konfiguration des Relays

use std::time::Duration;

use tuschel_core::limits;
use tuschel_protocol::wire::DEFAULT_MAX_FRAME_SIZE;

/// Groesse der Send-Queue pro Verbindung
pub const SENDE_QUEUE_GROESSE: usize = 64;

/// Konfiguration des Relay-Kerns und der TCP-Schicht
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximale Anzahl aktiver Sitzungen (ohne Server-Eintrag)
    pub max_clients: usize,
    /// Periode des Heartbeat-Durchlaufs
    pub heartbeat_intervall: Duration,
    /// Verpasste Heartbeats bis zur Trennung
    pub max_verpasste_heartbeats: u32,
    /// Laengere Chat-Nachrichten werden gekuerzt
    pub max_nachricht_laenge: usize,
    /// Maximale Frame-Groesse auf der Leitung
    pub max_frame_groesse: usize,
    /// Frames pro Verbindung, die auf das Schreiben warten duerfen
    pub sende_queue_groesse: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_clients: limits::MAX_CLIENTS,
            heartbeat_intervall: limits::HEARTBEAT_INTERVALL,
            max_verpasste_heartbeats: limits::MAX_VERPASSTE_HEARTBEATS,
            max_nachricht_laenge: limits::MAX_NACHRICHT_LAENGE,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
            sende_queue_groesse: SENDE_QUEUE_GROESSE,
        }
    }
}
