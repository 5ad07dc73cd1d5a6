//! Fehlertypen fuer den Relay-Kern

use thiserror::Error;
use tuschel_core::VerbindungsId;
use tuschel_protocol::{Ablehnung, ProtokollError};

use crate::transport::ZustellFehler;

/// Fehler der Registry-Operationen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Maximale Anzahl aktiver Sitzungen erreicht
    #[error("Kapazitaet erschoepft (maximal {max} Sitzungen)")]
    KapazitaetErschoepft { max: usize },

    /// Keine Sitzung mit diesem Handle
    #[error("Sitzung nicht gefunden: {0}")]
    NichtGefunden(VerbindungsId),

    /// Name ist bereits vergeben
    #[error("Name bereits vergeben: {0}")]
    NameVergeben(String),

    /// Handle ist bereits registriert
    #[error("Handle bereits registriert: {0}")]
    HandleVergeben(VerbindungsId),

    /// Der Server-Eintrag kann weder ersetzt noch entfernt werden
    #[error("Server-Eintrag ist unveraenderlich")]
    ServerEintrag,
}

/// Fehlertyp fuer den Relay-Kern
#[derive(Debug, Error)]
pub enum RelayError {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Protokoll- oder Kryptografiefehler einer Nachricht
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollError),

    /// Registry-Operation auf dem Hauptpfad fehlgeschlagen
    #[error("Registry-Fehler: {0}")]
    Registry(#[from] RegistryError),

    /// Handshake abgelehnt
    #[error("Handshake abgelehnt: {0}")]
    Abgelehnt(#[from] Ablehnung),

    /// Zustellung an eine Verbindung fehlgeschlagen
    #[error("Zustellung an {id} fehlgeschlagen: {fehler}")]
    Zustellung {
        id: VerbindungsId,
        #[source]
        fehler: ZustellFehler,
    },

    /// Nachricht von einer Verbindung ohne Sitzung
    #[error("Unbekannte Verbindung: {0}")]
    UnbekannteVerbindung(VerbindungsId),

    /// Die Registry widerspricht dem Zustand, den ein Pfad voraussetzt
    #[error("Registry inkonsistent bei {id}: {grund}")]
    RegistryInkonsistent {
        id: VerbindungsId,
        grund: RegistryError,
    },

    /// Mindestens eine Zustellung eines Broadcasts ist fehlgeschlagen
    #[error("Broadcast teilweise fehlgeschlagen ({fehlgeschlagen} Empfaenger)")]
    BroadcastTeilweise { fehlgeschlagen: usize },
}

impl RelayError {
    /// Gibt `true` zurueck wenn der Relay nach diesem Fehler nicht
    /// weiterlaufen darf
    pub fn ist_fatal(&self) -> bool {
        matches!(self, RelayError::RegistryInkonsistent { .. })
    }
}

/// Result-Typ fuer den Relay-Kern
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nur_inkonsistenz_ist_fatal() {
        let fatal = RelayError::RegistryInkonsistent {
            id: VerbindungsId(3),
            grund: RegistryError::NichtGefunden(VerbindungsId(3)),
        };
        assert!(fatal.ist_fatal());

        let harmlos = [
            RelayError::Registry(RegistryError::NichtGefunden(VerbindungsId(3))),
            RelayError::Abgelehnt(Ablehnung::NameVergeben),
            RelayError::UnbekannteVerbindung(VerbindungsId(9)),
            RelayError::BroadcastTeilweise { fehlgeschlagen: 2 },
            RelayError::Zustellung {
                id: VerbindungsId(1),
                fehler: ZustellFehler::Geschlossen,
            },
        ];
        assert!(harmlos.iter().all(|e| !e.ist_fatal()));
    }

    #[test]
    fn fehlermeldungen_nennen_die_verbindung() {
        let e = RelayError::UnbekannteVerbindung(VerbindungsId(7));
        assert_eq!(e.to_string(), "Unbekannte Verbindung: verbindung:7");
    }
}
