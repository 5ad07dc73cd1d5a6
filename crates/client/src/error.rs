//! Fehlertypen fuer den Client

use thiserror::Error;
use tuschel_crypto::CryptoError;
use tuschel_protocol::{Ablehnung, ProtokollError};

/// Fehler die bei der Server-Verbindung auftreten koennen
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP-Verbindung fehlgeschlagen
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Nachricht nicht ver- oder entschluesselbar
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollError),

    /// Schluesselerzeugung fehlgeschlagen
    #[error("Kryptografiefehler: {0}")]
    Krypto(#[from] CryptoError),

    /// Server hat den Handshake abgelehnt
    #[error("Vom Server abgelehnt: {0}")]
    Abgelehnt(Ablehnung),

    /// Server hat die Verbindung geschlossen
    #[error("Verbindung vom Server getrennt")]
    VerbindungGetrennt,
}

/// Result-Typ fuer den Client
pub type ClientResult<T> = Result<T, ClientError>;
