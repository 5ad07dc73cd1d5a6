//! Fehlertypen fuer das Wire-Protokoll

use thiserror::Error;
use tuschel_crypto::CryptoError;

use crate::handshake::Ablehnung;

/// Fehler beim Kodieren oder Dekodieren von Protokollnachrichten
#[derive(Debug, Error)]
pub enum ProtokollError {
    /// IO-Fehler beim Lesen oder Schreiben eines Frames
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Ver- oder Entschluesselung fehlgeschlagen
    #[error("Kryptografiefehler: {0}")]
    Krypto(#[from] CryptoError),

    /// Annahme-Antwort des Servers enthaelt keinen gueltigen Schluessel
    #[error("Ungueltige Annahme-Antwort: {0}")]
    UngueltigeAnnahme(#[from] Ablehnung),

    /// Chiffrat ist kein gueltiger Text
    #[error("Chiffrat ist kein gueltiges UTF-8")]
    UngueltigesChiffrat,
}

/// Result-Typ fuer das Wire-Protokoll
pub type ProtokollResult<T> = Result<T, ProtokollError>;
