//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Ungueltige Basis: {0} (erlaubt: 2 bis 62)")]
    UngueltigeBasis(u32),

    #[error("Ungueltige Ziffer '{zeichen}' an Position {position} fuer Basis {basis}")]
    UngueltigeZiffer {
        zeichen: char,
        position: usize,
        basis: u32,
    },

    #[error("Leere Zahl kann nicht dekodiert werden")]
    LeereZahl,

    #[error("Ungueltiger Schluessel: {0}")]
    UngueltigerSchluessel(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
