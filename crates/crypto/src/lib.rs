//! # tuschel-crypto
//!
//! Public-Key-Kryptosystem fuer das Tuschel-Relay.
//!
//! ## Module
//! - `radix` - Textdarstellung grosser Zahlen in Basis 2 bis 62
//! - `prim` - Zufaellige Primzahlen (Miller-Rabin)
//! - `schluessel` - Basis, Schluessel und Schluesselpaar-Erzeugung
//! - `block` - Blockweise Ver- und Entschluesselung
//! - `error` - Fehlertypen

pub mod block;
pub mod error;
pub mod prim;
pub mod radix;
pub mod schluessel;

// Bequeme Re-Exports
pub use block::{entschluesseln, max_klartext_bytes, verschluesseln, BLOCK_TRENNER};
pub use error::{CryptoError, CryptoResult};
pub use schluessel::{schluesselpaar_erzeugen, Basis, Schluessel, Schluesselpaar};
