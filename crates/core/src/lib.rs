//! tuschel-core – Gemeinsame Typen und Grenzwerte
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Tuschel-Crates gemeinsam genutzt werden: Verbindungs-Handles und die
//! festen Protokoll-Grenzwerte (Kapazitaet, Namenslaenge, Heartbeat).

pub mod limits;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{VerbindungsId, VerbindungsIdGenerator};
