//! tuschel-client – Client-seitige Verbindung zum Tuschel-Relay
//!
//! Ablauf:
//! 1. `ChatClient::verbinden` sendet die Klartext-Anfrage mit dem eigenen
//!    oeffentlichen Schluessel und wartet auf Annahme oder Ablehnung
//! 2. `senden` verschluesselt Text mit dem Server-Schluessel
//! 3. `empfangen` entschluesselt mit dem eigenen privaten Schluessel
//! 4. `trennen` meldet sich mit `DISCONNECT` ab

pub mod connection;
pub mod error;

pub use connection::{ChatClient, Eingang};
pub use error::{ClientError, ClientResult};
