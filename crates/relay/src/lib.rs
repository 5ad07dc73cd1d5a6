//! tuschel-relay – Relay-Kern des Tuschel-Servers
//!
//! Dieses Crate nimmt neue Verbindungen per Klartext-Handshake auf, leitet
//! entschluesselte Chat-Zeilen an alle aktiven Sitzungen weiter und trennt
//! Sitzungen, die sich abmelden, Fehler verursachen oder nicht mehr auf
//! Heartbeats antworten.
//!
//! ## Architektur
//! - `registry` - Geordnete Sitzungsliste mit Server-Kopfeintrag
//! - `transport` - Zustell-Schnittstelle (Trait) und Kanal-Implementierung
//! - `kern` - Handshake, Weiterleitung, Trennung (synchron, ein Besitzer)
//! - `broadcast` - Best-Effort-Verteilung einer Zeile an alle Sitzungen
//! - `heartbeat` - Periodischer Lebenszeichen-Durchlauf
//! - `verbindung` - Lese- und Schreib-Task pro TCP-Verbindung
//! - `tcp` - Owner-Loop: Accept, Frames, Heartbeat-Tick, Shutdown
//!
//! Der gesamte Zustand gehoert genau einem Task; Verbindungs-Tasks tauschen
//! nur Bytes ueber `mpsc`-Kanaele mit ihm aus.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod kern;
pub mod registry;
pub mod tcp;
pub mod transport;
pub mod verbindung;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use config::RelayConfig;
pub use error::{RegistryError, RelayError, RelayResult};
pub use kern::RelayKern;
pub use registry::{Registry, Sitzung};
pub use tcp::RelayServer;
pub use transport::{KanalZustellung, ZustellFehler, Zustellung};
