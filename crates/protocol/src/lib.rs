//! tuschel-protocol – Wire-Protokoll des Tuschel-Relays
//!
//! Dieses Crate definiert alles, was zwischen Client und Server ueber die
//! Leitung geht:
//! - `wire` - Laengen-praefixierte Frames (u32 big-endian + Nutzlast)
//! - `handshake` - Klartext-Anfrage, Ablehnungen und Annahme-Antwort
//! - `control` - Steuer-Token und Format der Broadcast-Zeilen
//! - `payload` - Verschluesselte Anwendungsnachrichten

pub mod control;
pub mod error;
pub mod handshake;
pub mod payload;
pub mod wire;

pub use control::Anwendungsnachricht;
pub use error::{ProtokollError, ProtokollResult};
pub use handshake::Ablehnung;
pub use wire::FrameCodec;
