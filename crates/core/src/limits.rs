//! Feste Protokoll-Grenzwerte
//!
//! Alle Werte sind Teil des Wire-Protokolls oder Standardwerte der
//! Server-Konfiguration.

use std::time::Duration;

/// Standard-Port des Relay-Servers
pub const STANDARD_PORT: u16 = 42069;

/// Maximale Anzahl gleichzeitig aktiver Sitzungen (ohne Server-Eintrag)
pub const MAX_CLIENTS: usize = 10;

/// Maximale Laenge eines Benutzernamens in Zeichen
pub const NAME_LAENGE: usize = 16;

/// Maximale Laenge einer Chat-Nachricht in Bytes
pub const MAX_NACHRICHT_LAENGE: usize = 256;

/// Obergrenze fuer eine formatierte Broadcast-Zeile
pub const BROADCAST_LAENGE: usize = MAX_NACHRICHT_LAENGE + NAME_LAENGE + 32;

/// Standard-Basis fuer die Textdarstellung von Schluesseln
pub const SCHLUESSEL_BASIS: u32 = 62;

/// Standard-Schluessellaenge in Bit
pub const SCHLUESSEL_BITS: u64 = 1024;

/// Heartbeat-Periode
pub const HEARTBEAT_INTERVALL: Duration = Duration::from_secs(30);

/// Anzahl verpasster Heartbeats bis zur Trennung
pub const MAX_VERPASSTE_HEARTBEATS: u32 = 3;

/// Name des Server-Eintrags in der Registry
pub const SERVER_NAME: &str = "SERVER";

/// Adresse des Server-Eintrags in der Registry
pub const SERVER_ADRESSE: &str = "0.0.0.0";
