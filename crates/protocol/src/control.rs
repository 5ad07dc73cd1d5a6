//! Steuer-Token und Broadcast-Format
//!
//! Nach dem Handshake ist jede entschluesselte Nachricht entweder eines der
//! beiden reservierten Token oder gewoehnlicher Chat-Text. Die Token werden
//! per exaktem Stringvergleich erkannt, bevor irgendetwas weitergeleitet wird.

use chrono::NaiveTime;
use tuschel_core::limits::BROADCAST_LAENGE;

/// Client meldet sich ab
pub const TRENNEN_TOKEN: &str = "DISCONNECT\n";

/// Heartbeat vom Server bzw. Bestaetigung vom Client
pub const HEARTBEAT_TOKEN: &str = "HEARTBEAT\n";

// ---------------------------------------------------------------------------
// Anwendungsnachricht
// ---------------------------------------------------------------------------

/// Klassifizierte Nachricht einer aktiven Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anwendungsnachricht<'a> {
    /// Explizite Abmeldung
    Trennen,
    /// Antwort auf einen Heartbeat
    HeartbeatAck,
    /// Chat-Text zur Weiterleitung
    Chat(&'a str),
}

impl<'a> Anwendungsnachricht<'a> {
    pub fn klassifizieren(text: &'a str) -> Self {
        match text {
            TRENNEN_TOKEN => Anwendungsnachricht::Trennen,
            HEARTBEAT_TOKEN => Anwendungsnachricht::HeartbeatAck,
            chat => Anwendungsnachricht::Chat(chat),
        }
    }
}

// ---------------------------------------------------------------------------
// Textformate
// ---------------------------------------------------------------------------

/// Kuerzt einen Text auf hoechstens `max_bytes` Bytes an einer Zeichengrenze
pub fn kuerzen(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut ende = max_bytes;
    while !text.is_char_boundary(ende) {
        ende -= 1;
    }
    &text[..ende]
}

/// Formatiert eine Broadcast-Zeile: `(HH:MM:SS) absender: text`
pub fn broadcast_zeile(zeit: NaiveTime, absender: &str, text: &str) -> String {
    let zeile = format!("({}) {absender}: {text}", zeit.format("%H:%M:%S"));
    kuerzen(&zeile, BROADCAST_LAENGE).to_owned()
}

/// Ankuendigung eines neuen Teilnehmers
pub fn beitritt_text(name: &str) -> String {
    format!("{name} joined the chat")
}

/// Ankuendigung eines ausgeschiedenen Teilnehmers
pub fn austritt_text(name: &str) -> String {
    format!("{name} left the chat")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
