//! Klartext-Handshake
//!
//! Eine neue Verbindung sendet genau eine Anfrage mit den Feldern
//! `BASE`, `EXP`, `DIV` und `UNAME`. Jedes Feld wird unabhaengig ueber das
//! erste Vorkommen seines Labels gefunden; die Reihenfolge ist beliebig.
//! Nach dem Label werden Leerzeichen uebersprungen und hoechstens so viele
//! Zeichen bis zum naechsten Whitespace gelesen, wie die Feldbreite erlaubt.
//! Laengere Werte werden abgeschnitten, nicht abgelehnt.
//!
//! Jeder Validierungsfehler hat eine eigene Klartext-Antwort (`Ablehnung`).
//! Die Annahme-Antwort enthaelt den oeffentlichen Server-Schluessel im selben
//! Feldformat und wird unter dem Client-Schluessel verschluesselt.

use thiserror::Error;
use tuschel_core::limits::NAME_LAENGE;
use tuschel_crypto::{max_klartext_bytes, radix, Basis, Schluessel};

// ---------------------------------------------------------------------------
// Feld-Labels und Breiten
// ---------------------------------------------------------------------------

pub const LABEL_BASIS: &str = "BASE: ";
pub const LABEL_EXPONENT: &str = "EXP: ";
pub const LABEL_MODULUS: &str = "DIV: ";
pub const LABEL_NAME: &str = "UNAME: ";

pub const BREITE_BASIS: usize = 4;
pub const BREITE_EXPONENT: usize = 64;
pub const BREITE_MODULUS: usize = 1024;
pub const BREITE_NAME: usize = NAME_LAENGE;

// ---------------------------------------------------------------------------
// Ablehnung
// ---------------------------------------------------------------------------

/// Grund fuer die Ablehnung einer Handshake-Anfrage
///
/// Die `Display`-Darstellung ist exakt der Text, den der Client sieht
/// (ohne abschliessenden Zeilenumbruch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ablehnung {
    #[error("Missing BASE field")]
    BasisFehlt,

    #[error("Invalid BASE value")]
    BasisUngueltig,

    #[error("Missing EXP field")]
    ExponentFehlt,

    #[error("Invalid EXP value")]
    ExponentUngueltig,

    #[error("Missing DIV field")]
    ModulusFehlt,

    #[error("Invalid DIV value")]
    ModulusUngueltig,

    #[error("Server at max capacity")]
    ServerVoll,

    #[error("Missing UNAME field")]
    NameFehlt,

    #[error("Username already exists")]
    NameVergeben,
}

impl Ablehnung {
    /// Alle Ablehnungsgruende in Pruefreihenfolge
    pub const ALLE: [Ablehnung; 9] = [
        Ablehnung::BasisFehlt,
        Ablehnung::BasisUngueltig,
        Ablehnung::ExponentFehlt,
        Ablehnung::ExponentUngueltig,
        Ablehnung::ModulusFehlt,
        Ablehnung::ModulusUngueltig,
        Ablehnung::ServerVoll,
        Ablehnung::NameFehlt,
        Ablehnung::NameVergeben,
    ];

    /// Antwortzeile, wie sie auf die Leitung geht
    pub fn antwort(&self) -> &'static str {
        match self {
            Ablehnung::BasisFehlt => "Missing BASE field\n",
            Ablehnung::BasisUngueltig => "Invalid BASE value\n",
            Ablehnung::ExponentFehlt => "Missing EXP field\n",
            Ablehnung::ExponentUngueltig => "Invalid EXP value\n",
            Ablehnung::ModulusFehlt => "Missing DIV field\n",
            Ablehnung::ModulusUngueltig => "Invalid DIV value\n",
            Ablehnung::ServerVoll => "Server at max capacity\n",
            Ablehnung::NameFehlt => "Missing UNAME field\n",
            Ablehnung::NameVergeben => "Username already exists\n",
        }
    }

    /// Erkennt eine Ablehnung anhand der empfangenen Antwort
    pub fn aus_antwort(antwort: &[u8]) -> Option<Self> {
        Self::ALLE
            .into_iter()
            .find(|a| a.antwort().as_bytes() == antwort)
    }
}

// ---------------------------------------------------------------------------
// Feld-Extraktion
// ---------------------------------------------------------------------------

/// Extrahiert den Wert eines Feldes aus einer Rohnachricht
///
/// Gibt `None` zurueck wenn das Label fehlt oder kein Wert folgt.
pub fn feld_extrahieren<'a>(roh: &'a str, label: &str, max_breite: usize) -> Option<&'a str> {
    let start = roh.find(label)? + label.len();
    let rest = roh[start..].trim_start_matches([' ', '\t']);

    let ende = rest
        .char_indices()
        .take_while(|(_, c)| !c.is_whitespace())
        .take(max_breite)
        .last()
        .map(|(i, c)| i + c.len_utf8())?;

    Some(&rest[..ende])
}

/// Liest und validiert den Client-Schluessel (`BASE`, `EXP`, `DIV`)
///
/// Die Felder werden in dieser Reihenfolge geprueft; der erste Fehler
/// bestimmt die Ablehnung.
pub fn schluessel_parsen(roh: &str) -> Result<Schluessel, Ablehnung> {
    let basis_text =
        feld_extrahieren(roh, LABEL_BASIS, BREITE_BASIS).ok_or(Ablehnung::BasisFehlt)?;
    let basis = basis_text
        .parse::<u32>()
        .ok()
        .and_then(|wert| Basis::neu(wert).ok())
        .ok_or(Ablehnung::BasisUngueltig)?;

    let exponent_text =
        feld_extrahieren(roh, LABEL_EXPONENT, BREITE_EXPONENT).ok_or(Ablehnung::ExponentFehlt)?;
    let exponent = radix::dekodieren(exponent_text, basis)
        .ok()
        .filter(|e| e.bits() > 0)
        .ok_or(Ablehnung::ExponentUngueltig)?;

    let modulus_text =
        feld_extrahieren(roh, LABEL_MODULUS, BREITE_MODULUS).ok_or(Ablehnung::ModulusFehlt)?;
    let modulus = radix::dekodieren(modulus_text, basis)
        .ok()
        .filter(|n| n.bits() > 0)
        .ok_or(Ablehnung::ModulusUngueltig)?;

    let schluessel =
        Schluessel::neu(basis, modulus, exponent).map_err(|_| Ablehnung::ModulusUngueltig)?;

    // Ein Modulus, der kein einziges Byte fasst, kann nichts verschluesseln
    if max_klartext_bytes(&schluessel) == 0 {
        return Err(Ablehnung::ModulusUngueltig);
    }

    Ok(schluessel)
}

/// Liest den Benutzernamen (`UNAME`)
pub fn name_parsen(roh: &str) -> Result<String, Ablehnung> {
    feld_extrahieren(roh, LABEL_NAME, BREITE_NAME)
        .map(str::to_owned)
        .ok_or(Ablehnung::NameFehlt)
}

// ---------------------------------------------------------------------------
// Rendern
// ---------------------------------------------------------------------------

fn schluessel_felder(schluessel: &Schluessel) -> String {
    format!(
        "{LABEL_BASIS}{}\n{LABEL_EXPONENT}{}\n{LABEL_MODULUS}{}\n",
        schluessel.basis(),
        schluessel.exponent_text(),
        schluessel.modulus_text()
    )
}

/// Baut die Klartext-Anfrage eines Clients
pub fn anfrage_rendern(oeffentlich: &Schluessel, name: &str) -> String {
    format!("{}{LABEL_NAME}{name}\n", schluessel_felder(oeffentlich))
}

/// Baut die Annahme-Antwort mit dem oeffentlichen Server-Schluessel
pub fn annahme_rendern(server_schluessel: &Schluessel) -> String {
    schluessel_felder(server_schluessel)
}

/// Liest den Server-Schluessel aus einer (entschluesselten) Annahme-Antwort
pub fn annahme_parsen(text: &str) -> Result<Schluessel, Ablehnung> {
    schluessel_parsen(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
