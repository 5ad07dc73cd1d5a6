//! Textdarstellung grosser Zahlen in Basis 2 bis 62
//!
//! Ziffernfolge: `0-9`, dann `a-z`, dann `A-Z`. Bis Basis 36 werden
//! Grossbuchstaben beim Dekodieren wie Kleinbuchstaben behandelt, darueber
//! sind beide Faelle verschiedene Ziffern. Kodiert wird immer in
//! Kleinbuchstaben zuerst.

use num_bigint::BigUint;

use crate::error::{CryptoError, CryptoResult};
use crate::schluessel::Basis;

/// Ziffernalphabet fuer alle unterstuetzten Basen
const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Ab dieser Basis sind Gross- und Kleinbuchstaben verschiedene Ziffern
const GROSS_KLEIN_GRENZE: u32 = 36;

/// Kodiert eine Zahl als Text in der gegebenen Basis
pub fn kodieren(zahl: &BigUint, basis: Basis) -> String {
    zahl.to_radix_be(basis.wert())
        .into_iter()
        .map(|ziffer| ALPHABET[ziffer as usize] as char)
        .collect()
}

/// Dekodiert einen Text in der gegebenen Basis
///
/// # Fehler
/// - `LeereZahl` bei leerem Text
/// - `UngueltigeZiffer` bei Zeichen ausserhalb des Alphabets der Basis
pub fn dekodieren(text: &str, basis: Basis) -> CryptoResult<BigUint> {
    if text.is_empty() {
        return Err(CryptoError::LeereZahl);
    }

    let ziffern = text
        .chars()
        .enumerate()
        .map(|(position, zeichen)| {
            ziffer_wert(zeichen, basis).ok_or(CryptoError::UngueltigeZiffer {
                zeichen,
                position,
                basis: basis.wert(),
            })
        })
        .collect::<CryptoResult<Vec<u8>>>()?;

    BigUint::from_radix_be(&ziffern, basis.wert()).ok_or(CryptoError::UngueltigeBasis(basis.wert()))
}

/// Liefert den Ziffernwert eines Zeichens, falls er in der Basis gueltig ist
fn ziffer_wert(zeichen: char, basis: Basis) -> Option<u8> {
    let wert = match zeichen {
        '0'..='9' => zeichen as u32 - '0' as u32,
        'a'..='z' => zeichen as u32 - 'a' as u32 + 10,
        'A'..='Z' if basis.wert() <= GROSS_KLEIN_GRENZE => zeichen as u32 - 'A' as u32 + 10,
        'A'..='Z' => zeichen as u32 - 'A' as u32 + 36,
        _ => return None,
    };
    (wert < basis.wert()).then_some(wert as u8)
}
