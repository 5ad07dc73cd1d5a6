//! Blockweise Ver- und Entschluesselung
//!
//! Der Klartext wird in Bloecke zu hoechstens `max_klartext_bytes` Bytes
//! zerlegt. Jeder Block wird als big-endian Zahl `m` gelesen, zu
//! `m^exponent mod modulus` transformiert und in der Basis des Schluessels
//! als Text dargestellt. Die Bloecke werden mit `BLOCK_TRENNER` verbunden.
//!
//! Beim Entschluesseln werden alle Bloecke ausser dem letzten wieder auf die
//! volle Blockbreite aufgefuellt. Fuehrende Null-Bytes im letzten Block gehen
//! verloren; das Textprotokoll enthaelt keine Null-Bytes.

use num_bigint::BigUint;

use crate::error::{CryptoError, CryptoResult};
use crate::radix;
use crate::schluessel::Schluessel;

/// Trennzeichen zwischen zwei Chiffratbloecken
pub const BLOCK_TRENNER: char = '\n';

/// Maximale Klartext-Bytes pro Block fuer diesen Schluessel
///
/// Jeder Block muss als Zahl kleiner als der Modulus sein.
pub fn max_klartext_bytes(schluessel: &Schluessel) -> usize {
    (schluessel.bits().saturating_sub(1) / 8) as usize
}

/// Verschluesselt einen Klartext mit dem (oeffentlichen) Schluessel
///
/// # Fehler
/// `Verschluesselung` wenn der Modulus zu klein fuer ein einziges Byte ist.
pub fn verschluesseln(klartext: &[u8], schluessel: &Schluessel) -> CryptoResult<String> {
    let breite = max_klartext_bytes(schluessel);
    if breite == 0 {
        return Err(CryptoError::Verschluesselung(format!(
            "Modulus mit {} Bit fasst kein einziges Byte",
            schluessel.bits()
        )));
    }

    let bloecke: Vec<String> = klartext
        .chunks(breite)
        .map(|block| {
            let m = BigUint::from_bytes_be(block);
            let c = m.modpow(schluessel.exponent(), schluessel.modulus());
            radix::kodieren(&c, schluessel.basis())
        })
        .collect();

    Ok(bloecke.join(&BLOCK_TRENNER.to_string()))
}

/// Entschluesselt ein Chiffrat mit dem (privaten) Schluessel
///
/// # Fehler
/// `Entschluesselung` bei fehlerhafter Blockkodierung, bei Blockwerten
/// ausserhalb des Modulus oder wenn ein Block nicht in die Blockbreite passt.
pub fn entschluesseln(chiffrat: &str, schluessel: &Schluessel) -> CryptoResult<Vec<u8>> {
    if chiffrat.is_empty() {
        return Ok(Vec::new());
    }

    let breite = max_klartext_bytes(schluessel);
    if breite == 0 {
        return Err(CryptoError::Entschluesselung(format!(
            "Modulus mit {} Bit fasst kein einziges Byte",
            schluessel.bits()
        )));
    }

    let bloecke: Vec<&str> = chiffrat.split(BLOCK_TRENNER).collect();
    let letzter = bloecke.len() - 1;
    let mut klartext = Vec::with_capacity(bloecke.len() * breite);

    for (index, block) in bloecke.into_iter().enumerate() {
        let c = radix::dekodieren(block, schluessel.basis())
            .map_err(|e| CryptoError::Entschluesselung(format!("Block {index}: {e}")))?;
        if &c >= schluessel.modulus() {
            return Err(CryptoError::Entschluesselung(format!(
                "Block {index} liegt ausserhalb des Modulus"
            )));
        }

        let bytes = c
            .modpow(schluessel.exponent(), schluessel.modulus())
            .to_bytes_be();
        if bytes.len() > breite {
            return Err(CryptoError::Entschluesselung(format!(
                "Block {index} ist groesser als {breite} Bytes (falscher Schluessel?)"
            )));
        }

        if index < letzter {
            klartext.resize(klartext.len() + breite - bytes.len(), 0);
        }
        klartext.extend_from_slice(&bytes);
    }

    Ok(klartext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schluessel::{schluesselpaar_erzeugen, Basis, Schluesselpaar};

    fn paar(bits: u64, basis: u32) -> Schluesselpaar {
        schluesselpaar_erzeugen(bits, basis).expect("Schluesselpaar muss erzeugbar sein")
    }

    #[test]
    fn max_klartext_bytes_aus_bitlaenge() {
        let basis = Basis::neu(10).unwrap();
        let k = |modulus: u32| Schluessel::neu(basis, BigUint::from(modulus), BigUint::from(3u32)).unwrap();
        assert_eq!(max_klartext_bytes(&k(255)), 0);
        assert_eq!(max_klartext_bytes(&k(256)), 1);
        assert_eq!(max_klartext_bytes(&k(500)), 1);
        assert_eq!(max_klartext_bytes(&k(65_536)), 2);
        assert_eq!(max_klartext_bytes(&paar(1024, 62).oeffentlich), 127);
    }

    #[test]
    fn einzelner_block_hin_und_zurueck() {
        let paar = paar(128, 62);
        let klartext = b"Hallo Welt";
        assert!(klartext.len() <= max_klartext_bytes(&paar.oeffentlich));

        let chiffrat = verschluesseln(klartext, &paar.oeffentlich).unwrap();
        assert!(!chiffrat.contains(BLOCK_TRENNER));
        assert_eq!(entschluesseln(&chiffrat, &paar.privat).unwrap(), klartext);
    }

    #[test]
    fn mehrere_bloecke_hin_und_zurueck() {
        let paar = paar(64, 36);
        let breite = max_klartext_bytes(&paar.oeffentlich);
        let klartext: Vec<u8> = (1..=200u8).collect();

        let chiffrat = verschluesseln(&klartext, &paar.oeffentlich).unwrap();
        assert_eq!(chiffrat.split(BLOCK_TRENNER).count(), klartext.len().div_ceil(breite));
        assert_eq!(entschluesseln(&chiffrat, &paar.privat).unwrap(), klartext);
    }

    #[test]
    fn null_bytes_in_inneren_bloecken_bleiben_erhalten() {
        let paar = paar(64, 62);
        let breite = max_klartext_bytes(&paar.oeffentlich);
        let mut klartext = vec![0u8; breite];
        klartext.extend_from_slice(b"\0\0ende");

        let chiffrat = verschluesseln(&klartext, &paar.oeffentlich).unwrap();
        let zurueck = entschluesseln(&chiffrat, &paar.privat).unwrap();
        // Nur die fuehrenden Nullen des letzten Blocks fallen weg
        assert_eq!(&zurueck[..breite], &klartext[..breite]);
        assert!(zurueck.ends_with(b"ende"));
    }

    #[test]
    fn alle_basen_hin_und_zurueck() {
        for basis in [2, 10, 16, 36, 37, 61, 62] {
            let paar = paar(96, basis);
            let text = format!("Gruesse aus Basis {basis}: aAzZ09");
            let klartext = text.as_bytes();
            let chiffrat = verschluesseln(klartext, &paar.oeffentlich).unwrap();
            assert_eq!(entschluesseln(&chiffrat, &paar.privat).unwrap(), klartext, "Basis {basis}");
        }
    }

    #[test]
    fn leerer_klartext() {
        let paar = paar(64, 62);
        let chiffrat = verschluesseln(b"", &paar.oeffentlich).unwrap();
        assert!(chiffrat.is_empty());
        assert!(entschluesseln(&chiffrat, &paar.privat).unwrap().is_empty());
    }

    #[test]
    fn zu_kleiner_modulus_abgelehnt() {
        let basis = Basis::neu(16).unwrap();
        let winzig = Schluessel::aus_text(basis, "ff", "3").unwrap();
        assert!(matches!(
            verschluesseln(b"x", &winzig),
            Err(CryptoError::Verschluesselung(_))
        ));
    }

    #[test]
    fn fehlerhafte_blockkodierung_abgelehnt() {
        let paar = paar(64, 16);
        assert!(matches!(
            entschluesseln("12xz", &paar.privat),
            Err(CryptoError::Entschluesselung(_))
        ));
        assert!(matches!(
            entschluesseln("12\n\n34", &paar.privat),
            Err(CryptoError::Entschluesselung(_))
        ));
    }

    #[test]
    fn block_ausserhalb_des_modulus_abgelehnt() {
        let paar = paar(64, 16);
        let zu_gross = radix::kodieren(paar.privat.modulus(), paar.privat.basis());
        let fehler = entschluesseln(&zu_gross, &paar.privat).unwrap_err();
        assert!(fehler.to_string().contains("ausserhalb"));
    }

    #[test]
    fn falscher_schluessel_liefert_nicht_den_klartext() {
        let alice = paar(128, 62);
        let bob = paar(128, 62);
        let chiffrat = verschluesseln(b"geheim", &alice.oeffentlich).unwrap();
        match entschluesseln(&chiffrat, &bob.privat) {
            Ok(klartext) => assert_ne!(klartext, b"geheim"),
            Err(e) => assert!(matches!(e, CryptoError::Entschluesselung(_))),
        }
    }
}
