//! Verschluesselte Anwendungsnachrichten
//!
//! Nach dem Handshake ist jede Frame-Nutzlast ein Chiffrat: Bloecke in der
//! Basis des Empfaenger-Schluessels, getrennt durch `BLOCK_TRENNER`.

use bytes::Bytes;
use tuschel_crypto::{entschluesseln, max_klartext_bytes, radix, verschluesseln, Schluessel, BLOCK_TRENNER};

use crate::error::{ProtokollError, ProtokollResult};

/// Verschluesselt einen Text fuer den Inhaber von `schluessel`
pub fn verschluesselt_kodieren(text: &str, schluessel: &Schluessel) -> ProtokollResult<Bytes> {
    let chiffrat = verschluesseln(text.as_bytes(), schluessel)?;
    Ok(Bytes::from(chiffrat))
}

/// Entschluesselt eine empfangene Nutzlast
///
/// Ungueltiges UTF-8 im Klartext wird ersetzt statt abgelehnt.
pub fn verschluesselt_dekodieren(nutzlast: &[u8], schluessel: &Schluessel) -> ProtokollResult<String> {
    let chiffrat = std::str::from_utf8(nutzlast).map_err(|_| ProtokollError::UngueltigesChiffrat)?;
    let klartext = entschluesseln(chiffrat, schluessel)?;
    Ok(String::from_utf8_lossy(&klartext).into_owned())
}

/// Entschluesselt hoechstens so viele Bloecke, wie fuer `max_klartext`
/// Bytes noetig sind
///
/// Weitere Bloecke werden ungelesen verworfen. Ein Block mit mehr Stellen als
/// der Modulus gilt als `UngueltigesChiffrat`, ohne dekodiert zu werden.
pub fn verschluesselt_dekodieren_begrenzt(
    nutzlast: &[u8],
    schluessel: &Schluessel,
    max_klartext: usize,
) -> ProtokollResult<String> {
    let breite = max_klartext_bytes(schluessel);
    if breite == 0 {
        return verschluesselt_dekodieren(nutzlast, schluessel);
    }
    let max_bloecke = max_klartext.div_ceil(breite).max(1);
    let max_stellen = radix::kodieren(schluessel.modulus(), schluessel.basis()).len();

    let mut ende = 0;
    for (index, block) in nutzlast.split(|b| *b == BLOCK_TRENNER as u8).enumerate() {
        if index == max_bloecke {
            break;
        }
        if block.len() > max_stellen {
            return Err(ProtokollError::UngueltigesChiffrat);
        }
        // Trenner vor dem Block mitzaehlen
        ende += block.len() + usize::from(index > 0);
    }

    verschluesselt_dekodieren(&nutzlast[..ende], schluessel)
}
