//! Schluessel und Schluesselpaar-Erzeugung
//!
//! Ein Schluessel besteht aus Modulus und Exponent. Oeffentlicher und privater
//! Schluessel teilen sich den Modulus und unterscheiden sich nur im Exponenten.
//! Die `Basis` legt fest, in welcher Zahlenbasis die Felder als Text auf dem
//! Draht dargestellt werden; sie ist Eigenschaft des Schluessels, nicht global.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;

use crate::error::{CryptoError, CryptoResult};
use crate::prim::zufalls_primzahl;
use crate::radix;

/// Kleinste erlaubte Modulus-Laenge in Bit
pub const MIN_SCHLUESSEL_BITS: u64 = 16;

/// Groesste erlaubte Modulus-Laenge in Bit
pub const MAX_SCHLUESSEL_BITS: u64 = 8192;

/// Bevorzugter oeffentlicher Exponent
const STANDARD_EXPONENT: u32 = 65_537;

/// Maximale Anzahl an Versuchen bis zur Aufgabe
const MAX_VERSUCHE: usize = 64;

// ---------------------------------------------------------------------------
// Basis
// ---------------------------------------------------------------------------

/// Zahlenbasis fuer die Textdarstellung (2 bis 62)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Basis(u32);

impl Basis {
    pub const MIN: u32 = 2;
    pub const MAX: u32 = 62;

    /// Erstellt eine validierte Basis
    pub fn neu(wert: u32) -> CryptoResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&wert) {
            Ok(Self(wert))
        } else {
            Err(CryptoError::UngueltigeBasis(wert))
        }
    }

    pub fn wert(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Schluessel
// ---------------------------------------------------------------------------

/// Ein oeffentlicher oder privater Schluessel
///
/// Unveraenderlich nach der Erzeugung.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schluessel {
    basis: Basis,
    modulus: BigUint,
    exponent: BigUint,
}

impl Schluessel {
    /// Erstellt einen Schluessel aus seinen Bestandteilen
    ///
    /// Modulus und Exponent muessen ungleich null sein.
    pub fn neu(basis: Basis, modulus: BigUint, exponent: BigUint) -> CryptoResult<Self> {
        if modulus.is_zero() {
            return Err(CryptoError::UngueltigerSchluessel("Modulus ist null".into()));
        }
        if exponent.is_zero() {
            return Err(CryptoError::UngueltigerSchluessel("Exponent ist null".into()));
        }
        Ok(Self {
            basis,
            modulus,
            exponent,
        })
    }

    /// Erstellt einen Schluessel aus der Textdarstellung seiner Felder
    pub fn aus_text(basis: Basis, modulus: &str, exponent: &str) -> CryptoResult<Self> {
        Self::neu(
            basis,
            radix::dekodieren(modulus, basis)?,
            radix::dekodieren(exponent, basis)?,
        )
    }

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }

    /// Modulus in der Basis des Schluessels
    pub fn modulus_text(&self) -> String {
        radix::kodieren(&self.modulus, self.basis)
    }

    /// Exponent in der Basis des Schluessels
    pub fn exponent_text(&self) -> String {
        radix::kodieren(&self.exponent, self.basis)
    }

    /// Bitlaenge des Modulus
    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }
}

/// Zusammengehoeriges Paar aus oeffentlichem und privatem Schluessel
#[derive(Debug, Clone)]
pub struct Schluesselpaar {
    pub oeffentlich: Schluessel,
    pub privat: Schluessel,
}

/// Erzeugt ein Schluesselpaar mit einem Modulus von `bits` Bit
///
/// # Fehler
/// `SchluesselGenerierung` wenn Bitlaenge oder Basis ausserhalb des gueltigen
/// Bereichs liegen oder nach mehreren Versuchen kein gueltiges Paar entsteht.
pub fn schluesselpaar_erzeugen(bits: u64, basis: u32) -> CryptoResult<Schluesselpaar> {
    if !(MIN_SCHLUESSEL_BITS..=MAX_SCHLUESSEL_BITS).contains(&bits) {
        return Err(CryptoError::SchluesselGenerierung(format!(
            "Bitlaenge {bits} ausserhalb von {MIN_SCHLUESSEL_BITS}..={MAX_SCHLUESSEL_BITS}"
        )));
    }
    let basis = Basis::neu(basis)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    let mut rng = OsRng;
    let p_bits = bits / 2;
    let q_bits = bits - p_bits;

    for versuch in 1..=MAX_VERSUCHE {
        let p = zufalls_primzahl(p_bits, &mut rng);
        let q = zufalls_primzahl(q_bits, &mut rng);
        if p == q {
            continue;
        }

        let modulus = &p * &q;
        let phi = (&p - BigUint::one()) * (&q - BigUint::one());

        let Some(e) = oeffentlichen_exponenten_waehlen(&phi) else {
            tracing::debug!(versuch, "Kein teilerfremder Exponent gefunden, neuer Versuch");
            continue;
        };
        let Some(d) = e.modinv(&phi) else {
            continue;
        };

        tracing::debug!(bits, basis = %basis, versuch, "Schluesselpaar erzeugt");
        return Ok(Schluesselpaar {
            oeffentlich: Schluessel::neu(basis, modulus.clone(), e)?,
            privat: Schluessel::neu(basis, modulus, d)?,
        });
    }

    Err(CryptoError::SchluesselGenerierung(format!(
        "kein gueltiges Paar nach {MAX_VERSUCHE} Versuchen"
    )))
}

/// Sucht einen zu `phi` teilerfremden Exponenten, beginnend bei 65537
fn oeffentlichen_exponenten_waehlen(phi: &BigUint) -> Option<BigUint> {
    let start = BigUint::from(STANDARD_EXPONENT);
    let mut e = if &start < phi { start } else { BigUint::from(3u32) };

    while &e < phi {
        if e.gcd(phi).is_one() {
            return Some(e);
        }
        e += 2u32;
    }
    None
}
