//! Zufaellige Primzahlen fuer die Schluessel-Erzeugung
//!
//! Kandidaten werden zuerst gegen kleine Primzahlen gesiebt und danach mit
//! dem probabilistischen Miller-Rabin-Test geprueft.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::Rng;

/// Anzahl der Miller-Rabin-Runden mit zufaelligen Zeugen
const MILLER_RABIN_RUNDEN: usize = 24;

/// Kleine Primzahlen fuer das Vorsieben
const KLEINE_PRIMZAHLEN: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Erzeugt eine zufaellige Primzahl mit genau `bits` Bit
///
/// Die beiden hoechsten Bits werden gesetzt, damit das Produkt zweier
/// solcher Primzahlen die volle Bitlaenge erreicht.
pub fn zufalls_primzahl<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    debug_assert!(bits >= 2, "Primzahlen brauchen mindestens 2 Bit");
    let hohe_bits = (BigUint::one() << (bits - 1)) | (BigUint::one() << (bits - 2));

    loop {
        let kandidat = rng.gen_biguint(bits) | &hohe_bits | BigUint::one();
        if ist_wahrscheinlich_prim(&kandidat, rng) {
            return kandidat;
        }
    }
}

/// Probabilistischer Primzahltest
pub fn ist_wahrscheinlich_prim<R: Rng + ?Sized>(n: &BigUint, rng: &mut R) -> bool {
    let zwei = BigUint::from(2u32);
    if n < &zwei {
        return false;
    }

    for p in KLEINE_PRIMZAHLEN {
        let p = BigUint::from(p);
        if n == &p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // n - 1 = d * 2^s mit ungeradem d
    let n_minus_eins = n - BigUint::one();
    let mut d = n_minus_eins.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    (0..MILLER_RABIN_RUNDEN).all(|_| {
        let zeuge = rng.gen_biguint_range(&zwei, &n_minus_eins);
        !ist_zeuge(n, &n_minus_eins, &d, s, &zeuge)
    })
}

/// Prueft ob `a` die Zusammengesetztheit von `n` bezeugt
fn ist_zeuge(n: &BigUint, n_minus_eins: &BigUint, d: &BigUint, s: u32, a: &BigUint) -> bool {
    let mut x = a.modpow(d, n);
    if x.is_one() || &x == n_minus_eins {
        return false;
    }
    for _ in 1..s {
        x = (&x * &x) % n;
        if &x == n_minus_eins {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bekannte_primzahlen_erkannt() {
        let mut rng = rand::thread_rng();
        for p in [2u64, 3, 5, 97, 101, 7919, 104_729, 2_147_483_647] {
            assert!(ist_wahrscheinlich_prim(&BigUint::from(p), &mut rng), "{p} ist prim");
        }
    }

    #[test]
    fn zusammengesetzte_zahlen_erkannt() {
        let mut rng = rand::thread_rng();
        // 561 und 41041 sind Carmichael-Zahlen
        for n in [0u64, 1, 4, 100, 561, 41_041, 7919 * 104_729] {
            assert!(!ist_wahrscheinlich_prim(&BigUint::from(n), &mut rng), "{n} ist nicht prim");
        }
    }

    #[test]
    fn primzahl_hat_gewuenschte_bitlaenge() {
        let mut rng = rand::thread_rng();
        for bits in [8u64, 16, 64, 128] {
            let p = zufalls_primzahl(bits, &mut rng);
            assert_eq!(p.bits(), bits);
            assert!(p.is_odd());
        }
    }
}
