//! Broadcast – Verteilt eine Zeile an alle aktiven Sitzungen
//!
//! Jede Zeile wird pro Empfaenger mit dessen Schluessel verschluesselt und
//! zugestellt. Eine fehlgeschlagene Zustellung haelt den Durchlauf nicht auf:
//! die betroffene Sitzung wird entfernt, die uebrigen erhalten die Zeile
//! trotzdem. Danach wird der Austritt der entfernten Sitzungen angekuendigt.

use std::collections::VecDeque;

use chrono::Local;
use tuschel_core::VerbindungsId;
use tuschel_protocol::control::broadcast_zeile;
use tuschel_protocol::payload::verschluesselt_kodieren;

use crate::error::{RelayError, RelayResult};
use crate::kern::{Austrittsgrund, RelayKern};
use crate::transport::Zustellung;

impl<Z: Zustellung> RelayKern<Z> {
    /// Sendet `absender: text` mit Zeitstempel an alle Sitzungen
    ///
    /// `ausser` wird uebersprungen (z. B. der gerade beigetretene Client).
    ///
    /// # Fehler
    /// - `BroadcastTeilweise` wenn mindestens eine Zustellung fehlschlug;
    ///   der Durchlauf wurde trotzdem vollstaendig ausgefuehrt
    /// - `RegistryInkonsistent` (fatal) wenn eine ausgefallene Sitzung nicht
    ///   mehr entfernt werden konnte
    pub fn rundsenden(
        &mut self,
        absender: &str,
        text: &str,
        ausser: Option<VerbindungsId>,
    ) -> RelayResult<()> {
        let mut austritte = VecDeque::new();
        let mut fehlgeschlagen = self.runde(absender, text, ausser, &mut austritte)?;
        fehlgeschlagen += self.austritte_ankuendigen(austritte)?;

        if fehlgeschlagen > 0 {
            Err(RelayError::BroadcastTeilweise { fehlgeschlagen })
        } else {
            Ok(())
        }
    }

    /// Ein einzelner Durchlauf ueber alle Sitzungen
    ///
    /// Namen ausgefallener Sitzungen werden an `austritte` angehaengt.
    pub(crate) fn runde(
        &mut self,
        absender: &str,
        text: &str,
        ausser: Option<VerbindungsId>,
        austritte: &mut VecDeque<String>,
    ) -> RelayResult<usize> {
        let zeile = broadcast_zeile(Local::now().time(), absender, text);
        let mut fehlgeschlagen = 0;

        // Schnappschuss, waehrend des Durchlaufs wird evtl. entfernt
        for id in self.registry.handles() {
            if Some(id) == ausser {
                continue;
            }
            let Some(schluessel) = self.registry.finden(id).and_then(|s| s.schluessel()) else {
                continue;
            };

            let zustellung = match verschluesselt_kodieren(&zeile, schluessel) {
                Ok(nutzlast) => self
                    .zustellung
                    .senden(id, nutzlast)
                    .map_err(|fehler| RelayError::Zustellung { id, fehler }),
                Err(e) => Err(e.into()),
            };

            if let Err(e) = zustellung {
                tracing::warn!(verbindung = %id, fehler = %e, "Broadcast-Zustellung fehlgeschlagen");
                fehlgeschlagen += 1;
                let sitzung = self.zwangsweise_entfernen(id, Austrittsgrund::Zustellfehler)?;
                austritte.push_back(sitzung.name().to_string());
            }
        }

        Ok(fehlgeschlagen)
    }
}
