//! Heartbeat – Periodischer Lebenszeichen-Durchlauf
//!
//! Einmal pro Periode (Standard 30 s) wird jede Sitzung geprueft:
//! - Zaehler hat das Maximum erreicht: Sitzung wird wegen
//!   Zeitueberschreitung entfernt, statt erneut angepingt zu werden
//! - sonst: verschluesseltes `HEARTBEAT` senden, Zaehler erhoehen
//! - Zustellung schlaegt fehl: Sitzung wird sofort entfernt
//!
//! Eine Bestaetigung des Clients setzt den Zaehler auf null zurueck
//! (siehe `RelayKern::client_nachricht`). Der Durchlauf laeuft als
//! gewoehnliches Ereignis im Owner-Task und wird nie unterbrochen.

use std::collections::VecDeque;

use tuschel_protocol::control::HEARTBEAT_TOKEN;
use tuschel_protocol::payload::verschluesselt_kodieren;

use crate::error::{RelayError, RelayResult};
use crate::kern::{Austrittsgrund, RelayKern};
use crate::transport::Zustellung;

impl<Z: Zustellung> RelayKern<Z> {
    /// Fuehrt einen vollstaendigen Heartbeat-Durchlauf aus
    ///
    /// Nur Registry-Inkonsistenzen werden als Fehler zurueckgegeben.
    pub fn heartbeat_runde(&mut self) -> RelayResult<()> {
        let max = self.config.max_verpasste_heartbeats;
        let mut austritte = VecDeque::new();

        for id in self.registry.handles() {
            let Some(sitzung) = self.registry.finden(id) else {
                continue;
            };

            if sitzung.verpasste_heartbeats >= max {
                tracing::info!(
                    verbindung = %id,
                    name = %sitzung.name(),
                    verpasst = sitzung.verpasste_heartbeats,
                    "Heartbeat-Timeout"
                );
                let entfernt = self.zwangsweise_entfernen(id, Austrittsgrund::Zeitueberschreitung)?;
                austritte.push_back(entfernt.name().to_string());
                continue;
            }

            let Some(schluessel) = sitzung.schluessel() else {
                continue;
            };
            let zustellung = match verschluesselt_kodieren(HEARTBEAT_TOKEN, schluessel) {
                Ok(nutzlast) => self
                    .zustellung
                    .senden(id, nutzlast)
                    .map_err(|fehler| RelayError::Zustellung { id, fehler }),
                Err(e) => Err(e.into()),
            };

            match zustellung {
                Ok(()) => {
                    if let Some(sitzung) = self.registry.finden_mut(id) {
                        sitzung.verpasste_heartbeats += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(verbindung = %id, fehler = %e, "Heartbeat nicht zustellbar");
                    let entfernt = self.zwangsweise_entfernen(id, Austrittsgrund::Zustellfehler)?;
                    austritte.push_back(entfernt.name().to_string());
                }
            }
        }

        let fehlgeschlagen = self.austritte_ankuendigen(austritte)?;
        if fehlgeschlagen > 0 {
            tracing::warn!(fehlgeschlagen, "Austrittsmeldungen nicht an alle zugestellt");
        }

        tracing::trace!(sitzungen = self.registry.anzahl(), "Heartbeat-Durchlauf beendet");
        Ok(())
    }
}
