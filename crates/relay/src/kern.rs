//! Relay-Kern – Handshake, Weiterleitung und Trennung
//!
//! Der Kern ist synchron und gehoert genau einem Task. Jeder Aufruf
//! verarbeitet ein einzelnes Ereignis vollstaendig, bevor das naechste
//! beginnt; Registry-Aenderungen koennen sich daher nie ueberschneiden.
//!
//! ## Zustandsautomat pro Verbindung
//! ```text
//! Verbindend -> BASE -> EXP -> DIV -> Kapazitaet -> UNAME -> Aktiv
//!      |          (jeder Schritt: Ablehnung + Schliessen)      |
//!      v                                                       v
//!  Abgelehnt                          Getrennt | Zeitueberschreitung | Fehler
//! ```

use std::collections::VecDeque;
use std::net::SocketAddr;

use tuschel_core::limits::SERVER_NAME;
use tuschel_core::VerbindungsId;
use tuschel_crypto::{Schluessel, Schluesselpaar};
use tuschel_protocol::control::{austritt_text, beitritt_text, kuerzen};
use tuschel_protocol::handshake::{self, Ablehnung};
use tuschel_protocol::payload::{verschluesselt_dekodieren_begrenzt, verschluesselt_kodieren};
use tuschel_protocol::Anwendungsnachricht;

use bytes::Bytes;

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::registry::{Registry, Sitzung};
use crate::transport::Zustellung;

/// Warum eine Sitzung beendet wurde
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Austrittsgrund {
    /// Client hat `DISCONNECT` gesendet
    Abgemeldet,
    /// Transport meldet das Ende der Verbindung
    Getrennt,
    /// Nachricht konnte nicht entschluesselt werden
    Fehler,
    /// Zu viele Heartbeats unbeantwortet
    Zeitueberschreitung,
    /// Zustellung ist fehlgeschlagen
    Zustellfehler,
}

/// Relay-Kern ueber einer austauschbaren Zustellung
pub struct RelayKern<Z: Zustellung> {
    pub(crate) registry: Registry,
    pub(crate) server_schluessel: Schluesselpaar,
    pub(crate) zustellung: Z,
    pub(crate) config: RelayConfig,
}

impl<Z: Zustellung> RelayKern<Z> {
    /// Erstellt einen Kern mit leerer Registry
    pub fn neu(server_schluessel: Schluesselpaar, zustellung: Z, config: RelayConfig) -> Self {
        Self {
            registry: Registry::neu(config.max_clients),
            server_schluessel,
            zustellung,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn zustellung(&self) -> &Z {
        &self.zustellung
    }

    pub fn zustellung_mut(&mut self) -> &mut Z {
        &mut self.zustellung
    }

    /// Oeffentlicher Server-Schluessel, wie er in der Annahme verschickt wird
    pub fn server_schluessel(&self) -> &Schluessel {
        &self.server_schluessel.oeffentlich
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Handshake
    // -----------------------------------------------------------------------

    /// Verarbeitet die erste Nachricht einer neuen Verbindung
    ///
    /// Bei Erfolg steht die Sitzung in der Registry, der Client hat den
    /// Server-Schluessel erhalten und alle anderen Sitzungen die
    /// Beitrittsmeldung. Bei einer Ablehnung erhaelt der Client die
    /// Klartext-Antwort und die Verbindung wird geschlossen.
    pub fn neue_verbindung(
        &mut self,
        id: VerbindungsId,
        adresse: SocketAddr,
        anfrage: &[u8],
    ) -> RelayResult<()> {
        let roh = String::from_utf8_lossy(anfrage);

        let schluessel = match handshake::schluessel_parsen(&roh) {
            Ok(s) => s,
            Err(a) => return Err(self.ablehnen(id, adresse, a)),
        };

        // Kapazitaet vor dem Namen pruefen
        if self.registry.ist_voll() {
            return Err(self.ablehnen(id, adresse, Ablehnung::ServerVoll));
        }

        let name = match handshake::name_parsen(&roh) {
            Ok(n) => n,
            Err(a) => return Err(self.ablehnen(id, adresse, a)),
        };
        if self.registry.name_existiert(&name) {
            return Err(self.ablehnen(id, adresse, Ablehnung::NameVergeben));
        }

        let annahme = handshake::annahme_rendern(&self.server_schluessel.oeffentlich);
        let annahme = match verschluesselt_kodieren(&annahme, &schluessel) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(verbindung = %id, fehler = %e, "Annahme nicht verschluesselbar");
                self.zustellung.schliessen(id);
                return Err(e.into());
            }
        };
        if let Err(fehler) = self.zustellung.senden(id, annahme) {
            tracing::warn!(verbindung = %id, fehler = %fehler, "Annahme nicht zustellbar");
            self.zustellung.schliessen(id);
            return Err(RelayError::Zustellung { id, fehler });
        }

        if let Err(e) = self
            .registry
            .einfuegen(Sitzung::neu(id, adresse.to_string(), name.clone(), schluessel))
        {
            self.zustellung.schliessen(id);
            return Err(e.into());
        }

        tracing::info!(
            verbindung = %id,
            peer = %adresse,
            name = %name,
            sitzungen = self.registry.anzahl(),
            "Client zugelassen"
        );

        self.nebenbei_rundsenden(SERVER_NAME, &beitritt_text(&name), Some(id))
    }

    fn ablehnen(&mut self, id: VerbindungsId, adresse: SocketAddr, grund: Ablehnung) -> RelayError {
        tracing::warn!(verbindung = %id, peer = %adresse, grund = %grund, "Handshake abgelehnt");
        if let Err(fehler) = self
            .zustellung
            .senden(id, Bytes::from_static(grund.antwort().as_bytes()))
        {
            tracing::debug!(verbindung = %id, fehler = %fehler, "Ablehnung nicht zustellbar");
        }
        self.zustellung.schliessen(id);
        RelayError::Abgelehnt(grund)
    }

    // -----------------------------------------------------------------------
    // Aktive Sitzungen
    // -----------------------------------------------------------------------

    /// Verarbeitet eine Nachricht einer aktiven Sitzung
    pub fn client_nachricht(&mut self, id: VerbindungsId, nutzlast: &[u8]) -> RelayResult<()> {
        if self.registry.finden(id).is_none() {
            return Err(RelayError::UnbekannteVerbindung(id));
        }

        // Leere Nachricht wie Verbindungsende behandeln
        if nutzlast.is_empty() {
            return self.sitzung_beenden(id, Austrittsgrund::Getrennt);
        }

        // Nur so viele Bloecke entschluesseln, wie die Nachrichtenlaenge erlaubt
        let text = match verschluesselt_dekodieren_begrenzt(
            nutzlast,
            &self.server_schluessel.privat,
            self.config.max_nachricht_laenge,
        ) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(verbindung = %id, fehler = %e, "Nachricht nicht entschluesselbar");
                self.sitzung_beenden(id, Austrittsgrund::Fehler)?;
                return Err(e.into());
            }
        };
        let text = kuerzen(&text, self.config.max_nachricht_laenge);

        match Anwendungsnachricht::klassifizieren(text) {
            Anwendungsnachricht::Trennen => self.sitzung_beenden(id, Austrittsgrund::Abgemeldet),
            Anwendungsnachricht::HeartbeatAck => {
                if let Some(sitzung) = self.registry.finden_mut(id) {
                    sitzung.verpasste_heartbeats = 0;
                }
                tracing::trace!(verbindung = %id, "Heartbeat bestaetigt");
                Ok(())
            }
            Anwendungsnachricht::Chat(chat) => {
                let absender = self
                    .registry
                    .finden(id)
                    .map(|s| s.name().to_string())
                    .ok_or(RelayError::UnbekannteVerbindung(id))?;
                tracing::debug!(verbindung = %id, name = %absender, laenge = chat.len(), "Chat-Nachricht");
                self.rundsenden(&absender, chat, None)
            }
        }
    }

    /// Der Transport meldet das Ende einer Verbindung
    pub fn verbindung_getrennt(&mut self, id: VerbindungsId) -> RelayResult<()> {
        if self.registry.finden(id).is_some() {
            self.sitzung_beenden(id, Austrittsgrund::Getrennt)
        } else {
            // Verbindung ohne abgeschlossenen Handshake
            self.zustellung.schliessen(id);
            Ok(())
        }
    }

    /// Entfernt eine Sitzung auf dem Hauptpfad und kuendigt den Austritt an
    ///
    /// Ein unbekanntes Handle wird gemeldet, ist hier aber nicht fatal.
    pub fn sitzung_beenden(&mut self, id: VerbindungsId, grund: Austrittsgrund) -> RelayResult<()> {
        let sitzung = match self.registry.entfernen(id) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(verbindung = %id, fehler = %e, "Sitzung zum Beenden nicht gefunden");
                return Err(e.into());
            }
        };
        self.zustellung.schliessen(id);

        tracing::info!(
            verbindung = %id,
            name = %sitzung.name(),
            grund = ?grund,
            sitzungen = self.registry.anzahl(),
            "Sitzung beendet"
        );

        self.nebenbei_rundsenden(SERVER_NAME, &austritt_text(sitzung.name()), None)
    }

    /// Entfernt eine Sitzung auf einem Pfad, der ihre Existenz voraussetzt
    ///
    /// Fehlt die Sitzung, ist die Registry inkonsistent (fatal).
    pub(crate) fn zwangsweise_entfernen(
        &mut self,
        id: VerbindungsId,
        grund: Austrittsgrund,
    ) -> RelayResult<Sitzung> {
        let sitzung = self.registry.entfernen(id).map_err(|grund| {
            tracing::error!(verbindung = %id, fehler = %grund, "Registry inkonsistent");
            RelayError::RegistryInkonsistent { id, grund }
        })?;
        self.zustellung.schliessen(id);

        tracing::info!(
            verbindung = %id,
            name = %sitzung.name(),
            grund = ?grund,
            sitzungen = self.registry.anzahl(),
            "Sitzung entfernt"
        );
        Ok(sitzung)
    }

    /// Broadcast, dessen Teilausfall nur protokolliert wird
    fn nebenbei_rundsenden(
        &mut self,
        absender: &str,
        text: &str,
        ausser: Option<VerbindungsId>,
    ) -> RelayResult<()> {
        match self.rundsenden(absender, text, ausser) {
            Err(e) if e.ist_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(fehler = %e, "Ankuendigung nicht an alle zugestellt");
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Kuendigt den Austritt entfernter Sitzungen an
    ///
    /// Sitzungen, die dabei selbst ausfallen, werden angehaengt und ebenfalls
    /// angekuendigt. Gibt die Anzahl fehlgeschlagener Zustellungen zurueck.
    pub(crate) fn austritte_ankuendigen(&mut self, mut austritte: VecDeque<String>) -> RelayResult<usize> {
        let mut fehlgeschlagen = 0;
        while let Some(name) = austritte.pop_front() {
            fehlgeschlagen += self.runde(SERVER_NAME, &austritt_text(&name), None, &mut austritte)?;
        }
        Ok(fehlgeschlagen)
    }
}
