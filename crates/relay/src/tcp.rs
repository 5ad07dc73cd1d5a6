//! TCP-Listener und Owner-Loop
//!
//! Der `RelayServer` bindet einen TCP-Socket und besitzt den `RelayKern`.
//! Eine einzige `tokio::select!`-Schleife verarbeitet nacheinander:
//! - neue Verbindungen (Lese-/Schreib-Task starten, Handshake abwarten)
//! - Frames und Trennungen aus den Lese-Tasks
//! - den Heartbeat-Tick
//! - das Shutdown-Signal
//!
//! Da nur diese Schleife den Kern anfasst, braucht die Registry keine
//! Sperren. Ein fataler Fehler des Kerns beendet die Schleife.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tuschel_core::{VerbindungsId, VerbindungsIdGenerator};
use tuschel_crypto::Schluesselpaar;

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::kern::RelayKern;
use crate::transport::{KanalZustellung, Zustellung};
use crate::verbindung::{verbindung_starten, Ereignis};

/// Groesse der Ereignis-Queue von den Lese-Tasks zum Owner-Task
const EREIGNIS_QUEUE_GROESSE: usize = 256;

/// TCP-Relay-Server
pub struct RelayServer {
    listener: TcpListener,
    kern: RelayKern<KanalZustellung>,
}

impl RelayServer {
    /// Bindet den TCP-Socket
    pub async fn binden(
        adresse: SocketAddr,
        server_schluessel: Schluesselpaar,
        config: RelayConfig,
    ) -> RelayResult<Self> {
        let listener = TcpListener::bind(adresse).await?;
        let kern = RelayKern::neu(server_schluessel, KanalZustellung::neu(), config);
        Ok(Self { listener, kern })
    }

    /// Tatsaechlich gebundene Adresse (relevant bei Port 0)
    pub fn lokale_adresse(&self) -> RelayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Startet die Owner-Loop
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt oder ein fataler
    /// Fehler auftritt.
    pub async fn starten(mut self, mut shutdown_rx: watch::Receiver<bool>) -> RelayResult<()> {
        let lokale_addr = self.listener.local_addr()?;
        let periode = self.kern.config().heartbeat_intervall;

        let (ereignis_tx, mut ereignis_rx) = mpsc::channel::<Ereignis>(EREIGNIS_QUEUE_GROESSE);
        let mut ids = VerbindungsIdGenerator::neu();
        // Verbindungen ohne abgeschlossenen Handshake
        let mut wartend: HashMap<VerbindungsId, Wartend> = HashMap::new();

        let mut heartbeat = interval_at(Instant::now() + periode, periode);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            adresse = %lokale_addr,
            max_clients = self.kern.config().max_clients,
            heartbeat_sek = periode.as_secs(),
            "TCP Relay-Server gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let id = ids.naechste();
                            tracing::debug!(verbindung = %id, peer = %peer_addr, "Verbindung akzeptiert");

                            let config = self.kern.config();
                            let (tx, leser) = verbindung_starten(
                                id,
                                stream,
                                ereignis_tx.clone(),
                                config.max_frame_groesse,
                                config.sende_queue_groesse,
                            );
                            self.kern.zustellung_mut().registrieren(id, tx, leser);
                            wartend.insert(id, Wartend { peer_addr, seit: Instant::now() });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Frames und Trennungen aus den Lese-Tasks
                Some(ereignis) = ereignis_rx.recv() => {
                    let ergebnis = match ereignis {
                        Ereignis::Frame { id, nutzlast } => match wartend.remove(&id) {
                            Some(w) => self.kern.neue_verbindung(id, w.peer_addr, &nutzlast),
                            None => self.kern.client_nachricht(id, &nutzlast),
                        },
                        Ereignis::Getrennt { id } => {
                            wartend.remove(&id);
                            self.kern.verbindung_getrennt(id)
                        }
                    };
                    ergebnis_pruefen(ergebnis)?;
                }

                // Heartbeat-Durchlauf
                _ = heartbeat.tick() => {
                    wartende_schliessen(&mut wartend, self.kern.zustellung_mut(), Instant::now(), periode);
                    ergebnis_pruefen(self.kern.heartbeat_runde())?;
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Relay-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(
            sitzungen = self.kern.registry().anzahl(),
            "TCP Relay-Server gestoppt"
        );
        Ok(())
    }
}

/// Verbindung, deren Handshake-Frame noch aussteht
#[derive(Debug, Clone, Copy)]
struct Wartend {
    peer_addr: SocketAddr,
    seit: Instant,
}

/// Schliesst Verbindungen, die laenger als `frist` keinen Handshake gesendet
/// haben. Gibt die Anzahl geschlossener Verbindungen zurueck.
fn wartende_schliessen<Z: Zustellung>(
    wartend: &mut HashMap<VerbindungsId, Wartend>,
    zustellung: &mut Z,
    jetzt: Instant,
    frist: Duration,
) -> usize {
    let abgelaufen: Vec<VerbindungsId> = wartend
        .iter()
        .filter(|(_, w)| jetzt.saturating_duration_since(w.seit) >= frist)
        .map(|(id, _)| *id)
        .collect();

    for id in &abgelaufen {
        if let Some(w) = wartend.remove(id) {
            tracing::info!(verbindung = %id, peer = %w.peer_addr, "Kein Handshake innerhalb der Frist, Verbindung geschlossen");
        }
        zustellung.schliessen(*id);
    }
    abgelaufen.len()
}

/// Nicht-fatale Fehler wurden bereits protokolliert und betreffen nur eine
/// Verbindung; fatale beenden die Owner-Loop.
fn ergebnis_pruefen(ergebnis: RelayResult<()>) -> RelayResult<()> {
    match ergebnis {
        Ok(()) => Ok(()),
        Err(e) if e.ist_fatal() => {
            tracing::error!(fehler = %e, "Fataler Fehler im Relay-Kern");
            Err(e)
        }
        Err(RelayError::UnbekannteVerbindung(id)) => {
            tracing::debug!(verbindung = %id, "Nachricht nach Trennung verworfen");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(fehler = %e, "Ereignis mit Fehler verarbeitet");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mock::TestZustellung;

    fn wartend_seit(seit: Instant) -> Wartend {
        Wartend {
            peer_addr: "127.0.0.1:4000".parse().unwrap(),
            seit,
        }
    }

    #[test]
    fn nur_abgelaufene_handshakes_werden_geschlossen() {
        let start = Instant::now();
        let frist = Duration::from_secs(30);
        let mut wartend = HashMap::new();
        wartend.insert(VerbindungsId(1), wartend_seit(start));
        wartend.insert(VerbindungsId(2), wartend_seit(start + Duration::from_secs(20)));
        let mut zustellung = TestZustellung::default();

        let geschlossen = wartende_schliessen(&mut wartend, &mut zustellung, start + frist, frist);

        assert_eq!(geschlossen, 1);
        assert_eq!(zustellung.geschlossen, vec![VerbindungsId(1)]);
        assert!(wartend.contains_key(&VerbindungsId(2)));
        assert!(!wartend.contains_key(&VerbindungsId(1)));
    }

    #[test]
    fn keine_wartenden_nichts_zu_tun() {
        let mut wartend = HashMap::new();
        let mut zustellung = TestZustellung::default();
        let jetzt = Instant::now();
        assert_eq!(
            wartende_schliessen(&mut wartend, &mut zustellung, jetzt, Duration::from_secs(1)),
            0
        );
        assert!(zustellung.geschlossen.is_empty());
    }
}
