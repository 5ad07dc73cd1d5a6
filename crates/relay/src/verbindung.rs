//! Verbindungs-Tasks – Lesen und Schreiben einer TCP-Verbindung
//!
//! Jede Verbindung bekommt zwei tokio-Tasks:
//! - Lese-Task: liest Frames via `FrameCodec` und meldet sie als `Ereignis`
//!   an den Owner-Task; am Ende folgt immer `Ereignis::Getrennt`
//! - Schreib-Task: schreibt Nutzlasten aus der Send-Queue als Frames
//!
//! Die Tasks kennen weder Registry noch Schluessel.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tuschel_core::VerbindungsId;
use tuschel_protocol::FrameCodec;

/// Meldung eines Lese-Tasks an den Owner-Task
#[derive(Debug)]
pub enum Ereignis {
    /// Ein vollstaendiger Frame wurde empfangen
    Frame { id: VerbindungsId, nutzlast: Bytes },
    /// Gegenseite hat geschlossen oder der Transport ist fehlgeschlagen
    Getrennt { id: VerbindungsId },
}

/// Startet Lese- und Schreib-Task fuer eine neue Verbindung
///
/// Gibt die Send-Queue und das Abort-Handle des Lese-Tasks zurueck.
pub fn verbindung_starten(
    id: VerbindungsId,
    stream: TcpStream,
    ereignisse: mpsc::Sender<Ereignis>,
    max_frame_groesse: usize,
    queue_groesse: usize,
) -> (mpsc::Sender<Bytes>, AbortHandle) {
    let (lesen, schreiben) = stream.into_split();
    let (tx, rx) = mpsc::channel(queue_groesse);

    tokio::spawn(schreiben_loop(
        id,
        FramedWrite::new(schreiben, FrameCodec::with_max_size(max_frame_groesse)),
        rx,
    ));
    let leser = tokio::spawn(lesen_loop(
        id,
        FramedRead::new(lesen, FrameCodec::with_max_size(max_frame_groesse)),
        ereignisse,
    ));

    (tx, leser.abort_handle())
}

async fn lesen_loop(
    id: VerbindungsId,
    mut framed: FramedRead<OwnedReadHalf, FrameCodec>,
    ereignisse: mpsc::Sender<Ereignis>,
) {
    while let Some(frame) = framed.next().await {
        match frame {
            Ok(nutzlast) => {
                if ereignisse.send(Ereignis::Frame { id, nutzlast }).await.is_err() {
                    // Owner-Task beendet
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(verbindung = %id, fehler = %e, "Frame-Fehler");
                break;
            }
        }
    }

    tracing::debug!(verbindung = %id, "Lese-Task beendet");
    let _ = ereignisse.send(Ereignis::Getrennt { id }).await;
}

async fn schreiben_loop(
    id: VerbindungsId,
    mut framed: FramedWrite<OwnedWriteHalf, FrameCodec>,
    mut rx: mpsc::Receiver<Bytes>,
) {
    while let Some(nutzlast) = rx.recv().await {
        if let Err(e) = framed.send(nutzlast).await {
            tracing::warn!(verbindung = %id, fehler = %e, "Senden fehlgeschlagen");
            return;
        }
    }

    // Queue geschlossen: Schreibseite sauber beenden
    let _ = framed.close().await;
    tracing::debug!(verbindung = %id, "Schreib-Task beendet");
}
