//! Client-seitige TCP-Verbindung zum Relay
//!
//! Nutzt den `FrameCodec` aus tuschel-protocol fuer das Wire-Format
//! (u32 BE length + Nutzlast). Alle Operationen sind async.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tuschel_crypto::{schluesselpaar_erzeugen, Schluessel, Schluesselpaar};
use tuschel_protocol::control::{HEARTBEAT_TOKEN, TRENNEN_TOKEN};
use tuschel_protocol::handshake::{anfrage_rendern, annahme_parsen};
use tuschel_protocol::payload::{verschluesselt_dekodieren, verschluesselt_kodieren};
use tuschel_protocol::{Ablehnung, FrameCodec, ProtokollError};

use crate::error::{ClientError, ClientResult};

/// Entschluesselte Nachricht vom Server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eingang {
    /// Lebenszeichen-Anfrage, muss bestaetigt werden
    Heartbeat,
    /// Broadcast-Zeile `(HH:MM:SS) absender: text`
    Zeile(String),
}

/// Zugelassene Verbindung zum Relay
pub struct ChatClient {
    /// Framed TCP-Stream mit FrameCodec
    framed: Framed<TcpStream, FrameCodec>,
    /// Eigenes Schluesselpaar (privat zum Entschluesseln)
    schluessel: Schluesselpaar,
    /// Oeffentlicher Server-Schluessel aus der Annahme
    server_schluessel: Schluessel,
    name: String,
}

impl ChatClient {
    /// Baut eine Verbindung auf und fuehrt den Handshake durch
    ///
    /// # Fehler
    /// `Abgelehnt` mit dem genauen Grund, wenn der Server ablehnt.
    pub async fn verbinden<A: ToSocketAddrs>(
        adresse: A,
        name: &str,
        schluessel: Schluesselpaar,
    ) -> ClientResult<Self> {
        let stream = TcpStream::connect(adresse).await?;
        let mut framed = Framed::new(stream, FrameCodec::new());

        let anfrage = anfrage_rendern(&schluessel.oeffentlich, name);
        framed.send(Bytes::from(anfrage)).await?;

        let antwort = match framed.next().await {
            Some(frame) => frame?,
            None => return Err(ClientError::VerbindungGetrennt),
        };

        // Ablehnungen kommen im Klartext
        if let Some(grund) = Ablehnung::aus_antwort(&antwort) {
            tracing::warn!(name = %name, grund = %grund, "Handshake abgelehnt");
            return Err(ClientError::Abgelehnt(grund));
        }

        let annahme = verschluesselt_dekodieren(&antwort, &schluessel.privat)?;
        let server_schluessel = annahme_parsen(&annahme).map_err(ProtokollError::from)?;

        tracing::info!(name = %name, basis = %server_schluessel.basis(), "Mit Relay verbunden");

        Ok(Self {
            framed,
            schluessel,
            server_schluessel,
            name: name.to_string(),
        })
    }

    /// Erzeugt ein neues Schluesselpaar und verbindet sich damit
    pub async fn verbinden_mit_neuem_schluessel<A: ToSocketAddrs>(
        adresse: A,
        name: &str,
        bits: u64,
        basis: u32,
    ) -> ClientResult<Self> {
        let schluessel = schluesselpaar_erzeugen(bits, basis)?;
        Self::verbinden(adresse, name, schluessel).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_schluessel(&self) -> &Schluessel {
        &self.server_schluessel
    }

    /// Sendet einen Text verschluesselt an den Server
    pub async fn senden(&mut self, text: &str) -> ClientResult<()> {
        let nutzlast = verschluesselt_kodieren(text, &self.server_schluessel)?;
        self.framed.send(nutzlast).await?;
        Ok(())
    }

    /// Wartet auf die naechste Nachricht vom Server
    pub async fn empfangen(&mut self) -> ClientResult<Eingang> {
        let frame = match self.framed.next().await {
            Some(frame) => frame?,
            None => return Err(ClientError::VerbindungGetrennt),
        };

        let text = verschluesselt_dekodieren(&frame, &self.schluessel.privat)?;
        if text == HEARTBEAT_TOKEN {
            Ok(Eingang::Heartbeat)
        } else {
            Ok(Eingang::Zeile(text))
        }
    }

    /// Wartet auf die naechste Zeile und beantwortet Heartbeats automatisch
    pub async fn naechste_zeile(&mut self) -> ClientResult<String> {
        loop {
            match self.empfangen().await? {
                Eingang::Heartbeat => self.heartbeat_bestaetigen().await?,
                Eingang::Zeile(zeile) => return Ok(zeile),
            }
        }
    }

    /// Bestaetigt einen Heartbeat
    pub async fn heartbeat_bestaetigen(&mut self) -> ClientResult<()> {
        tracing::trace!(name = %self.name, "Heartbeat bestaetigt");
        self.senden(HEARTBEAT_TOKEN).await
    }

    /// Meldet sich ab und schliesst die Verbindung
    pub async fn trennen(mut self) -> ClientResult<()> {
        self.senden(TRENNEN_TOKEN).await?;
        self.framed.close().await?;
        tracing::info!(name = %self.name, "Vom Relay getrennt");
        Ok(())
    }
}
