//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tuschel_core::limits;
use tuschel_crypto::schluessel::{MAX_SCHLUESSEL_BITS, MIN_SCHLUESSEL_BITS};
use tuschel_relay::config::{RelayConfig, SENDE_QUEUE_GROESSE};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Relay-Einstellungen (Kapazitaet, Heartbeat, Nachrichten)
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Schluessel des Servers
    pub krypto: KryptoEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Relay-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Maximale Anzahl gleichzeitiger Clients
    pub max_clients: usize,
    /// Heartbeat-Periode in Sekunden
    pub heartbeat_sek: u64,
    /// Verpasste Heartbeats bis zur Trennung
    pub max_verpasste_heartbeats: u32,
    /// Maximale Laenge einer Chat-Nachricht in Bytes
    pub max_nachricht_laenge: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            max_clients: limits::MAX_CLIENTS,
            heartbeat_sek: limits::HEARTBEAT_INTERVALL.as_secs(),
            max_verpasste_heartbeats: limits::MAX_VERPASSTE_HEARTBEATS,
            max_nachricht_laenge: limits::MAX_NACHRICHT_LAENGE,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den TCP-Listener
    pub bind_adresse: String,
    /// TCP-Port
    pub port: u16,
    /// Maximale Frame-Groesse in Bytes
    pub max_frame_groesse: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: limits::SERVER_ADRESSE.into(),
            port: limits::STANDARD_PORT,
            max_frame_groesse: RelayConfig::default().max_frame_groesse,
        }
    }
}

/// Schluessel-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KryptoEinstellungen {
    /// Bitlaenge des Server-Modulus
    pub schluessel_bits: u64,
    /// Zahlenbasis fuer die Textdarstellung (2 bis 62)
    pub basis: u32,
}

impl Default for KryptoEinstellungen {
    fn default() -> Self {
        Self {
            schluessel_bits: limits::SCHLUESSEL_BITS,
            basis: limits::SCHLUESSEL_BASIS,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Filter: "trace", "debug", "info", "warn", "error" oder Direktiven
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.pruefen()?;
        Ok(config)
    }

    /// Prueft Werte, mit denen der Relay nicht laufen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if self.server.max_clients == 0 {
            bail!("server.max_clients muss mindestens 1 sein");
        }
        if self.server.heartbeat_sek == 0 {
            bail!("server.heartbeat_sek muss mindestens 1 sein");
        }
        if self.server.max_nachricht_laenge == 0 {
            bail!("server.max_nachricht_laenge muss mindestens 1 sein");
        }
        if !(2..=62).contains(&self.krypto.basis) {
            bail!("krypto.basis {} liegt nicht zwischen 2 und 62", self.krypto.basis);
        }
        if !(MIN_SCHLUESSEL_BITS..=MAX_SCHLUESSEL_BITS).contains(&self.krypto.schluessel_bits) {
            bail!(
                "krypto.schluessel_bits {} liegt nicht zwischen {MIN_SCHLUESSEL_BITS} und {MAX_SCHLUESSEL_BITS}",
                self.krypto.schluessel_bits
            );
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse fuer TCP zurueck
    pub fn tcp_bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Bind-Adresse als `SocketAddr`
    pub fn socket_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = self.tcp_bind_adresse();
        adresse
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{adresse}'"))
    }

    /// Konfiguration fuer den Relay-Kern
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            max_clients: self.server.max_clients,
            heartbeat_intervall: Duration::from_secs(self.server.heartbeat_sek),
            max_verpasste_heartbeats: self.server.max_verpasste_heartbeats,
            max_nachricht_laenge: self.server.max_nachricht_laenge,
            max_frame_groesse: self.netzwerk.max_frame_groesse,
            sende_queue_groesse: SENDE_QUEUE_GROESSE,
        }
    }
}
