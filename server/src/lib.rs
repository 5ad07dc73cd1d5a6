//! tuschel-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use tokio::sync::watch;
use tuschel_crypto::schluesselpaar_erzeugen;
use tuschel_relay::RelayServer;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Erzeugt das Server-Schluesselpaar und bindet den TCP-Listener
    pub async fn vorbereiten(&self) -> Result<RelayServer> {
        let bits = self.config.krypto.schluessel_bits;
        let basis = self.config.krypto.basis;

        tracing::info!(bits, basis, "Server-Schluesselpaar wird erzeugt");
        let schluessel = tokio::task::spawn_blocking(move || schluesselpaar_erzeugen(bits, basis))
            .await
            .context("Schluesselerzeugung abgebrochen")?
            .context("Schluesselerzeugung fehlgeschlagen")?;

        let adresse = self.config.socket_adresse()?;
        let relay = RelayServer::binden(adresse, schluessel, self.config.relay_config())
            .await
            .with_context(|| format!("TCP-Listener auf {adresse} nicht bindbar"))?;
        Ok(relay)
    }

    /// Startet den Relay und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Schluesselpaar erzeugen
    /// 2. TCP-Listener binden
    /// 3. Owner-Loop starten
    /// 4. Auf Ctrl-C warten
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            tcp = %self.config.tcp_bind_adresse(),
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let relay = self.vorbereiten().await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => tracing::error!(fehler = %e, "Ctrl-C-Handler nicht installierbar"),
            }
        });

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        relay.starten(shutdown_rx).await?;
        Ok(())
    }
}
