//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt die Config-Datei):
//! - `TUSCHEL_LOG_LEVEL`: Filter-Ausdruck (z. B. `debug` oder
//!   `info,tuschel_relay=trace`), Standard: info
//! - `TUSCHEL_LOG_FORMAT`: Format (text/json), Standard: text

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Filter
pub const ENV_LOG_LEVEL: &str = "TUSCHEL_LOG_LEVEL";

/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "TUSCHEL_LOG_FORMAT";

/// Fehler beim Einrichten des Loggings
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Ungueltiger Log-Filter '{filter}': {grund}")]
    UngueltigerFilter { filter: String, grund: String },

    #[error("Ungueltiges Log-Format '{0}' (erlaubt: text, json)")]
    UngueltigesFormat(String),

    #[error("Logging bereits initialisiert: {0}")]
    BereitsInitialisiert(String),
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            anders => Err(LoggingError::UngueltigesFormat(anders.to_string())),
        }
    }
}

/// Aufgeloeste Logging-Einstellungen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEinstellungen {
    pub filter: String,
    pub format: LogFormat,
}

impl LogEinstellungen {
    /// Kombiniert Config-Werte mit optionalen Umgebungswerten
    ///
    /// Umgebungswerte haben Vorrang.
    pub fn aufloesen(
        level: &str,
        format: &str,
        env_level: Option<String>,
        env_format: Option<String>,
    ) -> Result<Self, LoggingError> {
        let filter = env_level.unwrap_or_else(|| level.to_string());
        let format = env_format.as_deref().unwrap_or(format).parse()?;

        // Filter frueh pruefen, damit Tippfehler nicht still zu "info" werden
        EnvFilter::try_new(&filter).map_err(|e| LoggingError::UngueltigerFilter {
            filter: filter.clone(),
            grund: e.to_string(),
        })?;

        Ok(Self { filter, format })
    }

    /// Liest `TUSCHEL_LOG_LEVEL` und `TUSCHEL_LOG_FORMAT` aus der Umgebung
    pub fn aus_umgebung(level: &str, format: &str) -> Result<Self, LoggingError> {
        Self::aufloesen(
            level,
            format,
            std::env::var(ENV_LOG_LEVEL).ok(),
            std::env::var(ENV_LOG_FORMAT).ok(),
        )
    }
}

/// Initialisiert das Logging-System.
///
/// `level` und `format` stammen aus der Config-Datei; die
/// Umgebungsvariablen ueberschreiben sie.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<LogEinstellungen, LoggingError> {
    let einstellungen = LogEinstellungen::aus_umgebung(level, format)?;
    let filter = EnvFilter::try_new(&einstellungen.filter).map_err(|e| {
        LoggingError::UngueltigerFilter {
            filter: einstellungen.filter.clone(),
            grund: e.to_string(),
        }
    })?;

    let ergebnis = match einstellungen.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|e| LoggingError::BereitsInitialisiert(e.to_string()))?;

    Ok(einstellungen)
}
