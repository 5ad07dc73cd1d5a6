//! # tuschel-observability
//!
//! Structured Logging fuer das Tuschel-Relay via tracing-subscriber,
//! wahlweise als Text oder JSON.

pub mod logging;

pub use logging::{logging_initialisieren, LogEinstellungen, LogFormat, LoggingError};
