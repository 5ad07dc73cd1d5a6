//! Tests fuer den Relay-Kern ueber eine aufzeichnende Zustellung

mod broadcast_tests;
