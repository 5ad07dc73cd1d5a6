//! Client-Registry – Geordnete Liste aller Sitzungen
//!
//! Der erste Eintrag ist immer der Server selbst (Handle `SERVER`, Name
//! `SERVER`, Adresse `0.0.0.0`, kein Schluessel). Er wird nur fuer die
//! Absenderangabe von Ankuendigungen benutzt, nie angeschrieben und nie
//! entfernt.
//!
//! ## Invarianten
//! - Der Server-Eintrag existiert immer und steht an erster Stelle
//! - Namen sind eindeutig (inklusive `SERVER`)
//! - Die Anzahl der Client-Sitzungen ueberschreitet nie die Kapazitaet
//!
//! Entfernt wird ausschliesslich ueber `entfernen`, das die Sitzung als Wert
//! zurueckgibt. Danach existiert kein Zugriff mehr ueber die Registry.

use tuschel_core::limits::{SERVER_ADRESSE, SERVER_NAME};
use tuschel_core::VerbindungsId;
use tuschel_crypto::Schluessel;

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Sitzung
// ---------------------------------------------------------------------------

/// Eine zugelassene Verbindung mit Schluessel und Lebenszeichen-Zaehler
#[derive(Debug, Clone)]
pub struct Sitzung {
    id: VerbindungsId,
    adresse: String,
    name: String,
    schluessel: Option<Schluessel>,
    /// Heartbeats seit der letzten Bestaetigung
    pub verpasste_heartbeats: u32,
}

impl Sitzung {
    /// Erstellt eine Client-Sitzung
    pub fn neu(
        id: VerbindungsId,
        adresse: impl Into<String>,
        name: impl Into<String>,
        schluessel: Schluessel,
    ) -> Self {
        Self {
            id,
            adresse: adresse.into(),
            name: name.into(),
            schluessel: Some(schluessel),
            verpasste_heartbeats: 0,
        }
    }

    fn server() -> Self {
        Self {
            id: VerbindungsId::SERVER,
            adresse: SERVER_ADRESSE.to_string(),
            name: SERVER_NAME.to_string(),
            schluessel: None,
            verpasste_heartbeats: 0,
        }
    }

    pub fn id(&self) -> VerbindungsId {
        self.id
    }

    pub fn adresse(&self) -> &str {
        &self.adresse
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Oeffentlicher Schluessel des Clients (`None` beim Server-Eintrag)
    pub fn schluessel(&self) -> Option<&Schluessel> {
        self.schluessel.as_ref()
    }

    pub fn ist_server(&self) -> bool {
        self.id.ist_server()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Geordnete Sammlung aller Sitzungen, Server-Eintrag zuerst
#[derive(Debug)]
pub struct Registry {
    eintraege: Vec<Sitzung>,
    kapazitaet: usize,
}

impl Registry {
    /// Erstellt eine Registry, die nur den Server-Eintrag enthaelt
    pub fn neu(kapazitaet: usize) -> Self {
        let mut eintraege = Vec::with_capacity(kapazitaet + 1);
        eintraege.push(Sitzung::server());
        Self {
            eintraege,
            kapazitaet,
        }
    }

    /// Sucht eine Sitzung ueber ihr Handle
    pub fn finden(&self, id: VerbindungsId) -> Option<&Sitzung> {
        self.eintraege.iter().find(|s| s.id == id)
    }

    pub fn finden_mut(&mut self, id: VerbindungsId) -> Option<&mut Sitzung> {
        self.eintraege.iter_mut().find(|s| s.id == id)
    }

    /// Prueft ob ein Name vergeben ist (der Server-Eintrag zaehlt mit)
    pub fn name_existiert(&self, name: &str) -> bool {
        self.eintraege.iter().any(|s| s.name == name)
    }

    /// Fuegt eine Sitzung am Ende ein
    ///
    /// Schlaegt ohne Veraenderung fehl, wenn die Kapazitaet erreicht ist,
    /// der Name oder das Handle bereits vergeben ist.
    pub fn einfuegen(&mut self, sitzung: Sitzung) -> Result<(), RegistryError> {
        if sitzung.ist_server() {
            return Err(RegistryError::ServerEintrag);
        }
        if self.ist_voll() {
            return Err(RegistryError::KapazitaetErschoepft {
                max: self.kapazitaet,
            });
        }
        if self.name_existiert(&sitzung.name) {
            return Err(RegistryError::NameVergeben(sitzung.name));
        }
        if self.finden(sitzung.id).is_some() {
            return Err(RegistryError::HandleVergeben(sitzung.id));
        }

        self.eintraege.push(sitzung);
        Ok(())
    }

    /// Entfernt eine Sitzung und gibt sie zurueck
    pub fn entfernen(&mut self, id: VerbindungsId) -> Result<Sitzung, RegistryError> {
        if id.ist_server() {
            return Err(RegistryError::ServerEintrag);
        }
        let index = self
            .eintraege
            .iter()
            .position(|s| s.id == id)
            .ok_or(RegistryError::NichtGefunden(id))?;
        Ok(self.eintraege.remove(index))
    }

    /// Alle Eintraege in Reihenfolge, Server-Eintrag zuerst
    pub fn iter(&self) -> impl Iterator<Item = &Sitzung> {
        self.eintraege.iter()
    }

    /// Ruft `f` fuer jeden Eintrag auf, Server-Eintrag zuerst
    pub fn fuer_alle(&self, mut f: impl FnMut(&Sitzung)) {
        self.eintraege.iter().for_each(|s| f(s));
    }

    /// Handles aller Client-Sitzungen in Reihenfolge
    pub fn handles(&self) -> Vec<VerbindungsId> {
        self.aktive().map(Sitzung::id).collect()
    }

    /// Client-Sitzungen ohne Server-Eintrag
    pub fn aktive(&self) -> impl Iterator<Item = &Sitzung> {
        self.eintraege.iter().skip(1)
    }

    /// Anzahl der Client-Sitzungen (ohne Server-Eintrag)
    pub fn anzahl(&self) -> usize {
        self.eintraege.len() - 1
    }

    pub fn ist_voll(&self) -> bool {
        self.anzahl() >= self.kapazitaet
    }

    pub fn kapazitaet(&self) -> usize {
        self.kapazitaet
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tuschel_crypto::Basis;

    fn test_schluessel() -> Schluessel {
        Schluessel::aus_text(Basis::neu(16).unwrap(), "1F4", "11").unwrap()
    }

    fn sitzung(id: u64, name: &str) -> Sitzung {
        Sitzung::neu(VerbindungsId(id), "127.0.0.1:5000", name, test_schluessel())
    }

    #[test]
    fn neue_registry_enthaelt_nur_server() {
        let registry = Registry::neu(10);
        assert_eq!(registry.anzahl(), 0);
        assert!(registry.handles().is_empty());

        let kopf = registry.iter().next().expect("Server-Eintrag fehlt");
        assert!(kopf.ist_server());
        assert_eq!(kopf.name(), "SERVER");
        assert_eq!(kopf.adresse(), "0.0.0.0");
        assert!(kopf.schluessel().is_none());
    }

    #[test]
    fn einfuegen_und_entfernen_sind_symmetrisch() {
        let mut registry = Registry::neu(10);

        registry.einfuegen(sitzung(1, "alice")).unwrap();
        assert!(registry.name_existiert("alice"));
        assert_eq!(registry.anzahl(), 1);
        assert_eq!(registry.finden(VerbindungsId(1)).unwrap().name(), "alice");

        let entfernt = registry.entfernen(VerbindungsId(1)).unwrap();
        assert_eq!(entfernt.name(), "alice");
        assert!(!registry.name_existiert("alice"));
        assert_eq!(registry.anzahl(), 0);
        assert!(registry.finden(VerbindungsId(1)).is_none());
    }

    #[test]
    fn einfuegen_ueber_kapazitaet_veraendert_nichts() {
        let mut registry = Registry::neu(2);
        registry.einfuegen(sitzung(1, "a")).unwrap();
        registry.einfuegen(sitzung(2, "b")).unwrap();
        assert!(registry.ist_voll());

        let fehler = registry.einfuegen(sitzung(3, "c")).unwrap_err();
        assert_eq!(fehler, RegistryError::KapazitaetErschoepft { max: 2 });
        assert_eq!(registry.anzahl(), 2);
        assert!(!registry.name_existiert("c"));
        assert_eq!(registry.handles(), vec![VerbindungsId(1), VerbindungsId(2)]);
    }

    #[test]
    fn doppelter_name_wird_abgelehnt() {
        let mut registry = Registry::neu(10);
        registry.einfuegen(sitzung(1, "alice")).unwrap();

        let fehler = registry.einfuegen(sitzung(2, "alice")).unwrap_err();
        assert_eq!(fehler, RegistryError::NameVergeben("alice".into()));
        assert_eq!(registry.anzahl(), 1);
    }

    #[test]
    fn server_name_ist_vergeben() {
        let mut registry = Registry::neu(10);
        assert!(registry.name_existiert("SERVER"));
        assert!(registry.einfuegen(sitzung(1, "SERVER")).is_err());
    }

    #[test]
    fn doppeltes_handle_wird_abgelehnt() {
        let mut registry = Registry::neu(10);
        registry.einfuegen(sitzung(1, "alice")).unwrap();
        assert_eq!(
            registry.einfuegen(sitzung(1, "bob")).unwrap_err(),
            RegistryError::HandleVergeben(VerbindungsId(1))
        );
    }

    #[test]
    fn server_eintrag_ist_nicht_entfernbar() {
        let mut registry = Registry::neu(10);
        assert_eq!(
            registry.entfernen(VerbindungsId::SERVER).unwrap_err(),
            RegistryError::ServerEintrag
        );
        assert!(registry.iter().next().unwrap().ist_server());
    }

    #[test]
    fn unbekanntes_handle_entfernen() {
        let mut registry = Registry::neu(10);
        assert_eq!(
            registry.entfernen(VerbindungsId(42)).unwrap_err(),
            RegistryError::NichtGefunden(VerbindungsId(42))
        );
    }

    #[test]
    fn reihenfolge_bleibt_beim_entfernen_erhalten() {
        let mut registry = Registry::neu(10);
        for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")] {
            registry.einfuegen(sitzung(id, name)).unwrap();
        }
        registry.entfernen(VerbindungsId(2)).unwrap();

        let mut namen = Vec::new();
        registry.fuer_alle(|s| namen.push(s.name().to_string()));
        assert_eq!(namen, ["SERVER", "a", "c", "d"]);
    }

    #[test]
    fn heartbeat_zaehler_ist_veraenderbar() {
        let mut registry = Registry::neu(10);
        registry.einfuegen(sitzung(1, "alice")).unwrap();
        registry.finden_mut(VerbindungsId(1)).unwrap().verpasste_heartbeats = 2;
        assert_eq!(registry.finden(VerbindungsId(1)).unwrap().verpasste_heartbeats, 2);
    }
}
