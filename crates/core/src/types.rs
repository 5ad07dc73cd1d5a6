//! Identifikationstypen fuer Tuschel
//!
//! Verbindungen werden ueber ein Newtype-Handle identifiziert, damit sie
//! zur Compilezeit nicht mit anderen Zaehlern verwechselt werden koennen.

/// Handle einer Transport-Verbindung
///
/// Das Handle `0` ist fuer den Server selbst (Kopf-Eintrag der Registry)
/// reserviert, Client-Verbindungen beginnen bei `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerbindungsId(pub u64);

impl VerbindungsId {
    /// Handle des Server-Eintrags
    pub const SERVER: VerbindungsId = VerbindungsId(0);

    /// Gibt den inneren Zaehlerwert zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }

    /// Prueft ob es sich um das Server-Handle handelt
    pub fn ist_server(&self) -> bool {
        *self == Self::SERVER
    }
}

impl std::fmt::Display for VerbindungsId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verbindung:{}", self.0)
    }
}

/// Vergibt fortlaufende Verbindungs-Handles
#[derive(Debug)]
pub struct VerbindungsIdGenerator {
    naechste: u64,
}

impl VerbindungsIdGenerator {
    pub fn neu() -> Self {
        Self { naechste: 1 }
    }

    /// Liefert das naechste freie Handle
    pub fn naechste(&mut self) -> VerbindungsId {
        let id = VerbindungsId(self.naechste);
        self.naechste = self.naechste.wrapping_add(1).max(1);
        id
    }
}

impl Default for VerbindungsIdGenerator {
    fn default() -> Self {
        Self::neu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_beginnt_nach_server_handle() {
        let mut generator = VerbindungsIdGenerator::neu();
        let erste = generator.naechste();
        assert_eq!(erste, VerbindungsId(1));
        assert!(!erste.ist_server());
        assert_eq!(generator.naechste(), VerbindungsId(2));
    }

    #[test]
    fn server_handle_display() {
        assert!(VerbindungsId::SERVER.ist_server());
        assert_eq!(VerbindungsId::SERVER.to_string(), "verbindung:0");
        assert_eq!(VerbindungsId(7).to_string(), "verbindung:7");
    }
}
